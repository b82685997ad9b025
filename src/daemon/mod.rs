use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Result;
use chrono::NaiveDate;
use collection::{collector::DataCollectionModule, sources::ObservationSources};
use processing::{journal_writer::JournalWriter, module::EventProcessor, ProcessingModule};
use storage::{
    journal_storage::{JournalStorage, JournalStorageImpl},
    observation::CaptureEvent,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    capture::command::CommandScreenObserver,
    config::Settings,
    ocr::tesseract::TesseractExtractor,
    utils::clock::{Clock, DefaultClock},
    window_api::{GenericWindowManager, UnsupportedWindowManager, WindowManager},
};

pub mod args;
pub mod collection;
pub mod processing;
pub mod shutdown;
pub mod storage;

pub const RECORDS_DIR: &str = "records";
const SCREENSHOT_DIR: &str = "tmp";
const CHANNEL_CAPACITY: usize = 10;

/// Represents the starting point for the daemon. Runs until SIGINT or SIGTERM, then writes the
/// entry that was still open and returns.
pub async fn start_daemon(dir: PathBuf, settings: Settings) -> Result<()> {
    info!(
        "Starting daemon in {dir:?}, capturing every {}s, keeping {} days",
        settings.interval, settings.retention_days
    );

    let storage = JournalStorageImpl::new(dir.join(RECORDS_DIR))?;
    prune_journals(&storage, settings.retention_days, DefaultClock.today()).await;

    let sources = create_sources(&dir, &settings)?;
    let shutdown_token = CancellationToken::new();
    let (sender, receiver) = mpsc::channel::<CaptureEvent>(CHANNEL_CAPACITY);

    let collector = create_collector(
        sender,
        sources,
        &shutdown_token,
        settings.interval(),
        DefaultClock,
    );
    let processor = create_processor(storage, receiver, &DefaultClock);

    let (_, collection_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        collector.run(),
        processor.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    info!("Daemon stopped");
    Ok(())
}

/// Performs exactly one capture and writes its result right away. Fails when nothing could be
/// captured or written.
pub async fn run_once(dir: PathBuf, settings: Settings) -> Result<()> {
    let storage = JournalStorageImpl::new(dir.join(RECORDS_DIR))?;
    let mut sources = create_sources(&dir, &settings)?;
    run_single_capture(&mut sources, storage, &DefaultClock).await
}

async fn run_single_capture(
    sources: &mut ObservationSources,
    storage: impl JournalStorage,
    clock: &dyn Clock,
) -> Result<()> {
    let observation = sources
        .observe(clock)
        .await
        .inspect_err(|e| error!("Capture failed {e:?}"))?;
    info!(
        "Captured {} - {}",
        observation.app_name, observation.window_title
    );

    let mut writer = JournalWriter::new(storage, clock.today());
    writer
        .process_next(CaptureEvent::Observed(observation))
        .await?;
    writer.finalize().await
}

/// Retention failures never stop the daemon.
async fn prune_journals(storage: &impl JournalStorage, retention_days: u32, today: NaiveDate) {
    match storage.prune(retention_days, today).await {
        Ok(0) => {}
        Ok(deleted) => info!("Cleaned up {deleted} old journal(s)"),
        Err(e) => error!("Failed to clean up old journals {e:?}"),
    }
}

fn create_sources(dir: &Path, settings: &Settings) -> Result<ObservationSources> {
    let window_manager: Box<dyn WindowManager> = match GenericWindowManager::new() {
        Ok(manager) => Box::new(manager),
        Err(e) => {
            warn!("Window manager is unavailable, windows will be reported as unknown {e:?}");
            Box::new(UnsupportedWindowManager)
        }
    };
    let screen = CommandScreenObserver::new(dir.join(SCREENSHOT_DIR))?;
    let extractor = TesseractExtractor::new(settings.ocr_languages.clone());

    Ok(ObservationSources::new(
        window_manager,
        Box::new(screen),
        Box::new(extractor),
        settings.capture_window,
    ))
}

fn create_collector(
    sender: mpsc::Sender<CaptureEvent>,
    sources: ObservationSources,
    shutdown_token: &CancellationToken,
    interval: Duration,
    clock: impl Clock,
) -> DataCollectionModule {
    DataCollectionModule::new(
        sender,
        sources,
        shutdown_token.clone(),
        interval,
        Box::new(clock),
    )
}

fn create_processor<S: JournalStorage>(
    storage: S,
    receiver: mpsc::Receiver<CaptureEvent>,
    clock: &dyn Clock,
) -> ProcessingModule<JournalWriter<S>> {
    let writer = JournalWriter::new(storage, clock.today());
    ProcessingModule::new(receiver, writer)
}

#[cfg(test)]
mod daemon_tests {
    use std::{path::PathBuf, time::Duration};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
    use tempfile::tempdir;
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use crate::{
        capture::{CapturedImage, MockScreenObserver},
        daemon::{
            collection::sources::ObservationSources,
            create_collector, create_processor, run_single_capture,
            storage::{
                journal_storage::{FailingJournalStorage, JournalStorage, JournalStorageImpl},
                observation::CaptureEvent,
            },
        },
        ocr::{Extraction, MockTextExtractor},
        utils::{clock::Clock, logging::TEST_LOGGING},
        window_api::{ActiveWindowData, MockWindowManager},
    };

    const TEST_START_DATE: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(),
        NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    );

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Local>,
        reference: Instant,
    }

    impl TestClock {
        fn new() -> Self {
            Self {
                start_time: Local.from_local_datetime(&TEST_START_DATE).unwrap(),
                reference: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Local> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    fn window_manager() -> MockWindowManager {
        let mut manager = MockWindowManager::new();
        manager.expect_get_active_window_data().returning(|| {
            Ok(ActiveWindowData {
                window_title: "main.rs".into(),
                app_name: "/usr/bin/code".into(),
            })
        });
        manager.expect_get_active_window_id().never();
        manager
    }

    fn screen(shots: PathBuf, failing_attempt: Option<usize>) -> MockScreenObserver {
        let mut screen = MockScreenObserver::new();
        let mut attempt = 0;
        screen.expect_capture().returning(move |window_id| {
            assert_eq!(window_id, None);
            attempt += 1;
            if Some(attempt) == failing_attempt {
                Err(anyhow!("screen recording is not permitted"))
            } else {
                Ok(CapturedImage::new(shots.join(format!("{attempt}.png"))))
            }
        });
        screen
    }

    fn extractor(texts: Vec<&'static str>) -> MockTextExtractor {
        let mut extractor = MockTextExtractor::new();
        let mut texts = texts.into_iter();
        extractor
            .expect_extract()
            .returning(move |_| Extraction::new(texts.next().unwrap_or("idle"), Some(0.9)));
        extractor
    }

    /// Runs collector and processor for six ticks, one of which fails to capture, then cancels
    /// them the way a signal would.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let sources = ObservationSources::new(
            Box::new(window_manager()),
            Box::new(screen(dir.path().join("tmp"), Some(3))),
            Box::new(extractor(vec![
                "editing", "editing", "reading", "reading", "reading",
            ])),
            false,
        );

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<CaptureEvent>(10);
        let test_clock = TestClock::new();
        let collector = create_collector(
            sender,
            sources,
            &shutdown_token,
            Duration::from_secs(10),
            test_clock.clone(),
        );

        let records = dir.path().join("records");
        let storage = JournalStorageImpl::new(records.clone())?;
        let processor = create_processor(storage, receiver, &test_clock);

        let (_, collection_result, processing_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_secs(55)).await;
                shutdown_token.cancel()
            },
            collector.run(),
            processor.run(),
        );

        collection_result?;
        processing_result?;

        let storage = JournalStorageImpl::new(records)?;
        let data = storage.read(TEST_START_DATE.date()).await?;

        assert_eq!(data.len(), 2);
        assert_eq!(&*data[0].extracted_text, "editing");
        assert_eq!(data[0].snapshot_count, 2);
        assert_eq!(&*data[0].active_app, "code");
        assert_eq!(&*data[1].extracted_text, "reading");
        assert_eq!(data[1].snapshot_count, 3);
        assert_eq!(data[1].avg_confidence, Some(0.9));

        Ok(())
    }

    #[tokio::test]
    async fn test_single_capture_is_written() -> Result<()> {
        let dir = tempdir()?;
        let mut sources = ObservationSources::new(
            Box::new(window_manager()),
            Box::new(screen(dir.path().join("tmp"), None)),
            Box::new(extractor(vec!["fn main() {}"])),
            false,
        );
        let storage = JournalStorageImpl::new(dir.path().join("records"))?;
        let clock = TestClock::new();

        run_single_capture(&mut sources, storage, &clock).await?;

        let storage = JournalStorageImpl::new(dir.path().join("records"))?;
        let data = storage.read(TEST_START_DATE.date()).await?;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].snapshot_count, 1);
        assert_eq!(data[0].duration_minutes, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_single_capture_fails_without_screenshot() -> Result<()> {
        let dir = tempdir()?;
        let mut extractor = MockTextExtractor::new();
        extractor.expect_extract().never();
        let mut sources = ObservationSources::new(
            Box::new(window_manager()),
            Box::new(screen(dir.path().join("tmp"), Some(1))),
            Box::new(extractor),
            false,
        );
        let storage = JournalStorageImpl::new(dir.path().join("records"))?;

        let result = run_single_capture(&mut sources, storage, &TestClock::new()).await;

        assert!(result.is_err());
        let storage = JournalStorageImpl::new(dir.path().join("records"))?;
        assert!(storage.read(TEST_START_DATE.date()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_single_capture_fails_when_write_fails() -> Result<()> {
        let dir = tempdir()?;
        let mut sources = ObservationSources::new(
            Box::new(window_manager()),
            Box::new(screen(dir.path().join("tmp"), None)),
            Box::new(extractor(vec!["fn main() {}"])),
            false,
        );

        let result =
            run_single_capture(&mut sources, FailingJournalStorage, &TestClock::new()).await;

        assert!(result.is_err());
        Ok(())
    }
}
