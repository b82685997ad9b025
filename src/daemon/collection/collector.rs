use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, warn, Instrument};

use crate::{daemon::storage::observation::CaptureEvent, utils::clock::Clock};

use super::sources::ObservationSources;

/// Drives capturing on a fixed schedule and forwards the results to the processing module.
pub struct DataCollectionModule {
    next: mpsc::Sender<CaptureEvent>,
    sources: ObservationSources,
    shutdown: CancellationToken,
    collection_frequency: Duration,
    time_provider: Box<dyn Clock>,
}

impl DataCollectionModule {
    pub fn new(
        next: mpsc::Sender<CaptureEvent>,
        sources: ObservationSources,
        shutdown: CancellationToken,
        collection_frequency: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            sources,
            shutdown,
            collection_frequency,
            time_provider,
        }
    }

    async fn collect_data(&mut self) -> CaptureEvent {
        match self.sources.observe(self.time_provider.as_ref()).await {
            Ok(observation) => CaptureEvent::Observed(observation),
            Err(e) => {
                warn!("Capture failed, skipping tick {:?}", e);
                CaptureEvent::Missed {
                    timestamp: self.time_provider.time(),
                }
            }
        }
    }

    /// Executes the collector event loop. Returning drops the sender, which lets the processing
    /// module drain and stop.
    pub async fn run(mut self) -> Result<()> {
        // Whatever ends the loop ends the whole daemon.
        let _shutdown_guard = self.shutdown.clone().drop_guard();
        let mut collection_point = self.time_provider.instant();
        loop {
            // A tick that took longer than the interval pushes the schedule instead of causing a
            // burst of catch-up captures.
            collection_point =
                collection_point.max(self.time_provider.instant()) + self.collection_frequency;

            let event = self.collect_data().await;
            let span = info_span!("Forwarding capture event");
            self.next
                .send(event)
                .instrument(span)
                .await
                .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
            debug!("Successfully sent capture event");

            tokio::select! {
                // Cancelation means we stop execution of the event loop. Which means we also drop
                // the sender channel and consequently stop processing module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(collection_point) => ()
            }
        }
    }
}
