use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::daemon::storage::{
    entities::LogEntry, journal_storage::JournalStorage, observation::CaptureEvent,
};

use super::{compaction::fold, module::EventProcessor};

/// Bridges [ProcessingModule](super::ProcessingModule) and [JournalStorage]. Holds the entry that
/// is still growing and decides when it is finished: when the text changes, when the local day
/// changes, and on shutdown.
pub struct JournalWriter<S: JournalStorage> {
    storage: S,
    open_entry: Option<LogEntry>,
    current_day: NaiveDate,
}

impl<S: JournalStorage> JournalWriter<S> {
    pub fn new(storage: S, current_day: NaiveDate) -> Self {
        Self {
            storage,
            open_entry: None,
            current_day,
        }
    }

    pub fn open_entry(&self) -> Option<&LogEntry> {
        self.open_entry.as_ref()
    }

    /// An entry never spans two day files. Once the day changes whatever is open is written to
    /// the day it started on, even if the same text is still on screen.
    async fn roll_over(&mut self, day: NaiveDate) -> Result<()> {
        if day == self.current_day {
            return Ok(());
        }
        debug!("Day changed from {} to {day}", self.current_day);
        self.current_day = day;
        match self.open_entry.take() {
            Some(entry) => self.commit(entry).await,
            None => Ok(()),
        }
    }

    async fn commit(&self, entry: LogEntry) -> Result<()> {
        info!(
            "Committing entry {} - {} ({} snapshots) from {}",
            entry.start_time, entry.end_time, entry.snapshot_count, entry.active_app
        );
        self.storage.append(&entry).await
    }
}

impl<S: JournalStorage> EventProcessor for JournalWriter<S> {
    async fn process_next(&mut self, event: CaptureEvent) -> Result<()> {
        let rolled = self.roll_over(event.timestamp().date_naive()).await;

        let CaptureEvent::Observed(observation) = event else {
            return rolled;
        };

        let (finished, next) = fold(self.open_entry.take(), observation);
        // The new entry is kept even if writing the finished one fails. The finished one is lost
        // in that case.
        self.open_entry = Some(next);
        let committed = match finished {
            Some(entry) => self.commit(entry).await,
            None => Ok(()),
        };

        rolled.and(committed)
    }

    async fn finalize(&mut self) -> Result<()> {
        match self.open_entry.take() {
            Some(entry) => self.commit(entry).await,
            None => Ok(()),
        }
    }
}
