use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::observation::Observation;

/// One line of a day journal. Consecutive observations that show the same text are stored as a
/// single entry spanning from the first to the last of them, so a user reading the same page for
/// an hour costs one line instead of a line per capture.
///
/// Timestamps keep the UTC offset they were captured with, which is what decides the day file an
/// entry belongs to.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub duration_minutes: u32,
    pub snapshot_count: u32,
    pub active_app: Arc<str>,
    pub window_title: Arc<str>,
    pub extracted_text: Arc<str>,
    pub avg_confidence: Option<f64>,
}

impl LogEntry {
    /// Calendar date of the entry, which is also the name of the file it is stored in.
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    pub fn is_blank(&self) -> bool {
        self.extracted_text.trim().is_empty()
    }

    /// Moves the end forward. An earlier moment, e.g. after the system clock was adjusted, leaves
    /// the end where it is.
    pub fn set_end(&mut self, end: DateTime<FixedOffset>) {
        self.end_time = end.max(self.end_time).max(self.start_time);
        self.duration_minutes = minutes_between(self.start_time, self.end_time);
    }
}

impl From<Observation> for LogEntry {
    fn from(
        Observation {
            timestamp,
            app_name,
            window_title,
            extracted_text,
            confidence,
        }: Observation,
    ) -> Self {
        let moment = timestamp.fixed_offset();
        LogEntry {
            start_time: moment,
            end_time: moment,
            duration_minutes: 1,
            snapshot_count: 1,
            active_app: app_name,
            window_title,
            extracted_text,
            avg_confidence: confidence,
        }
    }
}

/// Whole minutes between two moments, counting the started minute. Never less than 1.
fn minutes_between(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> u32 {
    let minutes = (end - start).num_minutes().max(0);
    u32::try_from(minutes).unwrap_or(u32::MAX - 1) + 1
}
