use std::sync::Arc;

use chrono::{DateTime, Local};

/// Result of one successful capture tick: what was in front of the user and what text could be
/// read off the screen. Observations are never stored directly, they are folded into
/// [LogEntry](super::entities::LogEntry).
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Local>,
    pub app_name: Arc<str>,
    pub window_title: Arc<str>,
    pub extracted_text: Arc<str>,
    pub confidence: Option<f64>,
}

/// Message sent from the collector to the processor on every tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    Observed(Observation),
    /// The tick happened but nothing could be captured. Still carries the time so that day
    /// rollover is noticed even while capturing is broken.
    Missed { timestamp: DateTime<Local> },
}

impl CaptureEvent {
    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            CaptureEvent::Observed(observation) => observation.timestamp,
            CaptureEvent::Missed { timestamp } => *timestamp,
        }
    }
}
