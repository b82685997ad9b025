use anyhow::Result;

use crate::daemon::storage::observation::CaptureEvent;

/// Represents an event processor. The processor owns whatever state is built up from capture
/// events and is the only place that state is touched.
pub trait EventProcessor {
    fn process_next(&mut self, event: CaptureEvent) -> impl std::future::Future<Output = Result<()>>;

    /// Called once after the last event. Anything still pending has to be written here.
    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
