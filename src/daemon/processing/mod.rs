use anyhow::Result;
use module::EventProcessor;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, trace};

use super::storage::observation::CaptureEvent;

pub mod compaction;
pub mod journal_writer;
pub mod module;

/// Receives capture events and hands them to a processor. The module stops once every sender is
/// dropped, which is how the collector signals shutdown, and finalizes the processor afterwards.
pub struct ProcessingModule<Processor> {
    receiver: Receiver<CaptureEvent>,
    processor: Processor,
}

impl<P: EventProcessor> ProcessingModule<P> {
    pub fn new(receiver: Receiver<CaptureEvent>, processor: P) -> Self {
        Self {
            receiver,
            processor,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        while let Some(event) = self.receiver.recv().await {
            let timestamp = event.timestamp();
            trace!("Processing event {:?}", event);
            match self.processor.process_next(event).await {
                Ok(_) => {
                    debug!("Processed event from {timestamp}")
                }
                Err(e) => {
                    error!("Error processing event from {timestamp}: {e:?}")
                }
            }
        }

        debug!("Collector is gone, draining");
        let result = self.processor.finalize().await;
        self.receiver.close();
        result
    }
}
