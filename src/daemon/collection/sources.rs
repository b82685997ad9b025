use anyhow::Result;
use tracing::{debug, instrument};

use crate::{
    capture::ScreenObserver,
    daemon::storage::observation::Observation,
    ocr::TextExtractor,
    utils::clock::Clock,
    window_api::{inspect_active_window, inspect_active_window_id, WindowManager},
};

/// Everything an observation is made of. Only a failed capture fails the observation, window
/// inspection and text extraction degrade to "Unknown" and empty text.
pub struct ObservationSources {
    window_manager: Box<dyn WindowManager>,
    screen: Box<dyn ScreenObserver>,
    extractor: Box<dyn TextExtractor>,
    capture_window: bool,
}

impl ObservationSources {
    pub fn new(
        window_manager: Box<dyn WindowManager>,
        screen: Box<dyn ScreenObserver>,
        extractor: Box<dyn TextExtractor>,
        capture_window: bool,
    ) -> Self {
        Self {
            window_manager,
            screen,
            extractor,
            capture_window,
        }
    }

    #[instrument(skip_all)]
    pub async fn observe(&mut self, clock: &dyn Clock) -> Result<Observation> {
        let timestamp = clock.time();

        let window_id = if self.capture_window {
            inspect_active_window_id(self.window_manager.as_mut())
        } else {
            None
        };
        let image = self.screen.capture(window_id).await?;

        let window = inspect_active_window(self.window_manager.as_mut());
        let extraction = self.extractor.extract(image.path()).await;
        debug!(
            "Extracted {} characters from {}",
            extraction.text.chars().count(),
            window.app_name
        );

        Ok(Observation {
            timestamp,
            app_name: window.app_name,
            window_title: window.window_title,
            extracted_text: extraction.text.into(),
            confidence: extraction.confidence,
        })
    }
}
