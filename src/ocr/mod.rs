//! Text recognition. Extractors never fail: anything that goes wrong is logged and reported as
//! an empty [Extraction].

pub mod tesseract;

use std::path::Path;

use async_trait::async_trait;

/// Upper bound for extracted text, in characters. Longer text is cut.
pub const MAX_TEXT_LENGTH: usize = 20_000;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub text: String,
    /// Mean recognition confidence in `0.0..=1.0`. Absent when nothing was recognized.
    pub confidence: Option<f64>,
}

impl Extraction {
    pub fn new(text: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            text: truncate_chars(text.into(), MAX_TEXT_LENGTH),
            confidence,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, image: &Path) -> Extraction;
}

pub fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((index, _)) = text.char_indices().nth(max) {
        text.truncate(index);
    }
    text
}
