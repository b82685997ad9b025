//! Screen capture. A capture produces a temporary image file that lives only as long as the
//! returned [CapturedImage].

pub mod command;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

/// Temporary screenshot on disk. The file is removed when the value is dropped.
#[derive(Debug)]
pub struct CapturedImage {
    path: PathBuf,
}

impl CapturedImage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CapturedImage {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete screenshot {:?}: {e}", self.path),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScreenObserver: Send + Sync {
    /// Captures the given window, or the whole screen when no window is given.
    async fn capture(&self, window_id: Option<u32>) -> Result<CapturedImage>;
}
