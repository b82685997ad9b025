use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{CapturedImage, ScreenObserver};

/// Program and arguments that write a png of the screen (or of one window) to `path`.
pub fn capture_command(window_id: Option<u32>, path: &Path) -> Option<(&'static str, Vec<String>)> {
    let path = path.to_string_lossy().into_owned();
    cfg_if::cfg_if! {
        if #[cfg(target_os = "macos")] {
            let mut args = vec!["-x".to_string()];
            if let Some(id) = window_id {
                args.push("-o".into());
                args.push(format!("-l{id}"));
            }
            args.push(path);
            Some(("screencapture", args))
        } else if #[cfg(windows)] {
            let _ = (window_id, path);
            None
        } else {
            let window = window_id.map_or_else(|| "root".to_string(), |id| format!("{id:#x}"));
            Some(("import", vec!["-silent".into(), "-window".into(), window, path]))
        }
    }
}

/// Captures through the screenshot utility of the platform: `screencapture` on macOS and
/// ImageMagick's `import` on X11.
pub struct CommandScreenObserver {
    tmp_dir: PathBuf,
    sequence: AtomicU64,
}

impl CommandScreenObserver {
    pub fn new(tmp_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&tmp_dir)?;
        Ok(Self {
            tmp_dir,
            sequence: AtomicU64::new(0),
        })
    }

    fn next_path(&self) -> PathBuf {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.tmp_dir.join(format!(
            "screenshot_{}_{sequence}.png",
            Local::now().format("%Y%m%d_%H%M%S")
        ))
    }

    async fn run_capture(&self, window_id: Option<u32>) -> Result<CapturedImage> {
        let image = CapturedImage::new(self.next_path());
        let (program, args) = capture_command(window_id, image.path())
            .ok_or_else(|| anyhow!("Screen capture is not supported on this platform"))?;

        debug!("Running {program} {args:?}");
        let output = Command::new(program).args(&args).output().await?;
        if !output.status.success() {
            bail!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if !tokio::fs::try_exists(image.path()).await? {
            bail!("{program} did not create {:?}", image.path());
        }
        Ok(image)
    }
}

#[async_trait]
impl ScreenObserver for CommandScreenObserver {
    #[instrument(skip(self))]
    async fn capture(&self, window_id: Option<u32>) -> Result<CapturedImage> {
        match (window_id, self.run_capture(window_id).await) {
            (Some(id), Err(e)) => {
                warn!("Capturing window {id} failed, capturing the whole screen instead {e:?}");
                self.run_capture(None).await
            }
            (_, result) => result,
        }
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use std::path::Path;

    use super::capture_command;

    #[test]
    fn test_whole_screen_command() {
        let (program, args) = capture_command(None, Path::new("/tmp/a.png")).unwrap();
        assert!(!program.is_empty());
        assert_eq!(args.last().map(String::as_str), Some("/tmp/a.png"));
    }

    #[test]
    fn test_window_command_mentions_window() {
        let (_, args) = capture_command(Some(0x2a), Path::new("/tmp/a.png")).unwrap();
        assert!(args.iter().any(|arg| arg.contains("42") || arg.contains("0x2a")));
    }
}
