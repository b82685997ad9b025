//! Contains logic for finding out which window the user is looking at.
//! [GenericWindowManager] is the main artifact of this module that abstracts
//! the operations, [inspect_active_window] turns its failures into the "Unknown" sentinel.

#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::{path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use tracing::debug;

/// Stands in for anything that could not be found out about the foreground window.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveWindowData {
    /// Name of the window. For example 'bash in hello' or 'Document 1' or 'Vibing in YouTube -
    /// Chrome'
    pub window_title: Arc<str>,
    /// Name of the application owning the window. Backends that only know the executable path
    /// return the full path, [inspect_active_window] shortens it.
    pub app_name: Arc<str>,
}

impl ActiveWindowData {
    pub fn unknown() -> Self {
        Self {
            window_title: UNKNOWN.into(),
            app_name: UNKNOWN.into(),
        }
    }
}

/// Intended to serve as a contract windows, linux and macos systems must implement.
#[cfg_attr(test, mockall::automock)]
pub trait WindowManager {
    fn get_active_window_data(&mut self) -> Result<ActiveWindowData>;

    /// Identifier of the foreground window understood by the screen capture backend.
    fn get_active_window_id(&mut self) -> Result<Option<u32>>;
}

/// Best effort version of [WindowManager::get_active_window_data]. Missing permissions make the
/// lookup fail all the time, so failures are only logged at debug level.
pub fn inspect_active_window(manager: &mut dyn WindowManager) -> ActiveWindowData {
    match manager.get_active_window_data() {
        Ok(data) => ActiveWindowData {
            app_name: clean_app_name(&data.app_name),
            window_title: non_empty_or_unknown(data.window_title),
        },
        Err(e) => {
            debug!("Active window lookup failed {e:?}");
            ActiveWindowData::unknown()
        }
    }
}

/// Best effort version of [WindowManager::get_active_window_id].
pub fn inspect_active_window_id(manager: &mut dyn WindowManager) -> Option<u32> {
    manager
        .get_active_window_id()
        .inspect_err(|e| debug!("Active window id lookup failed {e:?}"))
        .ok()
        .flatten()
}

/// Reduces an executable path to its file name, `/usr/bin/firefox` becomes `firefox`.
pub fn clean_app_name(value: &str) -> Arc<str> {
    let value = value.trim();
    if value.is_empty() {
        return UNKNOWN.into();
    }
    Path::new(value)
        .file_name()
        .map(|v| v.to_string_lossy().into())
        .unwrap_or_else(|| value.into())
}

fn non_empty_or_unknown(value: Arc<str>) -> Arc<str> {
    if value.trim().is_empty() {
        UNKNOWN.into()
    } else {
        value
    }
}

/// Serves as a cross-compatible WindowManager implementation.
pub struct GenericWindowManager {
    inner: Box<dyn WindowManager>,
}

impl GenericWindowManager {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowManager;
                Ok(Self {
                    inner: Box::new(WindowsWindowManager::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::LinuxWindowManager;
                Ok(Self {
                    inner: Box::new(LinuxWindowManager::new()?),
                })
            }
            else if #[cfg(target_os = "macos")] {
                use macos::MacWindowManager;
                Ok(Self {
                    inner: Box::new(MacWindowManager::new()),
                })
            }
            else {
                // Everything is reported as unknown, capturing and text extraction keep working.
                Ok(Self {
                    inner: Box::new(UnsupportedWindowManager),
                })
            }
        }
    }
}

impl WindowManager for GenericWindowManager {
    fn get_active_window_data(&mut self) -> Result<ActiveWindowData> {
        self.inner.get_active_window_data()
    }

    fn get_active_window_id(&mut self) -> Result<Option<u32>> {
        self.inner.get_active_window_id()
    }
}

/// Used when the crate was built without a window backend for the current platform.
pub struct UnsupportedWindowManager;

impl WindowManager for UnsupportedWindowManager {
    fn get_active_window_data(&mut self) -> Result<ActiveWindowData> {
        Err(anyhow!("No window manager backend was compiled in"))
    }

    fn get_active_window_id(&mut self) -> Result<Option<u32>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::{
        clean_app_name, inspect_active_window, inspect_active_window_id, ActiveWindowData,
        MockWindowManager, UnsupportedWindowManager, UNKNOWN,
    };

    #[test]
    fn test_clean_app_name() {
        assert_eq!(&*clean_app_name("/usr/lib/firefox/firefox"), "firefox");
        assert_eq!(&*clean_app_name("Safari"), "Safari");
        assert_eq!(&*clean_app_name("  "), UNKNOWN);
    }

    #[test]
    fn test_failures_become_unknown() {
        let mut manager = MockWindowManager::new();
        manager
            .expect_get_active_window_data()
            .returning(|| Err(anyhow!("not permitted")));
        manager
            .expect_get_active_window_id()
            .returning(|| Err(anyhow!("not permitted")));

        assert_eq!(inspect_active_window(&mut manager), ActiveWindowData::unknown());
        assert_eq!(inspect_active_window_id(&mut manager), None);
    }

    #[test]
    fn test_success_is_cleaned() {
        let mut manager = MockWindowManager::new();
        manager.expect_get_active_window_data().returning(|| {
            Ok(ActiveWindowData {
                window_title: "".into(),
                app_name: "/usr/bin/kitty".into(),
            })
        });
        manager
            .expect_get_active_window_id()
            .returning(|| Ok(Some(42)));

        let data = inspect_active_window(&mut manager);
        assert_eq!(&*data.app_name, "kitty");
        assert_eq!(&*data.window_title, UNKNOWN);
        assert_eq!(inspect_active_window_id(&mut manager), Some(42));
    }

    #[test]
    fn test_unsupported_backend() {
        let mut manager = UnsupportedWindowManager;
        assert_eq!(inspect_active_window(&mut manager), ActiveWindowData::unknown());
        assert_eq!(inspect_active_window_id(&mut manager), None);
    }
}
