use std::process::Command;

use anyhow::{anyhow, Result};
use tracing::instrument;

use super::{ActiveWindowData, WindowManager};

/// Prints the frontmost application name and the title of its front window on two lines. Reading
/// the title needs the accessibility permission, without it the second line is empty.
const FRONT_WINDOW_SCRIPT: &str = r#"
tell application "System Events"
    set frontApp to first application process whose frontmost is true
    set appName to name of frontApp
    set windowTitle to ""
    try
        set windowTitle to name of front window of frontApp
    end try
end tell
return appName & linefeed & windowTitle
"#;

fn run_osascript(script: &str) -> Result<String> {
    let output = Command::new("osascript").args(["-e", script]).output()?;
    if !output.status.success() {
        return Err(anyhow!(
            "osascript exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_front_window(output: &str) -> Result<ActiveWindowData> {
    let mut lines = output.lines();
    let app_name = lines
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("osascript returned no application"))?;
    let window_title = lines.next().unwrap_or_default().trim();
    Ok(ActiveWindowData {
        app_name: app_name.into(),
        window_title: window_title.into(),
    })
}

/// Asks System Events through `osascript`. Window ids of the window server aren't reachable this
/// way, so captures on macOS always cover the whole screen.
#[derive(Default)]
pub struct MacWindowManager {}

impl MacWindowManager {
    pub fn new() -> Self {
        Self {}
    }
}

impl WindowManager for MacWindowManager {
    #[instrument(skip(self))]
    fn get_active_window_data(&mut self) -> Result<ActiveWindowData> {
        parse_front_window(&run_osascript(FRONT_WINDOW_SCRIPT)?)
    }

    fn get_active_window_id(&mut self) -> Result<Option<u32>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::parse_front_window;

    #[test]
    fn test_parse_front_window() {
        let data = parse_front_window("Safari\nApple Developer\n").unwrap();
        assert_eq!(&*data.app_name, "Safari");
        assert_eq!(&*data.window_title, "Apple Developer");

        let data = parse_front_window("Finder\n\n").unwrap();
        assert_eq!(&*data.window_title, "");

        assert!(parse_front_window("\n").is_err());
    }
}
