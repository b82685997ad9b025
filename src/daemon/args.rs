use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::config::SettingsOverrides;

/// Capture settings that can be given on the command line. Anything left out comes from the
/// stored configuration.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SettingsArgs {
    #[arg(short, long, help = "Seconds between captures. At least 10")]
    pub interval: Option<u64>,
    #[arg(short, long = "retention", help = "Days of journals to keep")]
    pub retention_days: Option<u32>,
}

impl From<SettingsArgs> for SettingsOverrides {
    fn from(value: SettingsArgs) -> Self {
        SettingsOverrides {
            interval: value.interval,
            retention_days: value.retention_days,
            ..SettingsOverrides::default()
        }
    }
}

#[derive(Parser)]
#[command(name = "daylog-daemon", version, about = "Background process of daylog")]
pub struct DaemonArgs {
    #[arg(long, help = "Stay in the foreground instead of detaching")]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    #[command(flatten)]
    pub settings: SettingsArgs,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}
