pub mod daemon_path;
pub mod digest;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use digest::{process_digest_command, DigestCommand};
use process::{daemon_executable, kill_previous_servers, restart_server};
use tracing::{info, level_filters::LevelFilter};

use crate::{
    config::{config_path, load_settings, resolve_settings, save_settings, SettingsOverrides},
    daemon::{args::SettingsArgs, run_once, start_daemon},
    utils::{
        dir::resolve_application_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

const DIR_HELP: &str =
    "Application directory. By default tries to use $XDG_STATE_HOME or $HOME/.local/state";

#[derive(Parser, Debug)]
#[command(name = "daylog", version, long_about = None)]
#[command(about = "Journals what is on your screen throughout the day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Stops a running daemon and starts a new one in the background")]
    Init {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(about = "Render a digest of one day of the journal")]
    Digest {
        #[command(flatten)]
        command: DigestCommand,
    },
    #[command(
        about = "Capture continuously in the current console. Useful for debugging and service managers"
    )]
    Serve {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
        #[command(flatten)]
        settings: SettingsArgs,
    },
    #[command(about = "Capture once and write the result into the journal")]
    Once {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
    },
    #[command(about = "Show the configuration. Given values are validated and saved")]
    Config {
        #[arg(long, help = DIR_HELP)]
        dir: Option<PathBuf>,
        #[command(flatten)]
        settings: SettingsArgs,
        #[arg(long, help = "Text recognition languages, \"+\" separated. For example eng+jpn")]
        languages: Option<String>,
        #[arg(long, help = "Capture only the focused window (true or false)")]
        capture_window: Option<bool>,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
}

impl Commands {
    fn dir(&self) -> Option<PathBuf> {
        match self {
            Commands::Init { dir }
            | Commands::Serve { dir, .. }
            | Commands::Once { dir }
            | Commands::Config { dir, .. } => dir.clone(),
            Commands::Digest { command } => command.dir.clone(),
            Commands::Stop {} => None,
        }
    }
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let app_dir = resolve_application_path(args.commands.dir())?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init { .. } => restart_server(&app_dir),
        Commands::Stop {} => {
            let stopped = kill_previous_servers(&daemon_executable()?)?;
            println!("Stopped {stopped} daemon(s)");
            Ok(())
        }
        Commands::Serve { settings, .. } => {
            let settings = resolve_settings(&app_dir, settings.into())?;
            start_daemon(app_dir, settings).await
        }
        Commands::Once { .. } => {
            let settings = resolve_settings(&app_dir, SettingsOverrides::default())?;
            run_once(app_dir, settings).await
        }
        Commands::Digest { command } => process_digest_command(&app_dir, command).await,
        Commands::Config {
            settings,
            languages,
            capture_window,
            ..
        } => process_config_command(
            &app_dir,
            SettingsOverrides {
                ocr_languages: languages,
                capture_window,
                ..SettingsOverrides::from(settings)
            },
        ),
    }
}

fn process_config_command(app_dir: &Path, overrides: SettingsOverrides) -> Result<()> {
    let settings = if overrides.is_empty() {
        load_settings(app_dir)?
    } else {
        let settings = resolve_settings(app_dir, overrides)?;
        save_settings(app_dir, &settings)?;
        info!("Saved configuration {settings:?}");
        println!("Saved to {}", config_path(app_dir).display());
        settings
    };
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
