use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::debug;

use crate::daemon::{
    storage::journal_storage::{JournalStorage, JournalStorageImpl},
    RECORDS_DIR,
};

use super::{
    output::{render_digest, DigestOptions},
    Args,
};

const RECORD_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct DigestCommand {
    #[arg(
        long,
        help = "Application directory. By default tries to use $XDG_STATE_HOME or $HOME/.local/state"
    )]
    pub dir: Option<PathBuf>,
    #[arg(
        short,
        long,
        help = "Day to render. Examples are \"2025-03-15\", \"yesterday\", \"15/03/2025\". Today by default"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(short, long, help = "Write the digest into a file instead of stdout")]
    output: Option<PathBuf>,
    #[arg(
        short = 'n',
        long = "max-per-block",
        default_value_t = 2,
        help = "Maximum number of text excerpts shown per time block"
    )]
    max_per_block: usize,
    #[arg(
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..=1440),
        help = "Length of a time block in minutes"
    )]
    block_minutes: u32,
}

/// Renders the digest of a single day. Days without a journal still produce a digest saying
/// there is nothing recorded.
pub async fn process_digest_command(
    app_dir: &Path,
    DigestCommand {
        dir: _,
        date,
        date_style,
        output,
        max_per_block,
        block_minutes,
    }: DigestCommand,
) -> Result<()> {
    let now = Local::now();
    let date = match date {
        Some(date) => parse_date(&date, now, date_style)?,
        None => now.date_naive(),
    };

    let storage = JournalStorageImpl::new(app_dir.join(RECORDS_DIR))?;
    let entries = storage.read(date).await?;
    debug!("Rendering {} entries for {date}", entries.len());

    let digest = render_digest(
        date,
        &entries,
        &DigestOptions {
            block_minutes,
            max_entries_per_block: max_per_block,
            ..DigestOptions::default()
        },
    );

    match output {
        Some(path) => {
            tokio::fs::write(&path, digest).await?;
            println!("Digest saved to {}", path.display());
        }
        None => println!("{digest}"),
    }
    Ok(())
}

/// Accepts journal style dates first, then anything `chrono_english` understands.
fn parse_date(value: &str, now: DateTime<Local>, date_style: DateStyle) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), RECORD_DATE_FORMAT) {
        return Ok(date);
    }

    match parse_date_string(value, now, date_style.into()) {
        Ok(v) => Ok(v.date_naive()),
        Err(e) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {value:?}: {e}"),
            )
            .into()),
    }
}
