use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, info, trace, warn};

use crate::utils::time::{date_to_record_name, record_name_to_date};

use super::entities::LogEntry;

/// Interface for abstracting storage of journal entries.
pub trait JournalStorage {
    /// Appends a finished entry to the file of the day it started on. Entries without any text
    /// are accepted and silently dropped.
    fn append(&self, entry: &LogEntry) -> impl Future<Output = Result<()>>;

    /// Retrieves entries of a certain day in the order they were written.
    fn read(&self, date: NaiveDate) -> impl Future<Output = Result<Vec<LogEntry>>>;

    /// Removes day files that are `retention_days` or more days older than `today`. Returns the
    /// amount of removed files.
    fn prune(&self, retention_days: u32, today: NaiveDate) -> impl Future<Output = Result<usize>>;
}

/// The main realization of [JournalStorage].
pub struct JournalStorageImpl {
    record_dir: PathBuf,
}

impl JournalStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }

    async fn read_inner(&self, path: &Path) -> Result<Vec<LogEntry>> {
        async fn extract(path: &Path) -> std::result::Result<Vec<LogEntry>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let mut reader = BufReader::new(file);
            let mut line = Vec::new();
            let mut entries = vec![];
            // Lines are read as bytes, a line cut inside a character must not end the read.
            while reader.read_until(b'\n', &mut line).await? > 0 {
                let content = line.trim_ascii();
                if !content.is_empty() {
                    match serde_json::from_slice::<LogEntry>(content) {
                        Ok(v) => entries.push(v),
                        Err(e) => {
                            // A write cut short by a crash leaves a partial line behind.
                            warn!(
                                "During parsing in path {:?} found illegal json string {}:  {e}",
                                path,
                                String::from_utf8_lossy(content)
                            )
                        }
                    }
                }
                line.clear();
            }

            reader.into_inner().unlock_async().await?;

            Ok(entries)
        }

        match extract(path).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }

    async fn write_locked(file: &mut File, line: &[u8]) -> Result<()> {
        file.write_all(line).await?;
        file.flush().await?;
        Ok(())
    }
}

impl JournalStorage for JournalStorageImpl {
    async fn append(&self, entry: &LogEntry) -> Result<()> {
        if entry.is_blank() {
            trace!("Skipping entry without text started at {}", entry.start_time);
            return Ok(());
        }

        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let path = self.path_for(entry.date());
        let mut file = File::options()
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        // Readers take a shared lock, so they never see half of a line.
        file.lock_exclusive()?;
        let result = Self::write_locked(&mut file, &line).await;
        file.unlock_async().await?;
        result
    }

    async fn read(&self, date: NaiveDate) -> Result<Vec<LogEntry>> {
        let path = self.path_for(date);
        self.read_inner(&path).await
    }

    async fn prune(&self, retention_days: u32, today: NaiveDate) -> Result<usize> {
        let cutoff = today - Duration::days(retention_days as i64);
        let mut deleted = 0;

        let mut dir = tokio::fs::read_dir(&self.record_dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            // Only files named after a date are ours to remove.
            let Some(date) = name.to_str().and_then(record_name_to_date) else {
                continue;
            };
            if date > cutoff || !item.file_type().await?.is_file() {
                continue;
            }

            match tokio::fs::remove_file(item.path()).await {
                Ok(()) => {
                    info!("Deleted old journal {name:?}");
                    deleted += 1;
                }
                Err(e) => warn!("Failed to delete old journal {name:?}: {e}"),
            }
        }

        Ok(deleted)
    }
}

/// Storage whose writes always fail, as on a full or read-only disk.
#[cfg(test)]
pub struct FailingJournalStorage;

#[cfg(test)]
impl JournalStorage for FailingJournalStorage {
    async fn append(&self, entry: &LogEntry) -> Result<()> {
        Err(anyhow::anyhow!(
            "No space left on device, entry from {} lost",
            entry.start_time
        ))
    }

    async fn read(&self, _date: NaiveDate) -> Result<Vec<LogEntry>> {
        Ok(vec![])
    }

    async fn prune(&self, _retention_days: u32, _today: NaiveDate) -> Result<usize> {
        Ok(0)
    }
}
