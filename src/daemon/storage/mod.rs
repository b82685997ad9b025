//!  Storage is organized through [journal_storage::JournalStorageImpl].
//!  The basic idea is:
//!   - There is a directory with all the journals.
//!   - Every local calendar day gets its own `YYYY-MM-DD.jsonl` file.
//!   - Files are append only, one compacted [entities::LogEntry] per line.

pub mod entities;
pub mod journal_storage;
pub mod observation;
