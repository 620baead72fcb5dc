//! Storage module for persisting crawled pages
//!
//! Successfully fetched pages are appended as [`PageRecord`]s to one or more
//! page stores. The primary store is newline-delimited JSON (one object per
//! page, the format the extraction pipeline consumes); a SQLite store can be
//! enabled alongside it. Records are append-only: the crawler never mutates
//! or deletes what it has written.

mod jsonl;
mod sqlite;

pub use jsonl::JsonlStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One persisted unit of crawled content
///
/// Field order matches the wire format consumed downstream:
/// `{"url", "depth", "title", "text", "fetched_at"}` with an RFC 3339
/// timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical URL the content was fetched from
    pub url: String,

    /// BFS level at which the URL was first discovered
    pub depth: u32,

    /// Page title, empty when the document has none
    pub title: String,

    /// Visible text content with boilerplate removed
    pub text: String,

    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

/// Trait for page store backends
///
/// Implementations persist records in arrival order. A write failure is
/// fatal to the crawl: silently losing pages would defeat the job's purpose.
pub trait PageStore: Send {
    /// Appends one record to durable output
    fn append(&mut self, record: &PageRecord) -> StorageResult<()>;

    /// Returns the number of records currently persisted
    fn count(&self) -> StorageResult<u64>;
}
