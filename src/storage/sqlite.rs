//! SQLite page store
//!
//! Optional second backend mirroring the JSONL output into a queryable
//! `pages` table. The URL column is unique, so re-crawling a site into the
//! same database replaces stale rows instead of duplicating them.

use crate::storage::{PageRecord, PageStore, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed page store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Store ready for appends
    /// * `Err(StorageError)` - Failed to open or initialize the database
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Reads a record back by URL
    pub fn get_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        use rusqlite::OptionalExtension;

        let record = self
            .conn
            .query_row(
                "SELECT url, depth, title, text, fetched_at FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        Ok(record.map(|(url, depth, title, text, fetched_at)| PageRecord {
            url,
            depth,
            title,
            text,
            fetched_at: DateTime::parse_from_rfc3339(&fetched_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        }))
    }
}

impl PageStore for SqliteStore {
    fn append(&mut self, record: &PageRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO pages (url, depth, title, text, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.url,
                record.depth,
                record.title,
                record.text,
                record.fetched_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Creates the pages table if it does not exist
fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT UNIQUE NOT NULL,
            depth INTEGER NOT NULL,
            title TEXT NOT NULL,
            text TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        );
    ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, depth: u32, text: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            depth,
            title: "Title".to_string(),
            text: text.to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_count() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .append(&record("https://example.com/", 0, "root"))
            .unwrap();
        store
            .append(&record("https://example.com/a", 1, "child"))
            .unwrap();

        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_get_by_url() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .append(&record("https://example.com/team", 2, "Jane Doe"))
            .unwrap();

        let found = store.get_by_url("https://example.com/team").unwrap();
        assert!(found.is_some());
        let found = found.unwrap();
        assert_eq!(found.depth, 2);
        assert_eq!(found.text, "Jane Doe");

        assert!(store.get_by_url("https://example.com/missing").unwrap().is_none());
    }

    #[test]
    fn test_same_url_replaces() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .append(&record("https://example.com/", 0, "old"))
            .unwrap();
        store
            .append(&record("https://example.com/", 0, "new"))
            .unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let found = store.get_by_url("https://example.com/").unwrap().unwrap();
        assert_eq!(found.text, "new");
    }
}
