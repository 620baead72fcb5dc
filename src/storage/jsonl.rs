//! Newline-delimited JSON page store

use crate::storage::{PageRecord, PageStore, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Appends page records to a JSONL file, one JSON object per line
///
/// The file is opened in append mode and each record is flushed as it is
/// written, so an interrupted crawl leaves every completed fetch on disk.
pub struct JsonlStore {
    path: PathBuf,
    file: File,
}

impl JsonlStore {
    /// Opens (or creates) a JSONL store at the given path
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the output file
    ///
    /// # Returns
    ///
    /// * `Ok(JsonlStore)` - Store ready for appends
    /// * `Err(StorageError)` - Failed to create directories or open the file
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Returns the path this store writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all records back from the file
    ///
    /// Blank lines are skipped. Used by callers that post-process a finished
    /// crawl and by tests.
    pub fn read_all(&self) -> StorageResult<Vec<PageRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }

        Ok(records)
    }
}

impl PageStore for JsonlStore {
    fn append(&mut self, record: &PageRecord) -> StorageResult<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.flush()?;
        Ok(())
    }

    fn count(&self) -> StorageResult<u64> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut count = 0;
        for line in reader.lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(url: &str, depth: u32) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            depth,
            title: "Title".to_string(),
            text: "text".to_string(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.jsonl");

        let mut store = JsonlStore::open(&path).unwrap();
        store.append(&record("https://example.com/", 0)).unwrap();
        store.append(&record("https://example.com/a", 1)).unwrap();

        let records = store.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].url, "https://example.com/");
        assert_eq!(records[1].depth, 1);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/pages.jsonl");

        let mut store = JsonlStore::open(&path).unwrap();
        store.append(&record("https://example.com/", 0)).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.jsonl");

        {
            let mut store = JsonlStore::open(&path).unwrap();
            store.append(&record("https://example.com/", 0)).unwrap();
        }

        let mut store = JsonlStore::open(&path).unwrap();
        store.append(&record("https://example.com/b", 1)).unwrap();

        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_empty_file_counts_zero() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pages.jsonl");

        let store = JsonlStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
