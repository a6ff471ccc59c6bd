//! services/api/src/adapters/csv_store.rs
//!
//! This module contains the flat-file adapter, the concrete implementation of
//! the `RecordStore` port from the `core` crate. Each partition is one CSV file
//! with a `Book Name,Author,Publication Year` header row.
//!
//! Writers to the same partition are serialised by a per-partition mutex, and a
//! delete rewrites the file through a sibling temp file and an atomic rename.
//! Nothing coordinates separate processes sharing the same directory.

use async_trait::async_trait;
use book_catalog_core::domain::{normalize_name, BookRecord, Partition};
use book_catalog_core::ports::{PortError, PortResult, RecordStore};
use chrono::{Datelike, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Header row written at the top of every partition file.
pub const HEADER: [&str; 3] = ["Book Name", "Author", "Publication Year"];

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A storage adapter that implements the `RecordStore` port on CSV files.
pub struct CsvRecordStore {
    dir: PathBuf,
    locks: [Mutex<()>; 2],
}

impl CsvRecordStore {
    /// Creates a new `CsvRecordStore` rooted at `dir`. Files are created lazily.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: [Mutex::new(()), Mutex::new(())],
        }
    }

    pub fn file_name(partition: Partition) -> &'static str {
        match partition {
            Partition::Regular => "regularUser.csv",
            Partition::Admin => "adminUser.csv",
        }
    }

    pub fn path_for(&self, partition: Partition) -> PathBuf {
        self.dir.join(Self::file_name(partition))
    }

    fn lock(&self, partition: Partition) -> &Mutex<()> {
        &self.locks[partition.index()]
    }
}

//=========================================================================================
// `RecordStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecordStore for CsvRecordStore {
    async fn list(&self, partition: Partition) -> PortResult<Vec<BookRecord>> {
        let _guard = self.lock(partition).lock().await;
        let path = self.path_for(partition);

        let rows = blocking(move || read_rows(&path)).await?;
        let books = rows
            .iter()
            .enumerate()
            // Row 1 is the header.
            .map(|(i, row)| parse_row(row, i + 2))
            .collect::<PortResult<Vec<_>>>()?;

        debug!("Read {} books from the {} partition", books.len(), partition);
        Ok(books)
    }

    async fn append(&self, partition: Partition, record: &BookRecord) -> PortResult<()> {
        record.validate(Utc::now().year())?;

        let _guard = self.lock(partition).lock().await;
        let dir = self.dir.clone();
        let path = self.path_for(partition);
        let record = record.clone();

        blocking(move || append_row(&dir, &path, &record)).await
    }

    async fn delete(&self, partition: Partition, name: &str) -> PortResult<usize> {
        let _guard = self.lock(partition).lock().await;
        let path = self.path_for(partition);
        let target = normalize_name(name);

        let removed = blocking(move || {
            let rows = read_rows(&path)?;
            let before = rows.len();
            let kept: Vec<StringRecord> = rows
                .into_iter()
                .filter(|row| normalize_name(row.get(0).unwrap_or("")) != target)
                .collect();
            let removed = before - kept.len();
            if removed > 0 {
                rewrite(&path, &kept)?;
            }
            Ok(removed)
        })
        .await?;

        if removed == 0 {
            return Err(PortError::NotFound(format!("Book '{}' not found", name)));
        }
        debug!("Removed {} rows named '{}' from the {} partition", removed, name, partition);
        Ok(removed)
    }
}

//=========================================================================================
// Blocking File Helpers
//=========================================================================================

/// Runs file I/O on the blocking pool.
async fn blocking<T, F>(work: F) -> PortResult<T>
where
    F: FnOnce() -> PortResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PortError::Unexpected(format!("storage task failed: {}", e)))?
}

fn storage_error(path: &Path, err: impl std::fmt::Display) -> PortError {
    error!("Storage failure on {}: {}", path.display(), err);
    PortError::Unexpected(format!("storage failure on {}: {}", path.display(), err))
}

/// Reads all data rows. A missing file is an empty partition.
fn read_rows(path: &Path) -> PortResult<Vec<StringRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(storage_error(path, e)),
    };

    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file)
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| storage_error(path, e))
}

/// Converts one stored row. Columns past the third are ignored.
fn parse_row(row: &StringRecord, line: usize) -> PortResult<BookRecord> {
    match (row.get(0), row.get(1), row.get(2)) {
        (Some(name), Some(author), Some(year)) => {
            let publication_year = year.parse::<i32>().map_err(|_| {
                PortError::Unexpected(format!(
                    "row {}: publication year '{}' is not a number",
                    line, year
                ))
            })?;
            Ok(BookRecord::new(name, author, publication_year))
        }
        _ => Err(PortError::Unexpected(format!(
            "row {}: expected 3 columns, found {}",
            line,
            row.len()
        ))),
    }
}

fn append_row(dir: &Path, path: &Path, record: &BookRecord) -> PortResult<()> {
    fs::create_dir_all(dir).map_err(|e| storage_error(dir, e))?;
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| storage_error(path, e))?;
    let len = file.metadata().map_err(|e| storage_error(path, e))?.len();
    let needs_header = len == 0;
    // A hand-edited file may lack its final newline; the new row must not join the last one.
    if len > 0 && !ends_with_newline(&mut file).map_err(|e| storage_error(path, e))? {
        file.write_all(b"\n").map_err(|e| storage_error(path, e))?;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if needs_header {
        writer.write_record(HEADER).map_err(|e| storage_error(path, e))?;
    }
    // Reads trim every field, so store exactly what will be read back.
    let year = record.publication_year.to_string();
    writer
        .write_record([record.name.trim(), record.author.trim(), year.as_str()])
        .map_err(|e| storage_error(path, e))?;
    writer.flush().map_err(|e| storage_error(path, e))
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Replaces the partition with the header plus `rows`, via temp file and rename.
fn rewrite(path: &Path, rows: &[StringRecord]) -> PortResult<()> {
    let tmp_path = path.with_extension("csv.tmp");
    let file = File::create(&tmp_path).map_err(|e| storage_error(&tmp_path, e))?;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(HEADER).map_err(|e| storage_error(&tmp_path, e))?;
    for row in rows {
        writer.write_record(row).map_err(|e| storage_error(&tmp_path, e))?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| storage_error(&tmp_path, e.error()))?;
    file.sync_all().map_err(|e| storage_error(&tmp_path, e))?;

    fs::rename(&tmp_path, path).map_err(|e| storage_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_missing_partition_is_empty() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        assert!(store.list(Partition::Admin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_file_with_header() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path().join("nested"));

        store
            .append(Partition::Regular, &BookRecord::new("Dune", "Frank Herbert", 1965))
            .await
            .unwrap();
        store
            .append(Partition::Regular, &BookRecord::new("Emma", "Jane Austen", 1815))
            .await
            .unwrap();

        let contents = fs::read_to_string(store.path_for(Partition::Regular)).unwrap();
        assert_eq!(
            contents,
            "Book Name,Author,Publication Year\nDune,Frank Herbert,1965\nEmma,Jane Austen,1815\n"
        );
        assert_eq!(names(&store.list(Partition::Regular).await.unwrap()), vec!["Dune", "Emma"]);
    }

    #[tokio::test]
    async fn test_fields_with_commas_survive() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        let book = BookRecord::new("War, and Peace", "Leo Tolstoy", 1869);

        store.append(Partition::Regular, &book).await.unwrap();
        assert_eq!(store.list(Partition::Regular).await.unwrap(), vec![book]);
    }

    #[tokio::test]
    async fn test_invalid_record_never_written() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());

        let result = store
            .append(Partition::Regular, &BookRecord::new("Old", "Scribe", 999))
            .await;
        assert!(matches!(result, Err(PortError::Invalid(_))));
        assert!(!store.path_for(Partition::Regular).exists());
    }

    #[tokio::test]
    async fn test_reads_hand_written_files() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        fs::write(
            store.path_for(Partition::Admin),
            "Book Name, Author, Publication Year\nUlysses, James Joyce, 1922, extra\n",
        )
        .unwrap();

        let books = store.list(Partition::Admin).await.unwrap();
        assert_eq!(books, vec![BookRecord::new("Ulysses", "James Joyce", 1922)]);
    }

    #[tokio::test]
    async fn test_malformed_year_is_an_error() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        fs::write(
            store.path_for(Partition::Regular),
            "Book Name,Author,Publication Year\nDune,Frank Herbert,soon\n",
        )
        .unwrap();

        match store.list(Partition::Regular).await {
            Err(PortError::Unexpected(msg)) => assert!(msg.contains("row 2")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_removes_all_matches_in_order() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        for (name, year) in [("Dune", 1965), ("Emma", 1815), ("DUNE", 1984), ("Beloved", 1987)] {
            store
                .append(Partition::Regular, &BookRecord::new(name, "Someone", year))
                .await
                .unwrap();
        }

        assert_eq!(store.delete(Partition::Regular, "dune").await.unwrap(), 2);
        assert_eq!(
            names(&store.list(Partition::Regular).await.unwrap()),
            vec!["Emma", "Beloved"]
        );
        assert!(!store.path_for(Partition::Regular).with_extension("csv.tmp").exists());

        let contents = fs::read_to_string(store.path_for(Partition::Regular)).unwrap();
        assert!(contents.starts_with("Book Name,Author,Publication Year\n"));
    }

    #[tokio::test]
    async fn test_delete_without_match_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        store
            .append(Partition::Regular, &BookRecord::new("Emma", "Jane Austen", 1815))
            .await
            .unwrap();
        let before = fs::read_to_string(store.path_for(Partition::Regular)).unwrap();

        let result = store.delete(Partition::Regular, "Dune").await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
        assert_eq!(fs::read_to_string(store.path_for(Partition::Regular)).unwrap(), before);

        let missing = store.delete(Partition::Admin, "Dune").await;
        assert!(matches!(missing, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_append_after_missing_trailing_newline() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        fs::write(
            store.path_for(Partition::Admin),
            "Book Name,Author,Publication Year\nUlysses,James Joyce,1922",
        )
        .unwrap();

        store
            .append(Partition::Admin, &BookRecord::new("Dune", "Frank Herbert", 1965))
            .await
            .unwrap();

        assert_eq!(
            store.list(Partition::Admin).await.unwrap(),
            vec![
                BookRecord::new("Ulysses", "James Joyce", 1922),
                BookRecord::new("Dune", "Frank Herbert", 1965),
            ]
        );
        let contents = fs::read_to_string(store.path_for(Partition::Admin)).unwrap();
        assert!(contents.ends_with("Ulysses,James Joyce,1922\nDune,Frank Herbert,1965\n"));
    }

    #[tokio::test]
    async fn test_padded_name_is_stored_trimmed() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());

        store
            .append(Partition::Regular, &BookRecord::new("  Dune ", " Frank Herbert", 1965))
            .await
            .unwrap();
        assert_eq!(
            store.list(Partition::Regular).await.unwrap(),
            vec![BookRecord::new("Dune", "Frank Herbert", 1965)]
        );

        assert_eq!(store.delete(Partition::Regular, "  Dune ").await.unwrap(), 1);
        assert!(store.list(Partition::Regular).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());

        let result = store
            .append(Partition::Regular, &BookRecord::new("   ", "Someone", 1999))
            .await;
        assert!(matches!(result, Err(PortError::Invalid(_))));
        assert!(!store.path_for(Partition::Regular).exists());
    }

    #[tokio::test]
    async fn test_partitions_are_separate_files() {
        let dir = tempdir().unwrap();
        let store = CsvRecordStore::new(dir.path());
        store
            .append(Partition::Admin, &BookRecord::new("Ulysses", "James Joyce", 1922))
            .await
            .unwrap();

        assert!(store.list(Partition::Regular).await.unwrap().is_empty());
        assert!(dir.path().join("adminUser.csv").exists());
    }
}
