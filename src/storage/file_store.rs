//! File-backed record store.
//!
//! Each record is a whole page: a [`PageHeader`](super::page::PageHeader)
//! with a CRC32 and the payload length, then the node bytes. A record must
//! fit in one page; larger nodes are rejected with `RecordTooLarge` before
//! anything is written.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, RecordId, Result};
use crate::storage::page::Page;

use super::RecordStore;

/// Stores one record per page in a single file.
///
/// # File Layout
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────┬──────────┐
/// │ Page 0   │ Page 1   │ Page 2   │  ...    │ Page N   │
/// │ record 1 │ record 2 │ record 3 │         │ rec N+1  │
/// └──────────┴──────────┴──────────┴─────────┴──────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Record id `N + 1` lives in page `N`, at file offset `N × PAGE_SIZE`, so
/// id 0 stays free for "no link". Every page is CRC-checked on fetch.
///
/// # Thread Safety
/// The file handle sits behind a mutex; fetches and writes from many
/// threads are serialized on it. The mutex is held for the whole seek and
/// read (or seek, write and sync), so:
/// - a fetch sees a page either entirely before or entirely after a
///   concurrent `update`, never half of each
/// - the CRC is verified after the lock is released, on a private copy
///
/// Tree lookups rely on the first point: a node rewritten by a split is
/// replaced in one step, and its new right sibling was already written by
/// an earlier `put`.
///
/// # Durability
/// All writes are followed by `fsync()`. There is no free list: updates
/// overwrite in place and ids are never reused.
///
/// A crash during an overwrite can leave a torn page. It is reported as a
/// checksum error on the next fetch of that record, not repaired.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    file: File,
    /// Number of pages in the file.
    page_count: u64,
}

impl Inner {
    fn page_index(&self, recid: RecordId) -> Result<u64> {
        match recid.0.checked_sub(1) {
            Some(index) if index < self.page_count => Ok(index),
            _ => Err(Error::RecordNotFound(recid)),
        }
    }

    fn read_page(&mut self, index: u64) -> Result<Box<Page>> {
        self.file.seek(SeekFrom::Start(index * PAGE_SIZE as u64))?;
        let mut page = Box::new(Page::new());
        self.file.read_exact(page.as_mut_slice())?;
        Ok(page)
    }

    fn write_page(&mut self, index: u64, page: &Page) -> Result<()> {
        self.file.seek(SeekFrom::Start(index * PAGE_SIZE as u64))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl FileStore {
    /// Create a new store file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        tracing::debug!(path = %path.as_ref().display(), "created record file");
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            inner: Mutex::new(Inner {
                file,
                page_count: 0,
            }),
        })
    }

    /// Open an existing store file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or its
    /// size is not a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(Error::corruption(format!(
                "record file is {} bytes, not a multiple of {}",
                file_size, PAGE_SIZE
            )));
        }
        let page_count = file_size / PAGE_SIZE as u64;

        tracing::debug!(path = %path.as_ref().display(), page_count, "opened record file");
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            inner: Mutex::new(Inner { file, page_count }),
        })
    }

    /// Open an existing store file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records stored.
    #[inline]
    pub fn record_count(&self) -> u64 {
        self.inner.lock().page_count
    }

    /// Total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.record_count() * PAGE_SIZE as u64
    }
}

impl RecordStore for FileStore {
    fn fetch(&self, recid: RecordId) -> Result<Arc<[u8]>> {
        let page = {
            let mut inner = self.inner.lock();
            let index = inner.page_index(recid)?;
            inner.read_page(index)?
        };
        let record = page.record().map_err(|e| e.at_record(recid))?;
        Ok(Arc::from(record))
    }

    fn put(&self, bytes: &[u8]) -> Result<RecordId> {
        let page = Page::with_record(bytes)?;
        let mut inner = self.inner.lock();
        let index = inner.page_count;
        inner.write_page(index, &page)?;
        inner.page_count += 1;
        Ok(RecordId(index + 1))
    }

    /// Overwrite the page of an existing record.
    fn update(&self, recid: RecordId, bytes: &[u8]) -> Result<()> {
        let page = Page::with_record(bytes)?;
        let mut inner = self.inner.lock();
        let index = inner.page_index(recid)?;
        inner.write_page(index, &page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let store = FileStore::create(&path).unwrap();
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.file_size(), 0);
        assert_eq!(store.path(), path.as_path());
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        FileStore::create(&path).unwrap();
        assert!(FileStore::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        assert!(FileStore::open(dir.path().join("nonexistent.db")).is_err());
    }

    #[test]
    fn test_put_and_fetch() {
        let dir = tempdir().unwrap();
        let store = FileStore::create(dir.path().join("test.db")).unwrap();

        let first = store.put(b"first").unwrap();
        let second = store.put(b"second").unwrap();
        assert_eq!(first, RecordId(1));
        assert_eq!(second, RecordId(2));
        assert_eq!(&*store.fetch(first).unwrap(), b"first");
        assert_eq!(&*store.fetch(second).unwrap(), b"second");
        assert_eq!(store.file_size(), 2 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_update() {
        let dir = tempdir().unwrap();
        let store = FileStore::create(dir.path().join("test.db")).unwrap();

        let id = store.put(b"v1").unwrap();
        store.update(id, b"version two").unwrap();
        assert_eq!(&*store.fetch(id).unwrap(), b"version two");
        assert_eq!(store.record_count(), 1);
    }

    #[test]
    fn test_missing_records() {
        let dir = tempdir().unwrap();
        let store = FileStore::create(dir.path().join("test.db")).unwrap();
        store.put(b"only").unwrap();

        assert!(matches!(store.fetch(RecordId::NONE), Err(Error::RecordNotFound(_))));
        assert!(matches!(store.fetch(RecordId(2)), Err(Error::RecordNotFound(_))));
        assert!(matches!(store.update(RecordId(2), b"x"), Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn test_record_too_large() {
        let dir = tempdir().unwrap();
        let store = FileStore::create(dir.path().join("test.db")).unwrap();

        let big = vec![0u8; PAGE_SIZE];
        assert!(matches!(store.put(&big), Err(Error::RecordTooLarge { .. })));
        assert_eq!(store.record_count(), 0);
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let store = FileStore::open_or_create(&path).unwrap();
            assert_eq!(store.record_count(), 0);
            store.put(b"kept").unwrap();
        }

        {
            let store = FileStore::open_or_create(&path).unwrap();
            assert_eq!(store.record_count(), 1);
            assert_eq!(&*store.fetch(RecordId(1)).unwrap(), b"kept");
        }
    }

    #[test]
    fn test_open_rejects_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        std::fs::write(&path, [0u8; 100]).unwrap();
        assert!(FileStore::open(&path).unwrap_err().is_corruption());
    }
}
