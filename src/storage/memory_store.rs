//! In-memory record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{Error, RecordId, Result};

use super::RecordStore;

/// A [`RecordStore`] backed by a hash map.
///
/// Ids are handed out from 1 upwards and never reused. Fetches share the
/// stored bytes through an `Arc`, so a reader keeps the version it fetched
/// even if a writer replaces it afterwards.
#[derive(Debug)]
pub struct MemoryStore {
    records: RwLock<HashMap<RecordId, Arc<[u8]>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Overwrite stored bytes in place. Used to simulate media corruption.
    pub fn corrupt<F: FnOnce(&mut Vec<u8>)>(&self, recid: RecordId, f: F) -> Result<()> {
        let mut records = self.records.write();
        let slot = records.get_mut(&recid).ok_or(Error::RecordNotFound(recid))?;
        let mut bytes = slot.to_vec();
        f(&mut bytes);
        *slot = Arc::from(bytes);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn fetch(&self, recid: RecordId) -> Result<Arc<[u8]>> {
        self.records
            .read()
            .get(&recid)
            .cloned()
            .ok_or(Error::RecordNotFound(recid))
    }

    fn put(&self, bytes: &[u8]) -> Result<RecordId> {
        let recid = RecordId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if !recid.is_valid() {
            return Err(Error::Encode(format!("record id space exhausted at {}", recid)));
        }
        self.records.write().insert(recid, Arc::from(bytes));
        Ok(recid)
    }

    fn update(&self, recid: RecordId, bytes: &[u8]) -> Result<()> {
        let mut records = self.records.write();
        let slot = records.get_mut(&recid).ok_or(Error::RecordNotFound(recid))?;
        *slot = Arc::from(bytes);
        Ok(())
    }
}
