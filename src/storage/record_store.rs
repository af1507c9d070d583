//! The record store interface consumed by the tree.

use std::sync::Arc;

use crate::common::{RecordId, Result};

/// Byte storage addressed by [`RecordId`].
///
/// Lookups only call [`fetch`](RecordStore::fetch). `put` and `update` are
/// used by whatever builds and splits nodes; a split must write the new
/// right sibling first, then the shrunk node pointing at it, then the
/// parent, so that a concurrent reader can always finish by following
/// right links.
///
/// Implementations take `&self` and do their own locking, so one store can
/// serve any number of reader threads.
pub trait RecordStore {
    /// The exact bytes last stored under `recid`.
    ///
    /// # Errors
    /// `Error::RecordNotFound` if nothing was ever stored there.
    fn fetch(&self, recid: RecordId) -> Result<Arc<[u8]>>;

    /// Store `bytes` under a fresh id.
    fn put(&self, bytes: &[u8]) -> Result<RecordId>;

    /// Replace the bytes stored under an existing `recid`.
    fn update(&self, recid: RecordId, bytes: &[u8]) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn fetch(&self, recid: RecordId) -> Result<Arc<[u8]>> {
        (**self).fetch(recid)
    }

    fn put(&self, bytes: &[u8]) -> Result<RecordId> {
        (**self).put(bytes)
    }

    fn update(&self, recid: RecordId, bytes: &[u8]) -> Result<()> {
        (**self).update(recid, bytes)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn fetch(&self, recid: RecordId) -> Result<Arc<[u8]>> {
        (**self).fetch(recid)
    }

    fn put(&self, bytes: &[u8]) -> Result<RecordId> {
        (**self).put(bytes)
    }

    fn update(&self, recid: RecordId, bytes: &[u8]) -> Result<()> {
        (**self).update(recid, bytes)
    }
}
