//! Storage layer - record stores and page formats.
//!
//! This module handles where node bytes live:
//! - [`RecordStore`] - The fetch/put/update interface the tree reads through
//! - [`MemoryStore`] - Hash map store for tests and embedding
//! - [`FileStore`] - One CRC-checked page per record in a single file
//! - [`page`] - Page types and layouts

mod file_store;
mod memory_store;
pub mod page;
mod record_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use record_store::RecordStore;
