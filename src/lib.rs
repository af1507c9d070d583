//! blinkdb - lock-free B-link tree lookups over a record store.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            blinkdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   BLinkTree: descend (materialized) | get_binary (fast)  │   │
//! │  │        Node + NodeFlags → NodeSerializer → Step          │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Codecs (serializer/, encoding/)             │   │
//! │  │   U64 | DeltaU64 | Bytes | String | Prefix tuples        │   │
//! │  │   varint + parity, ByteWriter / ByteReader               │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │     RecordStore: MemoryStore | FileStore (CRC pages)     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (RecordId, Error, config)
//! - [`encoding`] - Packed integers, parity bits, byte cursors
//! - [`serializer`] - Key and value codecs
//! - [`index`] - The B-link tree
//! - [`storage`] - Record stores and page formats
//!
//! # Quick Start
//! ```
//! use blinkdb::index::btree::{BLinkTree, Node, NodeFlags, NodeSerializer};
//! use blinkdb::serializer::U64Serializer;
//! use blinkdb::storage::MemoryStore;
//! use blinkdb::RecordId;
//!
//! let tree = BLinkTree::new(MemoryStore::new(), NodeSerializer::new(U64Serializer, U64Serializer));
//!
//! // Two leaves: (-inf, 3] links to (3, +inf).
//! let right = Node::leaf(NodeFlags::empty().with_right_edge(), RecordId::NONE, vec![3, 5, 7], vec![50, 70]).unwrap();
//! let right_id = tree.put_node(&right).unwrap();
//! let flags = NodeFlags::empty().with_left_edge().with_last_key_duplicated();
//! let left = Node::leaf(flags, right_id, vec![1, 3], vec![10, 30]).unwrap();
//! let left_id = tree.put_node(&left).unwrap();
//!
//! assert_eq!(tree.descend(left_id, &5).unwrap(), Some(50));
//! assert_eq!(tree.get_binary(left_id, &9).unwrap(), None);
//! ```

pub mod common;
pub mod encoding;
pub mod index;
pub mod serializer;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, RecordId, Result, SearchOptions, StrictMode};

pub use index::btree::{BLinkTree, Node, NodeFlags, NodeSerializer, SearchStats, StatsSnapshot, Step};
pub use storage::{FileStore, MemoryStore, RecordStore};
