//! B-link tree index.
//!
//! # Components
//! - [`Node`] / [`NodeFlags`] - immutable node model and its size invariants
//! - [`NodeSerializer`] - bit-exact binary node format with parity checks
//! - [`Step`] - the outcome of searching one node
//! - [`BLinkTree`] - lookups that walk right links instead of locking
//! - [`SearchStats`] - lookup counters
//!
//! # Lookup paths
//! ```text
//!            fetch(recid)
//!                 │
//!        ┌────────┴─────────┐
//!        ▼                  ▼
//!   deserialize        binary_step
//!   Node::step      (search in place)
//!        │                  │
//!        └──── Step ────────┘
//!   Child → descend   Link → move right   Absent / Found → done
//! ```
//! [`BLinkTree::descend`] decodes whole nodes; [`BLinkTree::get_binary`]
//! decodes only the header, the keys it compares and the entry it selects.
//! Both resolve search positions with the same arithmetic.

mod binary_get;
mod node;
mod node_codec;
mod search;
mod stats;
mod tree;

pub use node::{Node, NodeEntries, NodeFlags};
pub use node_codec::{NodeHeader, NodeSerializer};
pub use search::Step;
pub use stats::{SearchStats, StatsSnapshot};
pub use tree::BLinkTree;
