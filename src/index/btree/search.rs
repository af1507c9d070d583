//! Single-node search step.
//!
//! A lookup is a sequence of steps, one per fetched node. Each step binary
//! searches the node's keys and turns the search position into one of four
//! outcomes ([`Step`]). The arithmetic that maps a position to an outcome
//! lives in [`resolve_directory`] and [`resolve_leaf`] and is shared by the
//! materialized path ([`Node::step`]) and the serialized fast path
//! ([`NodeSerializer::binary_step`](super::NodeSerializer::binary_step)).
//!
//! # Directory routing
//! ```text
//! keys:      [ low ]  k1      k2    ...   [ high ]
//! children:       c0      c1      c2 ...
//! ```
//! A key equal to a separator belongs to the child on its left, since every
//! node covers `(low, high]`. Running past the last child means a split
//! moved part of this node's range to its right sibling.

use crate::common::{Error, RecordId, Result};
use crate::serializer::{KeySerializer, SearchPosition};

use super::node::{Node, NodeEntries, NodeFlags};

/// Outcome of searching one node for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<V> {
    /// Descend into this child (directory nodes only).
    Child(RecordId),
    /// The key lies beyond this node's high bound; retry at the right sibling.
    Link(RecordId),
    /// The key is not stored in the tree.
    Absent,
    /// The key's value.
    Found(V),
}

impl<V> Step<V> {
    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Step<U> {
        match self {
            Step::Child(recid) => Step::Child(recid),
            Step::Link(recid) => Step::Link(recid),
            Step::Absent => Step::Absent,
            Step::Found(value) => Step::Found(f(value)),
        }
    }

    /// The next node to fetch, if this step continues the walk.
    pub fn next_record(&self) -> Option<RecordId> {
        match self {
            Step::Child(recid) | Step::Link(recid) => Some(*recid),
            Step::Absent | Step::Found(_) => None,
        }
    }
}

impl<V: Clone> Step<&V> {
    pub fn cloned(self) -> Step<V> {
        self.map(V::clone)
    }
}

/// Position-level outcome before entries are looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    /// Index into the node's children or values.
    Entry(usize),
    Link,
    Absent,
}

/// Map a key search position in a directory node to a child index.
///
/// # Errors
/// `Corruption` if the search runs off the end of a right-edge directory,
/// which can only happen when it has no children.
pub(crate) fn resolve_directory(
    flags: NodeFlags,
    child_count: usize,
    position: SearchPosition,
) -> Result<Route> {
    let j = match position {
        Ok(found) => found,
        Err(insert) => insert,
    };
    let index = (j + flags.left()).saturating_sub(1);
    if index < child_count {
        Ok(Route::Entry(index))
    } else if !flags.is_right_edge() {
        Ok(Route::Link)
    } else {
        Err(Error::corruption(format!(
            "right edge directory routes to child {} of {}",
            index, child_count
        )))
    }
}

/// Map a key search position in a leaf to a value index.
///
/// The first key of a non-left-edge leaf is the low bound, and the last key
/// of a non-right-edge leaf is the high bound; neither has a value unless the
/// high bound is flagged as a duplicated data key.
pub(crate) fn resolve_leaf(
    flags: NodeFlags,
    key_count: usize,
    value_count: usize,
    position: SearchPosition,
) -> Route {
    match position {
        Ok(0) if !flags.is_left_edge() => Route::Absent,
        Ok(p) if p + 1 == key_count
            && !flags.is_right_edge()
            && !flags.is_last_key_duplicated() =>
        {
            Route::Absent
        }
        Ok(p) => {
            let index = p + flags.left() - 1;
            if index < value_count {
                Route::Entry(index)
            } else {
                Route::Absent
            }
        }
        Err(insert) if insert == key_count && !flags.is_right_edge() => Route::Link,
        Err(_) => Route::Absent,
    }
}

impl<K, V> Node<K, V> {
    /// Search this node for `key`.
    ///
    /// ```
    /// use blinkdb::index::btree::{Node, NodeFlags, Step};
    /// use blinkdb::serializer::U64Serializer;
    /// use blinkdb::RecordId;
    ///
    /// // Holds 1 and 3; keys above 3 now live in record 2.
    /// let flags = NodeFlags::empty().with_left_edge().with_last_key_duplicated();
    /// let leaf = Node::leaf(flags, RecordId(2), vec![1u64, 3], vec!["a", "b"]).unwrap();
    ///
    /// assert_eq!(leaf.step(&U64Serializer, &3).unwrap(), Step::Found(&"b"));
    /// assert_eq!(leaf.step(&U64Serializer, &2).unwrap(), Step::Absent);
    /// assert_eq!(leaf.step(&U64Serializer, &5).unwrap(), Step::Link(RecordId(2)));
    /// ```
    pub fn step<KS>(&self, key_serializer: &KS, key: &K) -> Result<Step<&V>>
    where
        KS: KeySerializer<Item = K> + ?Sized,
    {
        let position = key_serializer.binary_search(self.keys(), key);
        match self.entries() {
            NodeEntries::Children(children) => {
                Ok(match resolve_directory(self.flags(), children.len(), position)? {
                    Route::Entry(index) => Step::Child(children[index]),
                    Route::Link => Step::Link(self.link()),
                    Route::Absent => Step::Absent,
                })
            }
            NodeEntries::Values(values) => {
                Ok(match resolve_leaf(self.flags(), self.keys().len(), values.len(), position) {
                    Route::Entry(index) => Step::Found(&values[index]),
                    Route::Link => Step::Link(self.link()),
                    Route::Absent => Step::Absent,
                })
            }
        }
    }
}
