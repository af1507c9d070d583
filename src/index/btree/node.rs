//! B-link tree node model.
//!
//! A [`Node`] is either a directory (internal) node whose entries are child
//! record ids, or a leaf whose entries are stored values. Every node carries
//! a right link to its sibling at the same level.
//!
//! # Key layout
//! ```text
//!            low bound        data / separator keys         high bound
//! keys:  [ k0 (unless LEFT) | k1 ... k(L-2)             | k(L-1) (unless RIGHT) ]
//! ```
//! A node covers the key range `(low, high]`. The leftmost node at a level
//! has no stored low bound (it is -inf) and the rightmost has no stored high
//! bound (+inf). A leaf whose high bound equals its last data key stores that
//! key once and sets `LAST_KEY_DUPLICATED`.
//!
//! # Size invariants
//! With `L` keys and `e_l`, `e_r`, `d` the LEFT, RIGHT and LAST_KEY_DUPLICATED
//! flags as 0/1:
//! - directory: `children = L - 1 + e_l + e_r`
//! - leaf: `values = L - 2 + e_l + e_r + d`
//!
//! Nodes are immutable once built; a structural change produces a new node
//! that is written under a new or overwritten record id.

use std::fmt;

use crate::common::{Error, RecordId, Result};

/// The 4-bit node flag field.
///
/// ```text
/// bit 3     bit 2      bit 1       bit 0
/// DIRECTORY LEFT_EDGE  RIGHT_EDGE  LAST_KEY_DUPLICATED
/// ```
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const LAST_KEY_DUPLICATED: u8 = 1;
    pub const RIGHT_EDGE: u8 = 1 << 1;
    pub const LEFT_EDGE: u8 = 1 << 2;
    pub const DIRECTORY: u8 = 1 << 3;
    pub const MASK: u8 = 0x0F;

    /// A leaf in the middle of its level.
    #[inline]
    pub const fn empty() -> Self {
        NodeFlags(0)
    }

    /// Flags from raw bits; `None` if anything above bit 3 is set.
    #[inline]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::MASK != 0 {
            None
        } else {
            Some(NodeFlags(bits))
        }
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn with_directory(self) -> Self {
        NodeFlags(self.0 | Self::DIRECTORY)
    }

    #[inline]
    pub const fn with_left_edge(self) -> Self {
        NodeFlags(self.0 | Self::LEFT_EDGE)
    }

    #[inline]
    pub const fn with_right_edge(self) -> Self {
        NodeFlags(self.0 | Self::RIGHT_EDGE)
    }

    #[inline]
    pub const fn with_last_key_duplicated(self) -> Self {
        NodeFlags(self.0 | Self::LAST_KEY_DUPLICATED)
    }

    #[inline]
    pub const fn is_directory(self) -> bool {
        self.0 & Self::DIRECTORY != 0
    }

    #[inline]
    pub const fn is_left_edge(self) -> bool {
        self.0 & Self::LEFT_EDGE != 0
    }

    #[inline]
    pub const fn is_right_edge(self) -> bool {
        self.0 & Self::RIGHT_EDGE != 0
    }

    #[inline]
    pub const fn is_last_key_duplicated(self) -> bool {
        self.0 & Self::LAST_KEY_DUPLICATED != 0
    }

    #[inline]
    pub(crate) const fn left(self) -> usize {
        self.is_left_edge() as usize
    }

    #[inline]
    pub(crate) const fn right(self) -> usize {
        self.is_right_edge() as usize
    }

    /// Number of children (directory) or values (leaf) a node with these
    /// flags and `key_count` keys must hold, or `None` if the formula goes
    /// negative.
    pub fn entry_count(self, key_count: usize) -> Option<usize> {
        let base = key_count + self.left() + self.right();
        if self.is_directory() {
            base.checked_sub(1)
        } else {
            (base + self.is_last_key_duplicated() as usize).checked_sub(2)
        }
    }
}

impl fmt::Debug for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.is_directory() {
            names.push("DIRECTORY");
        }
        if self.is_left_edge() {
            names.push("LEFT_EDGE");
        }
        if self.is_right_edge() {
            names.push("RIGHT_EDGE");
        }
        if self.is_last_key_duplicated() {
            names.push("LAST_KEY_DUPLICATED");
        }
        write!(f, "NodeFlags({})", names.join(" | "))
    }
}

/// What a node points at: child record ids or stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEntries<V> {
    Children(Vec<RecordId>),
    Values(Vec<V>),
}

impl<V> NodeEntries<V> {
    pub fn len(&self) -> usize {
        match self {
            NodeEntries::Children(children) => children.len(),
            NodeEntries::Values(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One directory or leaf node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<K, V> {
    flags: NodeFlags,
    link: RecordId,
    keys: Vec<K>,
    entries: NodeEntries<V>,
}

impl<K, V> Node<K, V> {
    /// Build a node, checking every structural invariant.
    ///
    /// # Errors
    /// `Error::InvalidNode` when:
    /// - the DIRECTORY flag disagrees with the kind of `entries`
    /// - LAST_KEY_DUPLICATED is set on a directory
    /// - `link` is non-zero on a right edge, or zero elsewhere
    /// - a record id does not fit in 63 bits
    /// - the entry count breaks the size formula
    pub fn new(flags: NodeFlags, link: RecordId, keys: Vec<K>, entries: NodeEntries<V>) -> Result<Self> {
        let is_directory = matches!(entries, NodeEntries::Children(_));
        if flags.is_directory() != is_directory {
            return Err(Error::InvalidNode(format!(
                "{:?} does not match {} entries",
                flags,
                if is_directory { "child" } else { "value" }
            )));
        }
        if is_directory && flags.is_last_key_duplicated() {
            return Err(Error::InvalidNode(
                "LAST_KEY_DUPLICATED is leaf-only".to_string(),
            ));
        }
        if flags.is_right_edge() && !link.is_none() {
            return Err(Error::InvalidNode(format!(
                "right edge node must not link anywhere, found {}",
                link
            )));
        }
        if !flags.is_right_edge() && !link.is_valid() {
            return Err(Error::InvalidNode(format!(
                "node below the right edge needs a valid link, found {}",
                link
            )));
        }
        if let NodeEntries::Children(children) = &entries {
            if let Some(bad) = children.iter().find(|c| c.0 > RecordId::MAX.0) {
                return Err(Error::InvalidNode(format!("child {} is not encodable", bad)));
            }
        }
        match flags.entry_count(keys.len()) {
            Some(expected) if expected == entries.len() => {}
            expected => {
                return Err(Error::InvalidNode(format!(
                    "{:?} with {} keys needs {} entries, found {}",
                    flags,
                    keys.len(),
                    expected.map_or_else(|| "a negative number of".to_string(), |n| n.to_string()),
                    entries.len()
                )))
            }
        }

        Ok(Self {
            flags,
            link,
            keys,
            entries,
        })
    }

    /// Build a leaf. The DIRECTORY bit of `flags` must be clear.
    pub fn leaf(flags: NodeFlags, link: RecordId, keys: Vec<K>, values: Vec<V>) -> Result<Self> {
        Self::new(flags, link, keys, NodeEntries::Values(values))
    }

    /// Build a directory node. The DIRECTORY bit is added to `flags`.
    pub fn directory(
        flags: NodeFlags,
        link: RecordId,
        keys: Vec<K>,
        children: Vec<RecordId>,
    ) -> Result<Self> {
        Self::new(flags.with_directory(), link, keys, NodeEntries::Children(children))
    }

    #[inline]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Right sibling, or `RecordId::NONE` on a right edge.
    #[inline]
    pub fn link(&self) -> RecordId {
        self.link
    }

    #[inline]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    #[inline]
    pub fn entries(&self) -> &NodeEntries<V> {
        &self.entries
    }

    pub fn children(&self) -> Option<&[RecordId]> {
        match &self.entries {
            NodeEntries::Children(children) => Some(children),
            NodeEntries::Values(_) => None,
        }
    }

    pub fn values(&self) -> Option<&[V]> {
        match &self.entries {
            NodeEntries::Values(values) => Some(values),
            NodeEntries::Children(_) => None,
        }
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        self.flags.is_directory()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        !self.flags.is_directory()
    }

    #[inline]
    pub fn is_left_edge(&self) -> bool {
        self.flags.is_left_edge()
    }

    #[inline]
    pub fn is_right_edge(&self) -> bool {
        self.flags.is_right_edge()
    }

    #[inline]
    pub fn is_last_key_duplicated(&self) -> bool {
        self.flags.is_last_key_duplicated()
    }

    /// Consume the node, returning `(flags, link, keys, entries)`.
    pub fn into_parts(self) -> (NodeFlags, RecordId, Vec<K>, NodeEntries<V>) {
        (self.flags, self.link, self.keys, self.entries)
    }
}
