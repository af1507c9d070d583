//! Lock-free B-link tree lookups over a [`RecordStore`].

use crate::common::{Error, RecordId, Result, SearchOptions};
use crate::serializer::{GroupSerializer, KeySerializer};
use crate::storage::RecordStore;

use super::node::Node;
use super::node_codec::NodeSerializer;
use super::search::Step;
use super::stats::SearchStats;

/// A B-link tree read handle.
///
/// Holds no locks: each lookup fetches nodes one at a time and, when a
/// concurrent split has moved its key to a right sibling, follows the
/// sibling link. Lookups therefore see a correct answer as long as splits
/// write the new sibling, then the shrunk node, then the parent.
///
/// # Example
/// ```
/// use blinkdb::index::btree::{BLinkTree, Node, NodeFlags, NodeSerializer};
/// use blinkdb::serializer::{StringSerializer, U64Serializer};
/// use blinkdb::storage::MemoryStore;
/// use blinkdb::RecordId;
///
/// let tree = BLinkTree::new(
///     MemoryStore::new(),
///     NodeSerializer::new(U64Serializer, StringSerializer),
/// );
/// let root = NodeFlags::empty().with_left_edge().with_right_edge();
/// let leaf = Node::leaf(root, RecordId::NONE, vec![7], vec!["seven".to_string()]).unwrap();
/// let recid = tree.put_node(&leaf).unwrap();
///
/// assert_eq!(tree.descend(recid, &7).unwrap(), Some("seven".to_string()));
/// assert_eq!(tree.get_binary(recid, &8).unwrap(), None);
/// ```
#[derive(Debug)]
pub struct BLinkTree<S, KS, VS> {
    store: S,
    codec: NodeSerializer<KS, VS>,
    options: SearchOptions,
    stats: SearchStats,
}

impl<S, KS, VS> BLinkTree<S, KS, VS>
where
    S: RecordStore,
    KS: KeySerializer,
    VS: GroupSerializer,
    VS::Item: Clone,
{
    pub fn new(store: S, codec: NodeSerializer<KS, VS>) -> Self {
        Self::with_options(store, codec, SearchOptions::default())
    }

    pub fn with_options(store: S, codec: NodeSerializer<KS, VS>, options: SearchOptions) -> Self {
        Self {
            store,
            codec,
            options,
            stats: SearchStats::new(),
        }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[inline]
    pub fn codec(&self) -> &NodeSerializer<KS, VS> {
        &self.codec
    }

    #[inline]
    pub fn options(&self) -> SearchOptions {
        self.options
    }

    #[inline]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Fetch and decode one node.
    pub fn read_node(&self, recid: RecordId) -> Result<Node<KS::Item, VS::Item>> {
        let bytes = self.store.fetch(recid)?;
        self.codec.deserialize(&bytes).map_err(|e| e.at_record(recid))
    }

    /// Serialize `node` and store it under a fresh id.
    pub fn put_node(&self, node: &Node<KS::Item, VS::Item>) -> Result<RecordId> {
        let bytes = self.codec.serialize(node)?;
        self.store.put(&bytes)
    }

    /// Serialize `node` over the existing record `recid`.
    pub fn update_node(&self, recid: RecordId, node: &Node<KS::Item, VS::Item>) -> Result<()> {
        let bytes = self.codec.serialize(node)?;
        self.store.update(recid, &bytes)
    }

    /// Look up `key` starting at `root`, decoding every node on the way.
    ///
    /// Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    /// - `Error::Checksum` / `Error::Corruption` tagged with the record id of
    ///   the node that failed to decode
    /// - `Error::RecordNotFound` if a child or link points nowhere
    pub fn descend(&self, root: RecordId, key: &KS::Item) -> Result<Option<VS::Item>> {
        self.walk(root, |bytes| {
            let node = self.codec.deserialize(bytes)?;
            Ok(node.step(self.codec.key_serializer(), key)?.cloned())
        })
    }

    /// Look up `key` starting at `root` without materializing nodes.
    ///
    /// Same result and errors as [`descend`](Self::descend).
    pub fn get_binary(&self, root: RecordId, key: &KS::Item) -> Result<Option<VS::Item>> {
        self.walk(root, |bytes| self.codec.binary_step(bytes, key))
    }

    fn walk<F>(&self, root: RecordId, mut step: F) -> Result<Option<VS::Item>>
    where
        F: FnMut(&[u8]) -> Result<Step<VS::Item>>,
    {
        self.stats.record_lookup();
        let mut recid = root;

        for _ in 0..self.options.max_steps {
            self.stats.record_visit();
            let bytes = self.store.fetch(recid)?;

            let outcome = match step(&bytes) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let e = e.at_record(recid);
                    if e.is_corruption() {
                        self.stats.record_corruption();
                        tracing::warn!(target: "blinkdb::search", %recid, error = %e, "node failed to decode");
                    }
                    return Err(e);
                }
            };

            match outcome {
                Step::Child(child) => {
                    tracing::trace!(target: "blinkdb::search", from = %recid, to = %child, "descend");
                    recid = child;
                }
                Step::Link(sibling) => {
                    self.stats.record_link_follow();
                    tracing::trace!(target: "blinkdb::search", from = %recid, to = %sibling, "follow right link");
                    recid = sibling;
                }
                Step::Absent => return Ok(None),
                Step::Found(value) => return Ok(Some(value)),
            }
        }

        self.stats.record_corruption();
        Err(Error::corruption(format!(
            "lookup visited {} nodes without finishing, links form a cycle",
            self.options.max_steps
        ))
        .at_record(recid))
    }
}
