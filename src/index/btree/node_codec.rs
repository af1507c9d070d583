//! Binary node format.
//!
//! # Layout
//! ```text
//! ┌────────────┬─────────────┬──────────┬──────────────────────┐
//! │ header     │ link        │ keys     │ children / values    │
//! │ packed     │ packed      │ L keys   │ count from the size  │
//! │            │ (not RIGHT) │          │ formula              │
//! └────────────┴─────────────┴──────────┴──────────────────────┘
//! header = parity1(((L << 4) | flags) << 1)
//! ```
//! - The header combines key count and flags so small nodes pay one byte.
//! - `link` is a parity-protected record id and is omitted on a right edge.
//! - Keys and values use their codec's bulk array format.
//! - Children are packed, parity-protected record ids.
//!
//! Packed integers put a set high bit on their **last** byte; see
//! [`varint`](crate::encoding::varint).

use std::cmp::Ordering;

use crate::common::config::MAX_KEY_COUNT;
use crate::common::{Error, RecordId, Result, StrictMode};
use crate::encoding::{varint, ByteReader, ByteWriter};
use crate::serializer::{GroupSerializer, KeySerializer};

use super::node::{Node, NodeEntries, NodeFlags};

/// Fixed part of a serialized node: everything before the key array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub flags: NodeFlags,
    pub key_count: usize,
    pub link: RecordId,
}

impl NodeHeader {
    /// Decode the header and link, leaving `input` at the first key.
    ///
    /// Rejects headers whose flags cannot describe a valid node: a
    /// directory with LAST_KEY_DUPLICATED, a missing or stray link, or a
    /// key count whose entry count would be negative.
    pub fn read(input: &mut ByteReader<'_>) -> Result<Self> {
        let raw = input.unpack_u64()?;
        let combined = varint::parity1_get(raw, "node header")? >> 1;
        let flags = NodeFlags::from_bits((combined & u64::from(NodeFlags::MASK)) as u8)
            .ok_or_else(|| Error::corruption("flag bits out of range"))?;
        let key_count = usize::try_from(combined >> 4)
            .map_err(|_| Error::corruption(format!("key count {} overflows", combined >> 4)))?;

        if flags.is_directory() && flags.is_last_key_duplicated() {
            return Err(Error::corruption("directory node has LAST_KEY_DUPLICATED"));
        }

        let link = if flags.is_right_edge() {
            RecordId::NONE
        } else {
            let link = input.unpack_recid()?;
            if link.is_none() {
                return Err(Error::corruption("node below the right edge has no link"));
            }
            link
        };

        Ok(Self {
            flags,
            key_count,
            link,
        })
    }

    /// Children (directory) or values (leaf) following the keys.
    pub fn entry_count(&self) -> Result<usize> {
        self.flags.entry_count(self.key_count).ok_or_else(|| {
            Error::corruption(format!(
                "{:?} with {} keys gives a negative entry count",
                self.flags, self.key_count
            ))
        })
    }

    fn write(flags: NodeFlags, key_count: usize, link: RecordId, out: &mut ByteWriter) -> Result<()> {
        let key_count = key_count as u64;
        if key_count > MAX_KEY_COUNT {
            return Err(Error::Encode(format!("{} keys do not fit a node header", key_count)));
        }
        let combined = (key_count << 4) | u64::from(flags.bits());
        out.pack_u64(varint::parity1_set(combined << 1));
        if !flags.is_right_edge() {
            out.pack_recid(link)?;
        }
        Ok(())
    }
}

/// Encodes and decodes [`Node`]s with pluggable key and value codecs.
///
/// # Example
/// ```
/// use blinkdb::index::btree::{Node, NodeFlags, NodeSerializer};
/// use blinkdb::serializer::{StringSerializer, U64Serializer};
/// use blinkdb::RecordId;
///
/// let codec = NodeSerializer::new(U64Serializer, StringSerializer);
/// let flags = NodeFlags::empty().with_left_edge().with_right_edge();
/// let node = Node::leaf(flags, RecordId::NONE, vec![1, 2], vec!["a".into(), "b".into()]).unwrap();
///
/// let bytes = codec.serialize(&node).unwrap();
/// assert_eq!(codec.deserialize(&bytes).unwrap(), node);
/// ```
#[derive(Debug, Default, Clone)]
pub struct NodeSerializer<KS, VS> {
    keys: KS,
    values: VS,
    strict: StrictMode,
}

impl<KS, VS> NodeSerializer<KS, VS>
where
    KS: KeySerializer,
    VS: GroupSerializer,
{
    pub fn new(keys: KS, values: VS) -> Self {
        Self {
            keys,
            values,
            strict: StrictMode::default(),
        }
    }

    pub fn with_strict_mode(mut self, strict: StrictMode) -> Self {
        self.strict = strict;
        self
    }

    #[inline]
    pub fn key_serializer(&self) -> &KS {
        &self.keys
    }

    #[inline]
    pub fn value_serializer(&self) -> &VS {
        &self.values
    }

    #[inline]
    pub fn strict_mode(&self) -> StrictMode {
        self.strict
    }

    pub fn serialize(&self, node: &Node<KS::Item, VS::Item>) -> Result<Vec<u8>> {
        let mut out = ByteWriter::new();
        self.serialize_into(node, &mut out)?;
        Ok(out.into_inner())
    }

    pub fn serialize_into(&self, node: &Node<KS::Item, VS::Item>, out: &mut ByteWriter) -> Result<()> {
        if self.strict.is_paranoid() {
            self.check_ascending(node.keys())
                .map_err(Error::Encode)?;
        }

        NodeHeader::write(node.flags(), node.keys().len(), node.link(), out)?;
        self.keys.serialize_array(out, node.keys())?;
        match node.entries() {
            NodeEntries::Children(children) => {
                for &child in children {
                    out.pack_recid(child)?;
                }
            }
            NodeEntries::Values(values) => self.values.serialize_array(out, values)?,
        }
        Ok(())
    }

    /// Decode a whole node.
    ///
    /// # Errors
    /// - `Error::Checksum` if the header or any record id fails its parity check
    /// - `Error::Corruption` if the bytes are truncated, the counts break the
    ///   size formula, or (paranoid mode) keys are out of order or bytes trail
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Node<KS::Item, VS::Item>> {
        let mut input = ByteReader::new(bytes);
        let header = NodeHeader::read(&mut input)?;
        let keys = self.keys.deserialize_array(&mut input, header.key_count)?;
        let entry_count = header.entry_count()?;

        let entries = if header.flags.is_directory() {
            let mut children = Vec::with_capacity(entry_count.min(input.remaining()));
            for _ in 0..entry_count {
                children.push(input.unpack_recid()?);
            }
            NodeEntries::Children(children)
        } else {
            NodeEntries::Values(self.values.deserialize_array(&mut input, entry_count)?)
        };

        if self.strict.is_paranoid() {
            self.check_ascending(&keys).map_err(Error::corruption)?;
            if !input.is_empty() {
                return Err(Error::corruption(format!(
                    "{} trailing bytes after node",
                    input.remaining()
                )));
            }
        }

        Node::new(header.flags, header.link, keys, entries).map_err(|e| match e {
            Error::InvalidNode(reason) => Error::corruption(reason),
            other => other,
        })
    }

    fn check_ascending(&self, keys: &[KS::Item]) -> std::result::Result<(), String> {
        match keys
            .windows(2)
            .position(|w| self.keys.compare(&w[0], &w[1]) != Ordering::Less)
        {
            Some(i) => Err(format!("keys {} and {} are not strictly ascending", i, i + 1)),
            None => Ok(()),
        }
    }
}
