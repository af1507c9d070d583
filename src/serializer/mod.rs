//! Pluggable key and value codecs.
//!
//! A node stores its keys and values as whole arrays, so codecs work on
//! slices rather than single elements. That lets a codec compress across
//! neighbouring elements (delta-packed integers, shared tuple prefixes) and
//! lets the lookup fast path search keys without materializing them.
//!
//! # Traits
//! - [`GroupSerializer`] - bulk encode/decode, plus fetching one element
//!   straight from the serialized form
//! - [`KeySerializer`] - adds the total order and binary searches, both over
//!   decoded keys and over serialized bytes
//!
//! # Codecs
//! - [`U64Serializer`] - fixed 8-byte big-endian
//! - [`DeltaU64Serializer`] - ascending runs stored as packed deltas
//! - [`BytesSerializer`] / [`StringSerializer`] - length-prefixed
//! - [`PrefixSerializer`] - tuples with run-length shared leading components
//!
//! # Searching serialized keys
//! Only [`U64Serializer`] binary searches its bytes, because fixed-width
//! keys can be addressed by offset. The other codecs cannot find the middle
//! key without reading the ones before it:
//! - [`BytesSerializer`] and [`StringSerializer`] scan the length-prefixed
//!   slices in order and compare each one in place, stopping at the first
//!   key not below the target
//! - [`DeltaU64Serializer`] scans the same way, summing deltas as it goes
//! - [`PrefixSerializer`] decodes the array and then binary searches it
//!
//! All of them return the same [`SearchPosition`] a true binary search
//! would, and all leave the reader just past the key array.

use std::cmp::Ordering;

use crate::common::{Error, Result};
use crate::encoding::{ByteReader, ByteWriter};

mod bytes;
mod long;
mod tuple;

pub use bytes::{BytesSerializer, StringSerializer};
pub use long::{DeltaU64Serializer, U64Serializer};
pub use tuple::PrefixSerializer;

/// Result of a binary search: `Ok(index)` when the key is present,
/// `Err(insertion_point)` when it is not (same convention as
/// [`slice::binary_search`]).
pub type SearchPosition = std::result::Result<usize, usize>;

/// Bulk encoding of element arrays.
pub trait GroupSerializer {
    type Item;

    /// Append all `items` to `out`.
    fn serialize_array(&self, out: &mut ByteWriter, items: &[Self::Item]) -> Result<()>;

    /// Decode exactly `count` elements, leaving `input` just past the array.
    fn deserialize_array(&self, input: &mut ByteReader<'_>, count: usize)
        -> Result<Vec<Self::Item>>;

    /// Decode only element `index` of a serialized array of `count` elements.
    ///
    /// The cursor position afterwards is unspecified. The default decodes the
    /// whole array; codecs that can skip elements override it.
    fn get_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        index: usize,
    ) -> Result<Self::Item> {
        let mut items = self.deserialize_array(input, count)?;
        if index >= items.len() {
            return Err(index_out_of_range(index, count));
        }
        Ok(items.swap_remove(index))
    }
}

/// Codec for ordered keys.
pub trait KeySerializer: GroupSerializer {
    /// Total order over keys.
    fn compare(&self, a: &Self::Item, b: &Self::Item) -> Ordering;

    /// Binary search over decoded, ascending keys.
    fn binary_search(&self, items: &[Self::Item], key: &Self::Item) -> SearchPosition {
        items.binary_search_by(|probe| self.compare(probe, key))
    }

    /// Binary search over a serialized array of `count` keys.
    ///
    /// Must leave `input` just past the array, like
    /// [`deserialize_array`](GroupSerializer::deserialize_array). The default
    /// decodes the keys; codecs override it to compare in place.
    fn binary_search_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        key: &Self::Item,
    ) -> Result<SearchPosition> {
        let items = self.deserialize_array(input, count)?;
        Ok(self.binary_search(&items, key))
    }
}

/// Binary search over `count` positions with a caller-supplied probe.
pub(crate) fn binary_search_by_index<F>(count: usize, mut cmp: F) -> SearchPosition
where
    F: FnMut(usize) -> Ordering,
{
    let mut lo = 0;
    let mut hi = count;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match cmp(mid) {
            Ordering::Less => lo = mid + 1,
            Ordering::Greater => hi = mid,
            Ordering::Equal => return Ok(mid),
        }
    }
    Err(lo)
}

/// Capacity for decoding `count` elements of at least `min_size` bytes each.
///
/// Keeps a corrupted count from triggering a huge allocation.
#[inline]
pub(crate) fn bounded_capacity(input: &ByteReader<'_>, count: usize, min_size: usize) -> usize {
    count.min(input.remaining() / min_size.max(1))
}

pub(crate) fn index_out_of_range(index: usize, count: usize) -> Error {
    Error::corruption(format!(
        "element {} requested from an array of {}",
        index, count
    ))
}
