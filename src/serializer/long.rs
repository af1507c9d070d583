//! `u64` codecs.

use std::cmp::Ordering;

use crate::common::{Error, Result};
use crate::encoding::{ByteReader, ByteWriter};

use super::{
    binary_search_by_index, bounded_capacity, index_out_of_range, GroupSerializer,
    KeySerializer, SearchPosition,
};

/// Fixed-width 8-byte big-endian `u64`.
///
/// Fixed width makes every key addressable by offset, so searching a
/// serialized array is a true binary search with no decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct U64Serializer;

const U64_LEN: usize = 8;

fn u64_at(raw: &[u8], index: usize) -> u64 {
    let mut bytes = [0u8; U64_LEN];
    bytes.copy_from_slice(&raw[index * U64_LEN..(index + 1) * U64_LEN]);
    u64::from_be_bytes(bytes)
}

fn array_len(count: usize) -> Result<usize> {
    count
        .checked_mul(U64_LEN)
        .ok_or_else(|| Error::corruption(format!("array of {} u64 overflows", count)))
}

impl GroupSerializer for U64Serializer {
    type Item = u64;

    fn serialize_array(&self, out: &mut ByteWriter, items: &[u64]) -> Result<()> {
        for &item in items {
            out.write_u64_be(item);
        }
        Ok(())
    }

    fn deserialize_array(&self, input: &mut ByteReader<'_>, count: usize) -> Result<Vec<u64>> {
        let raw = input.read_bytes(array_len(count)?)?;
        Ok((0..count).map(|i| u64_at(raw, i)).collect())
    }

    fn get_serialized(&self, input: &mut ByteReader<'_>, count: usize, index: usize) -> Result<u64> {
        if index >= count {
            return Err(index_out_of_range(index, count));
        }
        let raw = input.read_bytes(array_len(count)?)?;
        Ok(u64_at(raw, index))
    }
}

impl KeySerializer for U64Serializer {
    fn compare(&self, a: &u64, b: &u64) -> Ordering {
        a.cmp(b)
    }

    fn binary_search_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        key: &u64,
    ) -> Result<SearchPosition> {
        let raw = input.read_bytes(array_len(count)?)?;
        Ok(binary_search_by_index(count, |i| u64_at(raw, i).cmp(key)))
    }
}

/// Ascending `u64` runs stored as a packed first value followed by packed
/// deltas. Small, dense keys take one or two bytes each.
///
/// Only ascending arrays can be written; anything else is an
/// [`Error::Encode`].
///
/// Searching the serialized form is a linear scan, since each value is only
/// known once every delta before it has been added.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeltaU64Serializer;

impl DeltaU64Serializer {
    /// Walk the array in order, calling `visit` with each decoded value until
    /// it returns `false`. Returns how many values were visited.
    fn scan<F>(input: &mut ByteReader<'_>, count: usize, mut visit: F) -> Result<usize>
    where
        F: FnMut(usize, u64) -> bool,
    {
        let mut prev = 0u64;
        for i in 0..count {
            let delta = input.unpack_u64()?;
            let value = if i == 0 {
                delta
            } else {
                prev.checked_add(delta)
                    .ok_or_else(|| Error::corruption("delta-packed key overflows u64"))?
            };
            prev = value;
            if !visit(i, value) {
                return Ok(i + 1);
            }
        }
        Ok(count)
    }
}

impl GroupSerializer for DeltaU64Serializer {
    type Item = u64;

    fn serialize_array(&self, out: &mut ByteWriter, items: &[u64]) -> Result<()> {
        let mut prev: Option<u64> = None;
        for &item in items {
            match prev {
                None => out.pack_u64(item),
                Some(p) if item >= p => out.pack_u64(item - p),
                Some(p) => {
                    return Err(Error::Encode(format!(
                        "delta-packed values must ascend, {} follows {}",
                        item, p
                    )))
                }
            }
            prev = Some(item);
        }
        Ok(())
    }

    fn deserialize_array(&self, input: &mut ByteReader<'_>, count: usize) -> Result<Vec<u64>> {
        let mut items = Vec::with_capacity(bounded_capacity(input, count, 1));
        Self::scan(input, count, |_, value| {
            items.push(value);
            true
        })?;
        Ok(items)
    }

    fn get_serialized(&self, input: &mut ByteReader<'_>, count: usize, index: usize) -> Result<u64> {
        if index >= count {
            return Err(index_out_of_range(index, count));
        }
        let mut found = 0;
        Self::scan(input, count, |i, value| {
            found = value;
            i < index
        })?;
        Ok(found)
    }
}

impl KeySerializer for DeltaU64Serializer {
    fn compare(&self, a: &u64, b: &u64) -> Ordering {
        a.cmp(b)
    }

    fn binary_search_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        key: &u64,
    ) -> Result<SearchPosition> {
        // Deltas only decode front to back, so this is a linear scan that
        // stops at the first key >= the target.
        let mut position = Err(count);
        let visited = Self::scan(input, count, |i, value| match value.cmp(key) {
            Ordering::Less => true,
            Ordering::Equal => {
                position = Ok(i);
                false
            }
            Ordering::Greater => {
                position = Err(i);
                false
            }
        })?;
        input.skip_packed(count - visited)?;
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode<S: GroupSerializer>(ser: &S, items: &[S::Item]) -> Vec<u8> {
        let mut out = ByteWriter::new();
        ser.serialize_array(&mut out, items).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_u64_layout() {
        let bytes = encode(&U64Serializer, &[1, 256]);
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_u64_get_serialized() {
        let bytes = encode(&U64Serializer, &[10, 20, 30]);
        let mut input = ByteReader::new(&bytes);
        assert_eq!(U64Serializer.get_serialized(&mut input, 3, 2).unwrap(), 30);

        let mut input = ByteReader::new(&bytes);
        assert!(U64Serializer.get_serialized(&mut input, 3, 3).is_err());
    }

    #[test]
    fn test_u64_truncated() {
        let bytes = encode(&U64Serializer, &[10, 20]);
        let mut input = ByteReader::new(&bytes[..12]);
        assert!(U64Serializer
            .deserialize_array(&mut input, 2)
            .unwrap_err()
            .is_corruption());
    }

    #[test]
    fn test_u64_huge_count_rejected() {
        let mut input = ByteReader::new(&[0u8; 8]);
        assert!(U64Serializer.deserialize_array(&mut input, usize::MAX).is_err());
    }

    #[test]
    fn test_delta_is_compact() {
        let items: Vec<u64> = (1000..1100).collect();
        let bytes = encode(&DeltaU64Serializer, &items);
        // 1000 needs two bytes, every delta of 1 needs one.
        assert_eq!(bytes.len(), 2 + 99);
    }

    #[test]
    fn test_delta_rejects_descending() {
        let mut out = ByteWriter::new();
        let err = DeltaU64Serializer
            .serialize_array(&mut out, &[5, 3])
            .unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn test_delta_overflow_is_corruption() {
        let mut out = ByteWriter::new();
        out.pack_u64(u64::MAX);
        out.pack_u64(1);
        let bytes = out.into_inner();
        let mut input = ByteReader::new(&bytes);
        assert!(DeltaU64Serializer
            .deserialize_array(&mut input, 2)
            .unwrap_err()
            .is_corruption());
    }

    #[test]
    fn test_delta_get_serialized() {
        let bytes = encode(&DeltaU64Serializer, &[3, 7, 7, 100]);
        for (i, expected) in [3u64, 7, 7, 100].into_iter().enumerate() {
            let mut input = ByteReader::new(&bytes);
            assert_eq!(
                DeltaU64Serializer.get_serialized(&mut input, 4, i).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_serialized_search_leaves_cursor_after_array() {
        let items = [2u64, 4, 6];
        for ser in [&U64Serializer as &dyn KeySerializer<Item = u64>, &DeltaU64Serializer] {
            let mut bytes = encode_dyn(ser, &items);
            bytes.push(0xEE);
            let mut input = ByteReader::new(&bytes);
            assert_eq!(ser.binary_search_serialized(&mut input, 3, &3).unwrap(), Err(1));
            assert_eq!(input.read_u8().unwrap(), 0xEE);
        }
    }

    fn encode_dyn(ser: &dyn KeySerializer<Item = u64>, items: &[u64]) -> Vec<u8> {
        let mut out = ByteWriter::new();
        ser.serialize_array(&mut out, items).unwrap();
        out.into_inner()
    }

    proptest! {
        #[test]
        fn prop_serialized_search_matches_decoded(
            keys in proptest::collection::btree_set(any::<u64>(), 0..40),
            probe in any::<u64>(),
        ) {
            let keys: Vec<u64> = keys.into_iter().collect();
            for ser in [&U64Serializer as &dyn KeySerializer<Item = u64>, &DeltaU64Serializer] {
                let bytes = encode_dyn(ser, &keys);
                let mut input = ByteReader::new(&bytes);
                prop_assert_eq!(ser.deserialize_array(&mut input, keys.len()).unwrap(), keys.clone());
                prop_assert!(input.is_empty());

                let expected = ser.binary_search(&keys, &probe);
                let mut input = ByteReader::new(&bytes);
                prop_assert_eq!(ser.binary_search_serialized(&mut input, keys.len(), &probe).unwrap(), expected);
                prop_assert!(input.is_empty());

                if let Some(&hit) = keys.first() {
                    let mut input = ByteReader::new(&bytes);
                    prop_assert_eq!(ser.binary_search_serialized(&mut input, keys.len(), &hit).unwrap(), Ok(0));
                }
            }
        }
    }
}
