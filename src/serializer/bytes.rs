//! Length-prefixed byte string codecs.
//!
//! Slices are variable width, so searching a serialized array is a linear
//! scan that compares each slice in place without copying it.

use std::cmp::Ordering;

use crate::common::{Error, Result};
use crate::encoding::{ByteReader, ByteWriter};

use super::{bounded_capacity, index_out_of_range, GroupSerializer, KeySerializer, SearchPosition};

/// Read one length-prefixed slice.
fn read_slice<'a>(input: &mut ByteReader<'a>) -> Result<&'a [u8]> {
    let len = input.unpack_len()?;
    input.read_bytes(len)
}

fn skip_slices(input: &mut ByteReader<'_>, count: usize) -> Result<()> {
    for _ in 0..count {
        let len = input.unpack_len()?;
        input.skip(len)?;
    }
    Ok(())
}

fn get_slice<'a>(input: &mut ByteReader<'a>, count: usize, index: usize) -> Result<&'a [u8]> {
    if index >= count {
        return Err(index_out_of_range(index, count));
    }
    skip_slices(input, index)?;
    read_slice(input)
}

/// Scan serialized slices in order, comparing each against the target in place.
fn search_slices(input: &mut ByteReader<'_>, count: usize, key: &[u8]) -> Result<SearchPosition> {
    for pos in 0..count {
        let item = read_slice(input)?;
        match item.cmp(key) {
            Ordering::Less => continue,
            Ordering::Equal => {
                skip_slices(input, count - pos - 1)?;
                return Ok(Ok(pos));
            }
            Ordering::Greater => {
                skip_slices(input, count - pos - 1)?;
                return Ok(Err(pos));
            }
        }
    }
    Ok(Err(count))
}

fn write_slices<'a, I>(out: &mut ByteWriter, items: I)
where
    I: IntoIterator<Item = &'a [u8]>,
{
    for item in items {
        out.pack_len(item.len());
        out.write_bytes(item);
    }
}

/// Raw byte strings ordered lexicographically as unsigned bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BytesSerializer;

impl GroupSerializer for BytesSerializer {
    type Item = Vec<u8>;

    fn serialize_array(&self, out: &mut ByteWriter, items: &[Vec<u8>]) -> Result<()> {
        write_slices(out, items.iter().map(Vec::as_slice));
        Ok(())
    }

    fn deserialize_array(&self, input: &mut ByteReader<'_>, count: usize) -> Result<Vec<Vec<u8>>> {
        let mut items = Vec::with_capacity(bounded_capacity(input, count, 1));
        for _ in 0..count {
            items.push(read_slice(input)?.to_vec());
        }
        Ok(items)
    }

    fn get_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        index: usize,
    ) -> Result<Vec<u8>> {
        get_slice(input, count, index).map(<[u8]>::to_vec)
    }
}

impl KeySerializer for BytesSerializer {
    fn compare(&self, a: &Vec<u8>, b: &Vec<u8>) -> Ordering {
        a.cmp(b)
    }

    fn binary_search_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        key: &Vec<u8>,
    ) -> Result<SearchPosition> {
        search_slices(input, count, key)
    }
}

/// UTF-8 strings, ordered by their bytes (which is also `str` order).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StringSerializer;

fn to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::corruption(format!("string is not valid UTF-8: {}", e)))
}

impl GroupSerializer for StringSerializer {
    type Item = String;

    fn serialize_array(&self, out: &mut ByteWriter, items: &[String]) -> Result<()> {
        write_slices(out, items.iter().map(String::as_bytes));
        Ok(())
    }

    fn deserialize_array(&self, input: &mut ByteReader<'_>, count: usize) -> Result<Vec<String>> {
        let mut items = Vec::with_capacity(bounded_capacity(input, count, 1));
        for _ in 0..count {
            items.push(to_string(read_slice(input)?)?);
        }
        Ok(items)
    }

    fn get_serialized(&self, input: &mut ByteReader<'_>, count: usize, index: usize) -> Result<String> {
        to_string(get_slice(input, count, index)?)
    }
}

impl KeySerializer for StringSerializer {
    fn compare(&self, a: &String, b: &String) -> Ordering {
        a.cmp(b)
    }

    fn binary_search_serialized(
        &self,
        input: &mut ByteReader<'_>,
        count: usize,
        key: &String,
    ) -> Result<SearchPosition> {
        search_slices(input, count, key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<S: GroupSerializer>(ser: &S, items: &[S::Item]) -> Vec<u8> {
        let mut out = ByteWriter::new();
        ser.serialize_array(&mut out, items).unwrap();
        out.into_inner()
    }

    fn keys() -> Vec<Vec<u8>> {
        vec![b"".to_vec(), b"apple".to_vec(), b"apricot".to_vec(), b"zebra".to_vec()]
    }

    #[test]
    fn test_bytes_round_trip() {
        let items = keys();
        let bytes = encode(&BytesSerializer, &items);
        let mut input = ByteReader::new(&bytes);
        assert_eq!(BytesSerializer.deserialize_array(&mut input, 4).unwrap(), items);
        assert!(input.is_empty());
    }

    #[test]
    fn test_bytes_layout() {
        let bytes = encode(&BytesSerializer, &[b"ab".to_vec()]);
        // length 2 packed as a single terminated byte
        assert_eq!(bytes, [0x82, b'a', b'b']);
    }

    #[test]
    fn test_bytes_search_serialized() {
        let items = keys();
        let bytes = encode(&BytesSerializer, &items);
        let probes: [&[u8]; 6] = [b"", b"a", b"apple", b"apples", b"zebra", b"zz"];
        for probe in probes {
            let probe = probe.to_vec();
            let mut input = ByteReader::new(&bytes);
            let got = BytesSerializer
                .binary_search_serialized(&mut input, items.len(), &probe)
                .unwrap();
            assert_eq!(got, items.binary_search(&probe), "probe {:?}", probe);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn test_bytes_order_is_unsigned() {
        let low = vec![0x01];
        let high = vec![0xFF];
        assert_eq!(BytesSerializer.compare(&low, &high), Ordering::Less);
    }

    #[test]
    fn test_bytes_get_serialized() {
        let items = keys();
        let bytes = encode(&BytesSerializer, &items);
        let mut input = ByteReader::new(&bytes);
        assert_eq!(
            BytesSerializer.get_serialized(&mut input, 4, 2).unwrap(),
            b"apricot".to_vec()
        );
    }

    #[test]
    fn test_bytes_length_past_end() {
        let mut input = ByteReader::new(&[0x85, b'a']);
        assert!(BytesSerializer
            .deserialize_array(&mut input, 1)
            .unwrap_err()
            .is_corruption());
    }

    #[test]
    fn test_string_round_trip_and_search() {
        let items: Vec<String> = ["alpha", "beta", "gamma"].iter().map(|s| s.to_string()).collect();
        let bytes = encode(&StringSerializer, &items);

        let mut input = ByteReader::new(&bytes);
        assert_eq!(StringSerializer.deserialize_array(&mut input, 3).unwrap(), items);

        let mut input = ByteReader::new(&bytes);
        assert_eq!(
            StringSerializer
                .binary_search_serialized(&mut input, 3, &"beta".to_string())
                .unwrap(),
            Ok(1)
        );

        let mut input = ByteReader::new(&bytes);
        assert_eq!(StringSerializer.get_serialized(&mut input, 3, 2).unwrap(), "gamma");
    }

    #[test]
    fn test_string_invalid_utf8() {
        let bytes = encode(&BytesSerializer, &[vec![0xC3, 0x28]]);
        let mut input = ByteReader::new(&bytes);
        assert!(StringSerializer
            .deserialize_array(&mut input, 1)
            .unwrap_err()
            .is_corruption());
    }
}
