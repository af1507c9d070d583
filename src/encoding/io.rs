//! Byte cursors used by the node codec and the serializers.
//!
//! - [`ByteWriter`] - growable output buffer
//! - [`ByteReader`] - bounds-checked cursor over a borrowed byte slice
//!
//! Every read past the end of the input is reported as corruption: a
//! serialized node always carries exactly the bytes its header describes.

use crate::common::{Error, RecordId, Result};

use super::varint;

/// Output buffer for serialized nodes.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Fixed-width big-endian `u64`.
    #[inline]
    pub fn write_u64_be(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    #[inline]
    pub fn pack_u64(&mut self, value: u64) {
        varint::pack_u64(&mut self.buf, value);
    }

    #[inline]
    pub fn pack_len(&mut self, len: usize) {
        varint::pack_u64(&mut self.buf, len as u64);
    }

    #[inline]
    pub fn pack_recid(&mut self, recid: RecordId) -> Result<()> {
        varint::pack_recid(&mut self.buf, recid)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Read cursor over serialized bytes.
///
/// Slices returned by [`read_bytes`](Self::read_bytes) borrow from the
/// underlying input, not from the reader, so they outlive cursor moves.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or_else(|| Error::corruption("unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::corruption(format!(
                "needed {} bytes at offset {}, only {} remain",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let data: &'a [u8] = self.data;
        let slice = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Fixed-width big-endian `u64`.
    #[inline]
    pub fn read_u64_be(&mut self) -> Result<u64> {
        let bytes = self.read_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(raw))
    }

    #[inline]
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    #[inline]
    pub fn unpack_u64(&mut self) -> Result<u64> {
        varint::unpack_u64(self.data, &mut self.pos)
    }

    /// A packed length, checked against the bytes that are left.
    ///
    /// Every element of a serialized array occupies at least one byte, so a
    /// length larger than the remaining input can only come from corruption.
    #[inline]
    pub fn unpack_len(&mut self) -> Result<usize> {
        let len = self.unpack_u64()?;
        match usize::try_from(len) {
            Ok(len) if len <= self.remaining() => Ok(len),
            _ => Err(Error::corruption(format!(
                "length {} exceeds the {} remaining bytes",
                len,
                self.remaining()
            ))),
        }
    }

    #[inline]
    pub fn skip_packed(&mut self, count: usize) -> Result<()> {
        varint::skip_packed(self.data, &mut self.pos, count)
    }

    #[inline]
    pub fn unpack_recid(&mut self) -> Result<RecordId> {
        varint::unpack_recid(self.data, &mut self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_reader_mixed() {
        let mut out = ByteWriter::new();
        out.write_u8(0xAB);
        out.write_u64_be(0x0102_0304_0506_0708);
        out.pack_u64(300);
        out.pack_recid(RecordId::new(77)).unwrap();
        out.write_bytes(b"tail");

        let bytes = out.into_inner();
        let mut input = ByteReader::new(&bytes);
        assert_eq!(input.read_u8().unwrap(), 0xAB);
        assert_eq!(input.read_u64_be().unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(input.unpack_u64().unwrap(), 300);
        assert_eq!(input.unpack_recid().unwrap(), RecordId::new(77));
        assert_eq!(input.read_bytes(4).unwrap(), b"tail");
        assert!(input.is_empty());
    }

    #[test]
    fn test_big_endian_layout() {
        let mut out = ByteWriter::new();
        out.write_u64_be(1);
        assert_eq!(out.as_slice(), &[0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_read_past_end() {
        let mut input = ByteReader::new(&[1, 2, 3]);
        assert!(input.read_bytes(4).unwrap_err().is_corruption());
        // Failed read does not move the cursor.
        assert_eq!(input.position(), 0);
        assert!(input.read_u64_be().is_err());
        input.skip(3).unwrap();
        assert!(input.read_u8().is_err());
    }

    #[test]
    fn test_unpack_len_bounded_by_input() {
        let mut out = ByteWriter::new();
        out.pack_len(3);
        out.write_bytes(b"abc");
        let bytes = out.into_inner();
        assert_eq!(ByteReader::new(&bytes).unpack_len().unwrap(), 3);

        let mut out = ByteWriter::new();
        out.pack_len(1 << 40);
        let bytes = out.into_inner();
        assert!(ByteReader::new(&bytes).unpack_len().is_err());
    }

    #[test]
    fn test_slices_outlive_cursor() {
        let data = vec![1u8, 2, 3, 4];
        let first;
        {
            let mut input = ByteReader::new(&data);
            first = input.read_bytes(2).unwrap();
            input.skip(2).unwrap();
        }
        assert_eq!(first, &[1, 2]);
    }
}
