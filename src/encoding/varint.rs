//! Packed unsigned integers and 1-bit parity checksums.
//!
//! # Packed layout
//! A value is split into 7-bit groups, most significant non-zero group first.
//! Every byte but the last has its high bit clear; the last byte has its high
//! bit **set**. The high bit therefore marks the end of a number, not a
//! continuation:
//! ```text
//! 0        -> 80
//! 127      -> FF
//! 128      -> 01 80
//! u64::MAX -> 01 7F 7F 7F 7F 7F 7F 7F 7F FF
//! ```
//!
//! # Parity
//! [`parity1_set`] stores `(popcount(v) + 1) % 2` in the low bit of a value
//! whose low bit is free, making the total popcount odd. [`parity1_get`]
//! rejects any value with an even popcount. Any odd number of flipped bits is
//! caught; an even number is not.

use crate::common::config::{MAX_PACKED_LEN, MAX_RECORD_ID};
use crate::common::{Error, RecordId, Result};

/// Append `value` in packed form.
#[inline]
pub fn pack_u64(out: &mut Vec<u8>, value: u64) {
    let bits = 64 - value.leading_zeros();
    let mut shift = if bits == 0 { 0 } else { (bits - 1) / 7 * 7 };
    while shift != 0 {
        out.push(((value >> shift) & 0x7F) as u8);
        shift -= 7;
    }
    out.push((value & 0x7F) as u8 | 0x80);
}

/// Number of bytes [`pack_u64`] emits for `value`.
#[inline]
pub fn packed_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    if bits == 0 {
        1
    } else {
        (bits - 1) / 7 + 1
    }
}

/// Decode a packed integer from `buf` starting at `*pos`.
///
/// Advances `*pos` past the consumed bytes.
#[inline]
pub fn unpack_u64(buf: &[u8], pos: &mut usize) -> Result<u64> {
    let mut value: u64 = 0;
    for _ in 0..MAX_PACKED_LEN {
        let byte = *buf
            .get(*pos)
            .ok_or_else(|| Error::corruption("unexpected end of input in packed integer"))?;
        *pos += 1;

        if value >> 57 != 0 {
            return Err(Error::corruption("packed integer overflows 64 bits"));
        }
        value = (value << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 != 0 {
            return Ok(value);
        }
    }
    Err(Error::corruption(format!(
        "packed integer longer than {} bytes",
        MAX_PACKED_LEN
    )))
}

/// Advance `*pos` past `count` packed integers without decoding them.
pub fn skip_packed(buf: &[u8], pos: &mut usize, count: usize) -> Result<()> {
    let mut remaining = count;
    while remaining > 0 {
        let rest = buf
            .get(*pos..)
            .ok_or_else(|| Error::corruption("unexpected end of input while skipping"))?;
        let end = rest
            .iter()
            .position(|&b| b & 0x80 != 0)
            .ok_or_else(|| Error::corruption("unexpected end of input while skipping"))?;
        *pos += end + 1;
        remaining -= 1;
    }
    Ok(())
}

/// Fill the free low bit of `value` so that its popcount is odd.
#[inline]
pub fn parity1_set(value: u64) -> u64 {
    debug_assert_eq!(value & 1, 0, "low bit is reserved for parity");
    value | u64::from((value.count_ones() + 1) % 2)
}

/// Verify the parity bit of `value` and return it with the bit cleared.
///
/// `field` names what was being decoded, for the error message.
#[inline]
pub fn parity1_get(value: u64, field: &'static str) -> Result<u64> {
    if value.count_ones() % 2 != 1 {
        return Err(Error::checksum(field));
    }
    Ok(value & !1)
}

/// Append a record id as a packed, parity-protected pointer.
#[inline]
pub fn pack_recid(out: &mut Vec<u8>, recid: RecordId) -> Result<()> {
    if recid.0 > MAX_RECORD_ID {
        return Err(Error::Encode(format!(
            "{} exceeds the maximum record id",
            recid
        )));
    }
    pack_u64(out, parity1_set(recid.0 << 1));
    Ok(())
}

/// Decode a record id written by [`pack_recid`].
#[inline]
pub fn unpack_recid(buf: &[u8], pos: &mut usize) -> Result<RecordId> {
    let raw = unpack_u64(buf, pos)?;
    Ok(RecordId(parity1_get(raw, "record id")? >> 1))
}
