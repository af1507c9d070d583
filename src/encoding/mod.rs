//! Low-level binary encoding.
//!
//! - [`varint`] - packed integers with an end-of-number high bit, parity bits
//! - [`ByteWriter`] / [`ByteReader`] - cursors the codecs read and write through

mod io;
pub mod varint;

pub use io::{ByteReader, ByteWriter};
