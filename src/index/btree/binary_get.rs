//! Lookup straight from serialized node bytes.
//!
//! Decodes the header, searches the keys in place, and then decodes only the
//! selected child id or value. Nothing else in the node is materialized.

use crate::common::Result;
use crate::encoding::ByteReader;
use crate::serializer::{GroupSerializer, KeySerializer};

use super::node_codec::{NodeHeader, NodeSerializer};
use super::search::{resolve_directory, resolve_leaf, Route, Step};

impl<KS, VS> NodeSerializer<KS, VS>
where
    KS: KeySerializer,
    VS: GroupSerializer,
{
    /// Search serialized node `bytes` for `key`.
    ///
    /// Gives the same outcome as deserializing the node and calling
    /// [`Node::step`](super::Node::step).
    ///
    /// # Errors
    /// Header, link or selected child parity failures are `Checksum`; bytes
    /// that end early or break the size formula are `Corruption`. Entries
    /// that are skipped are not validated, unless the codec is in
    /// [`StrictMode::Paranoid`](crate::common::StrictMode::Paranoid): then
    /// the whole record is checked first, exactly as
    /// [`deserialize`](NodeSerializer::deserialize) checks it.
    pub fn binary_step(&self, bytes: &[u8], key: &KS::Item) -> Result<Step<VS::Item>> {
        if self.strict_mode().is_paranoid() {
            self.deserialize(bytes)?;
        }

        let mut input = ByteReader::new(bytes);
        let header = NodeHeader::read(&mut input)?;
        let entry_count = header.entry_count()?;
        let position = self
            .key_serializer()
            .binary_search_serialized(&mut input, header.key_count, key)?;

        if header.flags.is_directory() {
            match resolve_directory(header.flags, entry_count, position)? {
                Route::Entry(index) => {
                    input.skip_packed(index)?;
                    Ok(Step::Child(input.unpack_recid()?))
                }
                Route::Link => Ok(Step::Link(header.link)),
                Route::Absent => Ok(Step::Absent),
            }
        } else {
            match resolve_leaf(header.flags, header.key_count, entry_count, position) {
                Route::Entry(index) => Ok(Step::Found(
                    self.value_serializer()
                        .get_serialized(&mut input, entry_count, index)?,
                )),
                Route::Link => Ok(Step::Link(header.link)),
                Route::Absent => Ok(Step::Absent),
            }
        }
    }
}
