//! Record identifier type.

use std::fmt;

use super::config::MAX_RECORD_ID;

/// Identifies a stored byte blob in a [`RecordStore`](crate::storage::RecordStore).
///
/// Record ids are opaque to the index. Id `0` is reserved: stores never hand
/// it out, and it doubles as the link value of a right-edge node.
///
/// Inside a node a record id is shifted left by one and carries a parity bit,
/// so only ids up to [`MAX_RECORD_ID`] are encodable.
///
/// # Example
/// ```
/// use blinkdb::RecordId;
///
/// let recid = RecordId::new(42);
/// assert!(recid.is_valid());
/// assert!(!RecordId::NONE.is_valid());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub u64);

impl RecordId {
    /// The null record id ("no right sibling").
    pub const NONE: RecordId = RecordId(0);

    /// Largest encodable record id.
    pub const MAX: RecordId = RecordId(MAX_RECORD_ID);

    /// Create a new RecordId.
    #[inline]
    pub fn new(id: u64) -> Self {
        RecordId(id)
    }

    /// True for non-null ids that fit in a node's 63-bit pointer field.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0 != 0 && self.0 <= MAX_RECORD_ID
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "Record(NONE)")
        } else {
            write!(f, "Record({})", self.0)
        }
    }
}
