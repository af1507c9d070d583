//! Error types for blinkdb.

use thiserror::Error;

use super::RecordId;

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in blinkdb.
///
/// `Checksum` and `Corruption` are the two fatal decode failures: the bytes
/// behind a record id cannot be trusted and the operation is abandoned.
/// A missing key is never an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parity bit or page CRC did not match.
    #[error("checksum mismatch in {field}{}", located(.recid))]
    Checksum {
        field: &'static str,
        recid: Option<RecordId>,
    },

    /// Decoded bytes violate the node format or its size invariants.
    #[error("corrupted node: {reason}{}", located(.recid))]
    Corruption {
        reason: String,
        recid: Option<RecordId>,
    },

    /// A node was constructed with fields that break its invariants.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// A value cannot be represented in the binary format.
    #[error("cannot encode: {0}")]
    Encode(String),

    /// The store holds nothing under this id.
    #[error("{0} not found")]
    RecordNotFound(RecordId),

    /// The record does not fit in a single storage page.
    #[error("record of {len} bytes exceeds the {max} byte limit")]
    RecordTooLarge { len: usize, max: usize },
}

fn located(recid: &Option<RecordId>) -> String {
    match recid {
        Some(recid) => format!(" at {}", recid),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn checksum(field: &'static str) -> Self {
        Error::Checksum { field, recid: None }
    }

    pub(crate) fn corruption(reason: impl Into<String>) -> Self {
        Error::Corruption {
            reason: reason.into(),
            recid: None,
        }
    }

    /// Attach the record id a checksum/corruption error was raised for.
    ///
    /// An id that is already present is kept.
    pub fn at_record(self, at: RecordId) -> Self {
        match self {
            Error::Checksum { field, recid: None } => Error::Checksum {
                field,
                recid: Some(at),
            },
            Error::Corruption {
                reason,
                recid: None,
            } => Error::Corruption {
                reason,
                recid: Some(at),
            },
            other => other,
        }
    }

    /// True for the fatal "cannot trust these bytes" kinds.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Checksum { .. } | Error::Corruption { .. })
    }

    /// The record id attached to a checksum/corruption error, if any.
    pub fn record_id(&self) -> Option<RecordId> {
        match self {
            Error::Checksum { recid, .. } | Error::Corruption { recid, .. } => *recid,
            Error::RecordNotFound(recid) => Some(*recid),
            _ => None,
        }
    }
}
