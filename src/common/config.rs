//! Configuration constants and options for blinkdb.

/// Size of a page in the file-backed record store (4KB).
///
/// Each stored record occupies exactly one page, so this also bounds the
/// size of a serialized node kept in a [`FileStore`](crate::storage::FileStore).
pub const PAGE_SIZE: usize = 4096;

/// Largest record id that can be written inside a node.
///
/// Record ids are shifted left by one to make room for the parity bit,
/// which leaves 63 usable bits.
pub const MAX_RECORD_ID: u64 = u64::MAX >> 1;

/// Maximum number of bytes a packed `u64` may occupy (9 × 7 bits + 1 bit).
pub const MAX_PACKED_LEN: usize = 10;

/// Largest key count a node header can describe.
///
/// The header is `((key_count << 4) | flags) << 1` plus a parity bit, so the
/// key count must leave five bits of headroom in a `u64`.
pub const MAX_KEY_COUNT: u64 = u64::MAX >> 5;

/// Default bound on nodes visited by a single lookup.
pub const DEFAULT_MAX_SEARCH_STEPS: usize = 1 << 20;

/// How much checking the node codec performs beyond the structural invariants.
///
/// Structural checks (parity, entry counts, link/edge consistency) always run.
/// `Paranoid` additionally verifies that keys are strictly ascending on both
/// encode and decode, and rejects trailing bytes after a decoded node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrictMode {
    #[default]
    Relaxed,
    Paranoid,
}

impl StrictMode {
    #[inline]
    pub fn is_paranoid(self) -> bool {
        self == StrictMode::Paranoid
    }
}

/// Tuning for tree lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Nodes a single lookup may visit before it is reported as a link cycle.
    pub max_steps: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_SEARCH_STEPS,
        }
    }
}
