//! Page header and type definitions.
//!
//! Every page of a [`FileStore`](crate::storage::FileStore) starts with a
//! [`PageHeader`]:
//! - [`PageType`] discriminator
//! - CRC32 checksum over the whole page
//! - Length of the record payload that follows the header

/// Type of page stored on disk.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// Never written, or unreadable.
    #[default]
    Invalid = 0,
    /// Holds one record (a serialized node).
    Record = 1,
}

impl PageType {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => PageType::Record,
            _ => PageType::Invalid,
        }
    }
}

/// Metadata stored at the beginning of every page.
///
/// # Layout (9 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       4     len (payload bytes, little-endian)
/// ```
///
/// # Checksum
/// The checksum is computed over the entire page with the checksum field
/// itself set to zero, so it covers the type, the length and the padding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
    pub len: u32,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 9;

    /// Offset of each field within the header.
    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_LEN: usize = 5;

    /// Header for a record page holding `len` payload bytes.
    ///
    /// The checksum starts at zero; see [`Page::update_checksum`](super::Page::update_checksum).
    pub fn new(page_type: PageType, len: u32) -> Self {
        Self {
            page_type,
            checksum: 0,
            len,
        }
    }

    /// Read a header from the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        let page_type = PageType::from_u8(data[Self::OFFSET_PAGE_TYPE]);

        let checksum = u32::from_le_bytes([
            data[Self::OFFSET_CHECKSUM],
            data[Self::OFFSET_CHECKSUM + 1],
            data[Self::OFFSET_CHECKSUM + 2],
            data[Self::OFFSET_CHECKSUM + 3],
        ]);

        let len = u32::from_le_bytes([
            data[Self::OFFSET_LEN],
            data[Self::OFFSET_LEN + 1],
            data[Self::OFFSET_LEN + 2],
            data[Self::OFFSET_LEN + 3],
        ]);

        Self {
            page_type,
            checksum,
            len,
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for PageHeader");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_LEN..Self::OFFSET_LEN + 4].copy_from_slice(&self.len.to_le_bytes());
    }

    /// CRC32 of a page with the checksum field (bytes 1-4) read as zeros.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// `true` if the stored checksum matches the page contents.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}

// ============================================================================
// TESTS
// ============================================================================
