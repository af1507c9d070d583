//! Page - the 4KB unit of file storage.
//!
//! A [`Page`] holds one [`PageHeader`] followed by a single record payload
//! and zero padding.

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, Result};

use super::page_header::{PageHeader, PageType};

/// A page of data (4KB, 4KB-aligned).
///
/// # Layout
/// ```text
/// ┌──────────────┬───────────────────────┬──────────────┐
/// │ PageHeader   │ payload               │ zero padding │
/// │ (9 bytes)    │ (header.len bytes)    │              │
/// └──────────────┴───────────────────────┴──────────────┘
/// ```
///
/// # Example
/// ```
/// use blinkdb::storage::page::Page;
///
/// let page = Page::with_record(b"node bytes").unwrap();
/// assert!(page.verify_checksum());
/// assert_eq!(page.record().unwrap(), b"node bytes");
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Largest payload a page can hold.
    pub const MAX_RECORD_LEN: usize = PAGE_SIZE - PageHeader::SIZE;

    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Build a checksummed record page holding `payload`.
    ///
    /// # Errors
    /// `Error::RecordTooLarge` if the payload does not fit after the header.
    pub fn with_record(payload: &[u8]) -> Result<Self> {
        if payload.len() > Self::MAX_RECORD_LEN {
            return Err(Error::RecordTooLarge {
                len: payload.len(),
                max: Self::MAX_RECORD_LEN,
            });
        }
        let mut page = Page::new();
        page.set_header(&PageHeader::new(PageType::Record, payload.len() as u32));
        page.data[PageHeader::SIZE..PageHeader::SIZE + payload.len()].copy_from_slice(payload);
        page.update_checksum();
        Ok(page)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    pub fn header(&self) -> PageHeader {
        PageHeader::from_bytes(&self.data)
    }

    pub fn set_header(&mut self, header: &PageHeader) {
        header.write_to(&mut self.data);
    }

    /// Compute and store checksum in the header.
    ///
    /// Call this after all modifications to the page are complete.
    pub fn update_checksum(&mut self) {
        let checksum = PageHeader::compute_checksum(&self.data);
        self.data[PageHeader::OFFSET_CHECKSUM..PageHeader::OFFSET_CHECKSUM + 4]
            .copy_from_slice(&checksum.to_le_bytes());
    }

    pub fn verify_checksum(&self) -> bool {
        self.header().verify_checksum(&self.data)
    }

    /// The record payload, after checking the header.
    ///
    /// # Errors
    /// - `Error::Checksum` if the CRC does not match
    /// - `Error::Corruption` if the page is not a record page or its length
    ///   runs past the page
    pub fn record(&self) -> Result<&[u8]> {
        let header = self.header();
        if !header.verify_checksum(&self.data) {
            return Err(Error::checksum("record page crc32"));
        }
        if header.page_type != PageType::Record {
            return Err(Error::corruption(format!(
                "expected a record page, found {:?}",
                header.page_type
            )));
        }
        let len = header.len as usize;
        if len > Self::MAX_RECORD_LEN {
            return Err(Error::corruption(format!(
                "record length {} exceeds the page",
                len
            )));
        }
        Ok(&self.data[PageHeader::SIZE..PageHeader::SIZE + len])
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
