//! Page-aligned payload buffers

use alloc::vec::Vec;
use core::num::NonZeroUsize;
use core::slice::ChunksExact;

/// Value of an erased flash byte, used to pad partial pages
pub const ERASE_VALUE: u8 = 0xFF;

/// A payload split into whole pages
///
/// The payload is stored contiguously and padded with [`ERASE_VALUE`] up to
/// the next page boundary. Padding never truncates the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    data: Vec<u8>,
    page_size: NonZeroUsize,
    payload_len: usize,
}

impl Pages {
    /// Split `payload` into pages of `page_size` bytes
    pub fn split(payload: &[u8], page_size: NonZeroUsize) -> Self {
        let mut data = payload.to_vec();
        let padded_len = payload.len().div_ceil(page_size.get()) * page_size.get();
        data.resize(padded_len, ERASE_VALUE);

        Self {
            data,
            page_size,
            payload_len: payload.len(),
        }
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.data.len() / self.page_size.get()
    }

    /// Whether there are no pages (empty payload)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Page size in bytes
    pub fn page_size(&self) -> usize {
        self.page_size.get()
    }

    /// Length of the payload before padding
    pub fn payload_len(&self) -> usize {
        self.payload_len
    }

    /// Get page `index`
    pub fn page(&self, index: usize) -> Option<&[u8]> {
        let page_size = self.page_size.get();
        let start = index.checked_mul(page_size)?;
        self.data.get(start..start.checked_add(page_size)?)
    }

    /// Iterate over all pages in order
    pub fn iter(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.page_size.get())
    }

    /// All pages as one contiguous buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl<'a> IntoIterator for &'a Pages {
    type Item = &'a [u8];
    type IntoIter = ChunksExact<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
