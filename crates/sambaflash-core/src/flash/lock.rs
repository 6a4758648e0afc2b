//! Lock region alignment

use core::ops::Range;

use crate::chip::FlashGeometry;

/// A page range aligned to lock region boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRegion {
    /// First page (inclusive), a multiple of the region size
    pub start_page: u32,
    /// End page (exclusive), a multiple of the region size
    pub end_page: u32,
}

impl LockRegion {
    /// Smallest aligned range covering `page_count` pages from `first_page`
    ///
    /// The start rounds down and the end rounds up, so pages outside the
    /// requested range that share a lock bit with it are locked as well.
    pub const fn covering(first_page: u32, page_count: u32, pages_per_region: u32) -> Self {
        let start_page = first_page - first_page % pages_per_region;
        let mut end_page = first_page + page_count;
        if end_page % pages_per_region != 0 {
            end_page += pages_per_region - end_page % pages_per_region;
        }
        Self {
            start_page,
            end_page,
        }
    }

    /// Lock region for a page range under `geometry`
    pub const fn for_pages(geometry: &FlashGeometry, first_page: u32, page_count: u32) -> Self {
        Self::covering(first_page, page_count, geometry.pages_per_lockregion())
    }

    /// Lock bit indices covering this region
    pub const fn lock_bits(&self, pages_per_region: u32) -> Range<u32> {
        self.start_page / pages_per_region..self.end_page / pages_per_region
    }

    /// Number of pages in the region
    pub const fn page_count(&self) -> u32 {
        self.end_page - self.start_page
    }

    /// Whether the region contains the page range
    pub const fn contains(&self, first_page: u32, page_count: u32) -> bool {
        self.start_page <= first_page && first_page + page_count <= self.end_page
    }
}
