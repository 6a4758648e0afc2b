//! Flash layout for one `flash` invocation
//!
//! Firmware always starts at page 0. The IMU calibration blob lives at a
//! fixed distance below the top of flash; the bytes of its first page that
//! precede it belong to whatever else is stored there and are read back and
//! rewritten unchanged.

use crate::chip::FlashGeometry;
use crate::error::{Error, Result};

use super::lock::LockRegion;

/// Distance from the top of flash to the start of the calibration blob
pub const CALIBRATION_TOP_OFFSET: u32 = 2 * 0x1000 + 12 + 0x400;

/// A range of whole pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// First page number
    pub first_page: u32,
    /// Number of pages
    pub page_count: u32,
}

impl PageRange {
    /// End page number (exclusive)
    pub const fn end_page(&self) -> u32 {
        self.first_page + self.page_count
    }

    /// Lock region covering this range
    pub const fn lock_region(&self, geometry: &FlashGeometry) -> LockRegion {
        LockRegion::for_pages(geometry, self.first_page, self.page_count)
    }
}

/// Where the calibration blob goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationLayout {
    /// Offset of the blob from the flash base
    pub relative_address: u32,
    /// Bytes of the leading page that precede the blob
    pub prefix_len: u32,
    /// Page holding the first prefix byte
    pub first_page: u32,
}

impl CalibrationLayout {
    /// Calibration layout for a geometry
    pub const fn for_geometry(geometry: &FlashGeometry) -> Self {
        let relative_address = geometry.flash_size - CALIBRATION_TOP_OFFSET;
        let prefix_len = relative_address % geometry.page_size;
        Self {
            relative_address,
            prefix_len,
            first_page: (relative_address - prefix_len) / geometry.page_size,
        }
    }

    /// Absolute address of the first prefix byte
    pub const fn prefix_address(&self, geometry: &FlashGeometry) -> u32 {
        geometry.flash_base + self.relative_address - self.prefix_len
    }

    /// Largest blob that fits below the top of flash
    pub const fn max_len(&self, geometry: &FlashGeometry) -> u32 {
        geometry.flash_size - self.relative_address
    }
}

/// Calibration part of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationPlan {
    /// Address layout
    pub layout: CalibrationLayout,
    /// Pages written, prefix included
    pub pages: PageRange,
}

/// Resolved page layout for a single flash operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPlan {
    /// Firmware pages, starting at page 0
    pub firmware: PageRange,
    /// Calibration pages, if a blob was supplied
    pub calibration: Option<CalibrationPlan>,
}

impl FlashPlan {
    /// Plan a flash of `firmware_len` bytes and an optional calibration blob
    ///
    /// Fails with [`Error::ImageTooLarge`] if the firmware would reach into
    /// the calibration page (or past flash end without calibration), or if
    /// the blob would run past the end of flash.
    pub fn new(
        geometry: &FlashGeometry,
        firmware_len: usize,
        calibration_len: Option<usize>,
    ) -> Result<Self> {
        let page_size = geometry.page_size as usize;

        let calibration = match calibration_len {
            Some(len) => {
                let layout = CalibrationLayout::for_geometry(geometry);
                let max = layout.max_len(geometry) as usize;
                if len > max {
                    return Err(Error::ImageTooLarge { len, max });
                }
                let prefixed_len = layout.prefix_len as usize + len;
                Some(CalibrationPlan {
                    layout,
                    pages: PageRange {
                        first_page: layout.first_page,
                        page_count: prefixed_len.div_ceil(page_size) as u32,
                    },
                })
            }
            None => None,
        };

        let firmware_max = match &calibration {
            Some(cal) => cal.layout.first_page as usize * page_size,
            None => geometry.flash_size as usize,
        };
        if firmware_len > firmware_max {
            return Err(Error::ImageTooLarge {
                len: firmware_len,
                max: firmware_max,
            });
        }

        Ok(Self {
            firmware: PageRange {
                first_page: 0,
                page_count: firmware_len.div_ceil(page_size) as u32,
            },
            calibration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{SAM3SXB_GEOMETRY, SAM3SXC_GEOMETRY};

    #[test]
    fn test_calibration_layout_128k() {
        let layout = CalibrationLayout::for_geometry(&SAM3SXB_GEOMETRY);
        assert_eq!(layout.relative_address, 0x1DBF4);
        assert_eq!(layout.prefix_len, 0xF4);
        assert_eq!(layout.first_page, 475);
        assert_eq!(layout.prefix_address(&SAM3SXB_GEOMETRY), 0x41DB00);
    }

    #[test]
    fn test_calibration_layout_256k() {
        let layout = CalibrationLayout::for_geometry(&SAM3SXC_GEOMETRY);
        assert_eq!(layout.relative_address, 0x3DBF4);
        assert_eq!(layout.first_page, 987);
        assert_eq!(layout.max_len(&SAM3SXC_GEOMETRY), CALIBRATION_TOP_OFFSET);
    }

    #[test]
    fn test_plan_firmware_only() {
        let plan = FlashPlan::new(&SAM3SXB_GEOMETRY, 1000, None).unwrap();
        assert_eq!(plan.firmware, PageRange { first_page: 0, page_count: 4 });
        assert_eq!(plan.calibration, None);
    }

    #[test]
    fn test_plan_with_calibration() {
        let plan = FlashPlan::new(&SAM3SXB_GEOMETRY, 256, Some(20)).unwrap();
        let cal = plan.calibration.unwrap();
        // 244 prefix bytes + 20 blob bytes span two pages
        assert_eq!(cal.pages, PageRange { first_page: 475, page_count: 2 });
        assert_eq!(cal.pages.end_page(), 477);
    }

    #[test]
    fn test_firmware_may_not_reach_calibration_page() {
        let max = 475 * 256;
        assert!(FlashPlan::new(&SAM3SXB_GEOMETRY, max, Some(1)).is_ok());
        assert_eq!(
            FlashPlan::new(&SAM3SXB_GEOMETRY, max + 1, Some(1)),
            Err(Error::ImageTooLarge { len: max + 1, max })
        );
        assert!(FlashPlan::new(&SAM3SXB_GEOMETRY, max + 1, None).is_ok());
    }

    #[test]
    fn test_oversized_images_are_rejected() {
        assert_eq!(
            FlashPlan::new(&SAM3SXB_GEOMETRY, 0x20001, None),
            Err(Error::ImageTooLarge { len: 0x20001, max: 0x20000 })
        );
        let max = CALIBRATION_TOP_OFFSET as usize;
        assert_eq!(
            FlashPlan::new(&SAM3SXB_GEOMETRY, 0, Some(max + 1)),
            Err(Error::ImageTooLarge { len: max + 1, max })
        );
    }
}
