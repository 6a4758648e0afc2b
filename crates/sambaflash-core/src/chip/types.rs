//! Chip architecture and flash geometry types

use core::fmt;

use crate::error::{Error, Result};

/// Flash geometry of a SAM3S part
///
/// Resolved once from chip identification and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    /// Address of the first flash byte in the device memory map
    pub flash_base: u32,
    /// Flash size in bytes
    pub flash_size: u32,
    /// Program page size in bytes
    pub page_size: u32,
    /// Number of program pages
    pub page_count: u32,
    /// Number of lock bits (one per lock region)
    pub lockbit_count: u32,
}

impl FlashGeometry {
    /// Size of one lock region in bytes
    pub const fn lockregion_size(&self) -> u32 {
        self.flash_size / self.lockbit_count
    }

    /// Number of pages covered by one lock bit
    pub const fn pages_per_lockregion(&self) -> u32 {
        self.lockregion_size() / self.page_size
    }

    /// Representative page number handed to SLB/CLB for a lock bit index
    ///
    /// Truncating integer division, so every lock bit maps to the first page
    /// of its region.
    pub const fn lockbit_page(&self, lockbit: u32) -> u32 {
        lockbit * self.page_count / self.lockbit_count
    }

    /// Absolute address of the first byte of `page`
    pub const fn page_address(&self, page: u32) -> u32 {
        self.flash_base + page * self.page_size
    }

    /// Whether the lock regions tile flash into whole pages
    pub const fn is_consistent(&self) -> bool {
        self.lockbit_count != 0
            && self.page_size != 0
            && self.page_count * self.page_size == self.flash_size
            && self.flash_size % self.lockbit_count == 0
            && self.lockregion_size() % self.page_size == 0
    }
}

/// ATSAM3SxB: 128 KiB flash
pub const SAM3SXB_GEOMETRY: FlashGeometry = FlashGeometry {
    flash_base: 0x0040_0000,
    flash_size: 0x2_0000,
    page_size: 256,
    page_count: 512,
    lockbit_count: 8,
};

/// ATSAM3SxC: 256 KiB flash
pub const SAM3SXC_GEOMETRY: FlashGeometry = FlashGeometry {
    flash_base: 0x0040_0000,
    flash_size: 0x4_0000,
    page_size: 256,
    page_count: 1024,
    lockbit_count: 16,
};

const _: () = assert!(SAM3SXB_GEOMETRY.is_consistent());
const _: () = assert!(SAM3SXC_GEOMETRY.is_consistent());

/// Known SAM3S architectures
///
/// The discriminant is the ARCH field of the CHIPID CIDR register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChipArchitecture {
    /// ATSAM3SxB (64-pin)
    Sam3sxB = 0x89,
    /// ATSAM3SxC (100-pin)
    Sam3sxC = 0x8A,
}

impl ChipArchitecture {
    /// All supported architectures
    pub const ALL: [ChipArchitecture; 2] = [Self::Sam3sxB, Self::Sam3sxC];

    /// Resolve an ARCH code
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0x89 => Ok(Self::Sam3sxB),
            0x8A => Ok(Self::Sam3sxC),
            other => Err(Error::UnknownArchitecture(other)),
        }
    }

    /// Look up an architecture by name (case-insensitive, e.g. "sam3sxb")
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|arch| {
            arch.name().eq_ignore_ascii_case(name) || arch.short_name().eq_ignore_ascii_case(name)
        })
    }

    /// Raw ARCH code
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Datasheet name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sam3sxB => "ATSAM3SxB",
            Self::Sam3sxC => "ATSAM3SxC",
        }
    }

    const fn short_name(self) -> &'static str {
        match self {
            Self::Sam3sxB => "sam3sxb",
            Self::Sam3sxC => "sam3sxc",
        }
    }

    /// Flash geometry for this architecture
    pub const fn geometry(self) -> FlashGeometry {
        match self {
            Self::Sam3sxB => SAM3SXB_GEOMETRY,
            Self::Sam3sxC => SAM3SXC_GEOMETRY,
        }
    }
}

impl fmt::Display for ChipArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_resolve() {
        assert_eq!(ChipArchitecture::from_code(0x89), Ok(ChipArchitecture::Sam3sxB));
        assert_eq!(ChipArchitecture::from_code(0x8A), Ok(ChipArchitecture::Sam3sxC));
        for arch in ChipArchitecture::ALL {
            assert_eq!(ChipArchitecture::from_code(arch.code()), Ok(arch));
            assert!(arch.geometry().is_consistent());
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for code in 0..=u8::MAX {
            assert_eq!(ChipArchitecture::from_code(code), ChipArchitecture::from_code(code));
        }
    }

    #[test]
    fn test_unknown_codes_fail() {
        for code in (0..=u8::MAX).filter(|c| *c != 0x89 && *c != 0x8A) {
            assert_eq!(
                ChipArchitecture::from_code(code),
                Err(Error::UnknownArchitecture(code))
            );
        }
    }

    #[test]
    fn test_derived_geometry() {
        let b = SAM3SXB_GEOMETRY;
        assert_eq!(b.lockregion_size(), 0x4000);
        assert_eq!(b.pages_per_lockregion(), 64);
        assert_eq!(b.lockbit_page(3), 192);

        let c = SAM3SXC_GEOMETRY;
        assert_eq!(c.lockregion_size(), 0x4000);
        assert_eq!(c.pages_per_lockregion(), 64);
        assert_eq!(c.lockbit_page(15), 960);
        assert_eq!(c.page_address(2), 0x0040_0200);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(ChipArchitecture::from_name("sam3sxc"), Some(ChipArchitecture::Sam3sxC));
        assert_eq!(ChipArchitecture::from_name("ATSAM3SxB"), Some(ChipArchitecture::Sam3sxB));
        assert_eq!(ChipArchitecture::from_name("sam4s"), None);
    }
}
