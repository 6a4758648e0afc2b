//! CHIPID CIDR register decoding

use core::fmt;

/// Decoded CHIPID CIDR register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipId(pub u32);

impl ChipId {
    /// Silicon version (bits 0..=4)
    pub const fn version(self) -> u8 {
        (self.0 & 0x1F) as u8
    }

    /// Embedded processor code (bits 5..=7)
    pub const fn eproc(self) -> u8 {
        ((self.0 >> 5) & 0x7) as u8
    }

    /// Nonvolatile program memory size code (bits 8..=11)
    pub const fn nvpsiz(self) -> u8 {
        ((self.0 >> 8) & 0xF) as u8
    }

    /// Second nonvolatile program memory size code (bits 12..=15)
    pub const fn nvpsiz2(self) -> u8 {
        ((self.0 >> 12) & 0xF) as u8
    }

    /// Internal SRAM size code (bits 16..=19)
    pub const fn sramsiz(self) -> u8 {
        ((self.0 >> 16) & 0xF) as u8
    }

    /// Architecture code (bits 20..=27)
    pub const fn arch(self) -> u8 {
        ((self.0 >> 20) & 0xFF) as u8
    }

    /// Nonvolatile program memory type code (bits 28..=30)
    pub const fn nvptyp(self) -> u8 {
        ((self.0 >> 28) & 0x7) as u8
    }

    /// Extension flag (bit 31)
    pub const fn has_extension(self) -> bool {
        self.0 & (1 << 31) != 0
    }

    /// Embedded processor name
    pub const fn processor(self) -> &'static str {
        match self.eproc() {
            1 => "ARM946ES",
            2 => "ARM7TDMI",
            3 => "Cortex-M3",
            4 => "ARM920T",
            5 => "ARM926EJS",
            6 => "Cortex-A5",
            7 => "Cortex-M4",
            _ => "unknown",
        }
    }

    /// Nonvolatile program memory size in bytes, if the code is defined
    pub const fn nvm_size(self) -> Option<u32> {
        let kib = match self.nvpsiz() {
            0 => 0,
            1 => 8,
            2 => 16,
            3 => 32,
            5 => 64,
            7 => 128,
            9 => 256,
            10 => 512,
            12 => 1024,
            14 => 2048,
            _ => return None,
        };
        Some(kib * 1024)
    }

    /// Internal SRAM size in bytes, if the code is defined
    pub const fn sram_size(self) -> Option<u32> {
        let kib = match self.sramsiz() {
            0 => 48,
            1 => 1,
            2 => 2,
            3 => 6,
            4 => 24,
            5 => 4,
            6 => 80,
            7 => 160,
            8 => 8,
            9 => 16,
            10 => 32,
            11 => 64,
            12 => 128,
            13 => 256,
            14 => 96,
            15 => 512,
            _ => return None,
        };
        Some(kib * 1024)
    }

    /// Nonvolatile program memory type name
    pub const fn nvm_type(self) -> &'static str {
        match self.nvptyp() {
            0 => "ROM",
            1 => "ROMless or on-chip flash",
            2 => "embedded flash",
            3 => "ROM and embedded flash",
            4 => "SRAM emulating ROM",
            _ => "unknown",
        }
    }
}

impl fmt::Display for ChipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
