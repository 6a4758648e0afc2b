//! SAM3S register addresses, bit layouts and flash controller commands
//!
//! These are fixed across all supported architectures.

use bitflags::bitflags;

/// CHIPID Chip ID register
pub const CHIPID_CIDR: u32 = 0x400E_0740;

/// EEFC flash mode register
pub const EEFC_FMR: u32 = 0x400E_0A00;
/// EEFC flash command register
pub const EEFC_FCR: u32 = 0x400E_0A04;
/// EEFC flash status register
pub const EEFC_FSR: u32 = 0x400E_0A08;
/// EEFC flash result register
pub const EEFC_FRR: u32 = 0x400E_0A0C;

/// Key byte the EEFC requires in FCR bits 24..=31
pub const EEFC_FCR_FKEY: u8 = 0x5A;

/// Flash wait states required while programming (SAM3S flash errata)
pub const EEFC_FMR_FWS: u32 = 6;

/// RSTC control register
pub const RSTC_CR: u32 = 0x400E_1400;
/// RSTC mode register
pub const RSTC_MR: u32 = 0x400E_1408;

/// Key byte for RSTC_CR
pub const RSTC_CR_KEY: u8 = 0xA5;
/// Key byte for RSTC_MR
pub const RSTC_MR_KEY: u8 = 0xA5;

/// External reset length field written to RSTC_MR.ERSTL
pub const RSTC_MR_ERSTL: u32 = 10;

/// Iteration bound for FSR polling
///
/// Reads are issued back to back; the bootloader answers fast enough that
/// no delay is needed between them.
pub const FLASH_READY_POLL_LIMIT: u32 = 1000;

bitflags! {
    /// EEFC_FSR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlashStatus: u32 {
        /// Flash ready to accept a new command
        const FRDY = 1 << 0;
        /// Invalid command or bad key
        const FCMDE = 1 << 1;
        /// Program or erase of a locked region
        const FLOCKE = 1 << 2;
    }
}

bitflags! {
    /// RSTC_CR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResetControl: u32 {
        /// Processor reset
        const PROCRST = 1 << 0;
        /// External reset
        const EXTRST = 1 << 2;
    }
}

bitflags! {
    /// RSTC_MR bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResetMode: u32 {
        /// User reset enable
        const URSTEN = 1 << 0;
        /// User reset interrupt enable
        const URSTIEN = 1 << 3;
    }
}

/// EEFC flash commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FlashCommand {
    /// Write page
    WritePage = 0x01,
    /// Erase all
    EraseAll = 0x05,
    /// Set lock bit
    SetLockBit = 0x08,
    /// Clear lock bit
    ClearLockBit = 0x09,
    /// Get lock bit
    GetLockBit = 0x0A,
    /// Set GPNVM bit
    SetGpnvmBit = 0x0B,
    /// Clear GPNVM bit
    ClearGpnvmBit = 0x0C,
    /// Get GPNVM bit
    GetGpnvmBit = 0x0D,
    /// Start read unique identifier
    StartReadUniqueId = 0x0E,
    /// Stop read unique identifier
    StopReadUniqueId = 0x0F,
}

impl FlashCommand {
    /// Decode a FCMD field value
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => Self::WritePage,
            0x05 => Self::EraseAll,
            0x08 => Self::SetLockBit,
            0x09 => Self::ClearLockBit,
            0x0A => Self::GetLockBit,
            0x0B => Self::SetGpnvmBit,
            0x0C => Self::ClearGpnvmBit,
            0x0D => Self::GetGpnvmBit,
            0x0E => Self::StartReadUniqueId,
            0x0F => Self::StopReadUniqueId,
            _ => return None,
        })
    }

    /// FCMD field value
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Build the EEFC_FCR word for this command
    pub const fn fcr_word(self, argument: u32) -> u32 {
        ((EEFC_FCR_FKEY as u32) << 24) | (argument << 8) | self as u32
    }
}

/// GPNVM bit selecting boot from flash instead of ROM
pub const GPNVM_BOOT_FROM_FLASH: u32 = 1;

/// EEFC_FMR value programmed before any erase or write
pub const fn flash_mode_word() -> u32 {
    EEFC_FMR_FWS << 8
}

/// RSTC_MR value enabling user reset with the configured external reset length
pub const fn reset_mode_word() -> u32 {
    ((RSTC_MR_KEY as u32) << 24)
        | (RSTC_MR_ERSTL << 8)
        | ResetMode::URSTEN.bits()
        | ResetMode::URSTIEN.bits()
}

/// RSTC_CR value asserting processor and external reset
pub const fn reset_control_word() -> u32 {
    ((RSTC_CR_KEY as u32) << 24) | ResetControl::PROCRST.bits() | ResetControl::EXTRST.bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcr_word_layout() {
        assert_eq!(FlashCommand::WritePage.fcr_word(3), 0x5A00_0301);
        assert_eq!(FlashCommand::EraseAll.fcr_word(0), 0x5A00_0005);
        assert_eq!(FlashCommand::SetGpnvmBit.fcr_word(1), 0x5A00_010B);
        assert_eq!(FlashCommand::ClearLockBit.fcr_word(960), 0x5A03_C009);
    }

    #[test]
    fn test_command_codes_round_trip() {
        for code in 0..=0x10u8 {
            if let Some(cmd) = FlashCommand::from_code(code) {
                assert_eq!(cmd.code(), code);
            }
        }
        assert_eq!(FlashCommand::from_code(0x02), None);
    }

    #[test]
    fn test_reset_words() {
        assert_eq!(reset_mode_word(), 0xA500_0A09);
        assert_eq!(reset_control_word(), 0xA500_0005);
        assert_eq!(flash_mode_word(), 0x0000_0600);
    }
}
