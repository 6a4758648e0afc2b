//! Flash programming sequence
//!
//! `flash` runs strictly in order: wait states, unlock, erase, program
//! firmware, program calibration, lock, verify, boot bit, reset. Nothing is
//! retried; the first error aborts the remaining steps.

use alloc::vec;
use alloc::vec::Vec;
use core::num::NonZeroUsize;

use crate::error::{Error, Result, VerifyFailure, VerifyTarget};
use crate::protocol::registers::{flash_mode_word, EEFC_FMR, GPNVM_BOOT_FROM_FLASH};
use crate::protocol::FlashCommand;
use crate::session::SambaSession;
use crate::transport::Transport;

use super::page::Pages;
use super::plan::{CalibrationLayout, FlashPlan, PageRange};
use super::progress::FlashProgress;

const FIRMWARE_LABEL: &str = "Writing firmware";
const CALIBRATION_LABEL: &str = "Writing IMU calibration";
const VERIFY_FIRMWARE_LABEL: &str = "Verifying written firmware";
const VERIFY_CALIBRATION_LABEL: &str = "Verifying written IMU calibration";

/// When the boot-from-flash GPNVM bit is set relative to verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootBitOrder {
    /// Set the bit before verifying, as the SAM-BA tooling historically did.
    /// A verification failure then leaves the chip booting unverified flash.
    BeforeVerify,
    /// Verify first and only then switch the boot source to flash
    #[default]
    AfterVerify,
}

/// Options for [`SambaSession::flash_with_options`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashOptions {
    /// Lock the lock regions holding the calibration blob
    pub lock_calibration: bool,
    /// Position of the boot bit step
    pub boot_bit_order: BootBitOrder,
    /// Reset the device once flashing is complete
    pub reset: bool,
}

impl Default for FlashOptions {
    fn default() -> Self {
        Self {
            lock_calibration: false,
            boot_bit_order: BootBitOrder::default(),
            reset: true,
        }
    }
}

impl<T: Transport> SambaSession<T> {
    /// Flash firmware and an optional calibration blob, then reboot
    ///
    /// Uses [`FlashOptions::default`] apart from `lock_calibration`.
    pub fn flash<P: FlashProgress + ?Sized>(
        &mut self,
        firmware: &[u8],
        calibration: Option<&[u8]>,
        lock_calibration: bool,
        progress: &mut P,
    ) -> Result<()> {
        let options = FlashOptions {
            lock_calibration,
            ..FlashOptions::default()
        };
        self.flash_with_options(firmware, calibration, &options, progress)
    }

    /// Flash firmware and an optional calibration blob
    ///
    /// If only the final reset fails the firmware is already written and
    /// verified; that case is reported as [`Error::ExecutionError`].
    pub fn flash_with_options<P: FlashProgress + ?Sized>(
        &mut self,
        firmware: &[u8],
        calibration: Option<&[u8]>,
        options: &FlashOptions,
        progress: &mut P,
    ) -> Result<()> {
        let page_size = NonZeroUsize::new(self.geometry.page_size as usize)
            .ok_or(Error::UnknownArchitecture)?;
        let plan = FlashPlan::new(&self.geometry, firmware.len(), calibration.map(<[u8]>::len))?;
        let firmware_pages = Pages::split(firmware, page_size);

        log::info!(
            "Flashing {} bytes of firmware ({} pages){}",
            firmware.len(),
            firmware_pages.len(),
            if calibration.is_some() {
                " with IMU calibration"
            } else {
                ""
            }
        );

        self.configure_wait_states()?;
        self.unlock_all()?;
        self.erase_all()?;

        self.write_pages(
            &firmware_pages,
            plan.firmware.first_page,
            FIRMWARE_LABEL,
            progress,
        )?;

        let calibration_pages = match calibration.zip(plan.calibration) {
            Some((blob, cal)) => {
                progress.set_label(CALIBRATION_LABEL);
                progress.set_bound(0, 0);
                progress.set_value(0);
                progress.show();

                let mut prefixed = self.read_calibration_prefix(&cal.layout)?;
                prefixed.extend_from_slice(blob);
                let pages = Pages::split(&prefixed, page_size);

                self.write_pages(&pages, cal.pages.first_page, CALIBRATION_LABEL, progress)?;
                Some((pages, cal.pages))
            }
            None => None,
        };

        self.lock_pages(plan.firmware)?;

        if let Some((_, range)) = &calibration_pages {
            if options.lock_calibration {
                self.lock_pages(*range)?;
            } else {
                log::debug!("samba: Leaving IMU calibration pages unlocked");
            }
        }

        if options.boot_bit_order == BootBitOrder::BeforeVerify {
            self.set_boot_from_flash()?;
        }

        let firmware_target = if calibration_pages.is_some() {
            VerifyTarget::Firmware
        } else {
            VerifyTarget::Unspecified
        };
        self.verify_pages(
            &firmware_pages,
            plan.firmware.first_page,
            VERIFY_FIRMWARE_LABEL,
            firmware_target,
            progress,
        )?;

        if let Some((pages, range)) = &calibration_pages {
            self.verify_pages(
                pages,
                range.first_page,
                VERIFY_CALIBRATION_LABEL,
                VerifyTarget::Calibration,
                progress,
            )?;
        }

        if options.boot_bit_order == BootBitOrder::AfterVerify {
            self.set_boot_from_flash()?;
        }

        log::info!("Flash written and verified");

        if options.reset {
            self.reset()?;
        }

        Ok(())
    }

    fn configure_wait_states(&mut self) -> Result<()> {
        log::debug!("samba: Configuring flash wait states");
        self.samba.write_u32(EEFC_FMR, flash_mode_word())
    }

    fn unlock_all(&mut self) -> Result<()> {
        log::debug!("samba: Unlocking {} lock regions", self.geometry.lockbit_count);
        for lockbit in 0..self.geometry.lockbit_count {
            self.samba.wait_for_flash_ready(true)?;
            let page = self.geometry.lockbit_page(lockbit);
            self.samba
                .write_flash_command(FlashCommand::ClearLockBit, page)?;
        }
        Ok(())
    }

    fn erase_all(&mut self) -> Result<()> {
        log::info!("Erasing flash");
        self.samba.wait_for_flash_ready(true)?;
        self.samba.write_flash_command(FlashCommand::EraseAll, 0)?;
        self.samba.wait_for_flash_ready(true)
    }

    fn set_boot_from_flash(&mut self) -> Result<()> {
        log::debug!("samba: Setting boot-from-flash bit");
        self.samba.wait_for_flash_ready(true)?;
        self.samba
            .write_flash_command(FlashCommand::SetGpnvmBit, GPNVM_BOOT_FROM_FLASH)?;
        self.samba.wait_for_flash_ready(true)
    }

    /// Read the bytes of the calibration's first page that precede the blob
    fn read_calibration_prefix(&mut self, layout: &CalibrationLayout) -> Result<Vec<u8>> {
        let address = layout.prefix_address(&self.geometry);
        let prefix_len = layout.prefix_len as usize;
        let mut prefix = Vec::with_capacity(prefix_len + 4);

        while prefix.len() < prefix_len {
            let word = self.samba.read_word(address + prefix.len() as u32)?;
            prefix.extend_from_slice(&word);
        }
        prefix.truncate(prefix_len);

        log::debug!(
            "samba: Preserving {} bytes at 0x{:08X} ahead of calibration",
            prefix_len,
            address
        );
        Ok(prefix)
    }

    fn write_pages<P: FlashProgress + ?Sized>(
        &mut self,
        pages: &Pages,
        first_page: u32,
        label: &str,
        progress: &mut P,
    ) -> Result<()> {
        progress.set_label(label);
        progress.set_bound(0, pages.len());
        progress.set_value(0);
        progress.show();

        for (index, page) in pages.iter().enumerate() {
            let page_num = first_page + index as u32;
            let page_address = self.geometry.page_address(page_num);

            for (offset, word) in page.chunks_exact(4).enumerate() {
                let address = page_address + (offset * 4) as u32;
                self.samba
                    .write_word(address, [word[0], word[1], word[2], word[3]])?;
            }

            self.samba.wait_for_flash_ready(true)?;
            self.samba
                .write_flash_command(FlashCommand::WritePage, page_num)?;
            self.samba.wait_for_flash_ready(true)?;

            progress.set_value(index + 1);
            progress.pump_events();
        }

        log::debug!("samba: Wrote pages {}..{}", first_page, first_page + pages.len() as u32);
        Ok(())
    }

    fn verify_pages<P: FlashProgress + ?Sized>(
        &mut self,
        pages: &Pages,
        first_page: u32,
        label: &str,
        target: VerifyTarget,
        progress: &mut P,
    ) -> Result<()> {
        progress.set_label(label);
        progress.set_bound(0, pages.len());
        progress.set_value(0);
        progress.show();

        let mut read_back = vec![0u8; pages.page_size()];

        for (index, page) in pages.iter().enumerate() {
            let page_address = self.geometry.page_address(first_page + index as u32);
            self.samba.read_bytes(page_address, &mut read_back)?;

            if let Some(offset) = read_back.iter().zip(page).position(|(a, b)| a != b) {
                let failure = VerifyFailure {
                    target,
                    address: page_address + offset as u32,
                    expected: page[offset],
                    found: read_back[offset],
                };
                log::error!("samba: {}", failure);
                return Err(Error::VerificationError(failure));
            }

            progress.set_value(index + 1);
            progress.pump_events();
        }

        Ok(())
    }

    /// Lock every lock region touching `range`
    fn lock_pages(&mut self, range: PageRange) -> Result<()> {
        let pages_per_region = self.geometry.pages_per_lockregion();
        let region = range.lock_region(&self.geometry);

        log::debug!(
            "samba: Locking pages {}..{} (requested {}..{})",
            region.start_page,
            region.end_page,
            range.first_page,
            range.end_page()
        );

        for lockbit in region.lock_bits(pages_per_region) {
            self.samba.wait_for_flash_ready(true)?;
            let page = self.geometry.lockbit_page(lockbit);
            self.samba.write_flash_command(FlashCommand::SetLockBit, page)?;
        }

        self.samba.wait_for_flash_ready(true)
    }
}
