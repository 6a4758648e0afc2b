//! Bootloader session
//!
//! A session is established once per connection: it performs the handshake,
//! reads the chip identification register and resolves the flash geometry.
//! The geometry is never queried again for the lifetime of the session.

use crate::chip::{ChipArchitecture, ChipId, FlashGeometry};
use crate::error::Result;
use crate::protocol::registers::*;
use crate::protocol::Samba;
use crate::transport::Transport;

/// An established SAM-BA session
pub struct SambaSession<T: Transport> {
    pub(crate) samba: Samba<T>,
    chip_id: ChipId,
    architecture: ChipArchitecture,
    pub(crate) geometry: FlashGeometry,
}

impl<T: Transport> SambaSession<T> {
    /// Establish a session over an opened transport
    ///
    /// Fails with [`Error::NotInBootloader`](crate::Error::NotInBootloader)
    /// before touching any register if the handshake fails, and with
    /// [`Error::UnknownArchitecture`](crate::Error::UnknownArchitecture) if
    /// the chip is not one we know the geometry of.
    pub fn establish(transport: T) -> Result<Self> {
        let mut samba = Samba::new(transport);

        samba.handshake()?;
        log::debug!("samba: Bootloader answered handshake");

        let chip_id = ChipId(samba.read_u32(CHIPID_CIDR)?);
        let architecture = ChipArchitecture::from_code(chip_id.arch())?;
        let geometry = architecture.geometry();

        log::info!(
            "Found {} (CIDR {}), {} KiB flash in {} pages of {} bytes",
            architecture,
            chip_id,
            geometry.flash_size / 1024,
            geometry.page_count,
            geometry.page_size
        );
        if let Some(nvm_size) = chip_id.nvm_size() {
            if nvm_size != geometry.flash_size {
                log::warn!(
                    "samba: CIDR reports {} KiB flash, using {} KiB",
                    nvm_size / 1024,
                    geometry.flash_size / 1024
                );
            }
        }

        Ok(Self {
            samba,
            chip_id,
            architecture,
            geometry,
        })
    }

    /// Raw chip identification
    pub fn chip_id(&self) -> ChipId {
        self.chip_id
    }

    /// Resolved architecture
    pub fn architecture(&self) -> ChipArchitecture {
        self.architecture
    }

    /// Flash geometry of the connected chip
    pub fn geometry(&self) -> &FlashGeometry {
        &self.geometry
    }

    /// Register access for operations not covered by the session
    pub fn samba_mut(&mut self) -> &mut Samba<T> {
        &mut self.samba
    }

    /// End the session and release the transport
    pub fn into_transport(self) -> T {
        self.samba.into_inner()
    }

    /// Read the 64-bit unique identifier
    ///
    /// While the controller is in unique identifier mode it reports busy and
    /// the first flash words return the identifier instead of flash content.
    pub fn read_uid(&mut self) -> Result<u64> {
        let base = self.geometry.flash_base;

        self.samba
            .write_flash_command(FlashCommand::StartReadUniqueId, 0)?;
        self.samba.wait_for_flash_ready(false)?;

        let low = self.samba.read_u32(base + 8)?;
        let high = self.samba.read_u32(base + 12)?;

        self.samba
            .write_flash_command(FlashCommand::StopReadUniqueId, 0)?;
        self.samba.wait_for_flash_ready(true)?;

        let uid = (u64::from(high) << 32) | u64::from(low);
        log::debug!("samba: Unique identifier {:016X}", uid);
        Ok(uid)
    }

    /// Reset the processor and external peripherals
    ///
    /// Nothing is read back. A failed write is reported as
    /// [`Error::ExecutionError`](crate::Error::ExecutionError).
    pub fn reset(&mut self) -> Result<()> {
        log::debug!("samba: Resetting device");
        self.samba
            .write_u32(RSTC_MR, reset_mode_word())
            .and_then(|()| self.samba.write_u32(RSTC_CR, reset_control_word()))
            .map_err(|e| {
                log::error!("samba: Reset failed: {}", e);
                crate::Error::ExecutionError
            })
    }

    /// Jump to code at `address`
    pub fn go(&mut self, address: u32) -> Result<()> {
        log::debug!("samba: Jumping to 0x{:08X}", address);
        self.samba.go(address)
    }
}
