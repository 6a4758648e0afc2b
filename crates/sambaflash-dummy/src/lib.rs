//! sambaflash-dummy - Simulated SAM-BA bootloader for testing
//!
//! This crate provides an in-memory model of a SAM3S in bootloader mode. It
//! parses the SAM-BA request stream written to it and answers like the ROM
//! would, backed by a model of the enhanced embedded flash controller (EEFC):
//! flash array, page latch, lock bits, GPNVM bits and unique identifier
//! mode. Faults can be injected to exercise error paths.

use std::collections::VecDeque;

use sambaflash_core::chip::{ChipArchitecture, FlashGeometry};
use sambaflash_core::error::TransportError;
use sambaflash_core::flash::ERASE_VALUE;
use sambaflash_core::protocol::registers::*;
use sambaflash_core::protocol::request::{HANDSHAKE_REPLY, TERMINATOR};
use sambaflash_core::protocol::{FlashCommand, FlashStatus, Request};
use sambaflash_core::Transport;

/// Number of GPNVM bits on SAM3S
const GPNVM_COUNT: u32 = 3;

/// Size of the unique identifier area mapped over flash in UID mode
const UID_AREA_SIZE: u32 = 16;

/// Failure injected into the simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Raise FCMDE after the given command has run
    CommandErrorAfter(FlashCommand),
    /// Raise FLOCKE after the given command has run
    LockErrorAfter(FlashCommand),
    /// FRDY is never set
    NeverReady,
    /// Requests addressed at this address fail at the transport level
    FailRequestsTo(u32),
    /// Flip a bit in the first byte of this page when it is programmed
    CorruptPage(u32),
}

/// Configuration for the simulated device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Flash geometry to model
    pub geometry: FlashGeometry,
    /// Value returned by CHIPID_CIDR
    pub chip_id: u32,
    /// 64-bit unique identifier
    pub unique_id: u64,
    /// Reply to the `N#` handshake
    pub handshake_reply: Vec<u8>,
    /// FSR reads that report busy after each command
    pub busy_polls: u32,
}

impl DummyConfig {
    /// Configuration for a known architecture
    pub fn for_architecture(architecture: ChipArchitecture) -> Self {
        let chip_id = match architecture {
            ChipArchitecture::Sam3sxB => 0x289A_0760, // ATSAM3S2B
            ChipArchitecture::Sam3sxC => 0x28A0_0960, // ATSAM3S4C
        };
        Self {
            geometry: architecture.geometry(),
            chip_id,
            unique_id: 0x0123_4567_89AB_CDEF,
            handshake_reply: HANDSHAKE_REPLY.to_vec(),
            busy_polls: 1,
        }
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::for_architecture(ChipArchitecture::Sam3sxB)
    }
}

/// Simulated SAM-BA bootloader
pub struct DummyBootloader {
    config: DummyConfig,
    flash: Vec<u8>,
    latch: Vec<u8>,
    lock_bits: Vec<bool>,
    gpnvm: u32,
    status: FlashStatus,
    busy_remaining: u32,
    uid_mode: bool,
    fmr: u32,
    frr: u32,
    rstc_mr: u32,
    reset_count: u32,
    go_address: Option<u32>,
    line: Vec<u8>,
    replies: VecDeque<u8>,
    faults: Vec<Fault>,
    requests: Vec<Request>,
    commands: Vec<(FlashCommand, u32)>,
    fsr_reads: usize,
}

impl DummyBootloader {
    /// Create a simulated device with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let geometry = config.geometry;
        Self {
            flash: vec![ERASE_VALUE; geometry.flash_size as usize],
            latch: vec![ERASE_VALUE; geometry.page_size as usize],
            lock_bits: vec![false; geometry.lockbit_count as usize],
            gpnvm: 0,
            status: FlashStatus::empty(),
            busy_remaining: 0,
            uid_mode: false,
            fmr: 0,
            frr: 0,
            rstc_mr: 0,
            reset_count: 0,
            go_address: None,
            line: Vec::new(),
            replies: VecDeque::new(),
            faults: Vec::new(),
            requests: Vec::new(),
            commands: Vec::new(),
            fsr_reads: 0,
            config,
        }
    }

    /// Create a simulated ATSAM3SxB
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a simulated device with pre-filled flash
    pub fn with_flash(config: DummyConfig, initial: &[u8]) -> Self {
        let mut device = Self::new(config);
        let len = initial.len().min(device.flash.len());
        device.flash[..len].copy_from_slice(&initial[..len]);
        device
    }

    /// Add a fault
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Add a fault to a device already in use
    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    /// Flash contents
    pub fn flash(&self) -> &[u8] {
        &self.flash
    }

    /// Lock bit states, one per lock region
    pub fn lock_bits(&self) -> &[bool] {
        &self.lock_bits
    }

    /// Set a lock bit directly
    pub fn set_lock_bit(&mut self, region: usize, locked: bool) {
        self.lock_bits[region] = locked;
    }

    /// Whether the chip would boot from flash
    pub fn boots_from_flash(&self) -> bool {
        self.gpnvm & (1 << GPNVM_BOOT_FROM_FLASH) != 0
    }

    /// Last value written to EEFC_FMR
    pub fn flash_mode(&self) -> u32 {
        self.fmr
    }

    /// Last value written to RSTC_MR
    pub fn reset_mode(&self) -> u32 {
        self.rstc_mr
    }

    /// Number of processor resets requested through RSTC_CR
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    /// Target of the last `G` request
    pub fn go_address(&self) -> Option<u32> {
        self.go_address
    }

    /// Every request received, in order
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Every EEFC command accepted, with its argument
    pub fn commands(&self) -> &[(FlashCommand, u32)] {
        &self.commands
    }

    /// Arguments of every accepted `command`
    pub fn command_args(&self, command: FlashCommand) -> Vec<u32> {
        self.commands
            .iter()
            .filter(|(cmd, _)| *cmd == command)
            .map(|(_, arg)| *arg)
            .collect()
    }

    /// Number of EEFC_FSR reads
    pub fn fsr_reads(&self) -> usize {
        self.fsr_reads
    }

    /// Forget recorded requests, commands and FSR reads
    pub fn clear_log(&mut self) {
        self.requests.clear();
        self.commands.clear();
        self.fsr_reads = 0;
    }

    fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    fn flash_offset(&self, address: u32) -> Option<u32> {
        let geometry = &self.config.geometry;
        address
            .checked_sub(geometry.flash_base)
            .filter(|offset| *offset < geometry.flash_size)
    }

    fn dispatch(&mut self, line: &[u8]) -> Result<(), TransportError> {
        let text = String::from_utf8_lossy(line);
        let Some(request) = Request::parse(&text) else {
            log::warn!("dummy: Ignoring unknown request {:?}", text);
            return Ok(());
        };

        if let Some(address) = request.address() {
            if self.has_fault(Fault::FailRequestsTo(address)) {
                log::debug!("dummy: Injected transport failure for {}", request);
                return Err(TransportError::Io);
            }
        }

        self.requests.push(request);

        match request {
            Request::Handshake => {
                self.replies.extend(self.config.handshake_reply.iter().copied());
            }
            Request::ReadWord { address } => {
                let value = self.read_u32(address);
                self.replies.extend(value.to_le_bytes());
            }
            Request::WriteWord { address, value } => self.write_u32(address, value),
            Request::ReadBytes { address, len } => {
                for i in 0..len {
                    let byte = self.read_byte(address.wrapping_add(i));
                    self.replies.push_back(byte);
                }
            }
            Request::Go { address } => self.go_address = Some(address),
        }

        Ok(())
    }

    fn read_byte(&self, address: u32) -> u8 {
        let Some(offset) = self.flash_offset(address) else {
            return 0;
        };

        if self.uid_mode && offset < UID_AREA_SIZE {
            let mut area = [0u8; UID_AREA_SIZE as usize];
            area[8..].copy_from_slice(&self.config.unique_id.to_le_bytes());
            return area[offset as usize];
        }

        self.flash[offset as usize]
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        match address {
            CHIPID_CIDR => self.config.chip_id,
            EEFC_FSR => self.read_status(),
            EEFC_FMR => self.fmr,
            EEFC_FRR => self.frr,
            RSTC_MR => self.rstc_mr,
            _ => u32::from_le_bytes([
                self.read_byte(address),
                self.read_byte(address.wrapping_add(1)),
                self.read_byte(address.wrapping_add(2)),
                self.read_byte(address.wrapping_add(3)),
            ]),
        }
    }

    /// FSR read; error bits clear on read
    fn read_status(&mut self) -> u32 {
        self.fsr_reads += 1;

        let mut status = self.status;
        self.status = FlashStatus::empty();

        let busy = self.busy_remaining > 0;
        self.busy_remaining = self.busy_remaining.saturating_sub(1);

        if !busy && !self.uid_mode && !self.has_fault(Fault::NeverReady) {
            status |= FlashStatus::FRDY;
        }
        status.bits()
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        match address {
            EEFC_FMR => self.fmr = value,
            EEFC_FCR => self.execute(value),
            RSTC_MR => self.rstc_mr = value,
            RSTC_CR => {
                let key = (value >> 24) as u8;
                if key == RSTC_CR_KEY && value & ResetControl::PROCRST.bits() != 0 {
                    log::debug!("dummy: Processor reset");
                    self.reset_count += 1;
                    self.uid_mode = false;
                }
            }
            _ => match self.flash_offset(address) {
                Some(offset) => {
                    let start = (offset % self.config.geometry.page_size) as usize;
                    if let Some(slot) = self.latch.get_mut(start..start + 4) {
                        slot.copy_from_slice(&value.to_le_bytes());
                    }
                }
                None => log::trace!("dummy: Ignoring write to 0x{:08X}", address),
            },
        }
    }

    fn execute(&mut self, word: u32) {
        if (word >> 24) as u8 != EEFC_FCR_FKEY {
            self.status |= FlashStatus::FCMDE;
            return;
        }

        let Some(command) = FlashCommand::from_code(word as u8) else {
            self.status |= FlashStatus::FCMDE;
            return;
        };
        let argument = (word >> 8) & 0xFFFF;

        self.commands.push((command, argument));
        self.busy_remaining = self.config.busy_polls;

        let geometry = self.config.geometry;
        let pages_per_region = geometry.pages_per_lockregion();

        match command {
            FlashCommand::WritePage => self.program_page(argument),
            FlashCommand::EraseAll => {
                if self.lock_bits.iter().any(|&locked| locked) {
                    self.status |= FlashStatus::FLOCKE;
                } else {
                    self.flash.fill(ERASE_VALUE);
                }
            }
            FlashCommand::SetLockBit | FlashCommand::ClearLockBit => {
                if argument >= geometry.page_count {
                    self.status |= FlashStatus::FCMDE;
                } else {
                    let region = (argument / pages_per_region) as usize;
                    self.lock_bits[region] = command == FlashCommand::SetLockBit;
                }
            }
            FlashCommand::GetLockBit => {
                self.frr = self
                    .lock_bits
                    .iter()
                    .enumerate()
                    .filter(|(_, locked)| **locked)
                    .fold(0, |acc, (i, _)| acc | (1 << i));
            }
            FlashCommand::SetGpnvmBit | FlashCommand::ClearGpnvmBit => {
                if argument >= GPNVM_COUNT {
                    self.status |= FlashStatus::FCMDE;
                } else if command == FlashCommand::SetGpnvmBit {
                    self.gpnvm |= 1 << argument;
                } else {
                    self.gpnvm &= !(1 << argument);
                }
            }
            FlashCommand::GetGpnvmBit => self.frr = self.gpnvm,
            FlashCommand::StartReadUniqueId => self.uid_mode = true,
            FlashCommand::StopReadUniqueId => self.uid_mode = false,
        }

        if self.has_fault(Fault::CommandErrorAfter(command)) {
            self.status |= FlashStatus::FCMDE;
        }
        if self.has_fault(Fault::LockErrorAfter(command)) {
            self.status |= FlashStatus::FLOCKE;
        }
    }

    fn program_page(&mut self, page: u32) {
        let geometry = self.config.geometry;

        if page >= geometry.page_count {
            self.status |= FlashStatus::FCMDE;
            return;
        }
        if self.lock_bits[(page / geometry.pages_per_lockregion()) as usize] {
            self.status |= FlashStatus::FLOCKE;
            return;
        }

        let corrupt = self.has_fault(Fault::CorruptPage(page));

        // Programming can only clear bits
        let start = (page * geometry.page_size) as usize;
        let target = &mut self.flash[start..start + geometry.page_size as usize];
        for (byte, latched) in target.iter_mut().zip(&self.latch) {
            *byte &= latched;
        }

        if corrupt {
            target[0] ^= 0x01;
        }

        self.latch.fill(ERASE_VALUE);
    }
}

impl Transport for DummyBootloader {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        for &byte in data {
            if byte == TERMINATOR {
                let line = std::mem::take(&mut self.line);
                self.dispatch(&line)?;
            } else {
                self.line.push(byte);
            }
        }
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        if self.replies.len() < buf.len() {
            self.replies.clear();
            return Err(TransportError::Timeout);
        }
        let len = buf.len();
        for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..len)) {
            *slot = byte;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sambaflash_core::protocol::Samba;

    #[test]
    fn test_handshake_and_chip_id() {
        let mut samba = Samba::new(DummyBootloader::new_default());
        samba.handshake().unwrap();
        assert_eq!(samba.read_u32(CHIPID_CIDR).unwrap(), 0x289A_0760);
    }

    #[test]
    fn test_program_and_read_back() {
        let mut samba = Samba::new(DummyBootloader::new_default());
        samba.write_word(0x400104, [1, 2, 3, 4]).unwrap();
        samba.wait_for_flash_ready(true).unwrap();
        samba.write_flash_command(FlashCommand::WritePage, 1).unwrap();
        samba.wait_for_flash_ready(true).unwrap();

        let mut buf = [0u8; 8];
        samba.read_bytes(0x400100, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3, 4]);
    }

    #[test]
    fn test_locked_page_rejects_write() {
        let mut device = DummyBootloader::new_default();
        device.set_lock_bit(0, true);
        let mut samba = Samba::new(device);

        samba.write_flash_command(FlashCommand::WritePage, 3).unwrap();
        assert_eq!(
            samba.wait_for_flash_ready(true),
            Err(sambaflash_core::Error::FlashLockingError)
        );
    }

    #[test]
    fn test_bad_key_is_command_error() {
        let mut samba = Samba::new(DummyBootloader::new_default());
        samba.write_u32(EEFC_FCR, 0x0000_0005).unwrap();
        assert_eq!(
            samba.wait_for_flash_ready(true),
            Err(sambaflash_core::Error::FlashCommandError)
        );
        // Error bits clear on read
        samba.wait_for_flash_ready(true).unwrap();
    }

    #[test]
    fn test_missing_reply_times_out() {
        let mut device = DummyBootloader::new_default();
        let mut buf = [0u8; 4];
        assert_eq!(device.read_exact(&mut buf), Err(TransportError::Timeout));
    }

    #[test]
    fn test_lock_bit_readback() {
        let mut samba = Samba::new(DummyBootloader::new_default());
        samba
            .write_flash_command(FlashCommand::SetLockBit, 192)
            .unwrap();
        samba.write_flash_command(FlashCommand::GetLockBit, 0).unwrap();
        assert_eq!(samba.flash_result().unwrap(), 1 << 3);
    }
}
