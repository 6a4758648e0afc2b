//! Register access over a SAM-BA transport
//!
//! `Samba` owns the transport and provides word, byte and flash controller
//! access. Every transport failure is folded into [`Error::ReadError`] or
//! [`Error::WriteError`] with the address that was being accessed.

use crate::error::{Error, Result, TransportError};
use crate::transport::Transport;

use super::registers::*;
use super::request::{Request, HANDSHAKE_REPLY};

/// SAM-BA register access client
pub struct Samba<T: Transport> {
    transport: T,
}

impl<T: Transport> Samba<T> {
    /// Wrap an opened transport
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Get a reference to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Probe for the bootloader
    ///
    /// Sends `N#` and expects exactly `\n\r` back. Any other reply, a short
    /// reply or a transport failure means no bootloader is listening.
    pub fn handshake(&mut self) -> Result<()> {
        let mut reply = [0u8; HANDSHAKE_REPLY.len()];
        let outcome = self
            .send(&Request::Handshake)
            .and_then(|()| self.transport.read_exact(&mut reply));

        match outcome {
            Ok(()) if reply == HANDSHAKE_REPLY => Ok(()),
            Ok(()) => {
                log::debug!("samba: Unexpected handshake reply {:02X?}", reply);
                Err(Error::NotInBootloader)
            }
            Err(e) => {
                log::debug!("samba: Handshake failed: {}", e);
                Err(Error::NotInBootloader)
            }
        }
    }

    /// Read a 32-bit word as raw little-endian bytes
    pub fn read_word(&mut self, address: u32) -> Result<[u8; 4]> {
        let mut word = [0u8; 4];
        self.send(&Request::ReadWord { address })
            .and_then(|()| self.transport.read_exact(&mut word))
            .map_err(|e| read_error(address, e))?;
        Ok(word)
    }

    /// Read a 32-bit register
    pub fn read_u32(&mut self, address: u32) -> Result<u32> {
        self.read_word(address).map(u32::from_le_bytes)
    }

    /// Write a 32-bit register
    pub fn write_u32(&mut self, address: u32, value: u32) -> Result<()> {
        self.send(&Request::WriteWord { address, value })
            .map_err(|e| write_error(address, e))
    }

    /// Write four raw bytes as one little-endian word
    pub fn write_word(&mut self, address: u32, word: [u8; 4]) -> Result<()> {
        self.write_u32(address, u32::from_le_bytes(word))
    }

    /// Read `buf.len()` raw bytes starting at `address`
    pub fn read_bytes(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        let len = buf.len() as u32;
        self.send(&Request::ReadBytes { address, len })
            .and_then(|()| self.transport.read_exact(buf))
            .map_err(|e| read_error(address, e))
    }

    /// Jump to code at `address`
    pub fn go(&mut self, address: u32) -> Result<()> {
        self.send(&Request::Go { address }).map_err(|e| {
            log::debug!("samba: Go to 0x{:08X} failed: {}", address, e);
            Error::ExecutionError
        })
    }

    /// Issue an EEFC command
    ///
    /// Callers bracket this with [`Samba::wait_for_flash_ready`].
    pub fn write_flash_command(&mut self, command: FlashCommand, argument: u32) -> Result<()> {
        log::trace!("samba: EEFC command {:?} arg {}", command, argument);
        self.write_u32(EEFC_FCR, command.fcr_word(argument))
    }

    /// Read EEFC_FSR
    pub fn flash_status(&mut self) -> Result<FlashStatus> {
        self.read_u32(EEFC_FSR).map(FlashStatus::from_bits_retain)
    }

    /// Read EEFC_FRR
    pub fn flash_result(&mut self) -> Result<u32> {
        self.read_u32(EEFC_FRR)
    }

    /// Poll EEFC_FSR until FRDY equals `expect_ready`
    ///
    /// Gives up with [`Error::FlashTimeout`] after
    /// [`FLASH_READY_POLL_LIMIT`] reads. Lock and command error bits abort
    /// immediately.
    pub fn wait_for_flash_ready(&mut self, expect_ready: bool) -> Result<()> {
        for _ in 0..FLASH_READY_POLL_LIMIT {
            let status = self.flash_status()?;

            if status.contains(FlashStatus::FLOCKE) {
                log::error!("samba: Flash locking error (FSR 0x{:08X})", status.bits());
                return Err(Error::FlashLockingError);
            }

            if status.contains(FlashStatus::FCMDE) {
                log::error!("samba: Flash command error (FSR 0x{:08X})", status.bits());
                return Err(Error::FlashCommandError);
            }

            if status.contains(FlashStatus::FRDY) == expect_ready {
                return Ok(());
            }
        }

        log::error!(
            "samba: Flash did not become {} after {} polls",
            if expect_ready { "ready" } else { "busy" },
            FLASH_READY_POLL_LIMIT
        );
        Err(Error::FlashTimeout)
    }

    fn send(&mut self, request: &Request) -> core::result::Result<(), TransportError> {
        let line = request.encode();
        self.transport.write(line.as_bytes())
    }
}

fn read_error(address: u32, e: TransportError) -> Error {
    log::debug!("samba: Read at 0x{:08X} failed: {}", address, e);
    Error::ReadError { address }
}

fn write_error(address: u32, e: TransportError) -> Error {
    log::debug!("samba: Write at 0x{:08X} failed: {}", address, e);
    Error::WriteError { address }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::VecDeque;
    use alloc::string::String;
    use alloc::vec::Vec;

    /// Records writes and replays canned reply bytes
    #[derive(Default)]
    struct Scripted {
        written: String,
        replies: VecDeque<u8>,
        fail_writes: bool,
        reads: usize,
    }

    impl Scripted {
        fn reply(mut self, bytes: &[u8]) -> Self {
            self.replies.extend(bytes.iter().copied());
            self
        }

        fn reply_words(mut self, words: &[u32]) -> Self {
            for word in words {
                self.replies.extend(word.to_le_bytes());
            }
            self
        }
    }

    impl Transport for Scripted {
        fn write(&mut self, data: &[u8]) -> core::result::Result<(), TransportError> {
            if self.fail_writes {
                return Err(TransportError::Io);
            }
            self.written.push_str(core::str::from_utf8(data).unwrap());
            Ok(())
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> core::result::Result<(), TransportError> {
            if self.replies.len() < buf.len() {
                return Err(TransportError::Timeout);
            }
            for b in buf.iter_mut() {
                *b = self.replies.pop_front().unwrap();
            }
            self.reads += 1;
            Ok(())
        }
    }

    #[test]
    fn test_handshake_ok() {
        let mut samba = Samba::new(Scripted::default().reply(b"\n\r"));
        samba.handshake().unwrap();
        assert_eq!(samba.transport().written, "N#");
    }

    #[test]
    fn test_handshake_wrong_reply() {
        let mut samba = Samba::new(Scripted::default().reply(b"\r\n"));
        assert_eq!(samba.handshake(), Err(Error::NotInBootloader));
    }

    #[test]
    fn test_handshake_timeout() {
        let mut samba = Samba::new(Scripted::default().reply(b"\n"));
        assert_eq!(samba.handshake(), Err(Error::NotInBootloader));
    }

    #[test]
    fn test_read_u32_is_little_endian() {
        let mut samba = Samba::new(Scripted::default().reply(&[0x60, 0x07, 0x9A, 0x28]));
        assert_eq!(samba.read_u32(CHIPID_CIDR).unwrap(), 0x289A_0760);
        assert_eq!(samba.transport().written, "w400E0740,4#");
    }

    #[test]
    fn test_write_word_uses_value_encoding() {
        let mut samba = Samba::new(Scripted::default());
        samba.write_word(0x400000, [0x78, 0x56, 0x34, 0x12]).unwrap();
        assert_eq!(samba.transport().written, "W00400000,12345678#");
    }

    #[test]
    fn test_read_bytes() {
        let mut samba = Samba::new(Scripted::default().reply(&[1, 2, 3]));
        let mut buf = [0u8; 3];
        samba.read_bytes(0x400010, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(samba.transport().written, "R400010,3#");
    }

    #[test]
    fn test_transport_errors_are_normalized() {
        let mut samba = Samba::new(Scripted::default());
        assert_eq!(
            samba.read_u32(EEFC_FSR),
            Err(Error::ReadError { address: EEFC_FSR })
        );

        samba.transport_mut().fail_writes = true;
        assert_eq!(
            samba.write_u32(EEFC_FMR, 0),
            Err(Error::WriteError { address: EEFC_FMR })
        );
        assert_eq!(samba.go(0x400000), Err(Error::ExecutionError));
    }

    #[test]
    fn test_flash_command_word() {
        let mut samba = Samba::new(Scripted::default());
        samba
            .write_flash_command(FlashCommand::WritePage, 0x1DB)
            .unwrap();
        assert_eq!(samba.transport().written, "W400E0A04,5A01DB01#");
    }

    #[test]
    fn test_wait_ready_returns_once_ready() {
        let mut samba = Samba::new(Scripted::default().reply_words(&[0, 0, 1]));
        samba.wait_for_flash_ready(true).unwrap();
        assert_eq!(samba.transport().reads, 3);
    }

    #[test]
    fn test_wait_not_ready() {
        let mut samba = Samba::new(Scripted::default().reply_words(&[1, 0]));
        samba.wait_for_flash_ready(false).unwrap();
        assert_eq!(samba.transport().reads, 2);
    }

    #[test]
    fn test_wait_ready_error_bits() {
        let mut samba = Samba::new(Scripted::default().reply_words(&[0x3]));
        assert_eq!(
            samba.wait_for_flash_ready(true),
            Err(Error::FlashCommandError)
        );

        // Lock error wins over command error
        let mut samba = Samba::new(Scripted::default().reply_words(&[0x7]));
        assert_eq!(
            samba.wait_for_flash_ready(true),
            Err(Error::FlashLockingError)
        );
    }

    #[test]
    fn test_wait_ready_is_bounded() {
        let busy: Vec<u32> = (0..FLASH_READY_POLL_LIMIT + 5).map(|_| 0).collect();
        let mut samba = Samba::new(Scripted::default().reply_words(&busy));
        assert_eq!(samba.wait_for_flash_ready(true), Err(Error::FlashTimeout));
        assert_eq!(samba.transport().reads, FLASH_READY_POLL_LIMIT as usize);
    }
}
