//! Error types for sambaflash-core
//!
//! A single flat taxonomy covers every failure the flashing core can report.
//! Each variant maps to a distinct recovery posture for the caller, see
//! [`Error::recovery_hint`].

use core::fmt;

/// Which payload a verification failure was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyTarget {
    /// Application firmware
    Firmware,
    /// IMU calibration blob near the top of flash
    Calibration,
    /// Only one payload was written, so no tag is reported
    Unspecified,
}

impl VerifyTarget {
    /// Human-readable name used in messages
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::Firmware => Some("firmware"),
            Self::Calibration => Some("IMU calibration"),
            Self::Unspecified => None,
        }
    }
}

/// Details about a read-back mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyFailure {
    /// Payload that failed to verify
    pub target: VerifyTarget,
    /// Absolute address of the first differing byte
    pub address: u32,
    /// Byte that was written
    pub expected: u8,
    /// Byte that was read back
    pub found: u8,
}

/// Low-level transport failure
///
/// Transports report only these two kinds. The register protocol folds them
/// into [`Error::ReadError`] or [`Error::WriteError`] so callers never see
/// transport-specific error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Fewer bytes than requested arrived before the read timeout
    Timeout,
    /// Any other I/O failure
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "transport timed out"),
            Self::Io => write!(f, "transport I/O error"),
        }
    }
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// The serial port exists but is in use or not accessible
    PermissionDenied,
    /// The serial port could not be opened
    TransportUnavailable,

    // Session errors
    /// The handshake did not get the bootloader's `\n\r` reply
    NotInBootloader,
    /// Chip identification returned an architecture code we have no geometry for
    UnknownArchitecture(u8),

    // Register access errors
    /// A register or memory read failed at the transport level
    ReadError {
        /// Address that was being read
        address: u32,
    },
    /// A register or memory write failed at the transport level
    WriteError {
        /// Address that was being written
        address: u32,
    },

    // Flash controller errors
    /// The controller reported a write or erase to a locked region
    FlashLockingError,
    /// The controller rejected a command (bad key or argument)
    FlashCommandError,
    /// The controller did not reach the expected ready state in time
    FlashTimeout,

    // Flashing errors
    /// Data read back after programming does not match
    VerificationError(VerifyFailure),
    /// The `go` or reset directive failed at the transport level
    ExecutionError,
    /// Payload does not fit the space available for it
    ImageTooLarge {
        /// Payload length in bytes
        len: usize,
        /// Largest length that fits
        max: usize,
    },
}

impl Error {
    /// Short advice on how a caller should recover from this error
    pub const fn recovery_hint(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "check that no other program is using the port and that you may access it"
            }
            Self::TransportUnavailable => "check the port name and that the device is connected",
            Self::NotInBootloader => "put the device into bootloader mode and try again",
            Self::UnknownArchitecture(_) => "this chip is not supported by this version",
            Self::ReadError { .. }
            | Self::WriteError { .. }
            | Self::FlashLockingError
            | Self::FlashCommandError
            | Self::FlashTimeout
            | Self::VerificationError(_) => {
                "the device may be partially flashed, re-enter bootloader mode and flash again"
            }
            Self::ExecutionError => {
                "the firmware was written and verified, power-cycle the device to start it"
            }
            Self::ImageTooLarge { .. } => "nothing was written, use a smaller image",
        }
    }
}

impl fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target.name() {
            Some(name) => write!(f, "verification error ({})", name)?,
            None => write!(f, "verification error")?,
        }
        write!(
            f,
            " at 0x{:08X}: expected 0x{:02X}, found 0x{:02X}",
            self.address, self.expected, self.found
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "no permission to open serial port"),
            Self::TransportUnavailable => write!(f, "serial port unavailable"),
            Self::NotInBootloader => write!(f, "no device in bootloader mode found"),
            Self::UnknownArchitecture(code) => {
                write!(f, "device with unknown SAM3S architecture: 0x{:X}", code)
            }
            Self::ReadError { address } => write!(f, "read error at 0x{:08X}", address),
            Self::WriteError { address } => write!(f, "write error at 0x{:08X}", address),
            Self::FlashLockingError => write!(f, "flash locking error"),
            Self::FlashCommandError => write!(f, "flash command error"),
            Self::FlashTimeout => write!(f, "flash timeout"),
            Self::VerificationError(failure) => write!(f, "{}", failure),
            Self::ExecutionError => write!(f, "execution error"),
            Self::ImageTooLarge { len, max } => {
                write!(f, "image of {} bytes exceeds the {} bytes available", len, max)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_verification_message_is_tagged() {
        let err = Error::VerificationError(VerifyFailure {
            target: VerifyTarget::Calibration,
            address: 0x41DBF4,
            expected: 0x12,
            found: 0xFF,
        });
        assert_eq!(
            err.to_string(),
            "verification error (IMU calibration) at 0x0041DBF4: expected 0x12, found 0xFF"
        );
    }

    #[test]
    fn test_untagged_verification_message() {
        let failure = VerifyFailure {
            target: VerifyTarget::Unspecified,
            address: 0x400000,
            expected: 0,
            found: 1,
        };
        assert!(failure.to_string().starts_with("verification error at"));
    }

    #[test]
    fn test_unknown_architecture_carries_code() {
        assert_eq!(
            Error::UnknownArchitecture(0x8B).to_string(),
            "device with unknown SAM3S architecture: 0x8B"
        );
    }
}
