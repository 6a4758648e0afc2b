//! Error types for serial port access

use sambaflash_core::error::TransportError;
use thiserror::Error;

/// Errors raised while opening or driving a serial port
#[derive(Debug, Error)]
pub enum SerialError {
    /// The serial port library reported an error
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for serial operations
pub type Result<T> = core::result::Result<T, SerialError>;

impl SerialError {
    /// Whether the port exists but we are not allowed to use it
    ///
    /// serialport reports a port held by another process (flock, TIOCEXCL,
    /// Windows sharing violation) as `NoDevice`, so that kind counts too.
    /// Windows also folds a missing port into `NoDevice`; those are excluded.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            SerialError::Port(e) => match e.kind() {
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => true,
                serialport::ErrorKind::NoDevice => {
                    !WINDOWS_NOT_FOUND.contains(&e.description.as_str())
                }
                _ => false,
            },
            SerialError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
        }
    }
}

/// Messages for ERROR_FILE_NOT_FOUND and ERROR_PATH_NOT_FOUND, which
/// serialport reports as `NoDevice` on Windows
const WINDOWS_NOT_FOUND: &[&str] = &[
    "The system cannot find the file specified.",
    "The system cannot find the path specified.",
];

impl From<SerialError> for sambaflash_core::Error {
    fn from(e: SerialError) -> Self {
        if e.is_permission_denied() {
            sambaflash_core::Error::PermissionDenied
        } else {
            sambaflash_core::Error::TransportUnavailable
        }
    }
}

impl From<SerialError> for TransportError {
    fn from(e: SerialError) -> Self {
        match &e {
            SerialError::Io(io) if is_timeout(io.kind()) => TransportError::Timeout,
            SerialError::Port(port) if is_timeout_kind(port.kind()) => TransportError::Timeout,
            _ => TransportError::Io,
        }
    }
}

fn is_timeout(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::UnexpectedEof
    )
}

fn is_timeout_kind(kind: serialport::ErrorKind) -> bool {
    match kind {
        serialport::ErrorKind::Io(io) => is_timeout(io),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_mapping() {
        let e = SerialError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert_eq!(
            sambaflash_core::Error::from(e),
            sambaflash_core::Error::PermissionDenied
        );

        let e = SerialError::Port(serialport::Error::new(
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
            "Permission denied",
        ));
        assert_eq!(
            sambaflash_core::Error::from(e),
            sambaflash_core::Error::PermissionDenied
        );
    }

    fn port_error(kind: serialport::ErrorKind, description: &str) -> SerialError {
        SerialError::Port(serialport::Error::new(kind, description))
    }

    #[test]
    fn test_port_in_use_is_permission_denied() {
        for description in [
            "Unable to acquire exclusive lock on serial port",
            "Device or resource busy",
            "Access is denied.",
        ] {
            let e = port_error(serialport::ErrorKind::NoDevice, description);
            assert_eq!(
                sambaflash_core::Error::from(e),
                sambaflash_core::Error::PermissionDenied,
                "{}",
                description
            );
        }
    }

    #[test]
    fn test_missing_port_is_unavailable() {
        let e = port_error(
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound),
            "No such file or directory",
        );
        assert_eq!(
            sambaflash_core::Error::from(e),
            sambaflash_core::Error::TransportUnavailable
        );

        for description in WINDOWS_NOT_FOUND {
            let e = port_error(serialport::ErrorKind::NoDevice, description);
            assert_eq!(
                sambaflash_core::Error::from(e),
                sambaflash_core::Error::TransportUnavailable
            );
        }

        let e = port_error(serialport::ErrorKind::Unknown, "No such device");
        assert!(!e.is_permission_denied());
    }

    #[test]
    fn test_transport_error_mapping() {
        let timeout = SerialError::Io(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert_eq!(TransportError::from(timeout), TransportError::Timeout);

        let broken = SerialError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert_eq!(TransportError::from(broken), TransportError::Io);
    }
}
