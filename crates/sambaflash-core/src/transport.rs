//! Byte-stream transport abstraction
//!
//! The SAM-BA protocol needs nothing more than blocking writes and
//! fixed-size reads with a timeout. Serial ports, simulated bootloaders and
//! scripted test doubles all implement this trait.

use alloc::boxed::Box;

use crate::error::TransportError;

/// Blocking byte-stream transport
pub trait Transport {
    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read exactly `buf.len()` bytes
    ///
    /// Either the whole buffer is filled or an error is returned. Running out
    /// of time before the buffer is full is [`TransportError::Timeout`].
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Flush any buffered output
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(data)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_exact(buf)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write(data)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_exact(buf)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}
