//! Serial port transport

use std::io::{Read, Write};
use std::time::Duration;

use sambaflash_core::error::TransportError;
use sambaflash_core::Transport;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::{Result, SerialError};

/// Baud rate the SAM-BA ROM uses on its USART
pub const DEFAULT_BAUD: u32 = 115_200;

/// Per-operation read/write timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Serial port transport
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port, 8N1 without flow control
    ///
    /// Uses [`DEFAULT_BAUD`] when `baud` is `None`.
    pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
        let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

        let port = serialport::new(device, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(DEFAULT_TIMEOUT)
            .open()?;

        // Drop anything the bootloader echoed before we got here
        port.clear(ClearBuffer::All)?;

        log::info!("Opened serial port {} at {} baud", device, baud_rate);

        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> core::result::Result<(), TransportError> {
        self.port
            .write_all(data)
            .map_err(|e| io_error("write", e))
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> core::result::Result<(), TransportError> {
        self.port
            .read_exact(buf)
            .map_err(|e| io_error("read", e))
    }

    fn flush(&mut self) -> core::result::Result<(), TransportError> {
        self.port.flush().map_err(|e| io_error("flush", e))
    }
}

fn io_error(op: &str, e: std::io::Error) -> TransportError {
    log::debug!("serial: {} failed: {}", op, e);
    SerialError::Io(e).into()
}
