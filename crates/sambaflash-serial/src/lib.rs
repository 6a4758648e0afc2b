//! sambaflash-serial - Serial port access to the SAM-BA bootloader
//!
//! Opens a serial port with the settings the ROM bootloader expects
//! (115200 baud, 8N1, no flow control, 5 second timeout) as a
//! [`Transport`](sambaflash_core::Transport) for a
//! [`SambaSession`](sambaflash_core::SambaSession).
//!
//! # Example
//!
//! ```no_run
//! use sambaflash_core::flash::NoProgress;
//! use sambaflash_core::SambaSession;
//! use sambaflash_serial::SerialTransport;
//!
//! let transport = SerialTransport::open("/dev/ttyACM0", None)?;
//! let mut session = SambaSession::establish(transport)?;
//! let firmware = std::fs::read("firmware.bin")?;
//! session.flash(&firmware, None, false, &mut NoProgress)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod transport;

pub use error::{Result, SerialError};
pub use transport::{SerialTransport, DEFAULT_BAUD, DEFAULT_TIMEOUT};

/// Names of the serial ports present on this host
pub fn available_ports() -> Result<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|info| info.port_name)
        .collect())
}
