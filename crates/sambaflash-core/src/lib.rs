//! sambaflash-core - Core library for flashing SAM3S parts via SAM-BA
//!
//! This crate talks to the Atmel SAM-BA ROM bootloader over any byte-stream
//! [`Transport`] to erase, program, lock and verify on-chip flash, then
//! reboot into the new firmware. It is `no_std` and only needs `alloc`.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for the error types
//!
//! # Example
//!
//! ```ignore
//! use sambaflash_core::{flash::NoProgress, SambaSession};
//!
//! fn flash_device<T: sambaflash_core::Transport>(transport: T, firmware: &[u8]) {
//!     let mut session = SambaSession::establish(transport)?;
//!     println!("Found: {}", session.architecture());
//!     session.flash(firmware, None, false, &mut NoProgress)?;
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::{Error, Result, TransportError, VerifyFailure, VerifyTarget};
pub use session::SambaSession;
pub use transport::Transport;
