//! SAM-BA protocol
//!
//! - [`request`]: wire encoding of the `#`-terminated ASCII requests
//! - [`registers`]: CHIPID, EEFC and RSTC register layout
//! - [`Samba`]: register access and flash controller polling

mod client;
pub mod registers;
pub mod request;

pub use client::Samba;
pub use registers::{FlashCommand, FlashStatus};
pub use request::Request;
