//! SAM-BA request encoding
//!
//! Requests are short ASCII lines terminated by `#`. Addresses and values
//! are uppercase hexadecimal.
//!
//! | Request            | Wire format        | Reply                  |
//! |--------------------|--------------------|------------------------|
//! | handshake          | `N#`               | `\n\r`                 |
//! | read word          | `wAAAAAAAA,4#`     | 4 bytes, little endian |
//! | write word         | `WAAAAAAAA,VVVVVVVV#` | none                |
//! | read bytes         | `RA,N#`            | N bytes                |
//! | go                 | `GAAAAAAAA#`       | none                   |

use core::fmt::{self, Write};

/// Reply the bootloader sends to the handshake request
pub const HANDSHAKE_REPLY: [u8; 2] = *b"\n\r";

/// Request terminator
pub const TERMINATOR: u8 = b'#';

/// Capacity of an encoded request; the longest one is 19 bytes
pub const REQUEST_CAPACITY: usize = 24;

/// A single SAM-BA request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Switch to binary mode; doubles as the bootloader presence probe
    Handshake,
    /// Read one 32-bit word
    ReadWord {
        /// Word address
        address: u32,
    },
    /// Write one 32-bit word
    WriteWord {
        /// Word address
        address: u32,
        /// Value to store
        value: u32,
    },
    /// Read a range of raw bytes
    ReadBytes {
        /// Start address
        address: u32,
        /// Number of bytes
        len: u32,
    },
    /// Jump to code at an address
    Go {
        /// Entry address
        address: u32,
    },
}

impl Request {
    /// Address the request targets, if any
    pub const fn address(&self) -> Option<u32> {
        match self {
            Self::Handshake => None,
            Self::ReadWord { address }
            | Self::WriteWord { address, .. }
            | Self::ReadBytes { address, .. }
            | Self::Go { address } => Some(*address),
        }
    }

    /// Number of reply bytes the bootloader sends back
    pub const fn reply_len(&self) -> usize {
        match self {
            Self::Handshake => HANDSHAKE_REPLY.len(),
            Self::ReadWord { .. } => 4,
            Self::ReadBytes { len, .. } => *len as usize,
            Self::WriteWord { .. } | Self::Go { .. } => 0,
        }
    }

    /// Encode the request into its wire form
    pub fn encode(&self) -> heapless::String<REQUEST_CAPACITY> {
        let mut line = heapless::String::new();
        // Every request fits in REQUEST_CAPACITY.
        let _ = write!(line, "{}", self);
        line
    }

    /// Parse one request line, with or without the trailing `#`
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.strip_suffix('#').unwrap_or(line);
        let mut chars = line.chars();
        let kind = chars.next()?;
        let args = chars.as_str();

        match kind {
            'N' if args.is_empty() => Some(Self::Handshake),
            'w' => {
                let (address, len) = split_pair(args)?;
                (len == 4).then_some(Self::ReadWord { address })
            }
            'W' => {
                let (address, value) = split_pair(args)?;
                Some(Self::WriteWord { address, value })
            }
            'R' => {
                let (address, len) = split_pair(args)?;
                Some(Self::ReadBytes { address, len })
            }
            'G' => Some(Self::Go {
                address: u32::from_str_radix(args, 16).ok()?,
            }),
            _ => None,
        }
    }
}

fn split_pair(args: &str) -> Option<(u32, u32)> {
    let (first, second) = args.split_once(',')?;
    Some((
        u32::from_str_radix(first, 16).ok()?,
        u32::from_str_radix(second, 16).ok()?,
    ))
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake => write!(f, "N#"),
            Self::ReadWord { address } => write!(f, "w{:08X},4#", address),
            Self::WriteWord { address, value } => write!(f, "W{:08X},{:08X}#", address, value),
            Self::ReadBytes { address, len } => write!(f, "R{:X},{:X}#", address, len),
            Self::Go { address } => write!(f, "G{:08X}#", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_read_word() {
        let req = Request::ReadWord { address: 0x400E0740 };
        assert_eq!(req.encode().as_str(), "w400E0740,4#");
    }

    #[test]
    fn test_encode_write_word_pads_value() {
        let req = Request::WriteWord {
            address: 0x400E0A00,
            value: 0x600,
        };
        assert_eq!(req.encode().as_str(), "W400E0A00,00000600#");
    }

    #[test]
    fn test_encode_read_bytes_has_no_padding() {
        let req = Request::ReadBytes {
            address: 0x400100,
            len: 0x100,
        };
        assert_eq!(req.encode().as_str(), "R400100,100#");
    }

    #[test]
    fn test_encode_handshake_and_go() {
        assert_eq!(Request::Handshake.encode().as_str(), "N#");
        assert_eq!(
            Request::Go { address: 0x400000 }.encode().as_str(),
            "G00400000#"
        );
    }

    #[test]
    fn test_longest_request_fits() {
        let req = Request::WriteWord {
            address: u32::MAX,
            value: u32::MAX,
        };
        assert_eq!(req.encode().len(), 19);
    }

    #[test]
    fn test_parse_matches_encode() {
        let requests = [
            Request::Handshake,
            Request::ReadWord { address: 0x400E0A08 },
            Request::WriteWord {
                address: 0x400E0A04,
                value: 0x5A000005,
            },
            Request::ReadBytes {
                address: 0x41DB00,
                len: 256,
            },
            Request::Go { address: 0x400000 },
        ];
        for req in requests {
            assert_eq!(Request::parse(req.encode().as_str()), Some(req));
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Request::parse("X#"), None);
        assert_eq!(Request::parse("w400000,8#"), None);
        assert_eq!(Request::parse("W400000#"), None);
        assert_eq!(Request::parse(""), None);
    }
}
