//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use sambaflash_serial::DEFAULT_BAUD;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "sambaflash")]
#[command(
    author,
    version,
    about = "Flash SAM3S devices through the SAM-BA bootloader",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device selection shared across commands
#[derive(Args, Debug, Clone)]
pub struct PortArgs {
    /// Serial port of the device in bootloader mode (e.g. /dev/ttyACM0, COM3),
    /// or `dummy[:<architecture>]` for the simulated bootloader
    #[arg(short, long)]
    pub port: String,

    /// Baud rate
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
}

/// Options of the flash command
#[derive(Args, Debug, Clone)]
pub struct FlashArgs {
    /// Firmware image (raw binary, written from the start of flash)
    #[arg(short, long)]
    pub firmware: PathBuf,

    /// IMU calibration blob to write near the top of flash
    #[arg(short, long)]
    pub calibration: Option<PathBuf>,

    /// Lock the flash region holding the calibration
    #[arg(long, requires = "calibration")]
    pub lock_calibration: bool,

    /// Set the boot-from-flash bit before verifying instead of after
    #[arg(long)]
    pub boot_bit_first: bool,

    /// Leave the device in the bootloader after flashing
    #[arg(long)]
    pub no_reset: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write firmware (and optionally an IMU calibration), verify, and reboot
    Flash {
        #[command(flatten)]
        port: PortArgs,

        #[command(flatten)]
        flash: FlashArgs,
    },

    /// Read the 64-bit unique identifier
    Uid {
        #[command(flatten)]
        port: PortArgs,
    },

    /// Show chip identification and flash geometry
    Info {
        #[command(flatten)]
        port: PortArgs,
    },

    /// Reset the device
    Reset {
        #[command(flatten)]
        port: PortArgs,
    },

    /// Jump to code at an address
    Go {
        #[command(flatten)]
        port: PortArgs,

        /// Address to jump to (hex, e.g. 0x400000)
        #[arg(value_parser = parse_hex_u32, default_value = "0x400000")]
        address: u32,
    },

    /// List serial ports present on this host
    ListPorts,
}
