//! Port selection
//!
//! `--port` names either a serial device or, with the `dummy` feature, the
//! simulated bootloader (`dummy` or `dummy:<architecture>`).

use std::error::Error;

use sambaflash_core::{SambaSession, Transport};
use sambaflash_serial::SerialTransport;

use crate::cli::PortArgs;
use crate::error::CliError;

/// Name of the simulated bootloader port
const DUMMY_PORT: &str = "dummy";

/// Session over whichever transport the port selects
pub type Session = SambaSession<Box<dyn Transport>>;

/// Split `name:option` into its parts
fn parse_port_string(port: &str) -> (&str, Option<&str>) {
    match port.split_once(':') {
        Some((name, option)) if name == DUMMY_PORT => (name, Some(option)),
        _ => (port, None),
    }
}

/// Open the transport the port argument names
pub fn open_transport(args: &PortArgs) -> Result<Box<dyn Transport>, Box<dyn Error>> {
    match parse_port_string(&args.port) {
        (DUMMY_PORT, option) => open_dummy(option),
        (device, _) => {
            let transport = SerialTransport::open(device, Some(args.baud)).map_err(|e| {
                log::debug!("Opening {} failed: {}", device, e);
                let error = sambaflash_core::Error::from(e);
                if error == sambaflash_core::Error::TransportUnavailable {
                    log_available_ports();
                }
                error
            })?;
            Ok(Box::new(transport))
        }
    }
}

/// Open the port and establish a bootloader session
pub fn open_session(args: &PortArgs) -> Result<Session, Box<dyn Error>> {
    let transport = open_transport(args)?;
    let session = SambaSession::establish(transport)?;

    println!(
        "Found: {} ({} KiB flash, {} pages of {} bytes)",
        session.architecture(),
        session.geometry().flash_size / 1024,
        session.geometry().page_count,
        session.geometry().page_size
    );

    Ok(session)
}

#[cfg(feature = "dummy")]
fn open_dummy(option: Option<&str>) -> Result<Box<dyn Transport>, Box<dyn Error>> {
    use sambaflash_core::chip::ChipArchitecture;
    use sambaflash_dummy::{DummyBootloader, DummyConfig};

    let architecture = match option {
        None => ChipArchitecture::Sam3sxB,
        Some(name) => ChipArchitecture::from_name(name).ok_or_else(|| {
            let names: Vec<&str> = ChipArchitecture::ALL.iter().map(|a| a.name()).collect();
            CliError::UnknownDummyArchitecture(name.to_string(), names.join(", "))
        })?,
    };

    log::info!("Using simulated {} bootloader", architecture);
    Ok(Box::new(DummyBootloader::new(DummyConfig::for_architecture(
        architecture,
    ))))
}

#[cfg(not(feature = "dummy"))]
fn open_dummy(_option: Option<&str>) -> Result<Box<dyn Transport>, Box<dyn Error>> {
    Err(CliError::DummyUnavailable.into())
}

fn log_available_ports() {
    match sambaflash_serial::available_ports() {
        Ok(ports) if ports.is_empty() => log::info!("No serial ports found"),
        Ok(ports) => log::info!("Available serial ports: {}", ports.join(", ")),
        Err(e) => log::debug!("Could not enumerate serial ports: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_string() {
        assert_eq!(parse_port_string("dummy"), ("dummy", None));
        assert_eq!(parse_port_string("dummy:sam3sxc"), ("dummy", Some("sam3sxc")));
        assert_eq!(parse_port_string("/dev/ttyACM0"), ("/dev/ttyACM0", None));
        assert_eq!(parse_port_string("COM3"), ("COM3", None));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_open_dummy_session() {
        let args = PortArgs {
            port: "dummy:atsam3sxc".to_string(),
            baud: 115_200,
        };
        let session = open_session(&args).unwrap();
        assert_eq!(
            session.architecture(),
            sambaflash_core::chip::ChipArchitecture::Sam3sxC
        );
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_unknown_dummy_architecture() {
        assert!(open_dummy(Some("sam4s")).is_err());
    }
}
