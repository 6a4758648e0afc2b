//! List command implementation

/// List serial ports present on this host
pub fn list_ports() -> Result<(), Box<dyn std::error::Error>> {
    let ports = sambaflash_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found");
    } else {
        println!("Serial ports:");
        println!();
        for port in ports {
            println!("  {}", port);
        }
    }

    #[cfg(feature = "dummy")]
    {
        println!();
        println!("  dummy[:<architecture>] - Simulated SAM-BA bootloader for testing");
    }

    Ok(())
}
