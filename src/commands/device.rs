//! Commands that query or control the device without flashing

use sambaflash_core::chip::ChipId;

use crate::cli::PortArgs;
use crate::ports;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print chip identification and flash geometry
pub fn run_info(port: &PortArgs) -> CommandResult {
    let session = ports::open_session(port)?;
    let geometry = session.geometry();

    print_chip_id(session.chip_id());

    println!();
    println!("Flash:");
    println!("  Base address:    0x{:08X}", geometry.flash_base);
    println!("  Size:            {} KiB", geometry.flash_size / 1024);
    println!(
        "  Pages:           {} x {} bytes",
        geometry.page_count, geometry.page_size
    );
    println!(
        "  Lock regions:    {} x {} KiB",
        geometry.lockbit_count,
        geometry.lockregion_size() / 1024
    );

    Ok(())
}

fn print_chip_id(id: ChipId) {
    println!("Chip ID:           {}", id);
    println!("  Version:         {}", id.version());
    println!("  Processor:       {}", id.processor());
    match id.nvm_size() {
        Some(size) => println!("  NVM size:        {} KiB", size / 1024),
        None => println!("  NVM size:        reserved (code {})", id.nvpsiz()),
    }
    match id.sram_size() {
        Some(size) => println!("  SRAM size:       {} KiB", size / 1024),
        None => println!("  SRAM size:       reserved (code {})", id.sramsiz()),
    }
    println!("  NVM type:        {}", id.nvm_type());
    println!("  Architecture:    0x{:02X}", id.arch());
}

/// Print the 64-bit unique identifier
pub fn run_uid(port: &PortArgs) -> CommandResult {
    let mut session = ports::open_session(port)?;
    let uid = session.read_uid()?;
    println!("Unique ID: {:016X}", uid);
    Ok(())
}

/// Reset the device
pub fn run_reset(port: &PortArgs) -> CommandResult {
    let mut session = ports::open_session(port)?;
    session.reset()?;
    println!("Reset requested");
    Ok(())
}

/// Jump to `address`
pub fn run_go(port: &PortArgs, address: u32) -> CommandResult {
    let mut session = ports::open_session(port)?;
    session.go(address)?;
    println!("Jumped to 0x{:08X}", address);
    Ok(())
}
