//! sambaflash - Flash SAM3S devices through the SAM-BA bootloader
//!
//! Talks to the Atmel SAM-BA ROM bootloader over a serial port to erase,
//! program, lock and verify the on-chip flash of SAM3S parts, then reboots
//! into the new firmware.
//!
//! Every subcommand takes `--port`. The value `dummy` (or
//! `dummy:<architecture>`) selects an in-memory simulated bootloader, which
//! is handy for trying the tool without hardware.

mod cli;
mod commands;
mod error;
mod ports;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Verbosity picks the default filter; RUST_LOG still wins
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match &cli.command {
        Commands::Flash { port, flash } => commands::run_flash(port, flash),
        Commands::Uid { port } => commands::run_uid(port),
        Commands::Info { port } => commands::run_info(port),
        Commands::Reset { port } => commands::run_reset(port),
        Commands::Go { port, address } => commands::run_go(port, *address),
        Commands::ListPorts => commands::list_ports(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(error) = e.downcast_ref::<sambaflash_core::Error>() {
            eprintln!("Hint: {}", error.recovery_hint());
        }
        std::process::exit(1);
    }
}
