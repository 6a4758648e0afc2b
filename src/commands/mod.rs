//! CLI command implementations
//!
//! Every command opens its own session through [`crate::ports`] and drops
//! it when done.

mod device;
mod flash;
mod list;

pub use device::{run_go, run_info, run_reset, run_uid};
pub use flash::run_flash;
pub use list::list_ports;

use std::path::Path;

use crate::error::CliError;

/// Read a whole input file, rejecting empty ones
fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    let data = std::fs::read(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    if data.is_empty() {
        return Err(CliError::EmptyFile(path.to_path_buf()));
    }

    log::debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}
