//! Errors raised by the command layer itself

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is empty", .0.display())]
    EmptyFile(PathBuf),

    #[error("Unknown architecture '{0}' for the dummy port [available: {1}]")]
    UnknownDummyArchitecture(String, String),

    #[error("The dummy port is not available (recompile with the `dummy` feature)")]
    DummyUnavailable,
}
