//! Chip identification and flash geometry

mod id;
mod types;

pub use id::ChipId;
pub use types::{ChipArchitecture, FlashGeometry, SAM3SXB_GEOMETRY, SAM3SXC_GEOMETRY};
