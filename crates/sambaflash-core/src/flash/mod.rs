//! Flash programming
//!
//! Page splitting, lock region alignment, per-call layout planning and the
//! high-level `flash` sequence on [`SambaSession`](crate::SambaSession).

mod engine;
mod lock;
mod page;
mod plan;
mod progress;

pub use engine::{BootBitOrder, FlashOptions};
pub use lock::LockRegion;
pub use page::{Pages, ERASE_VALUE};
pub use plan::{
    CalibrationLayout, CalibrationPlan, FlashPlan, PageRange, CALIBRATION_TOP_OFFSET,
};
pub use progress::{FlashProgress, NoProgress};
