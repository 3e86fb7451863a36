pub mod mock;
pub mod traits;
pub mod types;

pub use traits::{RadioConnection, RadioDriver};
pub use types::{limits, BlockKind, Channel, ChipMode, DeviceInfo, Direction};
