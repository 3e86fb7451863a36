//! Shared-device coordination registry for SDR hardware.
//!
//! A physical radio exposes one RF front end but may be driven by two
//! independent pipeline blocks at once: a source producing received samples
//! and a sink consuming transmit samples. [`DeviceRegistry`] tracks which
//! blocks claimed which device, enforces that both owners agree on channel
//! mode and settings file, serializes configuration behind one lock, and
//! closes everything deterministically whichever owner leaves first or
//! whenever any hardware call fails.
//!
//! The vendor driver is reached through the [`hal`] trait seam; tests run
//! against the simulated backend in [`hal::mock`].

pub mod error;
pub mod hal;
pub mod registry;

pub use error::{Error, Result};
pub use hal::{BlockKind, Channel, ChipMode, DeviceInfo, Direction, RadioConnection, RadioDriver};
pub use registry::DeviceRegistry;
