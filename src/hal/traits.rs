use super::types::{Channel, ChipMode, DeviceInfo, Direction};
use crate::error::Result;
use std::sync::Arc;

/// Trait implemented by hardware backends for device discovery and opening
pub trait RadioDriver: Send + Sync {
    /// Unique driver identifier (e.g., "lime-usb", "simulated")
    fn driver_id(&self) -> &str;

    /// Enumerate attached devices. The registry calls this at most once
    /// and caches the result for its lifetime.
    fn enumerate(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a connection to an enumerated device
    fn open(&self, info: &DeviceInfo) -> Result<Arc<dyn RadioConnection>>;
}

/// Trait implemented by an open device connection. The registry serializes
/// every call behind its lock, so implementations only need `&self` methods
/// that are safe to call from one thread at a time.
pub trait RadioConnection: Send + Sync {
    /// Enable the channel set implied by `mode` for `direction`
    fn set_chip_mode(&self, mode: ChipMode, direction: Direction) -> Result<()>;

    /// Set the sample rate for both channels, in S/s
    fn set_sample_rate(&self, rate: f64) -> Result<()>;

    /// Set the oversampling factor for both channels
    fn set_oversampling(&self, factor: u8) -> Result<()>;

    /// Program the RF LO. Returns the frequency actually achieved after
    /// rounding to the hardware's PLL step, which callers must treat as
    /// ground truth instead of the request.
    fn set_rf_frequency(&self, direction: Direction, channel: Channel, freq: f64) -> Result<f64>;

    /// Run the device calibration procedure over `bandwidth` Hz
    fn calibrate(&self, direction: Direction, channel: Channel, bandwidth: f64) -> Result<()>;

    /// Select an antenna port
    fn set_antenna(&self, direction: Direction, channel: Channel, antenna: u8) -> Result<()>;

    /// Enable or bypass the analog low-pass filter
    fn set_analog_filter(
        &self,
        direction: Direction,
        channel: Channel,
        enabled: bool,
        bandwidth: f64,
    ) -> Result<()>;

    /// Enable or bypass the digital (GFIR) filter
    fn set_digital_filter(
        &self,
        direction: Direction,
        channel: Channel,
        enabled: bool,
        bandwidth: f64,
    ) -> Result<()>;

    /// Set the combined gain in dB. Returns the gain the hardware applied.
    fn set_gain(&self, direction: Direction, channel: Channel, gain_db: u32) -> Result<u32>;

    /// Set the NCO frequency in Hz; 0 switches the NCO off
    fn set_nco(&self, direction: Direction, channel: Channel, freq: f64) -> Result<()>;

    /// Disable automatic DC offset correction
    fn disable_dc_corrections(&self) -> Result<()>;

    /// Release the underlying hardware handle
    fn close(&self);
}
