use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware channel configuration: single channel A, single channel B, or
/// both channels active (MIMO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipMode {
    ChannelA,
    ChannelB,
    Mimo,
}

impl ChipMode {
    /// Channels driven in this mode
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            ChipMode::ChannelA => &[Channel::A],
            ChipMode::ChannelB => &[Channel::B],
            ChipMode::Mimo => &[Channel::A, Channel::B],
        }
    }
}

impl fmt::Display for ChipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChipMode::ChannelA => write!(f, "SISO-A"),
            ChipMode::ChannelB => write!(f, "SISO-B"),
            ChipMode::Mimo => write!(f, "MIMO"),
        }
    }
}

/// Direction of sample flow: RX (device to pipeline) or TX (pipeline to device)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Rx,
    Tx,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => write!(f, "RX"),
            Direction::Tx => write!(f, "TX"),
        }
    }
}

/// RF channel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    A = 0,
    B = 1,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::A => write!(f, "A"),
            Channel::B => write!(f, "B"),
        }
    }
}

/// Which kind of processing block is claiming a device direction.
/// Source blocks drive the RX path, sink blocks the TX path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Source = 1,
    Sink = 2,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Source => write!(f, "source"),
            BlockKind::Sink => write!(f, "sink"),
        }
    }
}

/// Device discovery information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Serial-derived identity, unique per physical device
    pub serial: String,
    /// Human-readable label (board name, connection medium)
    pub label: String,
}

/// Hardware limits and valid parameter sets
pub mod limits {
    /// Sample rate range in S/s
    pub const SAMP_RATE_MIN: f64 = 100e3;
    pub const SAMP_RATE_MAX: f64 = 61.44e6;

    /// Valid oversampling factors (0 selects the hardware default)
    pub const OVERSAMPLING_FACTORS: [u8; 7] = [0, 1, 2, 4, 8, 16, 32];

    /// RF LO frequency range in Hz
    pub const RF_FREQ_MIN: f64 = 100e3;
    pub const RF_FREQ_MAX: f64 = 3.8e9;

    /// Calibration bandwidth range in Hz
    pub const CALIBRATION_BW_MIN: f64 = 2.5e6;
    pub const CALIBRATION_BW_MAX: f64 = 120e6;

    /// Analog low-pass filter bandwidth ranges in Hz
    pub const ANALOG_BW_RX_MIN: f64 = 1.5e6;
    pub const ANALOG_BW_TX_MIN: f64 = 5e6;
    pub const ANALOG_BW_MAX: f64 = 130e6;

    /// Digital (GFIR) filter bandwidth ceiling in Hz
    pub const DIGITAL_BW_MAX: f64 = 61.44e6;

    /// Combined gain ceilings in dB
    pub const GAIN_RX_MAX: u32 = 70;
    pub const GAIN_TX_MAX: u32 = 60;

    /// NCO frequency span in Hz (0 disables the NCO)
    pub const NCO_FREQ_MAX: f64 = 31.25e6;

    /// Antenna port indices run 0..=3 (none / low / high / wide band)
    pub const ANTENNA_MAX: u8 = 3;

    /// Gain ceiling for a direction
    pub fn gain_max(direction: super::Direction) -> u32 {
        match direction {
            super::Direction::Rx => GAIN_RX_MAX,
            super::Direction::Tx => GAIN_TX_MAX,
        }
    }

    /// Analog filter bandwidth floor for a direction
    pub fn analog_bw_min(direction: super::Direction) -> f64 {
        match direction {
            super::Direction::Rx => ANALOG_BW_RX_MIN,
            super::Direction::Tx => ANALOG_BW_TX_MIN,
        }
    }
}
