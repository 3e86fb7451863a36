//! Configuration operations.
//!
//! Every operation follows one contract: validate the parameter against the
//! hardware range before anything else, take the registry lock, forward the
//! request to the device connection, and treat a driver-reported failure as
//! fatal for the whole device set. `set_rf_freq` and `set_gain` return the
//! value the hardware actually applied, which callers must use instead of
//! their request.

use super::DeviceRegistry;
use crate::error::{Error, Result};
use crate::hal::{limits, Channel, ChipMode, Direction};
use tracing::debug;

impl DeviceRegistry {
    /// Enable the channel set for `chip_mode` in the given direction
    pub fn set_chip_mode(
        &self,
        device_number: usize,
        chip_mode: ChipMode,
        direction: Direction,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, mode = %chip_mode, %direction, "set_chip_mode");
        conn.set_chip_mode(chip_mode, direction)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Set the sample rate for both channels, in S/s
    pub fn set_samp_rate(&self, device_number: usize, rate: f64) -> Result<()> {
        if !(limits::SAMP_RATE_MIN..=limits::SAMP_RATE_MAX).contains(&rate) {
            return Err(Error::range(format!(
                "sample rate {} S/s outside [{}, {}]",
                rate,
                limits::SAMP_RATE_MIN,
                limits::SAMP_RATE_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, rate, "set_samp_rate");
        conn.set_sample_rate(rate)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Set the oversampling factor for both channels; 0 keeps the hardware
    /// default
    pub fn set_oversampling(&self, device_number: usize, factor: u8) -> Result<()> {
        if !limits::OVERSAMPLING_FACTORS.contains(&factor) {
            return Err(Error::range(format!(
                "oversampling factor {} not one of {:?}",
                factor,
                limits::OVERSAMPLING_FACTORS
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, factor, "set_oversampling");
        conn.set_oversampling(factor)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Program the RF LO for one direction and channel. Returns the
    /// frequency the hardware settled on after PLL-step rounding.
    pub fn set_rf_freq(
        &self,
        device_number: usize,
        direction: Direction,
        channel: Channel,
        freq: f64,
    ) -> Result<f64> {
        if !(limits::RF_FREQ_MIN..=limits::RF_FREQ_MAX).contains(&freq) {
            return Err(Error::range(format!(
                "RF frequency {} Hz outside [{}, {}]",
                freq,
                limits::RF_FREQ_MIN,
                limits::RF_FREQ_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        let achieved = conn
            .set_rf_frequency(direction, channel, freq)
            .map_err(|e| Self::fail(&mut inner, None, e))?;
        debug!(device_number, %direction, %channel, requested = freq, achieved, "set_rf_freq");
        Ok(achieved)
    }

    /// Run device calibration over `bandwidth` Hz
    pub fn calibrate(
        &self,
        device_number: usize,
        direction: Direction,
        channel: Channel,
        bandwidth: f64,
    ) -> Result<()> {
        if !(limits::CALIBRATION_BW_MIN..=limits::CALIBRATION_BW_MAX).contains(&bandwidth) {
            return Err(Error::range(format!(
                "calibration bandwidth {} Hz outside [{}, {}]",
                bandwidth,
                limits::CALIBRATION_BW_MIN,
                limits::CALIBRATION_BW_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, %direction, %channel, bandwidth, "calibrate");
        conn.calibrate(direction, channel, bandwidth)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Select an antenna port for one direction and channel
    pub fn set_antenna(
        &self,
        device_number: usize,
        channel: Channel,
        direction: Direction,
        antenna: u8,
    ) -> Result<()> {
        if antenna > limits::ANTENNA_MAX {
            return Err(Error::range(format!(
                "antenna index {} outside 0..={}",
                antenna,
                limits::ANTENNA_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, %direction, %channel, antenna, "set_antenna");
        conn.set_antenna(direction, channel, antenna)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Enable or bypass the analog low-pass filter
    pub fn set_analog_filter(
        &self,
        device_number: usize,
        direction: Direction,
        channel: Channel,
        enabled: bool,
        bandwidth: f64,
    ) -> Result<()> {
        if enabled && !(limits::analog_bw_min(direction)..=limits::ANALOG_BW_MAX).contains(&bandwidth)
        {
            return Err(Error::range(format!(
                "{} analog filter bandwidth {} Hz outside [{}, {}]",
                direction,
                bandwidth,
                limits::analog_bw_min(direction),
                limits::ANALOG_BW_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, %direction, %channel, enabled, bandwidth, "set_analog_filter");
        conn.set_analog_filter(direction, channel, enabled, bandwidth)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Enable or bypass the digital (GFIR) filter
    pub fn set_digital_filter(
        &self,
        device_number: usize,
        direction: Direction,
        channel: Channel,
        enabled: bool,
        bandwidth: f64,
    ) -> Result<()> {
        if enabled && !(bandwidth > 0.0 && bandwidth <= limits::DIGITAL_BW_MAX) {
            return Err(Error::range(format!(
                "digital filter bandwidth {} Hz outside (0, {}]",
                bandwidth,
                limits::DIGITAL_BW_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, %direction, %channel, enabled, bandwidth, "set_digital_filter");
        conn.set_digital_filter(direction, channel, enabled, bandwidth)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Set the combined gain in dB: RX accepts 0..=70, TX 0..=60. Returns
    /// the gain the hardware applied.
    pub fn set_gain(
        &self,
        device_number: usize,
        direction: Direction,
        channel: Channel,
        gain_db: u32,
    ) -> Result<u32> {
        let max = limits::gain_max(direction);
        if gain_db > max {
            return Err(Error::range(format!(
                "{} gain {} dB outside 0..={}",
                direction, gain_db, max
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        let applied = conn
            .set_gain(direction, channel, gain_db)
            .map_err(|e| Self::fail(&mut inner, None, e))?;
        debug!(device_number, %direction, %channel, requested = gain_db, applied, "set_gain");
        Ok(applied)
    }

    /// Set the NCO frequency in Hz; 0 switches the NCO off
    pub fn set_nco(
        &self,
        device_number: usize,
        direction: Direction,
        channel: Channel,
        freq: f64,
    ) -> Result<()> {
        if freq.abs() > limits::NCO_FREQ_MAX {
            return Err(Error::range(format!(
                "NCO frequency {} Hz outside +/-{}",
                freq,
                limits::NCO_FREQ_MAX
            )));
        }
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, %direction, %channel, freq, "set_nco");
        conn.set_nco(direction, channel, freq)
            .map_err(|e| Self::fail(&mut inner, None, e))
    }

    /// Disable automatic DC offset correction on the device
    pub fn disable_dc_corrections(&self, device_number: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        let conn = Self::connection_for_config(&mut inner, device_number)?;
        debug!(device_number, "disable_dc_corrections");
        conn.disable_dc_corrections()
            .map_err(|e| Self::fail(&mut inner, None, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::{MockDriver, PLL_STEP_HZ};
    use std::sync::Arc;

    fn open_one() -> (Arc<MockDriver>, DeviceRegistry, usize) {
        let driver = Arc::new(MockDriver::with_serials(&["1D5A"]));
        let registry = DeviceRegistry::new(Box::new(Shared(driver.clone())));
        let n = registry.open_device("1D5A").unwrap();
        (driver, registry, n)
    }

    struct Shared(Arc<MockDriver>);

    impl crate::hal::RadioDriver for Shared {
        fn driver_id(&self) -> &str {
            self.0.driver_id()
        }
        fn enumerate(&self) -> Result<Vec<crate::hal::DeviceInfo>> {
            self.0.enumerate()
        }
        fn open(
            &self,
            info: &crate::hal::DeviceInfo,
        ) -> Result<Arc<dyn crate::hal::RadioConnection>> {
            self.0.open(info)
        }
    }

    #[test]
    fn test_gain_bounds_per_direction() {
        let (driver, registry, n) = open_one();

        let err = registry
            .set_gain(n, Direction::Rx, Channel::A, 71)
            .unwrap_err();
        assert!(matches!(err, Error::Range(_)));
        // Rejected before any hardware call
        assert!(driver.connection("1D5A").unwrap().calls().is_empty());

        let applied = registry.set_gain(n, Direction::Tx, Channel::A, 60).unwrap();
        assert!(applied <= 60);
        let applied = registry.set_gain(n, Direction::Rx, Channel::B, 70).unwrap();
        assert!(applied <= 70);
    }

    #[test]
    fn test_rf_freq_returns_achieved_value() {
        let (_driver, registry, n) = open_one();
        let requested = 433.92e6 + 11.0; // off the PLL grid
        let achieved = registry
            .set_rf_freq(n, Direction::Rx, Channel::A, requested)
            .unwrap();
        assert!((achieved - requested).abs() <= PLL_STEP_HZ / 2.0);
        assert_ne!(achieved, requested);
    }

    #[test]
    fn test_rf_freq_range() {
        let (_driver, registry, n) = open_one();
        assert!(matches!(
            registry.set_rf_freq(n, Direction::Tx, Channel::A, 4.0e9),
            Err(Error::Range(_))
        ));
        assert!(matches!(
            registry.set_rf_freq(n, Direction::Rx, Channel::A, 50e3),
            Err(Error::Range(_))
        ));
    }

    #[test]
    fn test_samp_rate_and_oversampling_validation() {
        let (driver, registry, n) = open_one();
        assert!(matches!(
            registry.set_samp_rate(n, 80e6),
            Err(Error::Range(_))
        ));
        assert!(matches!(
            registry.set_oversampling(n, 3),
            Err(Error::Range(_))
        ));
        registry.set_samp_rate(n, 2e6).unwrap();
        registry.set_oversampling(n, 8).unwrap();
        assert_eq!(
            driver.connection("1D5A").unwrap().calls(),
            vec!["set_sample_rate 2000000", "set_oversampling 8"]
        );
    }

    #[test]
    fn test_filter_bandwidth_validation() {
        let (_driver, registry, n) = open_one();
        // RX floor is 1.5 MHz, TX floor 5 MHz
        assert!(registry
            .set_analog_filter(n, Direction::Rx, Channel::A, true, 2e6)
            .is_ok());
        assert!(matches!(
            registry.set_analog_filter(n, Direction::Tx, Channel::A, true, 2e6),
            Err(Error::Range(_))
        ));
        // Bandwidth is ignored when the filter is bypassed
        assert!(registry
            .set_analog_filter(n, Direction::Tx, Channel::A, false, 0.0)
            .is_ok());
        assert!(matches!(
            registry.set_digital_filter(n, Direction::Rx, Channel::A, true, 0.0),
            Err(Error::Range(_))
        ));
    }

    #[test]
    fn test_calibrate_and_antenna_validation() {
        let (_driver, registry, n) = open_one();
        assert!(matches!(
            registry.calibrate(n, Direction::Rx, Channel::A, 1e6),
            Err(Error::Range(_))
        ));
        registry.calibrate(n, Direction::Rx, Channel::A, 5e6).unwrap();
        assert!(matches!(
            registry.set_antenna(n, Channel::A, Direction::Rx, 4),
            Err(Error::Range(_))
        ));
        registry.set_antenna(n, Channel::A, Direction::Rx, 2).unwrap();
    }

    #[test]
    fn test_nco_zero_disables() {
        let (driver, registry, n) = open_one();
        registry.set_nco(n, Direction::Rx, Channel::A, 0.0).unwrap();
        assert!(matches!(
            registry.set_nco(n, Direction::Rx, Channel::A, 32e6),
            Err(Error::Range(_))
        ));
        assert_eq!(
            driver.connection("1D5A").unwrap().calls(),
            vec!["set_nco RX A 0"]
        );
    }

    #[test]
    fn test_driver_failure_tears_everything_down() {
        let driver = Arc::new(MockDriver::with_serials(&["1D5A", "2C4B"]));
        let registry = DeviceRegistry::new(Box::new(Shared(driver.clone())));
        let a = registry.open_device("1D5A").unwrap();
        let b = registry.open_device("2C4B").unwrap();

        driver.connection("1D5A").unwrap().fail_on("calibrate");
        let err = registry
            .calibrate(a, Direction::Rx, Channel::A, 5e6)
            .unwrap_err();
        assert!(matches!(err, Error::Driver(_)));

        // Both devices are gone, not just the failing one
        assert!(registry.get_device(a).is_err());
        assert!(registry.get_device(b).is_err());
        assert!(driver.connection("2C4B").unwrap().is_closed());
    }

    #[test]
    fn test_chip_mode_and_dc_forwarding() {
        let (driver, registry, n) = open_one();
        registry
            .set_chip_mode(n, ChipMode::Mimo, Direction::Rx)
            .unwrap();
        registry.disable_dc_corrections(n).unwrap();
        assert_eq!(
            driver.connection("1D5A").unwrap().calls(),
            vec!["set_chip_mode MIMO RX A+B", "disable_dc_corrections"]
        );
    }

    #[test]
    fn test_config_on_unopened_index_is_fatal() {
        let (driver, registry, n) = open_one();
        let err = registry.set_samp_rate(7, 2e6).unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
        // Configuring a never-opened index closes the whole device set,
        // same as a bad index in check_blocks
        assert!(driver.connection("1D5A").unwrap().is_closed());
        assert!(registry.get_device(n).is_err());
    }
}
