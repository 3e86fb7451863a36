//! Simulated radio hardware for tests.
//!
//! `MockDriver` and `MockConnection` stand in for a vendor backend: they
//! record every forwarded configuration call, let tests inject failures at
//! any point (enumeration, open, or a named operation), and model the
//! hardware's quantization of requested LO frequencies to PLL steps.

use super::traits::{RadioConnection, RadioDriver};
use super::types::{Channel, ChipMode, DeviceInfo, Direction};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// LO tuning granularity of the simulated PLL in Hz
pub const PLL_STEP_HZ: f64 = 30.72e6 / (1u64 << 20) as f64;

#[derive(Default)]
struct DriverState {
    enumerate_calls: usize,
    fail_enumerate: bool,
    fail_open: HashSet<String>,
    connections: HashMap<String, Arc<MockConnection>>,
}

/// Simulated hardware backend with a scripted device list
pub struct MockDriver {
    devices: Vec<DeviceInfo>,
    state: Mutex<DriverState>,
}

impl MockDriver {
    /// Driver with the given device serials attached
    pub fn with_serials(serials: &[&str]) -> Self {
        let devices = serials
            .iter()
            .map(|s| DeviceInfo {
                serial: s.to_string(),
                label: format!("Simulated SDR [{}]", s),
            })
            .collect();
        Self {
            devices,
            state: Mutex::new(DriverState::default()),
        }
    }

    /// Make the next (and every) enumeration attempt fail
    pub fn fail_enumerate(&self) {
        self.state.lock().fail_enumerate = true;
    }

    /// Make opening the device with `serial` fail
    pub fn fail_open(&self, serial: &str) {
        self.state.lock().fail_open.insert(serial.to_string());
    }

    /// Number of times the registry fetched the device list
    pub fn enumerate_calls(&self) -> usize {
        self.state.lock().enumerate_calls
    }

    /// Connection handed out for `serial`, if one was opened
    pub fn connection(&self, serial: &str) -> Option<Arc<MockConnection>> {
        self.state.lock().connections.get(serial).cloned()
    }
}

impl RadioDriver for MockDriver {
    fn driver_id(&self) -> &str {
        "simulated"
    }

    fn enumerate(&self) -> Result<Vec<DeviceInfo>> {
        let mut state = self.state.lock();
        state.enumerate_calls += 1;
        if state.fail_enumerate {
            return Err(Error::enumeration("simulated list fetch failure"));
        }
        Ok(self.devices.clone())
    }

    fn open(&self, info: &DeviceInfo) -> Result<Arc<dyn RadioConnection>> {
        let mut state = self.state.lock();
        if state.fail_open.contains(&info.serial) {
            return Err(Error::connect(format!(
                "simulated open failure for {}",
                info.serial
            )));
        }
        let conn = Arc::new(MockConnection::new(&info.serial));
        state.connections.insert(info.serial.clone(), conn.clone());
        Ok(conn)
    }
}

#[derive(Default)]
struct ConnectionState {
    calls: Vec<String>,
    failing_ops: HashSet<String>,
    closed: bool,
}

/// Simulated open device connection
pub struct MockConnection {
    serial: String,
    state: Mutex<ConnectionState>,
}

impl MockConnection {
    fn new(serial: &str) -> Self {
        Self {
            serial: serial.to_string(),
            state: Mutex::new(ConnectionState::default()),
        }
    }

    /// Make the named operation (e.g. "calibrate", "set_gain") fail
    pub fn fail_on(&self, op: &str) {
        self.state.lock().failing_ops.insert(op.to_string());
    }

    /// Recorded configuration calls, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Whether the handle was released
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    fn forward(&self, op: &str, detail: String) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::driver(format!("{}: connection closed", self.serial)));
        }
        if state.failing_ops.contains(op) {
            return Err(Error::driver(format!(
                "simulated {} failure on {}",
                op, self.serial
            )));
        }
        state.calls.push(detail);
        Ok(())
    }
}

impl RadioConnection for MockConnection {
    fn set_chip_mode(&self, mode: ChipMode, direction: Direction) -> Result<()> {
        // Enable the channel set the mode implies, as real hardware would
        let enabled = mode
            .channels()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("+");
        self.forward(
            "set_chip_mode",
            format!("set_chip_mode {} {} {}", mode, direction, enabled),
        )
    }

    fn set_sample_rate(&self, rate: f64) -> Result<()> {
        self.forward("set_sample_rate", format!("set_sample_rate {}", rate))
    }

    fn set_oversampling(&self, factor: u8) -> Result<()> {
        self.forward("set_oversampling", format!("set_oversampling {}", factor))
    }

    fn set_rf_frequency(&self, direction: Direction, channel: Channel, freq: f64) -> Result<f64> {
        // Round to the nearest achievable PLL step, like real hardware does
        let achieved = (freq / PLL_STEP_HZ).round() * PLL_STEP_HZ;
        self.forward(
            "set_rf_frequency",
            format!("set_rf_frequency {} {} {}", direction, channel, achieved),
        )?;
        Ok(achieved)
    }

    fn calibrate(&self, direction: Direction, channel: Channel, bandwidth: f64) -> Result<()> {
        self.forward(
            "calibrate",
            format!("calibrate {} {} {}", direction, channel, bandwidth),
        )
    }

    fn set_antenna(&self, direction: Direction, channel: Channel, antenna: u8) -> Result<()> {
        self.forward(
            "set_antenna",
            format!("set_antenna {} {} {}", direction, channel, antenna),
        )
    }

    fn set_analog_filter(
        &self,
        direction: Direction,
        channel: Channel,
        enabled: bool,
        bandwidth: f64,
    ) -> Result<()> {
        self.forward(
            "set_analog_filter",
            format!(
                "set_analog_filter {} {} {} {}",
                direction, channel, enabled, bandwidth
            ),
        )
    }

    fn set_digital_filter(
        &self,
        direction: Direction,
        channel: Channel,
        enabled: bool,
        bandwidth: f64,
    ) -> Result<()> {
        self.forward(
            "set_digital_filter",
            format!(
                "set_digital_filter {} {} {} {}",
                direction, channel, enabled, bandwidth
            ),
        )
    }

    fn set_gain(&self, direction: Direction, channel: Channel, gain_db: u32) -> Result<u32> {
        self.forward(
            "set_gain",
            format!("set_gain {} {} {}", direction, channel, gain_db),
        )?;
        // The simulated gain table resolves in whole dB
        Ok(gain_db)
    }

    fn set_nco(&self, direction: Direction, channel: Channel, freq: f64) -> Result<()> {
        self.forward("set_nco", format!("set_nco {} {} {}", direction, channel, freq))
    }

    fn disable_dc_corrections(&self) -> Result<()> {
        self.forward("disable_dc_corrections", "disable_dc_corrections".to_string())
    }

    fn close(&self) {
        self.state.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_returns_scripted_devices() {
        let driver = MockDriver::with_serials(&["1D5A", "2C4B"]);
        let list = driver.enumerate().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].serial, "1D5A");
        assert_eq!(driver.enumerate_calls(), 1);
    }

    #[test]
    fn test_open_records_connection() {
        let driver = MockDriver::with_serials(&["1D5A"]);
        let info = driver.enumerate().unwrap().remove(0);
        let conn = driver.open(&info).unwrap();
        conn.set_sample_rate(2e6).unwrap();
        let mock = driver.connection("1D5A").unwrap();
        assert_eq!(mock.serial(), "1D5A");
        assert_eq!(mock.calls(), vec!["set_sample_rate 2000000"]);
    }

    #[test]
    fn test_chip_mode_enables_its_channel_set() {
        let driver = MockDriver::with_serials(&["1D5A"]);
        let info = driver.enumerate().unwrap().remove(0);
        let conn = driver.open(&info).unwrap();
        conn.set_chip_mode(ChipMode::Mimo, Direction::Rx).unwrap();
        conn.set_chip_mode(ChipMode::ChannelB, Direction::Tx).unwrap();
        assert_eq!(
            driver.connection("1D5A").unwrap().calls(),
            vec!["set_chip_mode MIMO RX A+B", "set_chip_mode SISO-B TX B"]
        );
    }

    #[test]
    fn test_frequency_quantized_to_pll_step() {
        let driver = MockDriver::with_serials(&["1D5A"]);
        let info = driver.enumerate().unwrap().remove(0);
        let conn = driver.open(&info).unwrap();
        let requested = 868.1e6 + 7.0; // deliberately off-step
        let achieved = conn
            .set_rf_frequency(Direction::Rx, Channel::A, requested)
            .unwrap();
        assert!((achieved - requested).abs() <= PLL_STEP_HZ / 2.0);
        assert_ne!(achieved, requested);
    }

    #[test]
    fn test_injected_failure_surfaces_as_driver_error() {
        let driver = MockDriver::with_serials(&["1D5A"]);
        let info = driver.enumerate().unwrap().remove(0);
        let conn = driver.open(&info).unwrap();
        let mock = driver.connection("1D5A").unwrap();
        mock.fail_on("calibrate");
        let err = conn.calibrate(Direction::Tx, Channel::A, 5e6).unwrap_err();
        assert!(matches!(err, Error::Driver(_)));
    }

    #[test]
    fn test_closed_connection_rejects_calls() {
        let driver = MockDriver::with_serials(&["1D5A"]);
        let info = driver.enumerate().unwrap().remove(0);
        let conn = driver.open(&info).unwrap();
        conn.close();
        assert!(conn.set_sample_rate(1e6).is_err());
    }
}
