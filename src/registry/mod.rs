//! Coordination registry for SDR devices shared between source and sink
//! processing blocks.
//!
//! One physical device may be opened by two independent blocks (RX source,
//! TX sink). The registry tracks per-direction claims, enforces that both
//! owners declared the same channel mode and settings file, serializes all
//! configuration against a single coarse lock, and tears every device down
//! on the first fatal error.

pub mod config;
pub mod record;

use crate::error::{Error, Result};
use crate::hal::{BlockKind, ChipMode, DeviceInfo, RadioConnection, RadioDriver};
use parking_lot::Mutex;
use record::DeviceRecord;
use std::sync::Arc;
use tracing::{error, info};

struct RegistryInner {
    /// Enumeration result, fetched at most once
    discovered: Option<Vec<DeviceInfo>>,
    /// One record per opened physical device, index-stable
    records: Vec<DeviceRecord>,
    /// One-shot guard so bulk teardown runs the close sequence only once
    closed: bool,
}

/// Process-wide device coordination registry. Explicitly constructed over a
/// hardware backend and shared (e.g. as `Arc<DeviceRegistry>`) by every
/// block that opens devices.
pub struct DeviceRegistry {
    driver: Box<dyn RadioDriver>,
    inner: Mutex<RegistryInner>,
}

impl DeviceRegistry {
    pub fn new(driver: Box<dyn RadioDriver>) -> Self {
        Self {
            driver,
            inner: Mutex::new(RegistryInner {
                discovered: None,
                records: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Open the device with `serial`, or attach to it if another block
    /// already opened it. An empty serial selects the first discovered
    /// device. Returns the stable device number used by all later calls.
    ///
    /// A discovery or connect failure closes every already-open device
    /// before the error surfaces.
    pub fn open_device(&self, serial: &str) -> Result<usize> {
        let mut inner = self.inner.lock();

        if let Err(e) = Self::ensure_discovered(self.driver.as_ref(), &mut inner) {
            return Err(Self::fail(&mut inner, None, e));
        }

        let list = inner.discovered.as_deref().unwrap_or(&[]);
        let info = if serial.is_empty() {
            list.first().cloned()
        } else {
            list.iter().find(|d| d.serial == serial).cloned()
        };
        let info = match info {
            Some(info) => info,
            None => {
                let e = Error::connect(format!("no device with serial '{}' found", serial));
                return Err(Self::fail(&mut inner, None, e));
            }
        };

        if let Some(number) = inner.records.iter().position(|r| r.serial == info.serial) {
            if inner.records[number].handle.is_none() {
                // Reopened after full release of an earlier use
                match self.driver.open(&info) {
                    Ok(handle) => inner.records[number].handle = Some(handle),
                    Err(e) => return Err(Self::fail(&mut inner, Some(info.serial.as_str()), e)),
                }
            }
            info!(serial = %info.serial, device_number = number, "attached to open device");
            return Ok(number);
        }

        let handle = match self.driver.open(&info) {
            Ok(handle) => handle,
            Err(e) => return Err(Self::fail(&mut inner, Some(info.serial.as_str()), e)),
        };
        inner.records.push(DeviceRecord::new(&info.serial, handle));
        let number = inner.records.len() - 1;
        info!(serial = %info.serial, label = %info.label, device_number = number, "opened device");
        Ok(number)
    }

    /// The enumeration list, fetching it on first use
    pub fn discovered_devices(&self) -> Result<Vec<DeviceInfo>> {
        let mut inner = self.inner.lock();
        Self::ensure_discovered(self.driver.as_ref(), &mut inner)?;
        Ok(inner.discovered.clone().unwrap_or_default())
    }

    /// Connection handle for configuration calls. Fails once the device has
    /// been closed or was never opened.
    pub fn get_device(&self, device_number: usize) -> Result<Arc<dyn RadioConnection>> {
        let inner = self.inner.lock();
        Self::connection(&inner, device_number)
    }

    /// Register `kind`'s ownership of the device and validate its declared
    /// channel mode and settings file against the other direction's claim.
    /// The first claimant's declarations become the reference; a second
    /// claimant that disagrees on either is a fatal configuration error.
    pub fn check_blocks(
        &self,
        device_number: usize,
        kind: BlockKind,
        chip_mode: ChipMode,
        settings_file: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock();
        if device_number >= inner.records.len() {
            let e = Error::connect(format!("device {} was never opened", device_number));
            return Err(Self::fail(&mut inner, None, e));
        }

        let serial = inner.records[device_number].serial.clone();
        let other = inner.records[device_number]
            .other_claim(kind)
            .map(|(mode, file)| (mode, file.to_string()));

        if let Some((other_mode, other_file)) = other {
            if other_mode != chip_mode {
                let e = Error::consistency(format!(
                    "device {}: {} requested {} but the other block runs {}",
                    serial, kind, chip_mode, other_mode
                ));
                return Err(Self::fail(&mut inner, None, e));
            }
            if other_file != settings_file {
                let e = Error::consistency(format!(
                    "device {}: {} requested settings file '{}' but the other block loaded '{}'",
                    serial, kind, settings_file, other_file
                ));
                return Err(Self::fail(&mut inner, None, e));
            }
        }

        inner.records[device_number].claim(kind, chip_mode, settings_file);
        info!(device_number, block = %kind, mode = %chip_mode, "block claimed device");
        Ok(())
    }

    /// Release `kind`'s claim on the device. When the last claim drops the
    /// underlying connection is closed. Closing an already-closed direction
    /// is a no-op.
    pub fn close_device(&self, device_number: usize, kind: BlockKind) {
        let mut inner = self.inner.lock();
        let record = match inner.records.get_mut(device_number) {
            Some(record) => record,
            None => return,
        };
        if !record.is_claimed(kind) {
            return;
        }
        record.release(kind);
        info!(device_number, block = %kind, "block released device");
        if record.unclaimed() {
            if let Some(handle) = record.handle.take() {
                handle.close();
                info!(device_number, serial = %record.serial, "closed device");
            }
        }
    }

    /// Close every open device. Idempotent: the close sequence runs once.
    pub fn close_all_devices(&self) {
        let mut inner = self.inner.lock();
        Self::close_all_locked(&mut inner);
    }

    /// Report a failure on the device and unconditionally tear down the
    /// whole device set. One hardware error leaves no device trustworthy.
    pub fn error(&self, device_number: usize) {
        let mut inner = self.inner.lock();
        let serial = inner
            .records
            .get(device_number)
            .map(|r| r.serial.clone())
            .unwrap_or_default();
        error!(device_number, serial = %serial, "device failure reported, closing all devices");
        Self::close_all_locked(&mut inner);
    }

    /// Number of device records (open or not) the registry holds
    pub fn device_count(&self) -> usize {
        self.inner.lock().records.len()
    }

    fn ensure_discovered(driver: &dyn RadioDriver, inner: &mut RegistryInner) -> Result<()> {
        if inner.discovered.is_none() {
            let list = driver.enumerate()?;
            info!(count = list.len(), "discovered devices");
            inner.discovered = Some(list);
        }
        Ok(())
    }

    fn connection(inner: &RegistryInner, device_number: usize) -> Result<Arc<dyn RadioConnection>> {
        inner
            .records
            .get(device_number)
            .and_then(|r| r.handle.clone())
            .ok_or_else(|| Error::connect(format!("device {} is not open", device_number)))
    }

    /// Connection lookup for configuration forwarding. Unlike the
    /// `get_device` query, a miss here means a block is configuring a
    /// device it never opened, so it runs the fatal path.
    fn connection_for_config(
        inner: &mut RegistryInner,
        device_number: usize,
    ) -> Result<Arc<dyn RadioConnection>> {
        Self::connection(inner, device_number).map_err(|e| Self::fail(inner, None, e))
    }

    /// Error router shared by every operation: report, close every open
    /// device when the error category demands it, hand the error back for
    /// propagation. Runs on the already locked state so callers holding
    /// the guard can invoke teardown.
    fn fail(inner: &mut RegistryInner, serial: Option<&str>, err: Error) -> Error {
        if err.is_fatal() {
            error!(serial = serial.unwrap_or("?"), "{err}, closing all devices");
            Self::close_all_locked(inner);
        }
        err
    }

    fn close_all_locked(inner: &mut RegistryInner) {
        if inner.closed {
            return;
        }
        inner.closed = true;
        for record in &mut inner.records {
            if record.handle.is_some() {
                info!(serial = %record.serial, "closing device");
                record.reset();
            }
        }
    }
}
