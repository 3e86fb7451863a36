use crate::hal::{BlockKind, ChipMode, RadioConnection};
use std::sync::Arc;

/// Per-physical-device state. Records are created on first open, live at a
/// stable index for the registry's lifetime, and are only reset in bulk at
/// full teardown.
pub struct DeviceRecord {
    /// Serial-derived identity this record was opened for
    pub serial: String,
    /// Open connection; `None` once every claim has been released
    pub handle: Option<Arc<dyn RadioConnection>>,
    pub source_claimed: bool,
    pub sink_claimed: bool,
    /// Channel mode each direction declared at claim time
    pub source_chip_mode: Option<ChipMode>,
    pub sink_chip_mode: Option<ChipMode>,
    /// Settings file each direction declared; empty means "no file"
    pub source_settings_file: String,
    pub sink_settings_file: String,
}

impl DeviceRecord {
    pub fn new(serial: &str, handle: Arc<dyn RadioConnection>) -> Self {
        Self {
            serial: serial.to_string(),
            handle: Some(handle),
            source_claimed: false,
            sink_claimed: false,
            source_chip_mode: None,
            sink_chip_mode: None,
            source_settings_file: String::new(),
            sink_settings_file: String::new(),
        }
    }

    pub fn is_claimed(&self, kind: BlockKind) -> bool {
        match kind {
            BlockKind::Source => self.source_claimed,
            BlockKind::Sink => self.sink_claimed,
        }
    }

    /// Mark `kind` as an active owner and record what it declared
    pub fn claim(&mut self, kind: BlockKind, chip_mode: ChipMode, settings_file: &str) {
        match kind {
            BlockKind::Source => {
                self.source_claimed = true;
                self.source_chip_mode = Some(chip_mode);
                self.source_settings_file = settings_file.to_string();
            }
            BlockKind::Sink => {
                self.sink_claimed = true;
                self.sink_chip_mode = Some(chip_mode);
                self.sink_settings_file = settings_file.to_string();
            }
        }
    }

    /// Drop `kind`'s claim and its declarations. No-op when not claimed.
    pub fn release(&mut self, kind: BlockKind) {
        match kind {
            BlockKind::Source => {
                self.source_claimed = false;
                self.source_chip_mode = None;
                self.source_settings_file.clear();
            }
            BlockKind::Sink => {
                self.sink_claimed = false;
                self.sink_chip_mode = None;
                self.sink_settings_file.clear();
            }
        }
    }

    /// Declarations of the opposite direction, if it holds a claim
    pub fn other_claim(&self, kind: BlockKind) -> Option<(ChipMode, &str)> {
        let (claimed, mode, file) = match kind {
            BlockKind::Source => (
                self.sink_claimed,
                self.sink_chip_mode,
                self.sink_settings_file.as_str(),
            ),
            BlockKind::Sink => (
                self.source_claimed,
                self.source_chip_mode,
                self.source_settings_file.as_str(),
            ),
        };
        if claimed {
            mode.map(|m| (m, file))
        } else {
            None
        }
    }

    /// True when neither direction holds a claim
    pub fn unclaimed(&self) -> bool {
        !self.source_claimed && !self.sink_claimed
    }

    /// Close and drop the handle, clearing all claim state
    pub fn reset(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        self.release(BlockKind::Source);
        self.release(BlockKind::Sink);
    }
}
