//! Virtual keyboard output
//!
//! Synthetic key events go to a uinput device that the kernel exposes as
//! an ordinary keyboard. Writes are batched until `sync()`, which emits the
//! batch followed by SYN_REPORT.

use log::{debug, info};

use crate::error::DeviceError;
use crate::input::keycodes::{self, KEY_MAX_REGISTERED};
use crate::input::KeyState;

/// A device accepting synthetic key-state changes
pub trait KeySink {
    fn name(&self) -> &str;

    /// Queue one key-state change
    fn write_key(&mut self, code: u16, state: KeyState) -> Result<(), DeviceError>;

    /// Flush queued changes as one report, terminated by a synchronization event
    fn sync(&mut self) -> Result<(), DeviceError>;

    /// Destroy the device. Further writes fail with `DeviceError::Closed`.
    fn close(&mut self) -> Result<(), DeviceError>;
}

/// Write a single key-state change followed by its own synchronization event
pub fn send_key(
    output: &mut dyn KeySink,
    code: u16,
    state: KeyState,
) -> Result<(), DeviceError> {
    debug!("{} {:?} -> {}", keycodes::key_name(code), state, output.name());
    output.write_key(code, state)?;
    output.sync()
}

/// uinput virtual keyboard
pub struct VirtualKeyboard {
    name: String,
    device: Option<evdev::uinput::VirtualDevice>,
    pending: Vec<evdev::InputEvent>,
}

impl VirtualKeyboard {
    /// Create the virtual keyboard, registering every key in `1..=KEY_MAX_REGISTERED`
    pub fn create(name: &str) -> Result<Self, DeviceError> {
        let build_err = |source: std::io::Error| DeviceError::Build {
            name: name.to_string(),
            source,
        };

        let mut keys = evdev::AttributeSet::<evdev::Key>::new();
        for code in 1..=KEY_MAX_REGISTERED {
            keys.insert(evdev::Key::new(code));
        }

        let device = evdev::uinput::VirtualDeviceBuilder::new()
            .map_err(build_err)?
            .name(name)
            .with_keys(&keys)
            .map_err(build_err)?
            .build()
            .map_err(build_err)?;

        info!("Virtual keyboard created: {}", name);
        Ok(Self {
            name: name.to_string(),
            device: Some(device),
            pending: Vec::new(),
        })
    }

    fn closed(&self) -> DeviceError {
        DeviceError::Closed {
            device: self.name.clone(),
        }
    }
}

impl KeySink for VirtualKeyboard {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_key(&mut self, code: u16, state: KeyState) -> Result<(), DeviceError> {
        if self.device.is_none() {
            return Err(self.closed());
        }
        self.pending.push(evdev::InputEvent::new(
            evdev::EventType::KEY,
            code,
            state.value(),
        ));
        Ok(())
    }

    fn sync(&mut self) -> Result<(), DeviceError> {
        let Some(device) = self.device.as_mut() else {
            return Err(self.closed());
        };
        let batch = std::mem::take(&mut self.pending);
        // emit() appends SYN_REPORT after the batch
        device.emit(&batch).map_err(|source| DeviceError::Write {
            device: self.name.clone(),
            source,
        })
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        match self.device.take() {
            Some(device) => {
                self.pending.clear();
                drop(device);
                info!("Virtual keyboard closed: {}", self.name);
                Ok(())
            }
            None => Err(self.closed()),
        }
    }
}
