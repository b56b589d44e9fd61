//! Pedal input sources
//!
//! Opens evdev devices (/dev/input/eventN) whose name is on the allow-list,
//! switches them to non-blocking reads and grabs them (EVIOCGRAB) so their
//! events stop reaching the rest of the system.

use std::io;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;

use log::{debug, info};
use nix::fcntl::{fcntl, FcntlArg, OFlag};

use super::event::RawEvent;
use crate::error::DeviceError;

/// A device producing raw input events
pub trait EventSource {
    /// Display name reported by the device
    fn name(&self) -> &str;

    /// Take exclusive ownership of the event stream
    fn grab(&mut self) -> Result<(), DeviceError>;

    /// Give up exclusive ownership
    fn ungrab(&mut self) -> Result<(), DeviceError>;

    fn is_grabbed(&self) -> bool;

    /// Read every event currently pending, in arrival order.
    ///
    /// Returns an empty list when nothing is pending; never blocks.
    fn read_events(&mut self) -> Result<Vec<RawEvent>, DeviceError>;
}

/// evdev-backed foot pedal
pub struct PedalDevice {
    device: evdev::Device,
    name: String,
    grabbed: bool,
}

impl PedalDevice {
    fn from_device(path: PathBuf, device: evdev::Device) -> Result<Self, DeviceError> {
        let name = device.name().unwrap_or_default().to_string();
        set_nonblocking(&device).map_err(|source| DeviceError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            device,
            name,
            grabbed: false,
        })
    }
}

impl EventSource for PedalDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn grab(&mut self) -> Result<(), DeviceError> {
        self.device.grab().map_err(|source| DeviceError::Grab {
            device: self.name.clone(),
            source,
        })?;
        self.grabbed = true;
        Ok(())
    }

    fn ungrab(&mut self) -> Result<(), DeviceError> {
        self.device.ungrab().map_err(|source| DeviceError::Ungrab {
            device: self.name.clone(),
            source,
        })?;
        self.grabbed = false;
        Ok(())
    }

    fn is_grabbed(&self) -> bool {
        self.grabbed
    }

    fn read_events(&mut self) -> Result<Vec<RawEvent>, DeviceError> {
        let mut events = Vec::new();
        loop {
            match self.device.fetch_events() {
                Ok(batch) => {
                    let before = events.len();
                    events.extend(batch.map(RawEvent::from));
                    if events.len() == before {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(DeviceError::Read {
                        device: self.name.clone(),
                        source,
                    })
                }
            }
        }
        Ok(events)
    }
}

/// Find attached pedals whose name exactly matches an allow-list entry
pub fn compatible_devices(names: &[String]) -> Result<Vec<PedalDevice>, DeviceError> {
    let mut pedals = Vec::new();
    for (path, device) in evdev::enumerate() {
        let name = device.name().unwrap_or_default();
        if !is_compatible(name, names) {
            debug!("Skipping input device {}: {:?}", path.display(), name);
            continue;
        }
        info!("Found pedal {:?} at {}", name, path.display());
        pedals.push(PedalDevice::from_device(path, device)?);
    }
    Ok(pedals)
}

/// Exact, case-sensitive match against the allow-list
pub fn is_compatible(name: &str, allow_list: &[String]) -> bool {
    allow_list.iter().any(|allowed| allowed == name)
}

/// Switch the device fd to non-blocking reads
fn set_nonblocking(device: &evdev::Device) -> io::Result<()> {
    let fd = device.as_raw_fd();
    let flags = fcntl(fd, FcntlArg::F_GETFL)?;
    let mut flags = OFlag::from_bits_truncate(flags);
    flags.insert(OFlag::O_NONBLOCK);
    fcntl(fd, FcntlArg::F_SETFL(flags))?;
    Ok(())
}
