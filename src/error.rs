//! Device error types
//!
//! Failures on the pedal (evdev) and virtual keyboard (uinput) side.
//! Application-level code wraps these in `anyhow` with context.

use std::io;
use thiserror::Error;

/// Failure talking to an input source or the virtual output device
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot open input device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot grab {device}: {source}")]
    Grab {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot ungrab {device}: {source}")]
    Ungrab {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("read from {device} failed: {source}")]
    Read {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("write to {device} failed: {source}")]
    Write {
        device: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot create virtual keyboard {name}: {source}")]
    Build {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{device} is already closed")]
    Closed { device: String },
}
