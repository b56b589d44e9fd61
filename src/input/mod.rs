//! Pedal input
//!
//! Read raw key events from foot pedals via evdev.
//! - Device discovery by name and exclusive grab
//! - Edge detection (press / release, repeat dropped)

pub mod dispatcher;
pub mod event;
pub mod keycodes;
pub mod source;

pub use dispatcher::Dispatcher;
pub use event::{KeyState, RawEvent};
pub use source::{compatible_devices, EventSource};
