//! Raw input events and key-state classification

use std::time::SystemTime;

/// Key event type (EV_KEY)
pub const EV_KEY: u16 = evdev::EventType::KEY.0;

/// One event as read from an input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// Event type (EV_KEY, EV_SYN, ...)
    pub kind: u16,
    /// Key code for EV_KEY events
    pub code: u16,
    /// 0 = up, 1 = down, 2 = repeat for EV_KEY events
    pub value: i32,
    /// Kernel timestamp
    pub timestamp: SystemTime,
}

#[cfg(test)]
impl RawEvent {
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self {
            kind,
            code,
            value,
            timestamp: SystemTime::now(),
        }
    }

    /// Key event shorthand
    pub fn key(code: u16, state: KeyState) -> Self {
        Self::new(EV_KEY, code, state.value())
    }
}

impl From<evdev::InputEvent> for RawEvent {
    fn from(ev: evdev::InputEvent) -> Self {
        Self {
            kind: ev.event_type().0,
            code: ev.code(),
            value: ev.value(),
            timestamp: ev.timestamp(),
        }
    }
}

/// Edge carried by a key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Up,
    Down,
    Repeat,
}

impl KeyState {
    /// Map an EV_KEY value to a key state
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Up),
            1 => Some(KeyState::Down),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }

    /// EV_KEY value for this state
    pub fn value(self) -> i32 {
        match self {
            KeyState::Up => 0,
            KeyState::Down => 1,
            KeyState::Repeat => 2,
        }
    }
}

/// Classify a raw event
///
/// Returns `None` for anything that is not an EV_KEY event with a known value.
pub fn classify(event: &RawEvent) -> Option<KeyState> {
    if event.kind != EV_KEY {
        return None;
    }
    KeyState::from_value(event.value)
}
