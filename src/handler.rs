//! Pedal handlers
//!
//! A handler decides which synthetic keys to emit for one pedal transition.
//! The default mapping is a clutch on Caps Lock: pressing the pedal releases
//! the modifier, letting go of the pedal presses it.
//!
//! Mappings come from the `[mapping]` config section as action lists
//! (`"up KEY_CAPSLOCK"`, `"tap KEY_ESC"`, ...), shared between the press and
//! release handlers so a reloaded config takes effect on the next event.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};

use crate::config::MappingConfig;
use crate::error::DeviceError;
use crate::input::keycodes::{self, KEY_CAPSLOCK};
use crate::input::{EventSource, KeyState, RawEvent};
use crate::output::{send_key, KeySink};

/// Callback run for a pedal transition
///
/// Receives the output device, the pedal that produced the event and the event
/// itself. Each call must end with a synchronization on the output device.
pub trait Handler {
    fn handle(
        &self,
        output: &mut dyn KeySink,
        source: &dyn EventSource,
        event: &RawEvent,
    ) -> Result<(), DeviceError>;
}

impl<F> Handler for F
where
    F: Fn(&mut dyn KeySink, &dyn EventSource, &RawEvent) -> Result<(), DeviceError>,
{
    fn handle(
        &self,
        output: &mut dyn KeySink,
        source: &dyn EventSource,
        event: &RawEvent,
    ) -> Result<(), DeviceError> {
        self(output, source, event)
    }
}

/// Press/release handlers shared by every dispatcher
#[derive(Clone)]
pub struct HandlerPair {
    pub press: Rc<dyn Handler>,
    pub release: Rc<dyn Handler>,
}

impl HandlerPair {
    pub fn new(press: impl Handler + 'static, release: impl Handler + 'static) -> Self {
        Self {
            press: Rc::new(press),
            release: Rc::new(release),
        }
    }

    /// Handlers driven by a shared keymap
    pub fn from_keymap(keymap: &SharedKeymap) -> Self {
        Self::new(
            KeymapHandler {
                keymap: Rc::clone(keymap),
                edge: Edge::Press,
            },
            KeymapHandler {
                keymap: Rc::clone(keymap),
                edge: Edge::Release,
            },
        )
    }
}

/// One synthetic key operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Key down, sync
    Down(u16),
    /// Key up, sync
    Up(u16),
    /// Key down, sync, key up, sync
    Tap(u16),
}

impl Action {
    pub fn apply(&self, output: &mut dyn KeySink) -> Result<(), DeviceError> {
        match *self {
            Action::Down(code) => send_key(output, code, KeyState::Down),
            Action::Up(code) => send_key(output, code, KeyState::Up),
            Action::Tap(code) => {
                send_key(output, code, KeyState::Down)?;
                send_key(output, code, KeyState::Up)
            }
        }
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    /// Parse `"<down|up|tap> <KEY_NAME>"`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let (Some(verb), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("expected \"<down|up|tap> KEY_NAME\", got {:?}", s);
        };
        let code = keycodes::key_code(key).ok_or_else(|| anyhow!("unknown key {:?}", key))?;
        match verb.to_ascii_lowercase().as_str() {
            "down" | "press" => Ok(Action::Down(code)),
            "up" | "release" => Ok(Action::Up(code)),
            "tap" => Ok(Action::Tap(code)),
            other => bail!("unknown action {:?} (expected down, up or tap)", other),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Action::Down(code) => write!(f, "down {}", keycodes::key_name(code)),
            Action::Up(code) => write!(f, "up {}", keycodes::key_name(code)),
            Action::Tap(code) => write!(f, "tap {}", keycodes::key_name(code)),
        }
    }
}

/// Pedal transition a keymap entry responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Press,
    Release,
}

/// Actions for each pedal transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    press: Vec<Action>,
    release: Vec<Action>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            press: vec![Action::Up(KEY_CAPSLOCK)],
            release: vec![Action::Down(KEY_CAPSLOCK)],
        }
    }
}

impl Keymap {
    pub fn from_config(mapping: &MappingConfig) -> Result<Self> {
        Ok(Self {
            press: parse_actions(&mapping.press).context("invalid [mapping] press")?,
            release: parse_actions(&mapping.release).context("invalid [mapping] release")?,
        })
    }

    pub fn actions(&self, edge: Edge) -> &[Action] {
        match edge {
            Edge::Press => &self.press,
            Edge::Release => &self.release,
        }
    }
}

impl fmt::Display for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |actions: &[Action]| {
            actions
                .iter()
                .map(Action::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "press [{}], release [{}]",
            join(&self.press),
            join(&self.release)
        )
    }
}

fn parse_actions(entries: &[String]) -> Result<Vec<Action>> {
    entries.iter().map(|entry| entry.parse()).collect()
}

pub type SharedKeymap = Rc<RefCell<Keymap>>;

/// Handler running the actions a keymap assigns to one edge
pub struct KeymapHandler {
    keymap: SharedKeymap,
    edge: Edge,
}

impl Handler for KeymapHandler {
    fn handle(
        &self,
        output: &mut dyn KeySink,
        _source: &dyn EventSource,
        _event: &RawEvent,
    ) -> Result<(), DeviceError> {
        let keymap = self.keymap.borrow();
        for action in keymap.actions(self.edge) {
            action.apply(output)?;
        }
        Ok(())
    }
}
