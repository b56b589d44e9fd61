//! Edge detection for one pedal
//!
//! A dispatcher drains the pending events of its input source in arrival
//! order and routes key-down to the press handler and key-up to the release
//! handler. Key repeat is dropped: a momentary clutch has no use for it.

use log::{debug, trace};

use super::event::{classify, KeyState};
use super::source::EventSource;
use crate::error::DeviceError;
use crate::handler::HandlerPair;
use crate::input::keycodes;
use crate::output::KeySink;

/// Binding of one input source to the shared handler pair
pub struct Dispatcher<S> {
    source: S,
    handlers: HandlerPair,
}

impl<S: EventSource> Dispatcher<S> {
    pub fn new(source: S, handlers: HandlerPair) -> Self {
        Self { source, handlers }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Drain pending events and run the matching handlers.
    ///
    /// Returns the number of handler invocations. A read or handler failure
    /// stops the drain and is returned as-is.
    pub fn handle_read(&mut self, output: &mut dyn KeySink) -> Result<usize, DeviceError> {
        let events = self.source.read_events()?;
        let mut fired = 0;

        for event in &events {
            let (handler, state) = match classify(event) {
                Some(KeyState::Down) => (&self.handlers.press, KeyState::Down),
                Some(KeyState::Up) => (&self.handlers.release, KeyState::Up),
                Some(KeyState::Repeat) => {
                    trace!("{}: repeat {} ignored", self.source.name(), event.code);
                    continue;
                }
                None => {
                    trace!(
                        "{}: skipping type={} code={} value={}",
                        self.source.name(),
                        event.kind,
                        event.code,
                        event.value
                    );
                    continue;
                }
            };

            debug!(
                "{}: {} {:?} at {:?}",
                self.source.name(),
                keycodes::key_name(event.code),
                state,
                event.timestamp
            );
            handler.handle(output, &self.source, event)?;
            fired += 1;
        }

        Ok(fired)
    }
}
