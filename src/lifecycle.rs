//! Device ownership for one run
//!
//! `Session` owns the virtual keyboard and every grabbed pedal. Releasing
//! happens once: pedals are ungrabbed best-effort, then the keyboard is
//! closed. Dropping the session releases too, so early returns and fatal
//! errors leave no device grabbed.

use log::{debug, info, warn};

use crate::error::DeviceError;
use crate::handler::HandlerPair;
use crate::input::{Dispatcher, EventSource};
use crate::output::KeySink;

pub struct Session<S: EventSource, K: KeySink> {
    dispatchers: Vec<Dispatcher<S>>,
    output: K,
    released: bool,
}

impl<S: EventSource, K: KeySink> Session<S, K> {
    pub fn new(output: K) -> Self {
        Self {
            dispatchers: Vec::new(),
            output,
            released: false,
        }
    }

    /// Grab a source and bind it to the handler pair.
    ///
    /// A source that fails to grab is dropped without being registered.
    pub fn acquire(&mut self, mut source: S, handlers: HandlerPair) -> Result<(), DeviceError> {
        source.grab()?;
        info!("Grabbed {}", source.name());
        self.dispatchers.push(Dispatcher::new(source, handlers));
        Ok(())
    }

    pub fn source_count(&self) -> usize {
        self.dispatchers.len()
    }

    pub fn output_name(&self) -> &str {
        self.output.name()
    }

    /// One non-blocking pass over every source, in registration order
    pub fn poll_pass(&mut self) -> Result<usize, DeviceError> {
        let mut fired = 0;
        for dispatcher in &mut self.dispatchers {
            fired += dispatcher.handle_read(&mut self.output)?;
        }
        Ok(fired)
    }

    /// Ungrab every grabbed source and close the output device.
    ///
    /// Only the first call does anything.
    pub fn release_all(&mut self) {
        if self.released {
            debug!("Devices already released");
            return;
        }
        self.released = true;

        let mut ungrabbed = 0;
        for dispatcher in &mut self.dispatchers {
            let source = dispatcher.source_mut();
            if !source.is_grabbed() {
                continue;
            }
            match source.ungrab() {
                Ok(()) => ungrabbed += 1,
                Err(e) => warn!("{}", e),
            }
        }

        if let Err(e) = self.output.close() {
            warn!("{}", e);
        }

        info!(
            "Released {}/{} input source(s), closed {}",
            ungrabbed,
            self.dispatchers.len(),
            self.output.name()
        );
    }
}

impl<S: EventSource, K: KeySink> Drop for Session<S, K> {
    fn drop(&mut self) {
        self.release_all();
    }
}
