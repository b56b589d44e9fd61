//! Poll loop
//!
//! Running -> ShuttingDown -> Stopped, never back. While running the loop
//! sleeps a fixed idle interval, then makes one non-blocking pass over every
//! pedal. The sleep keeps CPU use near zero at the cost of up to one idle
//! interval of input latency.

use std::thread;
use std::time::Duration;

use log::{error, info, trace};

use crate::error::DeviceError;
use crate::input::EventSource;
use crate::lifecycle::Session;
use crate::output::KeySink;
use crate::signals::StopReason;

/// Source of shutdown requests
pub trait StopCheck {
    fn stop_requested(&self) -> Option<StopReason>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShuttingDown,
    Stopped,
}

pub struct PollLoop<S: EventSource, K: KeySink> {
    session: Session<S, K>,
    idle: Duration,
    state: LoopState,
    /// Runs once per pass, before the pedals are read
    idle_hook: Option<Box<dyn FnMut()>>,
}

impl<S: EventSource, K: KeySink> PollLoop<S, K> {
    pub fn new(session: Session<S, K>, idle: Duration) -> Self {
        Self {
            session,
            idle,
            state: LoopState::Running,
            idle_hook: None,
        }
    }

    pub fn with_idle_hook(mut self, hook: impl FnMut() + 'static) -> Self {
        self.idle_hook = Some(Box::new(hook));
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Poll until a stop is requested or a device fails, then release devices.
    ///
    /// Cleanup runs on both paths. Returns the stop reason, or the device
    /// error that ended the loop.
    pub fn run(&mut self, stop: &dyn StopCheck) -> Result<StopReason, DeviceError> {
        if self.state != LoopState::Running {
            return Err(DeviceError::Closed {
                device: self.session.output_name().to_string(),
            });
        }

        info!(
            "Polling {} source(s) every {:?}",
            self.session.source_count(),
            self.idle
        );
        let outcome = self.drive(stop);

        self.state = LoopState::ShuttingDown;
        match &outcome {
            Ok(reason) => info!("Received {}, shutting down", reason),
            Err(e) => error!("Shutting down after device failure: {}", e),
        }
        let _ = sd_notify::notify(false, &[sd_notify::NotifyState::Stopping]);

        self.session.release_all();
        self.state = LoopState::Stopped;
        outcome
    }

    fn drive(&mut self, stop: &dyn StopCheck) -> Result<StopReason, DeviceError> {
        loop {
            if let Some(reason) = stop.stop_requested() {
                return Ok(reason);
            }
            if !self.idle.is_zero() {
                thread::sleep(self.idle);
            }
            // A signal during the sleep must not start another pass
            if let Some(reason) = stop.stop_requested() {
                return Ok(reason);
            }

            if let Some(hook) = self.idle_hook.as_mut() {
                hook();
            }
            let fired = self.session.poll_pass()?;
            if fired > 0 {
                trace!("Pass dispatched {} transition(s)", fired);
            }
        }
    }
}
