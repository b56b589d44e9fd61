//! Shutdown signals
//!
//! SIGTERM (systemd stop), SIGINT (Ctrl+C) and SIGHUP (terminal hangup) all
//! request a graceful shutdown. The handler only records which signal
//! arrived first; the poll loop notices and runs cleanup itself.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::poll::StopCheck;

/// First shutdown signal received (0 = none yet)
static RECEIVED_SIGNAL: AtomicI32 = AtomicI32::new(0);

/// Why the poll loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// SIGTERM
    Terminate,
    /// SIGINT (Ctrl+C)
    Interrupt,
    /// SIGHUP
    Hangup,
}

impl StopReason {
    pub fn from_signal(signo: libc::c_int) -> Option<Self> {
        match signo {
            0 => None,
            libc::SIGINT => Some(StopReason::Interrupt),
            libc::SIGHUP => Some(StopReason::Hangup),
            _ => Some(StopReason::Terminate),
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::Terminate => "SIGTERM",
            StopReason::Interrupt => "SIGINT",
            StopReason::Hangup => "SIGHUP",
        };
        f.write_str(name)
    }
}

/// Set up signal handlers for graceful shutdown (call once at startup)
pub fn setup_signal_handlers() {
    unsafe {
        libc::signal(
            libc::SIGTERM,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGINT,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGHUP,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
    }
}

extern "C" fn shutdown_signal_handler(signo: libc::c_int) {
    // Keep the first signal; a later Ctrl+C must not hide a SIGTERM
    let _ = RECEIVED_SIGNAL.compare_exchange(0, signo, Ordering::Relaxed, Ordering::Relaxed);
}

/// Shutdown request recorded by the signal handler, if any
pub fn received_signal() -> Option<StopReason> {
    StopReason::from_signal(RECEIVED_SIGNAL.load(Ordering::Relaxed))
}

/// Stop check backed by the process signal handlers
pub struct SignalStop;

impl StopCheck for SignalStop {
    fn stop_requested(&self) -> Option<StopReason> {
        received_signal()
    }
}
