//! Global constants for clutch
//!
//! Defaults for configuration values and naming.

/// Application name (config directory, log prefix)
pub const APP_NAME: &str = "clutch";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "CLUTCH_CONFIG";

// ============================================================================
// Timing Constants
// ============================================================================

/// Sleep between polling passes in milliseconds.
/// 20ms keeps CPU use under 1% while staying below perceptible latency.
pub const DEFAULT_IDLE_MS: u64 = 20;

// ============================================================================
// Device Names
// ============================================================================

/// Pedal models recognized without configuration
pub const DEFAULT_PEDAL_NAMES: &[&str] = &["RDing FootSwitchV1.1"];

/// Name of the virtual keyboard
pub const DEFAULT_OUTPUT_NAME: &str = "Emacs-Clutch Foot-Pedal";
