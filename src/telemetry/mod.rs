//! Telemetry module
//!
//! Structured logging and periodic conversion progress reporting

mod logging;
mod progress;

pub use logging::{init_logging, LogFormat};
pub use progress::ProgressReporter;

use crate::config::TelemetryConfig;

/// Guard that cleans up telemetry on drop
pub struct TelemetryGuard {
    _priv: (),
}

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let format = if config.json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(&config.log_level, format)?;

    Ok(TelemetryGuard { _priv: () })
}
