//! Runtime configuration for the controller and the telemetry pump.
//!
//! These are the structs the core actually consumes. They are separate from
//! the TOML-deserialized config in `rpm_config`; see `conversions`.

use std::time::Duration;

use crate::error::BuildError;
use crate::telemetry::DEFAULT_PREFIX;

/// Longest accepted manual-override window.
pub const MAX_OVERRIDE_WINDOW: Duration = Duration::from_secs(60);

/// Tuning knobs of the consistency evaluator, debouncer and compensation machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerCfg {
    /// `|new - last| <= consistency_tolerance` is "consistent" (RPM, inclusive).
    pub consistency_tolerance: u32,
    /// Minimum decrease between readings that counts as a sudden drop (RPM).
    pub drop_threshold: u32,
    /// Percent added to the setpoint per boost.
    pub compensation_increment: u8,
    /// Consecutive consistent readings required to revert a boost.
    pub consistent_readings_target: u32,
    /// Suppression window after an operator setpoint change.
    pub manual_override_window: Duration,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            consistency_tolerance: 30,
            drop_threshold: 50,
            compensation_increment: 10,
            consistent_readings_target: 3,
            manual_override_window: Duration::from_millis(1500),
        }
    }
}

impl ControllerCfg {
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.drop_threshold == 0 {
            return Err(BuildError::InvalidConfig("drop_threshold must be >= 1"));
        }
        if self.compensation_increment == 0 || self.compensation_increment > 100 {
            return Err(BuildError::InvalidConfig(
                "compensation_increment must be in [1, 100]",
            ));
        }
        if self.consistent_readings_target == 0 {
            return Err(BuildError::InvalidConfig(
                "consistent_readings_target must be >= 1",
            ));
        }
        if self.manual_override_window > MAX_OVERRIDE_WINDOW {
            return Err(BuildError::InvalidConfig(
                "manual_override_window must be <= 60s",
            ));
        }
        Ok(())
    }
}

/// Telemetry pump configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryCfg {
    /// Prefix marking an RPM report line.
    pub prefix: String,
    /// Max wait per `LineSource::read_line` before re-checking shutdown.
    pub read_timeout: Duration,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            read_timeout: Duration::from_millis(200),
        }
    }
}
