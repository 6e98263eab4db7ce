//! `From` implementations bridging `rpm_config` types to `rpm_core` types.

use std::time::Duration;

use crate::config::{ControllerCfg, TelemetryCfg};

// ── ControllerCfg ────────────────────────────────────────────────────────────

impl From<&rpm_config::ControllerCfg> for ControllerCfg {
    fn from(c: &rpm_config::ControllerCfg) -> Self {
        Self {
            consistency_tolerance: c.consistency_tolerance,
            drop_threshold: c.drop_threshold,
            compensation_increment: c.compensation_increment,
            consistent_readings_target: c.consistent_readings_target,
            manual_override_window: Duration::from_millis(c.manual_override_window_ms),
        }
    }
}

// ── TelemetryCfg ─────────────────────────────────────────────────────────────

impl From<&rpm_config::TelemetryCfg> for TelemetryCfg {
    fn from(c: &rpm_config::TelemetryCfg) -> Self {
        Self {
            prefix: c.prefix.clone(),
            read_timeout: Duration::from_millis(c.read_timeout_ms),
        }
    }
}
