//! Builder for `Controller`.
//!
//! Starts from `ControllerCfg::default()`; individual knobs can be overridden
//! before `build()` validates the result.

use std::time::Duration;

use crate::config::ControllerCfg;
use crate::controller::Controller;
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ControllerBuilder {
    cfg: Option<ControllerCfg>,
    consistency_tolerance: Option<u32>,
    drop_threshold: Option<u32>,
    compensation_increment: Option<u8>,
    consistent_readings_target: Option<u32>,
    manual_override_window: Option<Duration>,
}

impl ControllerBuilder {
    /// Replace the base configuration. Individual overrides still apply on top.
    pub fn with_config(mut self, cfg: ControllerCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    pub fn with_consistency_tolerance(mut self, rpm: u32) -> Self {
        self.consistency_tolerance = Some(rpm);
        self
    }

    pub fn with_drop_threshold(mut self, rpm: u32) -> Self {
        self.drop_threshold = Some(rpm);
        self
    }

    pub fn with_compensation_increment(mut self, percent: u8) -> Self {
        self.compensation_increment = Some(percent);
        self
    }

    pub fn with_consistent_readings_target(mut self, n: u32) -> Self {
        self.consistent_readings_target = Some(n);
        self
    }

    pub fn with_manual_override_window(mut self, window: Duration) -> Self {
        self.manual_override_window = Some(window);
        self
    }

    /// Validate and construct. The controller starts disconnected.
    pub fn build(self) -> Result<Controller> {
        let mut cfg = self.cfg.unwrap_or_default();
        if let Some(v) = self.consistency_tolerance {
            cfg.consistency_tolerance = v;
        }
        if let Some(v) = self.drop_threshold {
            cfg.drop_threshold = v;
        }
        if let Some(v) = self.compensation_increment {
            cfg.compensation_increment = v;
        }
        if let Some(v) = self.consistent_readings_target {
            cfg.consistent_readings_target = v;
        }
        if let Some(v) = self.manual_override_window {
            cfg.manual_override_window = v;
        }
        cfg.validate().map_err(eyre::Report::new)?;
        Ok(Controller::from_validated(cfg))
    }
}
