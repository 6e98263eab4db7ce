//! Display-oriented view of the controller after each event.

use core::fmt;

use crate::setpoint::Setpoint;

/// Coarse motor status shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorStatus {
    /// Not connected to a peripheral.
    Unknown,
    /// Commanded 0% and reporting 0 RPM (or nothing yet).
    Idle,
    Running,
}

impl MotorStatus {
    pub fn derive(connected: bool, setpoint: Setpoint, last_rpm: Option<u32>) -> Self {
        if !connected {
            return Self::Unknown;
        }
        if setpoint == Setpoint::ZERO && last_rpm.unwrap_or(0) == 0 {
            Self::Idle
        } else {
            Self::Running
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "N/A",
            Self::Idle => "Idle",
            Self::Running => "Running",
        }
    }
}

/// Point-in-time copy of the controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub connected: bool,
    pub setpoint: Setpoint,
    pub last_rpm: Option<u32>,
    pub consecutive_consistent: u32,
    /// `Some` while compensating.
    pub baseline: Option<Setpoint>,
    pub override_active: bool,
    pub status: MotorStatus,
    /// Label of the most recent telemetry verdict, if any.
    pub consistency: Option<String>,
}

impl fmt::Display for ControllerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "speed={} rpm={} status={} consistency={}",
            self.setpoint.percent(),
            self.last_rpm.unwrap_or(0),
            self.status.name(),
            self.consistency.as_deref().unwrap_or("Unknown"),
        )?;
        if let Some(b) = self.baseline {
            write!(f, " compensating(baseline={})", b.percent())?;
        }
        Ok(())
    }
}
