//! The RPM consistency & compensation controller.
//!
//! A pure step function over `(state, event, now)`: every call runs one event
//! to completion and returns the commands to send. Nothing here touches the
//! transport or reads a clock; see `worker` for the threaded shell.

use std::time::Instant;

use crate::builder::ControllerBuilder;
use crate::command::{CommandReason, Direction, IssuedCommand, MotorId};
use crate::compensation::{self, Compensation, RevertCause, Transition};
use crate::config::ControllerCfg;
use crate::consistency::{self, Consistency, Verdict};
use crate::error::ControlError;
use crate::manual_override::ManualOverride;
use crate::setpoint::Setpoint;
use crate::status::{ControllerSnapshot, MotorStatus};
use crate::telemetry::Sample;

/// Operator input from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRequest {
    Setpoint(Setpoint),
    Direction { motor: MotorId, direction: Direction },
}

/// Everything the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Connected,
    Disconnected,
    Telemetry(Sample),
    Operator(OperatorRequest),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Telemetry(_) => "telemetry",
            Self::Operator(OperatorRequest::Setpoint(_)) => "operator_setpoint",
            Self::Operator(OperatorRequest::Direction { .. }) => "operator_direction",
        }
    }
}

/// Session-scoped controller record. Reset on connect, discarded on disconnect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    pub last_sample: Option<Sample>,
    pub consecutive_consistent: u32,
    pub compensation: Option<Compensation>,
    pub manual_override: ManualOverride,
    pub setpoint: Setpoint,
}

/// Result of handling one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Commands to send, in order.
    pub commands: Vec<IssuedCommand>,
    /// Present for telemetry events that were evaluated or suppressed.
    pub verdict: Option<Verdict>,
    pub transition: Option<Transition>,
    /// Set when the event was not applied (e.g. no peripheral connected).
    pub refused: Option<ControlError>,
}

impl StepOutcome {
    fn refused(err: ControlError) -> Self {
        Self {
            refused: Some(err),
            ..Self::default()
        }
    }
}

pub struct Controller {
    pub(crate) cfg: ControllerCfg,
    pub(crate) state: ControllerState,
    pub(crate) connected: bool,
    pub(crate) last_verdict: Option<Verdict>,
}

impl core::fmt::Debug for Controller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("connected", &self.connected)
            .field("setpoint", &self.state.setpoint.percent())
            .field(
                "baseline",
                &self.state.compensation.map(|c| c.baseline.percent()),
            )
            .field("consecutive_consistent", &self.state.consecutive_consistent)
            .finish()
    }
}

impl Controller {
    /// Start building a Controller.
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    /// Caller guarantees `cfg` has been validated.
    pub(crate) fn from_validated(cfg: ControllerCfg) -> Self {
        Self {
            cfg,
            state: ControllerState::default(),
            connected: false,
            last_verdict: None,
        }
    }

    /// Dispatch one event.
    pub fn handle(&mut self, event: Event, now: Instant) -> StepOutcome {
        match event {
            Event::Connected => self.connect(),
            Event::Disconnected => self.disconnect(),
            Event::Telemetry(sample) => self.on_sample(sample, now),
            Event::Operator(OperatorRequest::Setpoint(sp)) => self.on_operator_setpoint(sp, now),
            Event::Operator(OperatorRequest::Direction { motor, direction }) => {
                self.on_direction(motor, direction)
            }
        }
    }

    /// Fresh session: reset all state and zero the motor.
    pub fn connect(&mut self) -> StepOutcome {
        if self.connected {
            tracing::debug!("connect while already connected; resetting session");
        }
        self.state = ControllerState::default();
        self.last_verdict = None;
        self.connected = true;
        tracing::info!("peripheral connected; controller state reset");
        StepOutcome {
            commands: vec![IssuedCommand::speed(Setpoint::ZERO, CommandReason::Connect)],
            ..StepOutcome::default()
        }
    }

    /// End the session, restoring the baseline first if compensating.
    pub fn disconnect(&mut self) -> StepOutcome {
        let mut out = StepOutcome::default();
        if !self.connected {
            return out;
        }
        if let Some((transition, baseline)) =
            compensation::revert(&mut self.state.compensation, RevertCause::Disconnect)
        {
            tracing::info!(
                baseline = baseline.percent(),
                "disconnect during compensation; restoring baseline"
            );
            out.commands.push(IssuedCommand::speed(
                baseline,
                CommandReason::RevertDisconnect,
            ));
            out.transition = Some(transition);
        }
        self.state = ControllerState::default();
        self.last_verdict = None;
        self.connected = false;
        tracing::info!("peripheral disconnected; controller state discarded");
        out
    }

    /// Evaluate one telemetry sample.
    pub fn on_sample(&mut self, sample: Sample, now: Instant) -> StepOutcome {
        if !self.connected {
            tracing::trace!(rpm = sample.rpm, "telemetry while disconnected; dropped");
            return StepOutcome::refused(ControlError::NotConnected);
        }
        let mut out = StepOutcome::default();
        let cfg = &self.cfg;
        let st = &mut self.state;

        let verdict = if st.manual_override.is_active(now) {
            st.consecutive_consistent = 0;
            Verdict::Suppressed
        } else {
            let class = consistency::classify(
                st.last_sample.as_ref(),
                &sample,
                cfg.consistency_tolerance,
            );
            if class == Consistency::Consistent {
                st.consecutive_consistent = st.consecutive_consistent.saturating_add(1);
            } else {
                st.consecutive_consistent = 0;
            }

            if class == Consistency::NotConsistent
                && let Some(last) = st.last_sample
                && consistency::is_sudden_drop(last.rpm, sample.rpm, cfg.drop_threshold)
            {
                let (transition, next) = compensation::boost(
                    &mut st.compensation,
                    st.setpoint,
                    cfg.compensation_increment,
                );
                tracing::info!(
                    last_rpm = last.rpm,
                    rpm = sample.rpm,
                    from = st.setpoint.percent(),
                    to = next.percent(),
                    boosts = st.compensation.map_or(0, |c| c.boosts),
                    transition = transition.name(),
                    "sudden rpm drop; boosting speed"
                );
                st.setpoint = next;
                out.commands
                    .push(IssuedCommand::speed(next, CommandReason::Boost));
                out.transition = Some(transition);
            }

            if st.compensation.is_some()
                && st.consecutive_consistent >= cfg.consistent_readings_target
                && let Some((transition, baseline)) =
                    compensation::revert(&mut st.compensation, RevertCause::Consistency)
            {
                tracing::info!(
                    readings = st.consecutive_consistent,
                    baseline = baseline.percent(),
                    "rpm stable again; reverting compensation"
                );
                st.setpoint = baseline;
                st.consecutive_consistent = 0;
                out.commands.push(IssuedCommand::speed(
                    baseline,
                    CommandReason::RevertConsistency,
                ));
                out.transition = Some(transition);
            }

            Verdict::Evaluated(class)
        };

        tracing::trace!(
            rpm = sample.rpm,
            verdict = %verdict.label(cfg.consistency_tolerance),
            consecutive = st.consecutive_consistent,
            "sample processed"
        );
        st.last_sample = Some(sample);
        self.last_verdict = Some(verdict);
        out.verdict = Some(verdict);
        out
    }

    /// Operator speed change: arm the override window, abandon any boost, apply the request.
    pub fn on_operator_setpoint(&mut self, requested: Setpoint, now: Instant) -> StepOutcome {
        if !self.connected {
            tracing::warn!(
                requested = requested.percent(),
                "speed change while disconnected; ignored"
            );
            return StepOutcome::refused(ControlError::NotConnected);
        }
        let mut out = StepOutcome::default();
        let st = &mut self.state;
        st.manual_override
            .arm(now, self.cfg.manual_override_window);
        st.consecutive_consistent = 0;

        if let Some((transition, baseline)) =
            compensation::revert(&mut st.compensation, RevertCause::Operator)
        {
            tracing::info!(
                baseline = baseline.percent(),
                requested = requested.percent(),
                "operator change during compensation; restoring baseline"
            );
            out.commands.push(IssuedCommand::speed(
                baseline,
                CommandReason::RevertOperator,
            ));
            out.transition = Some(transition);
        }

        st.setpoint = requested;
        out.commands
            .push(IssuedCommand::speed(requested, CommandReason::Operator));
        tracing::debug!(setpoint = requested.percent(), "operator setpoint applied");
        out
    }

    /// Direction changes pass straight through; they do not touch compensation state.
    pub fn on_direction(&mut self, motor: MotorId, direction: Direction) -> StepOutcome {
        if !self.connected {
            return StepOutcome::refused(ControlError::NotConnected);
        }
        StepOutcome {
            commands: vec![IssuedCommand {
                command: crate::command::Command::Direction { motor, direction },
                reason: CommandReason::Direction,
            }],
            ..StepOutcome::default()
        }
    }

    pub fn cfg(&self) -> &ControllerCfg {
        &self.cfg
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn setpoint(&self) -> Setpoint {
        self.state.setpoint
    }

    pub fn is_compensating(&self) -> bool {
        self.state.compensation.is_some()
    }

    /// Baseline of the active compensation episode.
    pub fn baseline(&self) -> Option<Setpoint> {
        self.state.compensation.map(|c| c.baseline)
    }

    pub fn consecutive_consistent(&self) -> u32 {
        self.state.consecutive_consistent
    }

    pub fn last_rpm(&self) -> Option<u32> {
        self.state.last_sample.map(|s| s.rpm)
    }

    pub fn override_active(&self, now: Instant) -> bool {
        self.state.manual_override.is_active(now)
    }

    pub fn snapshot(&self, now: Instant) -> ControllerSnapshot {
        ControllerSnapshot {
            connected: self.connected,
            setpoint: self.state.setpoint,
            last_rpm: self.last_rpm(),
            consecutive_consistent: self.state.consecutive_consistent,
            baseline: self.baseline(),
            override_active: self.override_active(now),
            status: MotorStatus::derive(self.connected, self.state.setpoint, self.last_rpm()),
            consistency: self
                .last_verdict
                .map(|v| v.label(self.cfg.consistency_tolerance)),
        }
    }
}
