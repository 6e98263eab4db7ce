#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! RPM consistency & compensation controller (transport-agnostic).
//!
//! This crate holds the decision logic that watches measured RPM, boosts the
//! commanded speed on a sudden drop and reverts once readings are stable.
//! All I/O goes through `rpm_traits::CommandSink` and `rpm_traits::LineSource`.
//!
//! ## Architecture
//!
//! - **Telemetry**: `RPM<digits>` line parsing (`telemetry` module)
//! - **Consistency**: reading-to-reading classification (`consistency`)
//! - **Manual override**: grace window after operator changes (`manual_override`)
//! - **Compensation**: boost/revert episode bookkeeping (`compensation`)
//! - **Commands**: wire vocabulary and fire-and-forget emitter (`command`, `emitter`)
//! - **Controller**: the pure `(state, event, now)` step (`controller`)
//! - **Worker / pump**: threaded shell serialising events (`worker`, `pump`)
//!
//! ## Integer arithmetic
//!
//! RPM values are `u32` and setpoints are integer percent; every threshold
//! comparison is exact.

pub mod builder;
pub mod command;
pub mod compensation;
pub mod config;
pub mod consistency;
pub mod controller;
pub mod conversions;
pub mod emitter;
pub mod error;
pub mod link_error;
pub mod manual_override;
pub mod mocks;
pub mod pump;
pub mod setpoint;
pub mod status;
pub mod telemetry;
pub mod worker;

pub use builder::ControllerBuilder;
pub use command::{Command, CommandReason, Direction, IssuedCommand, MotorId};
pub use compensation::{Compensation, RevertCause, Transition};
pub use config::{ControllerCfg, TelemetryCfg};
pub use consistency::{Consistency, Verdict};
pub use controller::{Controller, ControllerState, Event, OperatorRequest, StepOutcome};
pub use emitter::{CommandEmitter, SendFailure};
pub use error::{BuildError, ControlError};
pub use pump::{PumpStats, TelemetryPump};
pub use setpoint::Setpoint;
pub use status::{ControllerSnapshot, MotorStatus};
pub use telemetry::{Sample, TelemetryParser};
pub use worker::{Notification, Worker, WorkerHandle, WorkerReport};
