//! `simulate`: bench run against the simulated motor.

use std::sync::atomic::Ordering;
use std::time::Duration;

use rpm_core::{Controller, ControlError, OperatorRequest, Setpoint, TelemetryParser};
use rpm_link::{LinkError, SimParams, SimulatedMotor};
use rpm_traits::{ManualClock, MonotonicClock};

use crate::cli::SHUTDOWN;
use crate::output::{Printer, Summary};
use crate::session::{SessionOpts, run_session};
use crate::settings::Settings;
use crate::stepper::Stepper;

pub fn sim_params(c: &rpm_config::SimCfg, samples: u32) -> SimParams {
    SimParams {
        max_rpm: c.max_rpm,
        jitter_rpm: c.jitter_rpm,
        slew_rpm: c.slew_rpm,
        load_drop_rpm: c.load_drop_rpm,
        load_after_samples: c.load_after_samples,
        load_for_samples: c.load_for_samples,
        close_after_samples: if samples > 0 {
            samples
        } else {
            c.close_after_samples
        },
        sample_period: Duration::from_millis(c.sample_period_ms),
        seed: c.seed,
    }
}

pub fn run_simulate(
    settings: &Settings,
    speed: u8,
    samples: u32,
    fast: bool,
    printer: Printer,
) -> eyre::Result<Summary> {
    let setpoint = Setpoint::try_from(i64::from(speed))?;
    let params = sim_params(&settings.file.sim, samples);
    if fast && params.close_after_samples == 0 {
        return Err(eyre::Report::new(ControlError::Config(
            "--fast needs a sample limit (--samples > 0)".to_string(),
        )));
    }
    let controller = Controller::builder()
        .with_config(settings.controller.clone())
        .build()?;
    let motor = SimulatedMotor::new(params);
    tracing::info!(
        speed = setpoint.percent(),
        samples = motor.params().close_after_samples,
        fast,
        "starting simulation"
    );

    if fast {
        let clock = ManualClock::new();
        let (mut telemetry, commands) = motor.ports(clock.clone());
        let parser = TelemetryParser::new(settings.telemetry.prefix.clone());
        let mut stepper = Stepper::new(controller, commands, parser, clock, printer);
        stepper.connect();
        stepper.operator(OperatorRequest::Setpoint(setpoint));
        loop {
            if SHUTDOWN.load(Ordering::Relaxed) {
                break;
            }
            match telemetry.next_line() {
                Ok(line) => stepper.line(&line),
                Err(LinkError::Closed) => {
                    stepper.mark_link_lost();
                    stepper.disconnect();
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
        return Ok(stepper.finish());
    }

    let (telemetry, commands) = motor.ports(MonotonicClock::new());
    // keeps the operator channel open for the whole run
    let (_operator_tx, operator_rx) = crossbeam_channel::unbounded();
    run_session(
        controller,
        telemetry,
        commands,
        MonotonicClock::new(),
        &operator_rx,
        SessionOpts {
            telemetry: settings.telemetry.clone(),
            initial: vec![OperatorRequest::Setpoint(setpoint)],
            detach_pump: false,
            link_loss_is_error: false,
            printer,
        },
    )
}
