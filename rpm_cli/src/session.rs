//! Live session: worker + telemetry pump threads driven from the main thread.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crossbeam_channel as xch;
use rpm_core::{
    ControlError, Controller, Event, Notification, OperatorRequest, TelemetryCfg,
    TelemetryParser, TelemetryPump, Worker,
};
use rpm_traits::{Clock, CommandSink, LineSource};

use crate::cli::SHUTDOWN;
use crate::operator::OperatorInput;
use crate::output::{Printer, Summary};

const TICK: Duration = Duration::from_millis(100);

enum Wake {
    Note(Notification),
    Operator(OperatorRequest),
    Tick,
    Stop,
}

pub struct SessionOpts {
    pub telemetry: TelemetryCfg,
    /// Applied right after connecting, in order.
    pub initial: Vec<OperatorRequest>,
    /// The source cannot time out; do not wait for the pump on exit.
    pub detach_pump: bool,
    /// Report a lost link as an error instead of a normal end.
    pub link_loss_is_error: bool,
    pub printer: Printer,
}

pub fn run_session<L, S, C>(
    controller: Controller,
    source: L,
    sink: S,
    clock: C,
    operator: &xch::Receiver<OperatorInput>,
    opts: SessionOpts,
) -> eyre::Result<Summary>
where
    L: LineSource + Send + 'static,
    S: CommandSink + Send + 'static,
    C: Clock + Clone + Send + 'static,
{
    let start = clock.now();
    let t_ms = |clock: &C| clock.ms_since(start);
    let printer = opts.printer;
    let mut summary = Summary::default();

    let worker = Worker::spawn(controller, sink, clock.clone());
    let handle = worker.handle();
    handle.connect()?;
    for req in &opts.initial {
        handle.submit(Event::Operator(*req))?;
    }
    let pump = TelemetryPump::spawn(
        source,
        TelemetryParser::new(opts.telemetry.prefix.clone()),
        opts.telemetry.read_timeout,
        clock.clone(),
        handle.clone(),
    );

    let on_note = |note: Notification, summary: &mut Summary| match note {
        Notification::Processed {
            event,
            outcome,
            snapshot,
        } => {
            if event == "telemetry" && outcome.refused.is_none() {
                summary.samples += 1;
            }
            printer.outcome(t_ms(&clock), &outcome, &snapshot);
        }
        Notification::SendFailed(f) => {
            tracing::debug!(command = %f.issued.command, "send failure noted");
        }
    };

    let notes = worker.notifications().clone();
    loop {
        if SHUTDOWN.load(Ordering::Relaxed) {
            tracing::info!("interrupted; shutting down");
            break;
        }
        let next = xch::select! {
            recv(notes) -> note => note.map_or(Wake::Stop, Wake::Note),
            recv(operator) -> input => match input {
                Ok(OperatorInput::Request(req)) => Wake::Operator(req),
                Ok(OperatorInput::Quit) | Err(_) => Wake::Stop,
            },
            default(TICK) => Wake::Tick,
        };
        match next {
            Wake::Note(n) => on_note(n, &mut summary),
            Wake::Operator(req) => handle.submit(Event::Operator(req))?,
            Wake::Tick => {
                if pump.is_finished() && notes.is_empty() {
                    break;
                }
            }
            Wake::Stop => {
                tracing::info!("operator quit");
                break;
            }
        }
    }

    // A pump that already exited has reported the link loss itself.
    let pump_done = pump.is_finished();
    summary.link_lost = summary.link_lost || pump_done;
    if !pump_done {
        handle.disconnect()?;
    }
    if opts.detach_pump {
        pump.detach();
    } else if let Some(stats) = pump.stop() {
        summary.ignored = stats.ignored;
        summary.link_lost = stats.link_lost;
    }

    let report = worker
        .stop()
        .ok_or_else(|| eyre::eyre!("controller worker panicked"))?;
    for note in notes.try_iter() {
        on_note(note, &mut summary);
    }
    summary.events = report.events;
    summary.commands = report.sent + report.failed;
    summary.failed = report.failed;
    printer.summary(&summary, &report.controller.snapshot(clock.now()));

    if summary.link_lost && opts.link_loss_is_error {
        return Err(eyre::Report::new(ControlError::LinkDown(
            "telemetry link lost".to_string(),
        )));
    }
    Ok(summary)
}
