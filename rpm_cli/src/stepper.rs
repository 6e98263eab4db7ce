//! Single-threaded controller driver on a virtual clock.
//!
//! Each call runs one event through the controller, delivers its commands
//! and prints the outcome, in that order. Used by `replay` and `simulate --fast`.

use rpm_core::{CommandEmitter, Controller, Event, OperatorRequest, Sample, TelemetryParser};
use rpm_traits::{Clock, CommandSink, ManualClock};
use std::time::Duration;

use crate::output::{Printer, Summary};

pub struct Stepper<S: CommandSink> {
    controller: Controller,
    emitter: CommandEmitter<S>,
    parser: TelemetryParser,
    clock: ManualClock,
    printer: Printer,
    summary: Summary,
}

impl<S: CommandSink> Stepper<S> {
    pub fn new(
        controller: Controller,
        sink: S,
        parser: TelemetryParser,
        clock: ManualClock,
        printer: Printer,
    ) -> Self {
        Self {
            controller,
            emitter: CommandEmitter::new(sink),
            parser,
            clock,
            printer,
            summary: Summary::default(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock.ms_since(self.clock.origin())
    }

    pub fn advance(&self, d: Duration) {
        self.clock.advance(d);
    }

    fn step(&mut self, event: Event) {
        let now = self.clock.now();
        let outcome = self.controller.handle(event, now);
        let failures = self.emitter.emit_all(&outcome.commands);
        let snap = self.controller.snapshot(now);
        self.printer.outcome(self.elapsed_ms(), &outcome, &snap);
        self.summary.events += 1;
        self.summary.commands += outcome.commands.len() as u64;
        self.summary.failed += failures.len() as u64;
    }

    /// Feed one raw telemetry line; non-telemetry text is counted and dropped.
    pub fn line(&mut self, text: &str) {
        match self.parser.parse(text, self.clock.now()) {
            Some(sample) => self.sample(sample),
            None => self.summary.ignored += 1,
        }
    }

    fn sample(&mut self, sample: Sample) {
        self.summary.samples += 1;
        self.step(Event::Telemetry(sample));
    }

    pub fn operator(&mut self, request: OperatorRequest) {
        self.step(Event::Operator(request));
    }

    pub fn connect(&mut self) {
        self.step(Event::Connected);
    }

    pub fn disconnect(&mut self) {
        self.step(Event::Disconnected);
    }

    pub fn mark_link_lost(&mut self) {
        self.summary.link_lost = true;
    }

    /// Print the summary and hand back the totals.
    pub fn finish(self) -> Summary {
        let snap = self.controller.snapshot(self.clock.now());
        self.printer.summary(&self.summary, &snap);
        self.summary
    }
}
