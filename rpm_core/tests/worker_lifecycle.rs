//! Worker and telemetry pump threads: ordering, shutdown and link loss.

use std::time::Duration;

use rpm_core::mocks::{RecordingSink, ScriptedLines};
use rpm_core::{
    CommandReason, Controller, ControlError, Notification, PumpStats, Sample, Setpoint,
    TelemetryParser, TelemetryPump, Worker,
};
use rpm_traits::{Clock, ManualClock};

const WAIT: Duration = Duration::from_secs(2);

fn wait_for(worker: &Worker, event: &str) -> Notification {
    loop {
        let note = worker
            .notifications()
            .recv_timeout(WAIT)
            .expect("worker notification");
        if let Notification::Processed { event: name, .. } = &note
            && *name == event
        {
            return note;
        }
    }
}

/// Connected worker at 50% with the override window already behind it.
fn running_worker(sink: RecordingSink, clock: &ManualClock) -> Worker {
    let ctl = Controller::builder().build().expect("build");
    let worker = Worker::spawn(ctl, sink, clock.clone());
    let h = worker.handle();
    h.connect().unwrap();
    h.set_speed(Setpoint::new(50).unwrap()).unwrap();
    wait_for(&worker, "operator_setpoint");
    clock.advance(Duration::from_secs(2));
    worker
}

#[test]
fn worker_applies_events_in_submission_order() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new();
    let worker = running_worker(sink.clone(), &clock);
    let h = worker.handle();
    for rpm in [1000, 1005, 940, 945, 950, 955] {
        h.telemetry(Sample::new(rpm, clock.now())).unwrap();
    }
    let report = worker.stop().expect("report");
    assert_eq!(report.events, 8);
    assert_eq!(report.sent, 4);
    assert_eq!(report.failed, 0);
    assert!(!report.controller.is_compensating());
    assert_eq!(sink.sent(), vec!["SPEED0", "SPEED50", "SPEED60", "SPEED50"]);
}

#[test]
fn snapshot_follows_each_event() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new();
    let worker = running_worker(sink, &clock);
    let h = worker.handle();
    h.telemetry(Sample::new(1000, clock.now())).unwrap();
    h.telemetry(Sample::new(900, clock.now())).unwrap();
    let _ = wait_for(&worker, "telemetry");
    let Notification::Processed { outcome, snapshot, .. } = wait_for(&worker, "telemetry") else {
        unreachable!()
    };
    assert_eq!(outcome.commands.len(), 1);
    assert_eq!(outcome.commands[0].reason, CommandReason::Boost);
    assert_eq!(snapshot.baseline, Setpoint::new(50));
    assert_eq!(snapshot.setpoint.percent(), 60);
    drop(worker);
}

#[test]
fn failed_sends_are_published() {
    let sink = RecordingSink::failing();
    let clock = ManualClock::new();
    let worker = Worker::spawn(Controller::builder().build().unwrap(), sink, clock);
    worker.handle().connect().unwrap();
    let note = worker
        .notifications()
        .recv_timeout(WAIT)
        .expect("notification");
    match note {
        Notification::SendFailed(f) => {
            assert_eq!(f.issued.reason, CommandReason::Connect);
            assert!(matches!(f.error, ControlError::LinkDown(_)));
        }
        other => panic!("expected SendFailed first, got {other:?}"),
    }
    let report = worker.stop().unwrap();
    assert_eq!(report.failed, 1);
    // the controller still considers itself connected
    assert!(report.controller.is_connected());
}

#[test]
fn stopped_worker_rejects_events() {
    let worker = Worker::spawn(
        Controller::builder().build().unwrap(),
        RecordingSink::new(),
        ManualClock::new(),
    );
    let h = worker.handle();
    let _ = worker.stop();
    assert_eq!(h.connect(), Err(ControlError::WorkerStopped));
}

#[test]
fn pump_forwards_samples_and_reports_link_loss() {
    let sink = RecordingSink::new();
    let clock = ManualClock::new();
    let worker = running_worker(sink.clone(), &clock);

    let lines = ScriptedLines::new(["READY", "RPM1000", "RPM1005"])
        .then_timeout()
        .then_line("RPM940");
    let pump = TelemetryPump::spawn(
        lines,
        TelemetryParser::default(),
        Duration::from_millis(10),
        clock.clone(),
        worker.handle(),
    );
    let _ = wait_for(&worker, "disconnected");
    let stats = pump.stop().expect("stats");
    assert_eq!(
        stats,
        PumpStats {
            lines: 4,
            samples: 3,
            ignored: 1,
            link_lost: true,
        }
    );

    let report = worker.stop().unwrap();
    assert!(!report.controller.is_connected());
    // boost on 940, then the restore sent while tearing down
    assert_eq!(sink.sent(), vec!["SPEED0", "SPEED50", "SPEED60", "SPEED50"]);
}

#[test]
fn pump_exits_on_drop_while_idle() {
    let worker = Worker::spawn(
        Controller::builder().build().unwrap(),
        RecordingSink::new(),
        ManualClock::new(),
    );
    let idle = ScriptedLines::new(Vec::<String>::new())
        .then_timeout()
        .then_timeout()
        .then_timeout();
    let pump = TelemetryPump::spawn(
        idle,
        TelemetryParser::default(),
        Duration::from_millis(5),
        ManualClock::new(),
        worker.handle(),
    );
    drop(pump);
    drop(worker);
}

#[test]
fn many_workers_start_and_stop() {
    for _ in 0..10 {
        let worker = Worker::spawn(
            Controller::builder().build().unwrap(),
            RecordingSink::new(),
            ManualClock::new(),
        );
        worker.handle().connect().unwrap();
        let report = worker.stop().unwrap();
        assert_eq!(report.events, 1);
    }
}
