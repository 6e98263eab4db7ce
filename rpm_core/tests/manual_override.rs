use std::time::{Duration, Instant};

use rpm_core::{Consistency, Controller, Event, OperatorRequest, Sample, Setpoint, Verdict};

const WINDOW: Duration = Duration::from_millis(1500);

fn connected_at(percent: u8, t0: Instant) -> Controller {
    let mut ctl = Controller::builder()
        .with_manual_override_window(WINDOW)
        .build()
        .expect("build");
    ctl.handle(Event::Connected, t0);
    let sp = Setpoint::new(percent).expect("percent");
    ctl.handle(Event::Operator(OperatorRequest::Setpoint(sp)), t0);
    ctl
}

fn telemetry(ctl: &mut Controller, rpm: u32, at: Instant) -> rpm_core::StepOutcome {
    ctl.handle(Event::Telemetry(Sample::new(rpm, at)), at)
}

#[test]
fn drop_inside_window_is_ignored() {
    let t0 = Instant::now();
    let mut ctl = connected_at(50, t0);
    telemetry(&mut ctl, 1000, t0 + Duration::from_millis(200));
    let out = telemetry(&mut ctl, 800, t0 + Duration::from_millis(400));
    assert_eq!(out.verdict, Some(Verdict::Suppressed));
    assert!(out.commands.is_empty());
    assert!(!ctl.is_compensating());
    assert_eq!(ctl.consecutive_consistent(), 0);
    assert!(ctl.override_active(t0 + Duration::from_millis(400)));
    assert_eq!(
        ctl.snapshot(t0 + Duration::from_millis(400)).consistency.as_deref(),
        Some("Ignoring (Recent Manual Change)")
    );
}

#[test]
fn suppressed_readings_still_become_the_reference() {
    let t0 = Instant::now();
    let mut ctl = connected_at(50, t0);
    telemetry(&mut ctl, 1800, t0 + Duration::from_millis(1000));
    assert_eq!(ctl.last_rpm(), Some(1800));
    // first evaluated reading compares against the suppressed one
    let out = telemetry(&mut ctl, 1790, t0 + Duration::from_millis(1600));
    assert_eq!(out.verdict, Some(Verdict::Evaluated(Consistency::Consistent)));
    assert_eq!(ctl.consecutive_consistent(), 1);
}

#[test]
fn window_ends_exactly_at_deadline() {
    let t0 = Instant::now();
    let mut ctl = connected_at(50, t0);
    let just_before = t0 + WINDOW - Duration::from_millis(1);
    assert!(ctl.override_active(just_before));
    assert!(!ctl.override_active(t0 + WINDOW));

    telemetry(&mut ctl, 1000, just_before);
    let out = telemetry(&mut ctl, 900, t0 + WINDOW);
    assert!(matches!(out.verdict, Some(Verdict::Evaluated(_))));
    assert_eq!(out.commands.len(), 1);
    assert!(ctl.is_compensating());
}

#[test]
fn later_change_extends_window() {
    let t0 = Instant::now();
    let mut ctl = connected_at(50, t0);
    let t1 = t0 + Duration::from_millis(1000);
    ctl.handle(
        Event::Operator(OperatorRequest::Setpoint(Setpoint::new(60).unwrap())),
        t1,
    );
    assert!(ctl.override_active(t0 + Duration::from_millis(2000)));
    assert!(!ctl.override_active(t1 + WINDOW));
}

#[test]
fn stable_run_inside_window_never_counts() {
    let t0 = Instant::now();
    let mut ctl = connected_at(50, t0);
    for i in 1..=10u64 {
        telemetry(&mut ctl, 1000, t0 + Duration::from_millis(100 * i));
    }
    assert_eq!(ctl.consecutive_consistent(), 0);
}

#[test]
fn zero_window_never_suppresses() {
    let t0 = Instant::now();
    let mut ctl = Controller::builder()
        .with_manual_override_window(Duration::ZERO)
        .build()
        .expect("build");
    ctl.handle(Event::Connected, t0);
    ctl.handle(
        Event::Operator(OperatorRequest::Setpoint(Setpoint::new(50).unwrap())),
        t0,
    );
    telemetry(&mut ctl, 1000, t0);
    let out = telemetry(&mut ctl, 900, t0);
    assert_eq!(out.commands.len(), 1);
}

#[test]
fn window_longer_than_a_minute_is_rejected() {
    for window in [Duration::MAX, Duration::from_millis(60_001)] {
        let err = Controller::builder()
            .with_manual_override_window(window)
            .build()
            .expect_err("window too long");
        assert!(err.to_string().contains("manual_override_window"), "{err}");
    }
}

#[test]
fn longest_window_suppresses_drops() {
    let t0 = Instant::now();
    let mut ctl = Controller::builder()
        .with_manual_override_window(rpm_core::config::MAX_OVERRIDE_WINDOW)
        .build()
        .expect("a one-minute window is valid");
    ctl.handle(Event::Connected, t0);
    ctl.handle(
        Event::Operator(OperatorRequest::Setpoint(Setpoint::new(50).unwrap())),
        t0,
    );
    telemetry(&mut ctl, 1000, t0 + Duration::from_millis(100));
    let out = telemetry(&mut ctl, 800, t0 + Duration::from_millis(200));
    assert_eq!(out.verdict, Some(Verdict::Suppressed));
    assert!(out.commands.is_empty(), "commands during window: {:?}", out.commands);
    assert!(!ctl.is_compensating());
    assert!(ctl.override_active(t0 + Duration::from_secs(59)));
}
