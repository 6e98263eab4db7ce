use std::time::{Duration, Instant};

use rpm_core::mocks::RecordingSink;
use rpm_core::{
    CommandEmitter, CommandReason, Controller, ControlError, Event, RevertCause, Sample, Setpoint,
    Transition,
};

/// A connected controller running at `percent`, with the override window already expired.
struct Rig {
    ctl: Controller,
    emitter: CommandEmitter<RecordingSink>,
    sink: RecordingSink,
    now: Instant,
}

impl Rig {
    fn at_speed(percent: u8) -> Self {
        let ctl = Controller::builder().build().expect("default config builds");
        let sink = RecordingSink::new();
        let t0 = Instant::now();
        let mut rig = Self {
            ctl,
            emitter: CommandEmitter::new(sink.clone()),
            sink,
            now: t0,
        };
        rig.step(Event::Connected);
        rig.set_speed(percent);
        // past the 1.5 s manual override
        rig.now = t0 + Duration::from_secs(2);
        rig
    }

    fn step(&mut self, ev: Event) -> rpm_core::StepOutcome {
        let out = self.ctl.handle(ev, self.now);
        assert!(self.emitter.emit_all(&out.commands).is_empty());
        out
    }

    fn set_speed(&mut self, percent: u8) -> rpm_core::StepOutcome {
        let sp = Setpoint::new(percent).expect("valid percent");
        self.step(Event::Operator(rpm_core::OperatorRequest::Setpoint(sp)))
    }

    fn rpm(&mut self, rpm: u32) -> rpm_core::StepOutcome {
        self.now += Duration::from_millis(100);
        self.step(Event::Telemetry(Sample::new(rpm, self.now)))
    }

    fn feed(&mut self, rpms: &[u32]) {
        for &r in rpms {
            self.rpm(r);
        }
    }
}

#[test]
fn drop_boosts_then_stable_readings_revert() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 1005]);
    let out = rig.rpm(940);
    assert_eq!(
        out.transition,
        Some(Transition::Engaged {
            baseline: Setpoint::new(50).unwrap(),
            setpoint: Setpoint::new(60).unwrap(),
        })
    );
    assert_eq!(out.commands[0].reason, CommandReason::Boost);
    assert_eq!(rig.ctl.baseline(), Setpoint::new(50));

    rig.feed(&[945, 950]);
    assert!(rig.ctl.is_compensating());
    let out = rig.rpm(955);
    assert_eq!(
        out.transition,
        Some(Transition::Reverted {
            baseline: Setpoint::new(50).unwrap(),
            cause: RevertCause::Consistency,
        })
    );
    assert!(!rig.ctl.is_compensating());
    assert_eq!(rig.ctl.setpoint().percent(), 50);
    assert_eq!(rig.ctl.consecutive_consistent(), 0);
    assert_eq!(rig.sink.sent(), vec!["SPEED0", "SPEED50", "SPEED60", "SPEED50"]);
}

#[test]
fn one_short_of_target_keeps_boost() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940, 945, 950]);
    assert!(rig.ctl.is_compensating());
    assert_eq!(rig.ctl.consecutive_consistent(), 2);
    assert_eq!(rig.ctl.setpoint().percent(), 60);
}

#[test]
fn inconsistent_reading_resets_the_streak() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940, 945, 950]);
    // a rise outside tolerance is not a drop, but it breaks the run
    let out = rig.rpm(1010);
    assert!(out.commands.is_empty());
    assert_eq!(rig.ctl.consecutive_consistent(), 0);
    rig.feed(&[1012, 1015]);
    assert!(rig.ctl.is_compensating());
    let out = rig.rpm(1020);
    assert_eq!(out.commands.len(), 1);
    assert_eq!(out.commands[0].reason, CommandReason::RevertConsistency);
}

#[test]
fn reboost_keeps_original_baseline() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940]);
    let out = rig.rpm(880);
    assert!(matches!(out.transition, Some(Transition::Reboosted { .. })));
    assert_eq!(rig.ctl.setpoint().percent(), 70);
    assert_eq!(rig.ctl.baseline(), Setpoint::new(50));

    rig.feed(&[885, 890, 895]);
    assert_eq!(rig.ctl.setpoint().percent(), 50);
    assert_eq!(
        rig.sink.sent(),
        vec!["SPEED0", "SPEED50", "SPEED60", "SPEED70", "SPEED50"]
    );
}

#[test]
fn boost_clamps_at_full_speed() {
    let mut rig = Rig::at_speed(95);
    rig.feed(&[3300, 3200]);
    assert_eq!(rig.ctl.setpoint(), Setpoint::FULL);
    rig.rpm(3100);
    assert_eq!(rig.ctl.setpoint(), Setpoint::FULL);
    assert_eq!(rig.ctl.baseline(), Setpoint::new(95));
    assert_eq!(
        rig.sink.sent(),
        vec!["SPEED0", "SPEED95", "SPEED100", "SPEED100"]
    );
}

#[test]
fn small_drop_within_classification_gap_does_nothing() {
    // 40 rpm: not consistent (tolerance 30) and not sudden (threshold 50)
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000]);
    let out = rig.rpm(960);
    assert!(out.commands.is_empty());
    assert!(!rig.ctl.is_compensating());
}

#[test]
fn drop_exactly_at_threshold_boosts() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000]);
    let out = rig.rpm(950);
    assert_eq!(out.commands.len(), 1);
    assert!(rig.ctl.is_compensating());
}

#[test]
fn operator_change_during_boost_restores_baseline_first() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940]);
    assert!(rig.ctl.is_compensating());

    let out = rig.set_speed(80);
    let reasons: Vec<_> = out.commands.iter().map(|c| c.reason).collect();
    assert_eq!(
        reasons,
        vec![CommandReason::RevertOperator, CommandReason::Operator]
    );
    assert!(!rig.ctl.is_compensating());
    assert_eq!(rig.ctl.setpoint().percent(), 80);
    assert_eq!(
        rig.sink.sent(),
        vec!["SPEED0", "SPEED50", "SPEED60", "SPEED50", "SPEED80"]
    );

    // the next episode is anchored on the operator's value
    rig.now += Duration::from_secs(2);
    rig.feed(&[1600, 1500]);
    assert_eq!(rig.ctl.baseline(), Setpoint::new(80));
    assert_eq!(rig.ctl.setpoint().percent(), 90);
}

#[test]
fn connect_zeroes_and_resets() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940]);
    let out = rig.step(Event::Connected);
    assert_eq!(out.commands.len(), 1);
    assert_eq!(out.commands[0].reason, CommandReason::Connect);
    assert_eq!(rig.ctl.setpoint(), Setpoint::ZERO);
    assert!(!rig.ctl.is_compensating());
    assert_eq!(rig.ctl.last_rpm(), None);
    assert_eq!(rig.sink.sent().last().map(String::as_str), Some("SPEED0"));
}

#[test]
fn disconnect_while_boosted_sends_best_effort_restore() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940]);
    rig.sink.set_failing(true);

    let out = rig.ctl.handle(Event::Disconnected, rig.now);
    assert_eq!(out.commands.len(), 1);
    assert_eq!(out.commands[0].reason, CommandReason::RevertDisconnect);
    assert_eq!(
        out.transition,
        Some(Transition::Reverted {
            baseline: Setpoint::new(50).unwrap(),
            cause: RevertCause::Disconnect,
        })
    );
    let failures = rig.emitter.emit_all(&out.commands);
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0].error, ControlError::LinkDown(_)));

    // state is discarded regardless of the failed send
    assert!(!rig.ctl.is_connected());
    assert!(!rig.ctl.is_compensating());
    assert_eq!(rig.ctl.last_rpm(), None);
    assert_eq!(rig.emitter.failed(), 1);
}

#[test]
fn disconnect_when_idle_sends_nothing() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000]);
    let out = rig.step(Event::Disconnected);
    assert!(out.commands.is_empty());
    // second disconnect is a no-op
    let out = rig.step(Event::Disconnected);
    assert_eq!(out, rpm_core::StepOutcome::default());
}

#[test]
fn events_while_disconnected_are_refused() {
    let mut ctl = Controller::builder().build().unwrap();
    let now = Instant::now();
    let out = ctl.handle(Event::Telemetry(Sample::new(1000, now)), now);
    assert_eq!(out.refused, Some(ControlError::NotConnected));
    let out = ctl.handle(
        Event::Operator(rpm_core::OperatorRequest::Setpoint(Setpoint::FULL)),
        now,
    );
    assert_eq!(out.refused, Some(ControlError::NotConnected));
    assert!(out.commands.is_empty());
    assert_eq!(ctl.last_rpm(), None);
}

#[test]
fn failed_boost_send_still_advances_state() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000]);
    rig.sink.set_failing(true);
    rig.now += Duration::from_millis(100);
    let out = rig.ctl.handle(Event::Telemetry(Sample::new(900, rig.now)), rig.now);
    let failures = rig.emitter.emit_all(&out.commands);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].issued.reason, CommandReason::Boost);
    assert!(rig.ctl.is_compensating());
    assert_eq!(rig.ctl.setpoint().percent(), 60);
}

#[test]
fn snapshot_reflects_compensation() {
    let mut rig = Rig::at_speed(50);
    rig.feed(&[1000, 940]);
    let snap = rig.ctl.snapshot(rig.now);
    assert!(snap.connected);
    assert_eq!(snap.baseline, Setpoint::new(50));
    assert_eq!(snap.last_rpm, Some(940));
    assert_eq!(snap.consistency.as_deref(), Some("Not Consistent (±30)"));
    assert_eq!(snap.status, rpm_core::MotorStatus::Running);
}
