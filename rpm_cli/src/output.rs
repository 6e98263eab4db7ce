//! Operator-facing output on stdout, pretty text or JSON lines.
//!
//! Every JSON line carries a `kind`: `command`, `verdict`, `refused` or
//! `summary`. Logs never go to stdout.

use rpm_core::{ControllerSnapshot, IssuedCommand, StepOutcome, Verdict};
use serde_json::json;

#[derive(Debug, Clone, Copy)]
pub struct Printer {
    pub json: bool,
    /// Print a line for every telemetry verdict, not just commands.
    pub verdicts: bool,
    pub tolerance: u32,
}

/// Totals printed at the end of a run.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub events: u64,
    pub samples: u64,
    pub ignored: u64,
    pub commands: u64,
    pub failed: u64,
    pub link_lost: bool,
}

impl Printer {
    /// Print what one processed event produced.
    pub fn outcome(&self, t_ms: u64, outcome: &StepOutcome, snap: &ControllerSnapshot) {
        if let Some(err) = &outcome.refused {
            self.refused(t_ms, &err.to_string());
        }
        if self.verdicts
            && let Some(v) = outcome.verdict
        {
            self.verdict(t_ms, v, snap);
        }
        for issued in &outcome.commands {
            self.command(t_ms, issued, snap);
        }
    }

    pub fn command(&self, t_ms: u64, issued: &IssuedCommand, snap: &ControllerSnapshot) {
        let wire = issued.command.to_string();
        if self.json {
            let line = json!({
                "kind": "command",
                "t_ms": t_ms,
                "command": wire,
                "reason": issued.reason.name(),
                "rpm": snap.last_rpm,
                "setpoint": snap.setpoint.percent(),
                "baseline": snap.baseline.map(|b| b.percent()),
            });
            println!("{line}");
        } else {
            let rpm = snap
                .last_rpm
                .map_or_else(|| "-".to_string(), |r| r.to_string());
            print!("[{t_ms:>7} ms] {wire:<9} {:<18} rpm={rpm}", issued.reason.name());
            if let Some(b) = snap.baseline {
                print!(" baseline={b}");
            }
            println!();
        }
    }

    fn verdict(&self, t_ms: u64, verdict: Verdict, snap: &ControllerSnapshot) {
        let label = verdict.label(self.tolerance);
        if self.json {
            let line = json!({
                "kind": "verdict",
                "t_ms": t_ms,
                "rpm": snap.last_rpm,
                "verdict": label,
                "consecutive": snap.consecutive_consistent,
            });
            println!("{line}");
        } else {
            println!(
                "[{t_ms:>7} ms] rpm={:<6} {label}",
                snap.last_rpm.unwrap_or(0)
            );
        }
    }

    fn refused(&self, t_ms: u64, reason: &str) {
        if self.json {
            println!(
                "{}",
                json!({ "kind": "refused", "t_ms": t_ms, "reason": reason })
            );
        } else {
            println!("[{t_ms:>7} ms] refused: {reason}");
        }
    }

    pub fn summary(&self, s: &Summary, snap: &ControllerSnapshot) {
        if self.json {
            let line = json!({
                "kind": "summary",
                "events": s.events,
                "samples": s.samples,
                "ignored": s.ignored,
                "commands": s.commands,
                "failed": s.failed,
                "link_lost": s.link_lost,
                "connected": snap.connected,
                "setpoint": snap.setpoint.percent(),
                "compensating": snap.baseline.is_some(),
                "status": snap.status.name(),
            });
            println!("{line}");
        } else {
            println!(
                "done: {} events, {} samples ({} ignored), {} commands ({} failed){}",
                s.events,
                s.samples,
                s.ignored,
                s.commands,
                s.failed,
                if s.link_lost { ", link lost" } else { "" }
            );
            println!("final: {snap}");
        }
    }
}
