//! Boost/revert bookkeeping for one compensation episode.
//!
//! `Idle` is `None`; `Compensating` holds the baseline captured on the first
//! boost. The baseline is written exactly once per episode.

use std::fmt;

use crate::setpoint::Setpoint;

/// Active compensation episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compensation {
    /// Setpoint to restore when the episode ends.
    pub baseline: Setpoint,
    /// Number of boosts applied so far (>= 1).
    pub boosts: u32,
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertCause {
    Consistency,
    Operator,
    Disconnect,
}

impl fmt::Display for RevertCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Consistency => "consistency",
            Self::Operator => "operator",
            Self::Disconnect => "disconnect",
        })
    }
}

/// Observable state change of the compensation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle → Compensating.
    Engaged { baseline: Setpoint, setpoint: Setpoint },
    /// Compensating → Compensating with a higher (or clamped) setpoint.
    Reboosted { baseline: Setpoint, setpoint: Setpoint },
    /// Compensating → Idle; setpoint restored to `baseline`.
    Reverted { baseline: Setpoint, cause: RevertCause },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Engaged { .. } => "engaged",
            Self::Reboosted { .. } => "reboosted",
            Self::Reverted { .. } => "reverted",
        }
    }
}

/// Apply one boost starting from `current`.
///
/// Returns the transition and the new setpoint. The baseline is captured
/// only when `episode` is `None`.
pub fn boost(
    episode: &mut Option<Compensation>,
    current: Setpoint,
    increment: u8,
) -> (Transition, Setpoint) {
    let next = current.boosted(increment);
    match episode {
        Some(active) => {
            active.boosts = active.boosts.saturating_add(1);
            (
                Transition::Reboosted {
                    baseline: active.baseline,
                    setpoint: next,
                },
                next,
            )
        }
        None => {
            *episode = Some(Compensation {
                baseline: current,
                boosts: 1,
            });
            (
                Transition::Engaged {
                    baseline: current,
                    setpoint: next,
                },
                next,
            )
        }
    }
}

/// End the episode, if any, returning the transition and the baseline to restore.
pub fn revert(
    episode: &mut Option<Compensation>,
    cause: RevertCause,
) -> Option<(Transition, Setpoint)> {
    episode
        .take()
        .map(|c| (Transition::Reverted { baseline: c.baseline, cause }, c.baseline))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(p: u8) -> Setpoint {
        Setpoint::new(p).unwrap_or_default()
    }

    #[test]
    fn baseline_captured_once() {
        let mut ep = None;
        let (t1, s1) = boost(&mut ep, sp(50), 10);
        assert_eq!(
            t1,
            Transition::Engaged {
                baseline: sp(50),
                setpoint: sp(60)
            }
        );
        let (t2, s2) = boost(&mut ep, s1, 10);
        assert_eq!(
            t2,
            Transition::Reboosted {
                baseline: sp(50),
                setpoint: sp(70)
            }
        );
        assert_eq!(s2, sp(70));
        assert_eq!(ep.map(|c| (c.baseline, c.boosts)), Some((sp(50), 2)));
    }

    #[test]
    fn revert_clears_and_returns_baseline() {
        let mut ep = None;
        boost(&mut ep, sp(30), 25);
        let (t, restored) = revert(&mut ep, RevertCause::Operator).expect("active episode");
        assert_eq!(restored, sp(30));
        assert_eq!(t.name(), "reverted");
        assert!(ep.is_none());
        assert!(revert(&mut ep, RevertCause::Operator).is_none());
    }
}
