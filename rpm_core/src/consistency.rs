//! Reading-to-reading consistency classification.

use core::fmt;

use crate::telemetry::Sample;

/// Outcome of comparing a new sample with the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    NoPreviousReading,
    Consistent,
    NotConsistent,
}

/// Classify `new` against `last` with an inclusive tolerance.
#[inline]
pub fn classify(last: Option<&Sample>, new: &Sample, tolerance: u32) -> Consistency {
    match last {
        None => Consistency::NoPreviousReading,
        Some(prev) if prev.rpm.abs_diff(new.rpm) <= tolerance => Consistency::Consistent,
        Some(_) => Consistency::NotConsistent,
    }
}

/// True when the reading fell by at least `threshold` RPM.
#[inline]
pub fn is_sudden_drop(last_rpm: u32, new_rpm: u32, threshold: u32) -> bool {
    last_rpm > new_rpm && last_rpm - new_rpm >= threshold
}

/// How a sample was treated for control purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Inside the manual-override window; recorded but inconclusive.
    Suppressed,
    Evaluated(Consistency),
}

impl Verdict {
    /// Operator-facing label, e.g. `Consistent (±30)`.
    pub fn label(self, tolerance: u32) -> String {
        VerdictLabel {
            verdict: self,
            tolerance,
        }
        .to_string()
    }
}

struct VerdictLabel {
    verdict: Verdict,
    tolerance: u32,
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verdict {
            Verdict::Suppressed => f.write_str("Ignoring (Recent Manual Change)"),
            Verdict::Evaluated(Consistency::NoPreviousReading) => {
                f.write_str("No Previous Reading")
            }
            Verdict::Evaluated(Consistency::Consistent) => {
                write!(f, "Consistent (±{})", self.tolerance)
            }
            Verdict::Evaluated(Consistency::NotConsistent) => {
                write!(f, "Not Consistent (±{})", self.tolerance)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn s(rpm: u32) -> Sample {
        Sample::new(rpm, Instant::now())
    }

    #[test]
    fn tolerance_is_inclusive() {
        assert_eq!(
            classify(Some(&s(1000)), &s(1030), 30),
            Consistency::Consistent
        );
        assert_eq!(
            classify(Some(&s(1000)), &s(970), 30),
            Consistency::Consistent
        );
        assert_eq!(
            classify(Some(&s(1000)), &s(1031), 30),
            Consistency::NotConsistent
        );
        assert_eq!(classify(None, &s(1000), 30), Consistency::NoPreviousReading);
    }

    #[test]
    fn zero_tolerance_needs_identical_readings() {
        assert_eq!(classify(Some(&s(5)), &s(5), 0), Consistency::Consistent);
        assert_eq!(classify(Some(&s(5)), &s(6), 0), Consistency::NotConsistent);
    }

    #[test]
    fn drop_is_directional() {
        assert!(is_sudden_drop(1000, 950, 50));
        assert!(!is_sudden_drop(1000, 951, 50));
        assert!(!is_sudden_drop(950, 1000, 50));
        assert!(!is_sudden_drop(u32::MAX, u32::MAX, 1));
        assert!(is_sudden_drop(u32::MAX, 0, u32::MAX));
    }

    #[test]
    fn labels() {
        assert_eq!(Verdict::Suppressed.label(30), "Ignoring (Recent Manual Change)");
        assert_eq!(
            Verdict::Evaluated(Consistency::Consistent).label(30),
            "Consistent (±30)"
        );
        assert_eq!(
            Verdict::Evaluated(Consistency::NotConsistent).label(5),
            "Not Consistent (±5)"
        );
        assert_eq!(
            Verdict::Evaluated(Consistency::NoPreviousReading).label(5),
            "No Previous Reading"
        );
    }
}
