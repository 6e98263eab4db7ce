//! Commanded motor speed as an integer percentage.

use core::fmt;

use crate::error::ControlError;

/// Setpoint in percent, always within `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Setpoint(u8);

impl Setpoint {
    pub const MAX_PERCENT: u8 = 100;
    pub const ZERO: Self = Self(0);
    pub const FULL: Self = Self(Self::MAX_PERCENT);

    /// Returns `None` when `percent > 100`.
    #[inline]
    pub const fn new(percent: u8) -> Option<Self> {
        if percent <= Self::MAX_PERCENT {
            Some(Self(percent))
        } else {
            None
        }
    }

    #[inline]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// `min(self + increment, 100)`.
    #[inline]
    pub fn boosted(self, increment: u8) -> Self {
        Self(self.0.saturating_add(increment).min(Self::MAX_PERCENT))
    }
}

impl TryFrom<i64> for Setpoint {
    type Error = ControlError;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        u8::try_from(v)
            .ok()
            .and_then(Self::new)
            .ok_or(ControlError::SetpointOutOfRange(v))
    }
}

impl TryFrom<u8> for Setpoint {
    type Error = ControlError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v).ok_or(ControlError::SetpointOutOfRange(i64::from(v)))
    }
}

impl fmt::Display for Setpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_clamps_at_full() {
        assert_eq!(Setpoint::new(50).map(|s| s.boosted(10)), Setpoint::new(60));
        assert_eq!(Setpoint::new(95).map(|s| s.boosted(10)), Some(Setpoint::FULL));
        assert_eq!(Setpoint::FULL.boosted(100), Setpoint::FULL);
        assert_eq!(Setpoint::FULL.boosted(u8::MAX), Setpoint::FULL);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Setpoint::new(101).is_none());
        assert_eq!(
            Setpoint::try_from(-1i64),
            Err(ControlError::SetpointOutOfRange(-1))
        );
        assert_eq!(
            Setpoint::try_from(250u8),
            Err(ControlError::SetpointOutOfRange(250))
        );
        assert_eq!(Setpoint::try_from(100i64), Ok(Setpoint::FULL));
    }
}
