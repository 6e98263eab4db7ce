//! Outbound command vocabulary and its wire encoding.
//!
//! ```text
//! SPEED<n>\n     n in 0..=100
//! DIR<m><d>\n    m in {1,2}, d in {F,R,S}
//! ```

use core::fmt;
use core::str::FromStr;

use crate::setpoint::Setpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorId {
    One,
    Two,
}

impl MotorId {
    fn wire(self) -> char {
        match self {
            Self::One => '1',
            Self::Two => '2',
        }
    }
}

impl FromStr for MotorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            other => Err(format!("unknown motor '{other}' (expected 1 or 2)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
    Stop,
}

impl Direction {
    fn wire(self) -> char {
        match self {
            Self::Forward => 'F',
            Self::Reverse => 'R',
            Self::Stop => 'S',
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "forward" | "fwd" => Ok(Self::Forward),
            "r" | "reverse" | "rev" => Ok(Self::Reverse),
            "s" | "stop" => Ok(Self::Stop),
            other => Err(format!("unknown direction '{other}' (expected f|r|s)")),
        }
    }
}

/// A directive for the motor-driver peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetSpeed(Setpoint),
    Direction { motor: MotorId, direction: Direction },
}

impl Command {
    /// Newline-terminated wire form.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }

    /// Setpoint carried by a speed command.
    pub fn setpoint(&self) -> Option<Setpoint> {
        match self {
            Self::SetSpeed(s) => Some(*s),
            Self::Direction { .. } => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetSpeed(s) => write!(f, "SPEED{}", s.percent()),
            Self::Direction { motor, direction } => {
                write!(f, "DIR{}{}", motor.wire(), direction.wire())
            }
        }
    }
}

/// Why a command was issued; carried into logs and outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandReason {
    /// Zeroing the motor on a fresh link.
    Connect,
    /// Operator asked for this setpoint.
    Operator,
    /// Compensation boost after a sudden drop.
    Boost,
    RevertConsistency,
    RevertOperator,
    RevertDisconnect,
    /// Operator direction pass-through.
    Direction,
}

impl CommandReason {
    pub fn name(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Operator => "operator",
            Self::Boost => "boost",
            Self::RevertConsistency => "revert_consistency",
            Self::RevertOperator => "revert_operator",
            Self::RevertDisconnect => "revert_disconnect",
            Self::Direction => "direction",
        }
    }
}

impl fmt::Display for CommandReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A command together with the reason the controller issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedCommand {
    pub command: Command,
    pub reason: CommandReason,
}

impl IssuedCommand {
    #[inline]
    pub fn speed(setpoint: Setpoint, reason: CommandReason) -> Self {
        Self {
            command: Command::SetSpeed(setpoint),
            reason,
        }
    }
}
