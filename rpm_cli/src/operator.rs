//! Operator command syntax shared by stdin (`run`) and replay directives.
//!
//! ```text
//! speed <0..=100>
//! dir <1|2> <f|r|s>
//! quit
//! ```

use rpm_core::{Direction, MotorId, OperatorRequest, Setpoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorInput {
    Request(OperatorRequest),
    Quit,
}

pub fn parse(line: &str) -> Result<OperatorInput, String> {
    let mut words = line.split_whitespace();
    let verb = words
        .next()
        .ok_or_else(|| "empty command".to_string())?
        .to_ascii_lowercase();
    let args: Vec<&str> = words.collect();
    match (verb.as_str(), args.as_slice()) {
        ("speed", [n]) => {
            let v: i64 = n
                .parse()
                .map_err(|_| format!("speed expects a number, got {n:?}"))?;
            let sp = Setpoint::try_from(v).map_err(|e| e.to_string())?;
            Ok(OperatorInput::Request(OperatorRequest::Setpoint(sp)))
        }
        ("dir", [m, d]) => {
            let motor: MotorId = m.parse()?;
            let direction: Direction = d.parse()?;
            Ok(OperatorInput::Request(OperatorRequest::Direction {
                motor,
                direction,
            }))
        }
        ("quit" | "exit", []) => Ok(OperatorInput::Quit),
        ("speed", _) => Err("usage: speed <0..=100>".to_string()),
        ("dir", _) => Err("usage: dir <1|2> <f|r|s>".to_string()),
        (other, _) => Err(format!("unknown command {other:?}")),
    }
}
