//! Offline replay of a recorded session.
//!
//! Script format, one item per line:
//!
//! ```text
//! RPM1000          telemetry, one interval after the previous line
//! @speed 50        operator setpoint
//! @dir 1 f         direction pass-through
//! @wait 1500       advance the virtual clock
//! @disconnect      drop the link
//! @connect         re-establish it (the session starts connected)
//! # comment
//! ```

use std::path::Path;
use std::time::Duration;

use eyre::WrapErr;
use rpm_core::{Controller, OperatorRequest, TelemetryParser};
use rpm_link::CommandWriter;
use rpm_traits::ManualClock;

use crate::operator::{self, OperatorInput};
use crate::output::{Printer, Summary};
use crate::stepper::Stepper;

#[derive(Debug, thiserror::Error)]
#[error("{path}:{line}: {message}")]
pub struct ScriptError {
    pub path: String,
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Telemetry(String),
    Operator(OperatorRequest),
    Wait(Duration),
    Connect,
    Disconnect,
}

/// Parse a whole script up front so a typo fails before anything runs.
pub fn parse_script(path: &str, text: &str) -> Result<Vec<Directive>, ScriptError> {
    let mut out = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |message: String| ScriptError {
            path: path.to_string(),
            line: idx + 1,
            message,
        };
        let Some(body) = line.strip_prefix('@') else {
            out.push(Directive::Telemetry(line.to_string()));
            continue;
        };
        let mut words = body.split_whitespace();
        let directive = match words.next().unwrap_or("") {
            "wait" => {
                let ms = words
                    .next()
                    .and_then(|w| w.parse::<u64>().ok())
                    .ok_or_else(|| err("usage: @wait <ms>".to_string()))?;
                Directive::Wait(Duration::from_millis(ms))
            }
            "connect" => Directive::Connect,
            "disconnect" => Directive::Disconnect,
            "speed" | "dir" => match operator::parse(body).map_err(err)? {
                OperatorInput::Request(req) => Directive::Operator(req),
                OperatorInput::Quit => return Err(err("quit is not a directive".to_string())),
            },
            other => return Err(err(format!("unknown directive @{other}"))),
        };
        out.push(directive);
    }
    Ok(out)
}

pub fn run_replay(
    controller: Controller,
    parser: TelemetryParser,
    file: &Path,
    interval: Duration,
    printer: Printer,
) -> eyre::Result<Summary> {
    let text = std::fs::read_to_string(file).wrap_err_with(|| format!("read script {file:?}"))?;
    let script = parse_script(&file.display().to_string(), &text)?;
    tracing::info!(file = %file.display(), items = script.len(), "replaying script");

    let sink = CommandWriter::new(std::io::sink());
    let mut stepper = Stepper::new(controller, sink, parser, ManualClock::new(), printer);
    stepper.connect();
    for directive in script {
        match directive {
            Directive::Telemetry(line) => {
                stepper.advance(interval);
                stepper.line(&line);
            }
            Directive::Operator(req) => stepper.operator(req),
            Directive::Wait(d) => stepper.advance(d),
            Directive::Connect => stepper.connect(),
            Directive::Disconnect => stepper.disconnect(),
        }
    }
    Ok(stepper.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpm_core::Setpoint;

    #[test]
    fn parses_mixed_script() {
        let s = "# header\n@speed 50\n@wait 2000\nRPM1000\n\n  RPM940 \n@dir 1 f\n@disconnect\n";
        let d = parse_script("t", s).unwrap();
        assert_eq!(d.len(), 6);
        assert_eq!(
            d[0],
            Directive::Operator(OperatorRequest::Setpoint(Setpoint::new(50).unwrap()))
        );
        assert_eq!(d[1], Directive::Wait(Duration::from_millis(2000)));
        assert_eq!(d[3], Directive::Telemetry("RPM940".to_string()));
        assert_eq!(d[5], Directive::Disconnect);
    }

    #[test]
    fn reports_line_numbers() {
        let e = parse_script("s.txt", "RPM1\n\n@jump\n").unwrap_err();
        assert_eq!(e.line, 3);
        assert_eq!(e.to_string(), "s.txt:3: unknown directive @jump");
        let e = parse_script("s.txt", "@speed 300\n").unwrap_err();
        assert!(e.message.contains("out of range"));
        assert!(parse_script("s", "@wait soon\n").is_err());
        assert!(parse_script("s", "@quit\n").is_err());
    }
}
