//! Telemetry line parsing.
//!
//! The peripheral reports speed as `<prefix><digits>` lines, e.g. `RPM1200`.
//! Anything else on the link (banners, direction acks, partial lines) is not
//! an error; it simply yields no sample.

use std::time::Instant;

/// Prefix used by the stock motor-driver firmware.
pub const DEFAULT_PREFIX: &str = "RPM";

/// One parsed RPM measurement with its arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub rpm: u32,
    pub at: Instant,
}

impl Sample {
    #[inline]
    pub fn new(rpm: u32, at: Instant) -> Self {
        Self { rpm, at }
    }
}

/// Extract the RPM value from `line` if it is an RPM report.
///
/// Whitespace around the value is ignored; the value itself must be plain
/// ASCII digits that fit in `u32`.
///
/// Signs are rejected on purpose: `RPM+5` is not a reading even though
/// `str::parse::<u32>` alone would accept it.
pub fn parse_rpm(prefix: &str, line: &str) -> Option<u32> {
    let value = line.strip_prefix(prefix)?.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<u32>().ok()
}

/// Parse a line into a [`Sample`] stamped with `at`.
#[inline]
pub fn parse_line(prefix: &str, line: &str, at: Instant) -> Option<Sample> {
    parse_rpm(prefix, line).map(|rpm| Sample::new(rpm, at))
}

/// Parser bound to one telemetry prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryParser {
    prefix: String,
}

impl Default for TelemetryParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl TelemetryParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn parse(&self, line: &str, at: Instant) -> Option<Sample> {
        let sample = parse_line(&self.prefix, line, at);
        if sample.is_none() {
            tracing::trace!(line, "telemetry line ignored");
        }
        sample
    }
}
