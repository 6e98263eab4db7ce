//! Test and helper mocks for rpm_core

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sink that records every command and can be told to fail.
///
/// Clones share the same log and failure switch.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every send fails, as if the link were already gone.
    pub fn failing() -> Self {
        let s = Self::default();
        s.set_failing(true);
        s
    }

    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::Relaxed);
    }

    /// Commands delivered so far, newline stripped.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl rpm_traits::CommandSink for RecordingSink {
    fn send(&mut self, command: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "recording sink: link closed",
            )));
        }
        if let Ok(mut v) = self.sent.lock() {
            v.push(command.trim_end().to_string());
        }
        Ok(())
    }
}

/// Line source that replays a fixed script, then reports the link as closed.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<Option<String>>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|l| Some(l.into())).collect(),
        }
    }

    /// Insert a read timeout at the end of the script.
    pub fn then_timeout(mut self) -> Self {
        self.lines.push_back(None);
        self
    }

    pub fn then_line(mut self, line: impl Into<String>) -> Self {
        self.lines.push_back(Some(line.into()));
        self
    }
}

impl rpm_traits::LineSource for ScriptedLines {
    fn read_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        match self.lines.pop_front() {
            Some(line) => Ok(line),
            None => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "scripted lines exhausted",
            ))),
        }
    }
}
