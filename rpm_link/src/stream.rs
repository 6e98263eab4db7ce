//! Line-oriented transports over byte streams.
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::{LinkError, Result};

/// Streams whose blocking reads can be bounded.
pub trait ReadTimeout {
    /// Apply `timeout` to subsequent reads. Streams that cannot time out
    /// return `Ok(false)` and keep blocking.
    fn set_read_timeout(&self, timeout: Duration) -> std::io::Result<bool>;
}

impl ReadTimeout for TcpStream {
    fn set_read_timeout(&self, timeout: Duration) -> std::io::Result<bool> {
        // A zero duration is rejected by the OS.
        TcpStream::set_read_timeout(self, Some(timeout.max(Duration::from_millis(1))))?;
        Ok(true)
    }
}

impl ReadTimeout for std::fs::File {
    fn set_read_timeout(&self, _timeout: Duration) -> std::io::Result<bool> {
        Ok(false)
    }
}

pub(crate) fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Reads newline-terminated telemetry from a stream.
///
/// A partial line that straddles a read timeout is kept and completed on the
/// next call. End of stream is reported as [`LinkError::Closed`].
#[derive(Debug)]
pub struct LineReader<R: Read> {
    inner: BufReader<R>,
    pending: Vec<u8>,
    applied_timeout: Option<Duration>,
}

impl<R: Read + ReadTimeout> LineReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            inner: BufReader::new(stream),
            pending: Vec::with_capacity(32),
            applied_timeout: None,
        }
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Read one line without its terminator, `Ok(None)` on timeout.
    pub fn next_line(&mut self, timeout: Duration) -> Result<Option<String>> {
        if self.applied_timeout != Some(timeout) {
            self.inner.get_ref().set_read_timeout(timeout)?;
            self.applied_timeout = Some(timeout);
        }
        loop {
            match self.inner.read_until(b'\n', &mut self.pending) {
                Ok(0) => {
                    if !self.pending.is_empty() {
                        tracing::debug!(bytes = self.pending.len(), "discarding partial line at EOF");
                        self.pending.clear();
                    }
                    return Err(LinkError::Closed);
                }
                Ok(_) => {
                    if self.pending.last() != Some(&b'\n') {
                        // EOF mid-line; the next read reports Closed
                        continue;
                    }
                    let line = String::from_utf8_lossy(&self.pending)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    self.pending.clear();
                    return Ok(Some(line));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if is_timeout(&e) => return Ok(None),
                Err(e) => return Err(LinkError::Io(e)),
            }
        }
    }
}

impl<R: Read + ReadTimeout> rpm_traits::LineSource for LineReader<R> {
    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> std::result::Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        self.next_line(timeout).map_err(Into::into)
    }
}

/// Writes encoded commands to a stream, flushing after each one.
#[derive(Debug)]
pub struct CommandWriter<W: Write> {
    inner: W,
}

impl<W: Write> CommandWriter<W> {
    pub fn new(stream: W) -> Self {
        Self { inner: stream }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn write_command(&mut self, command: &str) -> Result<()> {
        let res = self
            .inner
            .write_all(command.as_bytes())
            .and_then(|()| self.inner.flush());
        match res {
            Ok(()) => Ok(()),
            Err(e) if is_timeout(&e) => Err(LinkError::Timeout),
            Err(e) if e.kind() == ErrorKind::WriteZero => Err(LinkError::Closed),
            Err(e) => Err(LinkError::Io(e)),
        }
    }
}

impl<W: Write> rpm_traits::CommandSink for CommandWriter<W> {
    fn send(
        &mut self,
        command: &str,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.write_command(command).map_err(Into::into)
    }
}
