//! Serial-link transports for the RPM controller.
//!
//! A link is a pair: a [`rpm_traits::LineSource`] yielding telemetry lines and
//! a [`rpm_traits::CommandSink`] accepting encoded commands. Both halves of a
//! real link share one OS handle, cloned so the reader and writer can live on
//! different threads.
pub mod error;
pub mod sim;
pub mod stream;

use std::fs::OpenOptions;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;

pub use error::LinkError;
pub use sim::{SimCommandPort, SimParams, SimTelemetryPort, SimulatedMotor};
pub use stream::{CommandWriter, LineReader, ReadTimeout};

use error::Result;

/// Boxed link halves, ready to hand to the controller threads.
pub type LinkPair = (
    Box<dyn rpm_traits::LineSource + Send>,
    Box<dyn rpm_traits::CommandSink + Send>,
);

/// Where the peripheral lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Character device such as `/dev/rfcomm0` or `/dev/ttyUSB0`.
    Device(PathBuf),
    /// TCP serial bridge, `host:port`.
    Tcp(String),
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(p) => write!(f, "device {}", p.display()),
            Self::Tcp(a) => write!(f, "tcp {a}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkOptions {
    /// Initial read timeout; the pump may change it per call.
    pub read_timeout: Option<Duration>,
    /// Write timeout for TCP bridges. `None` means blocking writes.
    pub write_timeout: Option<Duration>,
    /// Bound on establishing a TCP connection.
    pub connect_timeout: Option<Duration>,
}

/// Open a character device read/write.
///
/// Line settings (baud, parity) are expected to be configured outside this
/// process, e.g. by `stty` or the rfcomm binding.
pub fn open_device(
    path: impl Into<PathBuf>,
) -> Result<(LineReader<std::fs::File>, CommandWriter<std::fs::File>)> {
    let path = path.into();
    let file = OpenOptions::new().read(true).write(true).open(&path)?;
    let writer = file.try_clone()?;
    tracing::info!(path = %path.display(), "opened serial device");
    Ok((LineReader::new(file), CommandWriter::new(writer)))
}

/// Connect to a TCP serial bridge.
pub fn connect_tcp(
    addr: &str,
    opts: LinkOptions,
) -> Result<(LineReader<TcpStream>, CommandWriter<TcpStream>)> {
    let resolved = addr
        .to_socket_addrs()
        .map_err(|e| LinkError::Address(format!("{addr}: {e}")))?
        .next()
        .ok_or_else(|| LinkError::Address(format!("{addr}: no addresses")))?;
    let stream = match opts.connect_timeout {
        Some(t) => TcpStream::connect_timeout(&resolved, t)?,
        None => TcpStream::connect(resolved)?,
    };
    stream.set_nodelay(true)?;
    if let Some(t) = opts.read_timeout {
        ReadTimeout::set_read_timeout(&stream, t)?;
    }
    if let Some(t) = opts.write_timeout.filter(|t| !t.is_zero()) {
        stream.set_write_timeout(Some(t))?;
    }
    let writer = stream.try_clone()?;
    tracing::info!(peer = %resolved, "connected to tcp serial bridge");
    Ok((LineReader::new(stream), CommandWriter::new(writer)))
}

/// Open either kind of endpoint and box the halves.
pub fn open(endpoint: &Endpoint, opts: LinkOptions) -> Result<LinkPair> {
    match endpoint {
        Endpoint::Device(path) => {
            let (r, w) = open_device(path.clone())?;
            Ok((Box::new(r), Box::new(w)))
        }
        Endpoint::Tcp(addr) => {
            let (r, w) = connect_tcp(addr, opts)?;
            Ok((Box::new(r), Box::new(w)))
        }
    }
}
