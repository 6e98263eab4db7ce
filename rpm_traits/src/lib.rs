pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Outbound half of the peripheral link: accepts one encoded command at a time.
pub trait CommandSink {
    fn send(&mut self, command: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Inbound half of the peripheral link: yields telemetry text one line at a time.
///
/// `Ok(None)` means no complete line arrived within `timeout`; an `Err` means
/// the link is gone and no further lines will arrive.
pub trait LineSource {
    fn read_line(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: CommandSink + ?Sized> CommandSink for Box<T> {
    fn send(&mut self, command: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).send(command)
    }
}

impl<T: LineSource + ?Sized> LineSource for Box<T> {
    fn read_line(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_line(timeout)
    }
}
