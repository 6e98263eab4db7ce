//! Fire-and-forget delivery of controller commands to the link.
//!
//! A failed send is logged and returned to the caller; it never feeds back
//! into controller state.

use rpm_traits::CommandSink;

use crate::command::IssuedCommand;
use crate::error::ControlError;
use crate::link_error::map_link_error;

/// A command the transport refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFailure {
    pub issued: IssuedCommand,
    pub error: ControlError,
}

pub struct CommandEmitter<T: CommandSink> {
    sink: T,
    sent: u64,
    failed: u64,
}

impl<T: CommandSink> core::fmt::Debug for CommandEmitter<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandEmitter")
            .field("sent", &self.sent)
            .field("failed", &self.failed)
            .finish()
    }
}

impl<T: CommandSink> CommandEmitter<T> {
    pub fn new(sink: T) -> Self {
        Self {
            sink,
            sent: 0,
            failed: 0,
        }
    }

    /// Encode and send one command.
    pub fn emit(&mut self, issued: &IssuedCommand) -> Result<(), ControlError> {
        let wire = issued.command.encode();
        match self.sink.send(&wire) {
            Ok(()) => {
                self.sent = self.sent.saturating_add(1);
                tracing::debug!(
                    command = %issued.command,
                    reason = issued.reason.name(),
                    "command sent"
                );
                Ok(())
            }
            Err(e) => {
                self.failed = self.failed.saturating_add(1);
                let err = map_link_error(&*e);
                tracing::warn!(
                    command = %issued.command,
                    reason = issued.reason.name(),
                    error = %err,
                    "command send failed"
                );
                Err(err)
            }
        }
    }

    /// Send every command in order; failures do not stop later sends.
    pub fn emit_all(&mut self, commands: &[IssuedCommand]) -> Vec<SendFailure> {
        commands
            .iter()
            .filter_map(|issued| {
                self.emit(issued).err().map(|error| SendFailure {
                    issued: *issued,
                    error,
                })
            })
            .collect()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}
