use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// A command could not be delivered; controller state has already advanced.
    #[error("transport error: {0}")]
    Transport(String),
    /// The link dropped underneath us (read or write side).
    #[error("link down: {0}")]
    LinkDown(String),
    #[error("not connected to a peripheral")]
    NotConnected,
    #[error("setpoint {0} out of range (0..=100)")]
    SetpointOutOfRange(i64),
    #[error("configuration error: {0}")]
    Config(String),
    /// The controller worker has exited and no longer accepts events.
    #[error("controller worker stopped")]
    WorkerStopped,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
