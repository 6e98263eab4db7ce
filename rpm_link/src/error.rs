use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link closed by peer")]
    Closed,
    #[error("link timeout")]
    Timeout,
    #[error("invalid link address: {0}")]
    Address(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
