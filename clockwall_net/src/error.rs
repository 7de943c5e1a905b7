use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("http error: {0}")]
    Http(String),
    #[error("request timeout")]
    Timeout,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("response has no {0} timestamp")]
    MissingTimestamp(&'static str),
    #[error("malformed timestamp: {0}")]
    Malformed(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetError>;
