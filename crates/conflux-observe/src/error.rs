use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("invalid log format: {0} (expected: text|json|journald)")]
    InvalidFormat(String),

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("journald is not supported on this platform")]
    JournaldNotSupported,

    #[error("failed to initialize journald: {0}")]
    JournaldInitFailed(String),

    #[error("tracing already initialized")]
    AlreadyInitialized,
}

pub type ObserveResult<T> = Result<T, ObserveError>;
