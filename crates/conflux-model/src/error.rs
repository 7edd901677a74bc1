use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid merge limit: {0}")]
    InvalidLimit(String),

    #[error("invalid model: {0}")]
    Invalid(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
