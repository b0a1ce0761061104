use thiserror::Error;

/// Error taxonomy for maintenance runs.
///
/// `Store` errors are caught at batch/entity granularity by the
/// orchestrators; the other kinds abort the invocation.
#[derive(Debug, Error)]
pub enum MaintError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Schema(String),

    #[error("{0}")]
    Store(String),

    #[error("Entity {0} is not supported.")]
    UnsupportedType(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl MaintError {
    pub fn store(message: impl Into<String>) -> Self {
        MaintError::Store(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        MaintError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, MaintError>;
