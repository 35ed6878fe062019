use thiserror::Error;

/// Closes over the error kinds named by the processing specification:
/// validation, precondition, transient-IO, fatal, and cancellation.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transient failure in {task}: {source}")]
    TransientIo {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("fatal failure in {task}: {message}")]
    Fatal { task: String, message: String },

    #[error("operation cancelled: {0}")]
    Cancelled(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
