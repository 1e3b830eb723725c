use thiserror::Error;

#[derive(Error, Debug)]
pub enum NookError {
    /// A candidate value was rejected by the configured validator.
    /// The in-memory value and the durable file are unchanged.
    #[error("Validation rejected: {0}")]
    ValidationRejected(String),

    /// The write could not be applied to the value graph itself:
    /// the target path no longer resolves, the target has the wrong
    /// shape for the operation, or an array index is out of bounds.
    #[error("Structural write failed: {0}")]
    StructuralWrite(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, NookError>;
