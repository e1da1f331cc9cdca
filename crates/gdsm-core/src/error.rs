use thiserror::Error;

/// The only two ways a model operation can fail. Empty documents, zero
/// matches and empty text are ordinary results, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GdsmError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Malformed operation: {0}")]
    MalformedOperation(String),
}
