//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the document model.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("malformed XML: {message}")]
    Parse { message: String },

    #[error("unexpected root namespace: expected {expected}, found {}", .found.as_deref().unwrap_or("<none>"))]
    NamespaceMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("cannot serialize document: {message}")]
    Serialize { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
