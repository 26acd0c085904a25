//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

/// Application errors: the two generator failure classes plus configuration.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("base template not found: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("transformation failed: {context}: {source}")]
    Transformation {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

impl ApplicationError {
    /// Wrap any underlying failure as a transformation error.
    pub fn transformation(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transformation {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
