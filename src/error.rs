use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by compiler collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the tile layer configuration entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// Caller supplied a value violating an entity invariant
    #[error("Invalid argument for {field}: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    /// A persisted record could not be materialized into a valid entity
    #[error("Invalid layer record: {0}")]
    Invalid(String),
}

/// Errors related to parameter filters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Filter was read before it was bound to the values it depends on
    #[error("Parameter filter {key} was not initialized properly")]
    InconsistentState { key: String },

    /// Request value is not legal for the filter
    #[error("Illegal value {value:?} for parameter {key}")]
    IllegalValue { key: String, value: String },

    /// Regex filter holds a pattern that does not compile
    #[error("Invalid pattern for parameter {key}: {message}")]
    InvalidPattern { key: String, message: String },
}

/// Errors raised by the compiled-resource reload cache
#[derive(Debug, Error)]
pub enum ReloadError {
    /// Filesystem access failed (stat or read)
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler collaborator rejected the file contents
    #[error("Failed to compile {}: {source}", .path.display())]
    Compile {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl ReloadError {
    /// Path of the file the failed operation was working on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ReloadError::Io { path, .. } | ReloadError::Compile { path, .. } => path,
        }
    }

    /// Whether this is a compile failure rather than an I/O failure.
    pub fn is_compile(&self) -> bool {
        matches!(self, ReloadError::Compile { .. })
    }
}
