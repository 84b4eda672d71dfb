//! Error types for veil-core.
//!
//! The variants mirror how a failure is surfaced: permission and validation
//! failures always reach the acting principal, while configuration and
//! diagnostic failures are absorbed by the caller.

use std::path::{Path, PathBuf};

use crate::types::{DocKind, RecordId};

/// Result type alias for Veil operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating or maintaining confidentiality.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The settings record could not be loaded.
    #[error("Configuration unavailable: {message}")]
    ConfigurationUnavailable {
        /// Why the settings could not be read
        message: String,
    },

    /// No record with this identity exists.
    #[error("{kind} {id} not found")]
    RecordNotFound {
        /// Kind of the missing record
        kind: DocKind,
        /// Identity that failed to resolve
        id: RecordId,
    },

    /// The identity resolved to more than one record.
    #[error("{kind} {id} is ambiguous")]
    AmbiguousIdentity {
        /// Kind of the record
        kind: DocKind,
        /// Identity that matched several records
        id: RecordId,
    },

    /// The principal may not access or create this record.
    #[error("Permission denied on {kind} {id}: {message}")]
    PermissionDenied {
        /// Kind of the protected record
        kind: DocKind,
        /// Identity of the protected record
        id: RecordId,
        /// User-facing explanation
        message: String,
    },

    /// A save was rejected by confidentiality validation.
    #[error("Validation failed for {kind}{}: {message}", id.as_ref().map(|i| format!(" {i}")).unwrap_or_default())]
    ValidationFailed {
        /// Kind of the record being saved
        kind: DocKind,
        /// Identity, if the record has one yet
        id: Option<RecordId>,
        /// User-facing explanation
        message: String,
    },

    /// Updating one dependent record during a cascade failed.
    #[error("Propagation to {kind} {id} failed: {message}")]
    Propagation {
        /// Kind of the dependent record
        kind: DocKind,
        /// Identity of the dependent record
        id: RecordId,
        /// What went wrong
        message: String,
    },

    /// The host record store failed.
    #[error("Store error: {message}")]
    Store {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid local configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error, optionally tied to a path.
    #[error("I/O error{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    Io {
        /// Path being accessed, if known
        path: Option<PathBuf>,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { path: None, source }
    }
}

impl Error {
    /// Creates a permission denial for a record.
    pub fn permission_denied<M: Into<String>>(kind: DocKind, id: RecordId, message: M) -> Self {
        Error::PermissionDenied {
            kind,
            id,
            message: message.into(),
        }
    }

    /// Creates a validation failure for a record.
    pub fn validation<M: Into<String>>(kind: DocKind, id: Option<RecordId>, message: M) -> Self {
        Error::ValidationFailed {
            kind,
            id,
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: DocKind, id: RecordId) -> Self {
        Error::RecordNotFound { kind, id }
    }

    /// Creates a propagation failure for one dependent record.
    pub fn propagation<M: Into<String>>(kind: DocKind, id: RecordId, message: M) -> Self {
        Error::Propagation {
            kind,
            id,
            message: message.into(),
        }
    }

    /// Creates a store error with a message.
    pub fn store<S: Into<String>>(message: S) -> Self {
        Error::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a store error with a message and source error.
    pub fn store_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a configuration-unavailable error.
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Error::ConfigurationUnavailable {
            message: message.into(),
        }
    }

    /// Creates a local configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path that triggered it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: Some(path.as_ref().to_path_buf()),
            source,
        }
    }

    /// Returns `true` for permission denials.
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }

    /// Returns `true` for failures that must be shown to the acting principal.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::PermissionDenied { .. } | Error::ValidationFailed { .. }
        )
    }
}
