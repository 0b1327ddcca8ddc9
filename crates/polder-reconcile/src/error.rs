//! Error types for the reconciliation engine.

use polder_core::object::Kind;

/// The result type used throughout polder-reconcile.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in reconciliation operations.
///
/// Note that already-exists races and optimistic-concurrency conflicts are
/// *not* errors; the store surfaces them as normal results
/// ([`crate::store::CreateResult`], [`crate::store::WriteResult`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A storage operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An object payload could not be serialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An object of an unexpected kind was passed to a kind-specific
    /// operation. This is a programming-contract violation, never a
    /// degraded-mode condition.
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// The kind the operation requires.
        expected: Kind,
        /// The kind that was actually passed.
        actual: Kind,
    },

    /// An error from polder-core.
    #[error("core error: {0}")]
    Core(#[from] polder_core::error::Error),
}

impl Error {
    /// Creates a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
