//! Common error type definitions.

use std::sync::Arc;

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur in agora-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A local precondition failed before any store call was made.
    Validation,
    /// The store failed: transport, permission, missing row or constraint.
    DataAccess,
    /// The signed-in user may not perform the action.
    Forbidden,
    /// The target is not part of the loaded state.
    NotFound,
}

/// A structured error type for agora-core operations.
///
/// Errors are cloneable so that one failed fetch can be handed to every
/// caller waiting on it; the source is shared rather than copied.
#[derive(Debug, Clone, Error)]
#[error("{}{}", kind.as_ref(), message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a new validation error.
    pub fn validation() -> Self {
        Self::new(ErrorKind::Validation)
    }

    /// Creates a new data access error.
    pub fn data_access() -> Self {
        Self::new(ErrorKind::DataAccess)
    }

    /// Creates a new forbidden error.
    pub fn forbidden() -> Self {
        Self::new(ErrorKind::Forbidden)
    }

    /// Creates a new not found error.
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }
}

#[cfg(feature = "postgres")]
impl From<agora_postgres::PgError> for Error {
    fn from(error: agora_postgres::PgError) -> Self {
        let message = match error.constraint_violation() {
            Some(violation) => format!("constraint {violation} violated"),
            None if error.is_not_found() => "row not found".to_owned(),
            None => "database operation failed".to_owned(),
        };

        Self::data_access().with_message(message).with_source(error)
    }
}
