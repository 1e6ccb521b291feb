//! Error types for mannequin

use thiserror::Error;

/// Main error type for pose, action and variant handling
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed file contents (wrong arity, non-finite numbers, bad durations)
    #[error("Format error: {0}")]
    Format(String),

    /// Unknown part name or interpolation mode
    #[error("Schema error: {0}")]
    Schema(String),

    /// Action frame names a pose that is not loaded
    #[error("Action '{action}' references unknown pose '{pose}'")]
    Reference { action: String, pose: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Two skins sanitize to the same identifier
    #[error("Identifier '{id}' from {rejected} collides with {existing}")]
    IdentifierCollision {
        id: String,
        existing: String,
        rejected: String,
    },

    /// Host refused a variant, or the registry is in the wrong state
    #[error("Registration of '{id}' failed: {reason}")]
    Registration { id: String, reason: String },

    /// Lookup by name or id found nothing
    #[error("Unknown {kind} '{name}'")]
    NotFound { kind: &'static str, name: String },
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// True for lookups that missed, including a missing definition file
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    pub(crate) fn registration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Registration {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        // Syntax and type errors both count as malformed data
        if err.is_io() {
            Self::Io(err.into())
        } else {
            Self::Format(err.to_string())
        }
    }
}
