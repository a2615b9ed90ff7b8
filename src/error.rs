//! Error taxonomy for the content engine.
//!
//! Every failure is surfaced synchronously to the immediate caller as a
//! typed error. `Forbidden` is always distinct from `NotFound` so callers
//! can tell "doesn't exist" apart from "not yours".

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the content engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// A referenced entity does not exist
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// The actor is not allowed to perform an author-only operation
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// A caller-supplied value is malformed
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether this is a missing-entity failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = Error::not_found("article", "some-slug");
        assert_eq!(err.to_string(), "article not found: some-slug");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_forbidden_is_distinct_from_not_found() {
        let err = Error::forbidden("you can only update your own articles");
        assert!(!err.is_not_found());
        assert!(matches!(err, Error::Forbidden(_)));
    }
}
