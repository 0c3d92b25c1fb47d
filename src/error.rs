//! Error types for prototype-preserving encoding and decoding.
//!
//! Almost every anomaly the codec meets degrades to passthrough data: an
//! envelope whose tag cannot be resolved simply stays a plain object. The
//! variants below cover the few conditions that are reported to the caller.
//!
//! ## Error Categories
//!
//! - **Configuration**: deep-walk decode called without a resolver
//! - **Registration**: tag collisions, reserved tags and untagged prototypes
//!   rejected by [`Resolver::register`](crate::Resolver::register)
//! - **Patterns**: malformed flag strings or sources that fail to compile
//! - **JSON / I/O**: failures of the underlying text format
//!
//! ## Examples
//!
//! ```rust
//! use serde_proto::{unpack_object, value, Error};
//!
//! let mut payload = value!({ "a": 1 });
//! let err = unpack_object(&mut payload, None).unwrap_err();
//! assert!(matches!(err, Error::MissingResolver));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all errors surfaced by the codec.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Deep-walk decode was called without a resolver.
    #[error("missing resolver: deep-walk decode requires a tag-to-constructor resolver")]
    MissingResolver,

    /// Two distinct prototypes claim the same lineage tag.
    #[error("tag collision: '{tag}' is already bound to prototype '{existing}', refusing '{incoming}'")]
    TagCollision {
        tag: String,
        existing: String,
        incoming: String,
    },

    /// The tag is reserved for special numbers, dates or patterns.
    #[error("reserved tag: '{0}' cannot be bound to a user prototype")]
    ReservedTag(String),

    /// A prototype without a lineage tag was offered for registration.
    #[error("prototype '{0}' has no lineage tag")]
    UntaggedPrototype(String),

    /// Pattern flags or source are malformed.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// JSON syntax or data error
    #[error("JSON error: {0}")]
    Json(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a tag collision error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_proto::Error;
    ///
    /// let err = Error::tag_collision("Base", "Base", "Other");
    /// assert!(err.to_string().contains("'Base'"));
    /// ```
    pub fn tag_collision(tag: &str, existing: &str, incoming: &str) -> Self {
        Error::TagCollision {
            tag: tag.to_string(),
            existing: existing.to_string(),
            incoming: incoming.to_string(),
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidPattern(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_proto::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_resolver_display() {
        let err = Error::MissingResolver;
        assert!(err.to_string().contains("resolver"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::from(parse);
        assert!(matches!(err, Error::Json(_)));
    }
}
