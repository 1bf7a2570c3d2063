//! Structured error types for circulation-core.
//!
//! Library consumers get a `thiserror` enum they can match on; the
//! `circulation` binary wraps these in `anyhow` for reporting.

use mongodb::bson;
use thiserror::Error;

/// Main error type for record store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached, the URI was invalid, or authentication failed
    #[error("Failed to connect to store: {source}")]
    Connection {
        #[source]
        source: mongodb::error::Error,
    },

    /// Identifier string is not a well-formed ObjectId
    #[error("Invalid record identifier '{value}'")]
    InvalidIdentifier { value: String },

    /// A record with this identifier already exists
    #[error("Duplicate record identifier: {id}")]
    Duplicate { id: String },

    /// Document rejected by the store
    #[error("Invalid document: {reason}")]
    InvalidDocument { reason: String },

    /// Driver-reported failure, passed through unchanged
    #[error("Store operation failed: {0}")]
    Operation(#[from] mongodb::error::Error),

    /// Typed record could not be encoded as a document
    #[error("Failed to encode record: {0}")]
    Serialization(#[from] bson::ser::Error),

    /// Document could not be decoded into a typed record
    #[error("Failed to decode record: {0}")]
    Deserialization(#[from] bson::de::Error),

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

/// Result type alias for record store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Create a connection error
    pub fn connection(source: mongodb::error::Error) -> Self {
        Self::Connection { source }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(value: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
        }
    }

    /// Create a duplicate identifier error
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::Duplicate { id: id.into() }
    }

    /// Create an invalid document error
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            reason: reason.into(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
