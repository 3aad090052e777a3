//! Driver error types

use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors reported by a document store driver
///
/// `NoDocuments` and `DuplicateKey` are the two conditions the client
/// translates into its own error kinds; everything else is passed through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// A single-document read matched nothing
    #[error("no documents in result")]
    NoDocuments,

    /// A write violated a unique index
    #[error("E11000 duplicate key error collection: {namespace} index: {index} dup key: {key}")]
    DuplicateKey {
        /// `database.collection` where the violation happened
        namespace: String,
        /// Name of the violated index
        index: String,
        /// Offending key, rendered as text
        key: String,
    },

    /// Connection or network failure
    #[error("connection error: {0}")]
    Connection(String),

    /// The server did not answer in time
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The filter could not be interpreted
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The update could not be interpreted
    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    /// The document could not be stored
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The client was disconnected before the call
    #[error("client is disconnected")]
    Disconnected,

    /// Any other driver failure
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// True for `NoDocuments`
    pub fn is_no_documents(&self) -> bool {
        matches!(self, Self::NoDocuments)
    }

    /// True for `DuplicateKey`
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
