//! Error types for the docstore client
//!
//! Every client operation returns [`Result<T>`]. Store failures are sorted
//! into a small set of stable kinds so callers can branch on them without
//! knowing which driver produced them:
//!
//! - [`StoreError::MissingRequiredParameter`]: parameters failed validation,
//!   the store was never contacted
//! - [`StoreError::NotFound`]: a single-document read matched nothing
//! - [`StoreError::Collision`]: an insert hit a unique index
//! - [`StoreError::MaxRetriesExceeded`]: every attempt failed with a retryable
//!   error
//!
//! Anything else the driver reports is passed through as [`StoreError::Store`].

use crate::params::Operation;
use docstore_core::{RetryEligible, RetryError, error_boundary};
use docstore_driver::DriverError;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Operation parameters failed validation.
    #[error("missing required parameter for {operation}: {reason}")]
    MissingRequiredParameter {
        /// Operation that was rejected
        operation: Operation,
        /// Which requirement was not met
        reason: &'static str,
    },

    /// A single-document read matched zero documents.
    #[error("no document matched the filter")]
    NotFound,

    /// An insert violated a unique constraint.
    #[error("collision found in collection {collection_name}")]
    Collision {
        /// Collection the insert targeted
        collection_name: String,
    },

    /// The retry budget ran out on retryable failures.
    #[error("max retries exhausted trying to call database after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Attempts performed
        attempts: u32,
        /// Error from the final attempt
        #[source]
        last: Box<StoreError>,
    },

    /// The call context was cancelled.
    #[error("call cancelled")]
    Cancelled,

    /// The call context deadline elapsed.
    #[error("call deadline exceeded")]
    DeadlineExceeded,

    /// A fetched document did not fit the destination type.
    #[error("unable to decode result: {0}")]
    Decode(#[source] serde_json::Error),

    /// A caller value could not be turned into a document.
    #[error("unable to encode document: {0}")]
    Encode(String),

    /// Any other failure reported by the store.
    #[error(transparent)]
    Store(DriverError),
}

error_boundary!(serde_json::Error => StoreError, |err| StoreError::Decode(err));
error_boundary!(DriverError => StoreError, |err| StoreError::Store(err));

impl StoreError {
    /// True for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// True for [`StoreError::Collision`].
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }

    /// True for [`StoreError::MissingRequiredParameter`].
    pub fn is_missing_parameter(&self) -> bool {
        matches!(self, Self::MissingRequiredParameter { .. })
    }

    /// True for [`StoreError::MaxRetriesExceeded`].
    pub fn is_max_retries_exceeded(&self) -> bool {
        matches!(self, Self::MaxRetriesExceeded { .. })
    }

    /// True when the call context ended the operation.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// True when the error may be retried, subject to the retryable list.
    ///
    /// Only passthrough store errors qualify; the named kinds are terminal.
    pub fn is_retryable_kind(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// The driver error behind a passthrough or exhausted failure.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Store(err) => Some(err),
            Self::MaxRetriesExceeded { last, .. } => last.driver_error(),
            _ => None,
        }
    }

    pub(crate) fn missing(operation: Operation, reason: &'static str) -> Self {
        Self::MissingRequiredParameter { operation, reason }
    }
}

impl RetryEligible for StoreError {
    fn can_retry(&self) -> bool {
        self.is_retryable_kind()
    }
}

impl From<RetryError<StoreError>> for StoreError {
    fn from(err: RetryError<StoreError>) -> Self {
        match err {
            RetryError::Terminal(err) => err,
            RetryError::Exhausted { attempts, last } => Self::MaxRetriesExceeded {
                attempts,
                last: Box::new(last),
            },
        }
    }
}

/// Errors raised while building a client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No database name was supplied.
    #[error("database name must not be empty")]
    MissingDatabase,

    /// The retry budget must allow at least one attempt.
    #[error("max_retries must be at least 1")]
    ZeroRetries,

    /// The client builder was not given a store.
    #[error("a document store is required to build a client")]
    MissingStore,

    /// An environment variable held an unusable value.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// A dotenv file could not be read or parsed.
    #[error("failed to load env file {path}: {reason}")]
    EnvFile {
        /// File path
        path: String,
        /// Loader error
        reason: String,
    },
}
