//! Observability and structured logging
//!
//! Provides structured logging for client operations using the `tracing`
//! crate. The library never installs a subscriber; applications choose where
//! events go. With the `trace` feature, [`init_tracing`] installs a
//! formatting subscriber driven by `RUST_LOG`.

use crate::error::StoreError;
use crate::params::Operation;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Operation metadata for logging
#[derive(Debug, Clone)]
pub struct OperationMetadata {
    /// Operation name
    pub operation: Operation,
    /// Target collection
    pub collection: String,
}

impl OperationMetadata {
    /// Create new operation metadata
    pub fn new(operation: Operation, collection: impl Into<String>) -> Self {
        Self {
            operation,
            collection: collection.into(),
        }
    }

    /// Log operation start
    pub fn log_start(&self) {
        debug!(
            operation = %self.operation,
            collection = %self.collection,
            "Starting operation"
        );
    }

    /// Log rejected parameters
    pub fn log_invalid(&self, error: &StoreError) {
        error!(
            operation = %self.operation,
            collection = %self.collection,
            error = %error,
            "Operation parameters are invalid"
        );
    }

    /// Log a successful operation
    pub fn log_success(&self, elapsed: Duration, attempts: u32) {
        info!(
            operation = %self.operation,
            collection = %self.collection,
            elapsed_ms = elapsed.as_millis(),
            attempts,
            "Operation completed"
        );
    }

    /// Log a failed operation
    ///
    /// Expected outcomes (`NotFound`, `Collision`) are logged at `warn`;
    /// everything else at `error`.
    pub fn log_failure(&self, elapsed: Duration, attempts: u32, err: &StoreError) {
        if err.is_not_found() || err.is_collision() {
            warn!(
                operation = %self.operation,
                collection = %self.collection,
                elapsed_ms = elapsed.as_millis(),
                attempts,
                error = %err,
                "Operation failed"
            );
        } else {
            error!(
                operation = %self.operation,
                collection = %self.collection,
                elapsed_ms = elapsed.as_millis(),
                attempts,
                error = %err,
                "Operation failed"
            );
        }
    }
}

/// Operation timing tracker
#[derive(Debug)]
pub struct OperationTimer {
    start: Instant,
}

impl OperationTimer {
    /// Start timing an operation
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Install a formatting subscriber filtered by `RUST_LOG`.
///
/// Falls back to `info` for the docstore crates when `RUST_LOG` is unset.
/// Calling it twice is harmless; the first subscriber stays in place.
#[cfg(feature = "trace")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("docstore=info,docstore_core=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_metadata_creation() {
        let metadata = OperationMetadata::new(Operation::Upsert, "profiles");
        assert_eq!(metadata.operation, Operation::Upsert);
        assert_eq!(metadata.collection, "profiles");
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::start();
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed().as_millis() >= 10);
    }

    #[test]
    fn test_logging_without_subscriber_is_silent() {
        let metadata = OperationMetadata::new(Operation::FindOne, "users");
        metadata.log_start();
        metadata.log_success(Duration::from_millis(3), 1);
        metadata.log_failure(Duration::from_millis(3), 2, &StoreError::NotFound);
        metadata.log_failure(Duration::from_millis(3), 3, &StoreError::Cancelled);
    }
}
