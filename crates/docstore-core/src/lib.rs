#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core abstractions for the docstore crates.
//!
//! This crate holds the pieces of the data-access layer that do not know
//! anything about documents or collections:
//!
//! - **Bounded retry execution** via [`RetryPolicy`]
//!   - Fixed attempt budget (default 3 attempts)
//!   - Retry classification by error-text substrings ([`RetryClassifier`])
//!   - Optional interval between attempts ([`RetryInterval`])
//! - **Declarative error boundaries** via the `error_boundary!` macro
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use docstore_core::prelude::*;
//!
//! # #[derive(Debug, thiserror::Error)]
//! # #[error("socket closed")]
//! # struct SocketClosed;
//! # impl RetryEligible for SocketClosed {}
//! # async fn example() -> Result<(), RetryError<SocketClosed>> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .retryable_errors(["socket closed"])
//!     .build();
//!
//! let value = policy.execute(|| async { Ok::<_, SocketClosed>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod retry;

pub use retry::{
    RetryClassifier, RetryEligible, RetryError, RetryInterval, RetryPolicy, RetryPolicyBuilder,
};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use docstore_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error_boundary;
    pub use crate::retry::{
        RetryClassifier, RetryEligible, RetryError, RetryInterval, RetryPolicy,
        RetryPolicyBuilder,
    };
}
