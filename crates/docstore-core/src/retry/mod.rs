//! Bounded retry execution.
//!
//! A logical call is executed by [`RetryPolicy::execute`], which runs one
//! attempt at a time and decides after each failure whether to try again.
//!
//! # Key Types
//!
//! - [`RetryPolicy`] - attempt budget, classification and interval in one value
//! - [`RetryClassifier`] - retryable-error substrings matched against error text
//! - [`RetryInterval`] - delay policy `attempt -> duration`
//! - [`RetryEligible`] - lets an error type opt whole kinds out of retrying
//! - [`RetryError`] - terminal failure or exhausted budget
//!
//! # Examples
//!
//! ```rust
//! use docstore_core::retry::{RetryEligible, RetryPolicy};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("connection reset by peer")]
//! struct Reset;
//!
//! impl RetryEligible for Reset {}
//!
//! # async fn example() {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .retryable_errors(["connection reset"])
//!     .build();
//!
//! let result = policy.execute(|| async { Err::<(), _>(Reset) }).await;
//! assert_eq!(result.unwrap_err().attempts(), Some(3));
//! # }
//! ```

mod classifier;
mod interval;
mod policy;

pub use classifier::RetryClassifier;
pub use interval::RetryInterval;
pub use policy::{RetryEligible, RetryError, RetryPolicy, RetryPolicyBuilder};
