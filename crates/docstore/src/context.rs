//! Per-call cancellation and deadline.
//!
//! A [`CallContext`] is created for one logical operation and passed by
//! reference to the client. Store calls made on its behalf are raced against
//! its cancellation token and its deadline; whichever ends first wins.
//! Dropping the context cancels it, which also cancels any cursor that was
//! handed out under it.

use crate::error::{Result, StoreError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline used by [`CallContext::new`].
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest timeout honored; larger ones are clamped to it.
const MAX_CALL_TIMEOUT: Duration = Duration::from_secs(86400 * 365 * 30);

/// Instant `timeout` from now, clamped so it cannot overflow.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_CALL_TIMEOUT)).unwrap_or(now)
}

/// Cancellation signal plus deadline, shared with decoders.
#[derive(Debug, Clone)]
pub(crate) struct CallScope {
    token: CancellationToken,
    deadline: Instant,
}

impl CallScope {
    fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if Instant::now() >= self.deadline {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    pub(crate) async fn run<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(StoreError::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => Err(StoreError::DeadlineExceeded),
            output = future => Ok(output),
        }
    }
}

/// Execution context for one logical call.
///
/// # Example
///
/// ```rust
/// use docstore::CallContext;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ctx = CallContext::with_timeout(Duration::from_secs(2));
/// assert!(!ctx.is_cancelled());
/// assert!(ctx.remaining() <= Duration::from_secs(2));
/// # }
/// ```
#[derive(Debug)]
pub struct CallContext {
    scope: CallScope,
}

impl CallContext {
    /// Context with a 10 second deadline from now.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_CALL_TIMEOUT)
    }

    /// Context that expires `timeout` from now.
    ///
    /// Timeouts beyond 30 years are treated as 30 years.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(deadline_after(timeout))
    }

    /// Context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            scope: CallScope {
                token: CancellationToken::new(),
                deadline,
            },
        }
    }

    /// Context cancelled together with `parent`, expiring `timeout` from now.
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            scope: CallScope {
                token: parent.child_token(),
                deadline: deadline_after(timeout),
            },
        }
    }

    /// Cancel the context. In-flight and later calls fail with
    /// [`StoreError::Cancelled`].
    pub fn cancel(&self) {
        self.scope.token.cancel();
    }

    /// Whether the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.scope.token.is_cancelled()
    }

    /// When the context expires.
    pub fn deadline(&self) -> Instant {
        self.scope.deadline
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.scope.deadline.saturating_duration_since(Instant::now())
    }

    /// Token for deriving contexts that end with this one.
    pub fn token(&self) -> &CancellationToken {
        &self.scope.token
    }

    /// Run `future` until it completes or the context ends.
    pub async fn run<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future,
    {
        self.scope.run(future).await
    }

    pub(crate) fn scope(&self) -> CallScope {
        self.scope.clone()
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CallContext {
    fn drop(&mut self) {
        self.scope.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[tokio::test(start_paused = true)]
    async fn test_default_deadline_is_ten_seconds() {
        let ctx = CallContext::new();
        assert_eq!(ctx.remaining(), DEFAULT_CALL_TIMEOUT);
    }

    #[rstest]
    #[case::max_duration(Duration::MAX)]
    #[case::max_seconds(Duration::from_secs(u64::MAX))]
    #[tokio::test(start_paused = true)]
    async fn test_huge_timeout_is_clamped(#[case] timeout: Duration) {
        let ctx = CallContext::with_timeout(timeout);
        assert_eq!(ctx.remaining(), MAX_CALL_TIMEOUT);

        let parent = CancellationToken::new();
        let child = CallContext::child_of(&parent, timeout);
        assert_eq!(child.remaining(), MAX_CALL_TIMEOUT);

        let value = ctx.run(async { "done" }).await.unwrap();
        assert_eq!(value, "done");
    }

    #[tokio::test]
    async fn test_completed_future_passes_through() {
        let ctx = CallContext::new();
        let value = ctx.run(async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_interrupts_pending_future() {
        let ctx = CallContext::with_timeout(Duration::from_secs(1));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_matches!(result, Err(StoreError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let ctx = CallContext::new();
        let cancel = ctx.token().clone();
        tokio::spawn(async move { cancel.cancel() });

        let result = ctx.run(std::future::pending::<()>()).await;
        assert_matches!(result, Err(StoreError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_context_does_not_start_work() {
        let ctx = CallContext::new();
        ctx.cancel();

        let mut started = false;
        let result = ctx
            .run(async {
                started = true;
            })
            .await;
        assert_matches!(result, Err(StoreError::Cancelled));
        assert!(!started);
    }

    #[tokio::test]
    async fn test_parent_cancellation_reaches_child() {
        let parent = CancellationToken::new();
        let ctx = CallContext::child_of(&parent, Duration::from_secs(5));
        parent.cancel();
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_cancels_shared_scope() {
        let ctx = CallContext::new();
        let scope = ctx.scope();
        drop(ctx);
        assert_matches!(scope.check(), Err(StoreError::Cancelled));
    }
}
