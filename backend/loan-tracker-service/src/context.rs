//! Per-request cancellation and deadline carrier
//!
//! Created at the boundary (one per inbound request) and passed unchanged
//! into every store call. Stores race their work against the cancellation
//! token and the deadline via [`RequestContext::run`].
use crate::db::StoreError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context bound to an externally owned cancellation token
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Copy of this context that also expires `timeout` from now
    ///
    /// An earlier existing deadline wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };

        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fail fast if the request is already cancelled or past its deadline
    pub fn check(&self) -> Result<(), StoreError> {
        if self.cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        if matches!(self.deadline, Some(deadline) if deadline <= Instant::now()) {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `future` to completion unless the request is cancelled or times out first
    pub async fn run<F, T>(&self, future: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.check()?;

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
                    _ = tokio::time::sleep_until(deadline) => Err(StoreError::DeadlineExceeded),
                    result = future => result,
                }
            }
            None => {
                tokio::select! {
                    _ = self.cancel.cancelled() => Err(StoreError::Cancelled),
                    result = future => result,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes_without_cancellation() {
        let ctx = RequestContext::background();
        let result = ctx.run(async { Ok::<_, StoreError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_fast() {
        let ctx = RequestContext::background();
        ctx.cancel();

        let result = ctx.run(async { Ok::<_, StoreError>(42) }).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
        assert!(matches!(ctx.check(), Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_deadline_elapses() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(10));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, StoreError>(42)
            })
            .await;

        assert!(matches!(result, Err(StoreError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_cancellation_propagates_to_clones() {
        let token = CancellationToken::new();
        let ctx =
            RequestContext::with_cancellation(token.clone()).with_timeout(Duration::from_secs(5));

        token.cancel();
        assert!(matches!(ctx.check(), Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_earlier_deadline_wins() {
        let short = RequestContext::background().with_timeout(Duration::from_secs(1));
        let widened = short.with_timeout(Duration::from_secs(60));
        assert_eq!(short.deadline(), widened.deadline());
    }
}
