use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation token threaded through every call that can block.
///
/// Cancellation is cooperative: a handler only stops early if it awaits
/// [`DispatchContext::cancelled`] or checks [`DispatchContext::is_expired`].
/// The dispatcher still detects an overrun after the fact.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl DispatchContext {
    /// No deadline, never cancelled unless [`cancel`](Self::cancel) is called
    pub fn background() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    /// Child context expiring after `timeout`, or at the parent's deadline if sooner.
    /// Cancelling the parent cancels the child.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < own => parent,
            _ => own,
        };
        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    /// Context that ignores the caller's deadline and cancellation entirely.
    /// Used for optional background work that must never look like a dispatch failure.
    pub fn detached(timeout: Duration) -> Self {
        Self::background().with_timeout(timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolves once the deadline passes or the context is cancelled
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

impl Default for DispatchContext {
    fn default() -> Self {
        Self::background()
    }
}
