//! Cancellation signals for waits and background computations.
//!
//! A [`CancelSignal`] fires at most once, either because [`CancelSignal::cancel`]
//! was called on it or one of its ancestors, or because its deadline passed.
//! Once fired it stays fired.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Why a [`CancelSignal`] fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Cause {
    #[error("context canceled")]
    Cancelled,
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// A cloneable cancellation signal with an optional deadline.
///
/// Clones observe and control the same signal. Derived signals created by
/// [`child`](Self::child), [`with_timeout`](Self::with_timeout) and
/// [`with_deadline`](Self::with_deadline) fire together with their parent but
/// can be cancelled on their own.
///
/// Waiting on a signal with a deadline requires a Tokio runtime with the
/// timer enabled.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires this signal and every signal derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn child(&self) -> Self {
        Self { token: self.token.child_token(), deadline: self.deadline }
    }

    /// Derives a signal that also fires once `timeout` has elapsed.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a signal that also fires at `deadline`.
    ///
    /// An earlier inherited deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(inherited) => inherited.min(deadline),
            None => deadline,
        };
        Self { token: self.token.child_token(), deadline: Some(deadline) }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this signal has fired, or `None` if it has not.
    pub fn cause(&self) -> Option<Cause> {
        if self.token.is_cancelled() {
            return Some(Cause::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cause::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cause().is_some()
    }

    /// Completes once this signal fires.
    pub async fn cancelled(&self) -> Cause {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => Cause::Cancelled,
                    () = time::sleep_until(deadline) => Cause::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                Cause::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelSignal, Cause};
    use std::time::Duration;
    use tokio::time::{self, Instant};

    #[test]
    fn test_cancel_is_sticky() {
        let signal = CancelSignal::new();
        assert_eq!(signal.cause(), None);
        signal.cancel();
        signal.cancel();
        assert_eq!(signal.cause(), Some(Cause::Cancelled));
        assert!(signal.clone().is_cancelled());
    }

    #[test]
    fn test_child_follows_parent_only() {
        let parent = CancelSignal::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.cause(), Some(Cause::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_at_deadline() {
        let start = Instant::now();
        let signal = CancelSignal::new().with_timeout(Duration::from_millis(250));
        assert_eq!(signal.cause(), None);

        assert_eq!(signal.cancelled().await, Cause::DeadlineExceeded);
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(signal.cause(), Some(Cause::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_earlier_deadline_is_inherited() {
        let outer = CancelSignal::new().with_timeout(Duration::from_secs(1));
        let inner = outer.with_timeout(Duration::from_secs(10));
        assert_eq!(inner.deadline(), outer.deadline());

        time::advance(Duration::from_secs(1)).await;
        assert_eq!(inner.cause(), Some(Cause::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_cancel_wins_over_deadline() {
        let signal = CancelSignal::new().with_timeout(Duration::from_secs(5));
        signal.cancel();
        assert_eq!(signal.cancelled().await, Cause::Cancelled);

        time::advance(Duration::from_secs(5)).await;
        assert_eq!(signal.cause(), Some(Cause::Cancelled));
    }
}
