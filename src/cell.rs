use parking_lot::RwLock;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::{signal::Signal, CancelSignal, Error};

/// Resolution state of a [`ResolvableCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Unresolved,
    Value,
    Empty,
    Failure,
}

/// A write-once slot resolved exactly once to a value, to "empty", or to a
/// failure.
///
/// Clones share the same slot. The first resolution wins; later attempts are
/// silently ignored. Any number of readers may [`try_read`](Self::try_read) or
/// [`wait`](Self::wait) concurrently, before or after resolution.
///
/// # Examples
///
/// ```
/// use resolvable::{CancelSignal, ResolvableCell};
/// use futures::executor::block_on;
/// use std::thread;
///
/// let cell = ResolvableCell::<String, String>::new();
/// let waiter = cell.clone();
/// let task = thread::spawn(move || block_on(waiter.wait(&CancelSignal::new())));
///
/// cell.resolve_value("🍓".into());
/// assert_eq!(task.join().expect("The task has panicked"), Ok("🍓".to_string()));
/// ```
pub struct ResolvableCell<T, E> {
    shared: Arc<Shared<T, E>>,
}

struct Shared<T, E> {
    outcome: RwLock<Outcome<T, E>>,
    resolved: Signal,
}

enum Outcome<T, E> {
    Unresolved,
    Value(T),
    Empty,
    Failure(E),
}

impl<T, E> Outcome<T, E> {
    fn state(&self) -> State {
        match self {
            Self::Unresolved => State::Unresolved,
            Self::Value(_) => State::Value,
            Self::Empty => State::Empty,
            Self::Failure(_) => State::Failure,
        }
    }
}

impl<T: Clone, E: Clone> Outcome<T, E> {
    fn read(&self) -> Result<T, Error<E>> {
        match self {
            Self::Unresolved => Err(Error::Unresolved),
            Self::Value(value) => Ok(value.clone()),
            Self::Empty => Err(Error::Empty),
            Self::Failure(err) => Err(Error::Failure(err.clone())),
        }
    }
}

impl<T, E> ResolvableCell<T, E> {
    /// Creates an unresolved cell.
    pub fn new() -> Self {
        Self { shared: Arc::new(Shared { outcome: RwLock::new(Outcome::Unresolved), resolved: Signal::new() }) }
    }

    /// Resolves the cell to `value` unless it is already resolved.
    pub fn resolve_value(&self, value: T) -> &Self {
        self.settle(Outcome::Value(value))
    }

    /// Resolves the cell to "no value" unless it is already resolved.
    pub fn resolve_empty(&self) -> &Self {
        self.settle(Outcome::Empty)
    }

    /// Resolves the cell to the failure `err` unless it is already resolved.
    pub fn resolve_failure(&self, err: E) -> &Self {
        self.settle(Outcome::Failure(err))
    }

    /// Resolves from an outcome: `Ok(Some(_))` is a value, `Ok(None)` is empty and `Err(_)` a failure.
    pub fn resolve(&self, outcome: Result<Option<T>, E>) -> &Self {
        match outcome {
            Ok(Some(value)) => self.resolve_value(value),
            Ok(None) => self.resolve_empty(),
            Err(err) => self.resolve_failure(err),
        }
    }

    fn settle(&self, outcome: Outcome<T, E>) -> &Self {
        let state = outcome.state();
        {
            // The check and the transition share this write guard, so exactly
            // one concurrent resolver can observe `Unresolved`.
            let mut current = self.shared.outcome.write();
            if !matches!(*current, Outcome::Unresolved) {
                tracing::trace!(current = ?current.state(), ignored = ?state, "cell already resolved");
                return self;
            }
            *current = outcome;
        }

        // Published before firing: waiters read the outcome only after the signal.
        self.shared.resolved.fire();
        tracing::debug!(?state, "cell resolved");
        self
    }

    pub fn state(&self) -> State {
        self.shared.outcome.read().state()
    }

    pub fn is_resolved(&self) -> bool {
        self.state() != State::Unresolved
    }
}

impl<T: Clone, E: Clone> ResolvableCell<T, E> {
    /// Reads the resolution without blocking.
    ///
    /// Returns [`Error::Unresolved`] if nothing has been resolved yet.
    pub fn try_read(&self) -> Result<T, Error<E>> {
        self.shared.outcome.read().read()
    }

    /// Waits until the cell is resolved or `cancel` fires.
    ///
    /// Cancellation only ends this wait. The cell, its producer and other
    /// waiters are unaffected. If both are ready, the resolution is returned.
    pub async fn wait(&self, cancel: &CancelSignal) -> Result<T, Error<E>> {
        tokio::select! {
            biased;
            () = self.shared.resolved.fired() => self.try_read(),
            cause = cancel.cancelled() => {
                tracing::trace!(%cause, "cell wait cancelled");
                Err(Error::WaitCancelled(cause))
            }
        }
    }
}

impl<T, E> Clone for ResolvableCell<T, E> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<T, E> Default for ResolvableCell<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Debug for ResolvableCell<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvableCell").field("state", &self.state()).finish()
    }
}
