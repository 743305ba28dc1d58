use parking_lot::RwLock;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use tracing::Instrument;

use crate::{signal::Signal, CancelSignal, Error};

/// The outcome of a computation started eagerly in the background.
///
/// The computation is spawned on the current Tokio runtime as soon as the
/// promise is created and runs to completion even if every handle is dropped
/// or every wait is cancelled. Clones share the same outcome.
///
/// Two cancellation signals are involved: the one passed to
/// [`new`](Self::new) is handed to the computation, which decides whether to
/// abort. The one passed to [`wait`](Self::wait) only bounds how long that
/// particular caller waits.
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

struct Shared<T, E> {
    outcome: RwLock<Option<Result<T, E>>>,
    done: Signal,
}

impl<T, E> Shared<T, E> {
    fn complete(&self, outcome: Result<T, E>) {
        {
            let mut slot = self.outcome.write();
            debug_assert!(slot.is_none(), "promise completed twice");
            *slot = Some(outcome);
        }
        self.done.fire();
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Starts `computation` in the background, passing it `cancel`.
    ///
    /// Never blocks. Must be called within a Tokio runtime.
    pub fn new<F, Fut>(cancel: CancelSignal, computation: F) -> Self
    where
        F: FnOnce(CancelSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let shared = Self::pending();
        let completion = shared.clone();
        tracing::debug!("promise computation starting");
        tokio::spawn(
            async move {
                let outcome = computation(cancel).await;
                tracing::debug!(ok = outcome.is_ok(), "promise computation finished");
                completion.complete(outcome);
            }
            .in_current_span(),
        );
        Self { shared }
    }

    /// Like [`new`](Self::new), but runs a synchronous computation on the
    /// runtime's blocking thread pool.
    pub fn new_blocking<F>(cancel: CancelSignal, computation: F) -> Self
    where
        F: FnOnce(CancelSignal) -> Result<T, E> + Send + 'static,
    {
        let shared = Self::pending();
        let completion = shared.clone();
        let span = tracing::Span::current();
        tracing::debug!("blocking promise computation starting");
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let outcome = computation(cancel);
            tracing::debug!(ok = outcome.is_ok(), "blocking promise computation finished");
            completion.complete(outcome);
        });
        Self { shared }
    }

    fn pending() -> Arc<Shared<T, E>> {
        Arc::new(Shared { outcome: RwLock::new(None), done: Signal::new() })
    }
}

impl<T, E> Promise<T, E> {
    pub fn is_complete(&self) -> bool {
        self.shared.done.is_fired()
    }
}

impl<T: Clone, E: Clone> Promise<T, E> {
    /// Returns the outcome without waiting.
    ///
    /// Returns [`Error::Unresolved`] while the computation is still running.
    pub fn try_result(&self) -> Result<T, Error<E>> {
        match &*self.shared.outcome.read() {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(err)) => Err(Error::Failure(err.clone())),
            None => Err(Error::Unresolved),
        }
    }

    /// Waits for the computation to finish or for `cancel` to fire.
    ///
    /// A cancelled wait does not stop the computation.
    pub async fn wait(&self, cancel: &CancelSignal) -> Result<T, Error<E>> {
        tokio::select! {
            biased;
            () = self.shared.done.fired() => self.try_result(),
            cause = cancel.cancelled() => {
                tracing::trace!(%cause, "promise wait cancelled");
                Err(Error::WaitCancelled(cause))
            }
        }
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<T, E> Debug for Promise<T, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").field("complete", &self.is_complete()).finish()
    }
}
