use parking_lot::Mutex;
use std::collections::{hash_map::Entry, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// One-shot broadcast gate.
///
/// Fires at most once. Every waiter registered before firing is woken, and
/// every waiter created afterwards completes immediately.
#[derive(Debug, Default)]
pub(crate) struct Signal {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    fired: bool,
    next_key: u64,
    // Keyed so a waiter dropped before firing can take its waker back out.
    wakers: HashMap<u64, Waker>,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fires the signal and wakes all waiters.
    ///
    /// Returns `false` if the signal had already fired.
    pub(crate) fn fire(&self) -> bool {
        let wakers = {
            let mut inner = self.inner.lock();
            if inner.fired {
                return false;
            }
            inner.fired = true;
            std::mem::take(&mut inner.wakers)
        };
        for waker in wakers.into_values() {
            waker.wake()
        }
        true
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.inner.lock().fired
    }

    pub(crate) fn fired(&self) -> Fired<'_> {
        Fired { signal: self, key: None }
    }
}

/// Future returned by [`Signal::fired`].
#[derive(Debug)]
pub(crate) struct Fired<'a> {
    signal: &'a Signal,
    key: Option<u64>,
}

impl Future for Fired<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let signal = this.signal;
        let mut inner = signal.inner.lock();
        if inner.fired {
            return Poll::Ready(());
        }

        let key = match this.key {
            Some(key) => key,
            None => {
                let key = inner.next_key;
                inner.next_key += 1;
                this.key = Some(key);
                key
            }
        };
        match inner.wakers.entry(key) {
            Entry::Occupied(mut entry) => {
                if !entry.get().will_wake(cx.waker()) {
                    entry.insert(cx.waker().clone());
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(cx.waker().clone());
            }
        }
        Poll::Pending
    }
}

impl Drop for Fired<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.signal.inner.lock().wakers.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Signal;
    use futures::{executor::block_on, FutureExt};
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn test_fires_once() {
        let signal = Signal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(!signal.fire());
        assert!(signal.is_fired());
    }

    #[test]
    fn test_late_waiter_completes_immediately() {
        let signal = Signal::new();
        signal.fire();
        assert_eq!(signal.fired().now_or_never(), Some(()));
    }

    #[test]
    fn test_wakes_all_waiters() {
        let signal = Arc::new(Signal::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let signal = signal.clone();
                thread::spawn(move || block_on(signal.fired()))
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        signal.fire();
        for waiter in waiters {
            waiter.join().expect("The waiter thread has panicked");
        }
    }

    #[test]
    fn test_dropped_waiter_deregisters() {
        let signal = Signal::new();
        {
            let mut fired = signal.fired();
            assert_eq!((&mut fired).now_or_never(), None);
            assert_eq!(signal.inner.lock().wakers.len(), 1);
        }
        assert!(signal.inner.lock().wakers.is_empty());
    }
}
