//! Hand a value from one producing task to any number of consuming tasks,
//! exactly once, with cancellable waits.
//!
//! * [`ResolvableCell`] is a write-once slot resolved by its producer to a
//!   value, to "empty", or to a failure. The first resolution wins.
//! * [`Promise`] starts a computation in the background on creation and lets
//!   any number of callers wait for its outcome.
//!
//! Every wait takes its own [`CancelSignal`]. Cancelling a wait never resolves
//! the cell, never stops a computation and never affects other waiters.
//!
//! # Examples
//!
//! ```
//! use resolvable::{CancelSignal, Error, ResolvableCell};
//! use futures::executor::block_on;
//! use std::thread;
//!
//! let cell = ResolvableCell::<u32, String>::new();
//! let waiters: Vec<_> = (0..3)
//!     .map(|_| {
//!         let cell = cell.clone();
//!         thread::spawn(move || block_on(cell.wait(&CancelSignal::new())))
//!     })
//!     .collect();
//!
//! cell.resolve_value(42);
//! for waiter in waiters {
//!     assert_eq!(waiter.join().expect("The waiter has panicked"), Ok(42));
//! }
//!
//! // Later resolutions are ignored.
//! cell.resolve_empty();
//! assert_eq!(cell.try_read(), Ok(42));
//! assert_eq!(ResolvableCell::<u32, String>::new().try_read(), Err(Error::Unresolved));
//! ```

pub mod cancel;
mod cell;
mod error;
mod promise;
mod signal;

pub use cancel::{CancelSignal, Cause};
pub use cell::{ResolvableCell, State};
pub use error::Error;
pub use promise::Promise;
