use thiserror::Error;

use crate::cancel::Cause;

/// Error returned when reading or waiting on a
/// [`ResolvableCell`](crate::ResolvableCell) or [`Promise`](crate::Promise).
///
/// `E` is the failure type supplied by the producer. It is carried verbatim
/// in [`Error::Failure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error<E> {
    /// Nothing has been resolved yet.
    #[error("option not yet set")]
    Unresolved,
    /// The producer resolved to "no value".
    #[error("value is none")]
    Empty,
    /// The wait's own cancellation signal fired first.
    #[error("wait context error: {0}")]
    WaitCancelled(#[source] Cause),
    /// The producer resolved to a failure.
    #[error("{0}")]
    Failure(E),
}

impl<E> Error<E> {
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn is_wait_cancelled(&self) -> bool {
        matches!(self, Self::WaitCancelled(_))
    }

    /// The producer's failure, if this is one.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }
}
