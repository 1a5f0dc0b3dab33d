//! Faults raised while forcing or updating a lazy collection.
//!
//! Every fault surfaces synchronously at the call that triggered it. The
//! engine never retries on its own: a handle whose materialization failed
//! stays pending, so the caller decides whether to force it again or build
//! a fresh pipeline.
//!
//! # Examples
//!
//! ```rust
//! use lazy_persistent::{Fault, LazyVector};
//!
//! let vector = LazyVector::of([1, 2, 3]);
//! assert!(matches!(vector.get(7), Err(Fault::Index { index: 7, length: 3 })));
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// A shareable, type-erased cause carried by [`Fault::Upstream`] and [`Fault::Callback`].
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Result type returned by forcing operations.
pub type LazyResult<T> = Result<T, Fault>;

/// The ways forcing or updating a lazy collection can fail.
#[derive(Debug, Clone, Error)]
pub enum Fault {
    /// An index was outside the valid range for the operation.
    ///
    /// Indices are never clamped: `get`, `with`, `plus_at` and `minus_at`
    /// report this immediately.
    #[error("index {index} out of range for collection of length {length}")]
    Index {
        /// The offending index.
        index: usize,
        /// The length of the collection at the time of the call.
        length: usize,
    },

    /// The producer feeding a pending collection failed before supplying
    /// every element the pipeline needed.
    #[error("upstream producer failed: {0}")]
    Upstream(#[source] SharedError),

    /// A one-shot producer already failed during an earlier drain and
    /// cannot supply its remaining elements again.
    #[error("upstream producer was already drained by an earlier failed attempt")]
    Drained,

    /// A fallible pipeline callback (`try_map`, `try_filter`) returned an error.
    #[error("pipeline callback failed: {0}")]
    Callback(#[source] SharedError),
}

impl Fault {
    /// Wraps a producer error as [`Fault::Upstream`].
    pub fn upstream<E>(cause: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Upstream(Arc::from(cause.into()))
    }

    /// Wraps a callback error as [`Fault::Callback`].
    pub fn callback<E>(cause: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Callback(Arc::from(cause.into()))
    }

    /// Checks `index < length`, the precondition of every element-addressing update.
    pub(crate) fn check_index(index: usize, length: usize) -> LazyResult<()> {
        if index < length {
            Ok(())
        } else {
            Err(Self::Index { index, length })
        }
    }

    /// Checks `index <= length`, the precondition of insertion.
    pub(crate) fn check_insertion(index: usize, length: usize) -> LazyResult<()> {
        if index <= length {
            Ok(())
        } else {
            Err(Self::Index { index, length })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1, true)]
    #[case(1, 1, false)]
    #[case(3, 0, false)]
    fn check_index_rejects_out_of_range(
        #[case] index: usize,
        #[case] length: usize,
        #[case] accepted: bool,
    ) {
        assert_eq!(Fault::check_index(index, length).is_ok(), accepted);
    }

    #[rstest]
    fn check_insertion_accepts_the_end_position() {
        assert!(Fault::check_insertion(3, 3).is_ok());
        assert!(matches!(
            Fault::check_insertion(4, 3),
            Err(Fault::Index { index: 4, length: 3 })
        ));
    }

    #[rstest]
    fn upstream_fault_keeps_its_cause() {
        let fault = Fault::upstream("connection reset");
        assert_eq!(fault.to_string(), "upstream producer failed: connection reset");
        assert!(fault.source().is_some());
    }
}
