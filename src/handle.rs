//! Shared, memoizing state behind every lazy collection.
//!
//! A [`LazyHandle`] is either realized (holds a concrete persistent
//! collection) or pending (holds a [`Pipeline`] that has not been drained).
//! Forcing a pending handle drains the pipeline once, publishes the result
//! and drops the pipeline. The transition is irreversible.
//!
//! # Concurrency
//!
//! The handle is guarded by a `parking_lot::Mutex`. The first caller of
//! [`LazyHandle::force`] drains while holding the lock; concurrent callers
//! block and then observe the single published value, so side effects
//! recorded with `peek` run once per logical force.
//!
//! Deriving from a handle ([`LazyHandle::pipeline`], [`LazyHandle::append`])
//! and [`LazyHandle::is_realized`] take the same lock, so while another
//! thread is draining they wait for it to finish. The derived handle is
//! then rooted at the published collection and never re-runs the drain.
//!
//! A pipeline callback must not force the handle it belongs to. Doing so
//! re-enters the lock on the same thread and deadlocks.
//!
//! # Failure
//!
//! When draining fails (a producer fault, a fallible callback, or a panic
//! unwinding through `force`) nothing is published and the handle stays
//! pending. `parking_lot` locks do not poison, so a later `force` simply
//! tries again.
//!
//! # Examples
//!
//! ```rust
//! use lazy_persistent::handle::LazyHandle;
//! use lazy_persistent::kind::VectorKind;
//! use lazy_persistent::pipeline::{Operation, Pipeline};
//!
//! let pipeline = Pipeline::from_collection(im::vector![3, 1, 2]).append(Operation::Reverse);
//! let handle: LazyHandle<i32, VectorKind> = LazyHandle::pending(pipeline);
//!
//! assert!(!handle.is_realized());
//! assert_eq!(handle.force().unwrap(), im::vector![2, 1, 3]);
//! assert!(handle.is_realized());
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::LazyResult;
use crate::kind::{Element, Materialize, PersistentCollection};
use crate::pipeline::{Operation, Pipeline};

/// The two representations a handle can be in.
enum Source<T: Element, C> {
    Realized(C),
    Pending(Pipeline<T>),
}

/// Shared state of a lazy collection of kind `K`.
///
/// Cloning a handle shares it: both clones observe the same materialization.
pub struct LazyHandle<T: Element, K: Materialize<T>> {
    source: Arc<Mutex<Source<T, K::Collection>>>,
}

impl<T: Element, K: Materialize<T>> LazyHandle<T, K> {
    /// Creates a handle that is already realized.
    pub fn realized(collection: K::Collection) -> Self {
        Self::from_source(Source::Realized(collection))
    }

    /// Creates a handle that drains `pipeline` when first forced.
    pub fn pending(pipeline: Pipeline<T>) -> Self {
        Self::from_source(Source::Pending(pipeline))
    }

    fn from_source(source: Source<T, K::Collection>) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
        }
    }

    /// Returns the realized collection, draining the pipeline first if needed.
    ///
    /// Repeated calls return the same value without re-running anything.
    ///
    /// # Errors
    ///
    /// Returns the fault that stopped the drain. The handle stays pending.
    pub fn force(&self) -> LazyResult<K::Collection> {
        let mut source = self.source.lock();
        let pipeline = match &*source {
            Source::Realized(collection) => {
                tracing::trace!(kind = K::NAME, "memoized materialization");
                return Ok(collection.clone());
            }
            Source::Pending(pipeline) => pipeline.clone(),
        };

        tracing::debug!(
            kind = K::NAME,
            operations = pipeline.len(),
            upstream = pipeline.upstream_name(),
            "draining pending pipeline"
        );
        match pipeline.drain_into(K::Collection::empty()) {
            Ok(collection) => {
                *source = Source::Realized(collection.clone());
                Ok(collection)
            }
            Err(fault) => {
                tracing::debug!(kind = K::NAME, error = %fault, "materialization failed");
                Err(fault)
            }
        }
    }

    /// Returns a snapshot pipeline to derive new handles from.
    ///
    /// A realized handle yields a pipeline rooted at its collection, which is
    /// shared rather than copied. A pending handle yields its own pipeline.
    ///
    /// Blocks while another thread is forcing this handle, and then returns
    /// a pipeline rooted at the collection it published.
    pub fn pipeline(&self) -> Pipeline<T> {
        match &*self.source.lock() {
            Source::Realized(collection) => Pipeline::from_collection(collection.clone()),
            Source::Pending(pipeline) => pipeline.clone(),
        }
    }

    /// Returns a new pending handle with `operation` appended.
    ///
    /// The receiver is neither forced nor changed.
    #[must_use]
    pub fn append(&self, operation: Operation<T>) -> Self {
        Self::pending(self.pipeline().append(operation))
    }

    /// Returns `true` once the handle holds a realized collection. Never forces.
    pub fn is_realized(&self) -> bool {
        matches!(&*self.source.lock(), Source::Realized(_))
    }
}

impl<T: Element, K: Materialize<T>> Clone for LazyHandle<T, K> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: Element, K: Materialize<T>> fmt::Debug for LazyHandle<T, K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = formatter.debug_struct("LazyHandle");
        debug.field("kind", &K::NAME);
        match self.source.try_lock().as_deref() {
            Some(Source::Realized(collection)) => debug.field("realized", &collection.len()),
            Some(Source::Pending(pipeline)) => debug.field("pending", pipeline),
            None => debug.field("state", &"<forcing>"),
        };
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::kind::VectorKind;
    use crate::pipeline::Test;
    use im::Vector;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn counted(counter: &Arc<AtomicUsize>) -> LazyHandle<i32, VectorKind> {
        let counter = Arc::clone(counter);
        let pipeline = Pipeline::from_collection((1..=4).collect::<Vector<i32>>())
            .append(Operation::Peek(Arc::new(move |_: &i32| {
                counter.fetch_add(1, Ordering::SeqCst);
            })));
        LazyHandle::pending(pipeline)
    }

    #[rstest]
    fn force_is_idempotent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counted(&counter);

        let first = handle.force().unwrap();
        let second = handle.force().unwrap();

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[rstest]
    fn append_does_not_force_the_receiver() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counted(&counter);
        let derived = handle.append(Operation::Take(2));

        assert!(!handle.is_realized());
        assert!(!derived.is_realized());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(derived.force().unwrap(), im::vector![1, 2]);
    }

    #[rstest]
    fn realized_handle_derives_from_its_collection() {
        let handle: LazyHandle<i32, VectorKind> = LazyHandle::realized(im::vector![1, 2, 3]);
        let derived = handle.append(Operation::Reverse);

        assert_eq!(derived.pipeline().upstream_name(), "Realized");
        assert_eq!(derived.force().unwrap(), im::vector![3, 2, 1]);
    }

    #[rstest]
    fn concurrent_first_force_publishes_one_value() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counted(&counter);

        let results: Vec<Vector<i32>> = thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let handle = handle.clone();
                    scope.spawn(move || handle.force().unwrap())
                })
                .collect();
            workers.into_iter().map(|worker| worker.join().unwrap()).collect()
        });

        assert!(results.iter().all(|result| *result == im::vector![1, 2, 3, 4]));
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[rstest]
    fn failed_force_leaves_the_handle_pending() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let test: Test<i32> = Arc::new(move |_: &i32| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Fault::callback("rejected"))
        });
        let handle: LazyHandle<i32, VectorKind> =
            LazyHandle::pending(Pipeline::from_collection(im::vector![1]).append(Operation::Filter(test)));

        assert!(matches!(handle.force(), Err(Fault::Callback(_))));
        assert!(!handle.is_realized());
        assert!(matches!(handle.force(), Err(Fault::Callback(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    fn debug_does_not_force() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counted(&counter);

        let rendered = format!("{handle:?}");

        assert!(rendered.contains("pending"));
        assert!(!handle.is_realized());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
