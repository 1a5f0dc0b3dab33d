//! The lazy collection facade.
//!
//! [`LazyCollection`] is the type users hold. Transformations (`map`,
//! `filter`, `zip`, `sorted`, ...) only record work; queries (`len`, `get`,
//! `iter`, equality, `Display`) force it; structural updates (`plus`,
//! `minus`, `with`, ...) force and then return a new realized collection.
//! Every call leaves the receiver untouched.
//!
//! The concrete structure a collection materializes into is chosen by its
//! kind parameter. [`LazyVector`], [`LazyQueue`], [`LazySet`],
//! [`LazyOrderedSet`] and [`LazyBag`] name the built-in kinds.
//!
//! # Examples
//!
//! ```rust
//! use lazy_persistent::LazyVector;
//!
//! let evens = LazyVector::range(0, 10).filter(|n| n % 2 == 0).map(|n| n * 10);
//! assert!(!evens.is_materialized());
//!
//! assert_eq!(evens.to_vec().unwrap(), vec![0, 20, 40, 60, 80]);
//! assert!(evens.is_materialized());
//! ```

use std::error::Error as StdError;
use std::iter;
use std::sync::Arc;

use im::Vector;

use crate::bulk;
use crate::error::{Fault, LazyResult};
use crate::handle::LazyHandle;
use crate::kind::{
    BagKind, Element, Materialize, OrderedSetKind, PersistentCollection, QueueKind, SetKind,
    VectorKind,
};
use crate::pipeline::Pipeline;
use crate::pipeline::upstream::{OneShot, Producer, Replayable};

mod structural;
mod traits;
mod transform;

#[cfg(feature = "async")]
mod stream;

/// A persistent collection whose contents may not have been computed yet.
///
/// `K` selects the concrete persistent structure (see [`crate::kind`]).
/// Cloning is cheap and shares the memoized materialization.
pub struct LazyCollection<T: Element, K: Materialize<T> = VectorKind> {
    handle: LazyHandle<T, K>,
    kind: K,
}

/// A lazy collection that materializes into an `im::Vector`.
pub type LazyVector<T> = LazyCollection<T, VectorKind>;

/// A lazy collection that materializes into a [`PersistentQueue`](crate::kind::PersistentQueue).
pub type LazyQueue<T> = LazyCollection<T, QueueKind>;

/// A lazy collection that materializes into an `im::HashSet`.
pub type LazySet<T> = LazyCollection<T, SetKind>;

/// A lazy collection that materializes into an `im::OrdSet`.
pub type LazyOrderedSet<T> = LazyCollection<T, OrderedSetKind>;

/// A lazy collection that materializes into a [`Bag`](crate::kind::Bag).
pub type LazyBag<T> = LazyCollection<T, BagKind>;

static_assertions::assert_impl_all!(LazyVector<i32>: Send, Sync, Clone);
static_assertions::assert_impl_all!(LazySet<String>: Send, Sync, Clone);
static_assertions::assert_impl_all!(LazyBag<u64>: Send, Sync, Clone);

impl<T: Element, K: Materialize<T>> LazyCollection<T, K> {
    pub(crate) fn from_handle(handle: LazyHandle<T, K>) -> Self {
        Self {
            handle,
            kind: K::default(),
        }
    }

    pub(crate) fn pending(pipeline: Pipeline<T>) -> Self {
        Self::from_handle(LazyHandle::pending(pipeline))
    }

    pub(crate) const fn handle(&self) -> &LazyHandle<T, K> {
        &self.handle
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Creates a realized collection holding `elements`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazySet;
    ///
    /// let set = LazySet::of([1, 2, 2, 3]);
    /// assert!(set.is_materialized());
    /// assert_eq!(set.len().unwrap(), 3);
    /// ```
    pub fn of<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_collection(bulk::build(K::Collection::empty(), elements))
    }

    /// Creates an empty, realized collection.
    pub fn empty() -> Self {
        Self::from_collection(K::Collection::empty())
    }

    /// Creates a realized collection holding one element.
    pub fn singleton(element: T) -> Self {
        Self::from_collection(K::Collection::empty().plus(element))
    }

    /// Wraps an already realized collection. Nothing is copied.
    pub fn from_collection(collection: K::Collection) -> Self {
        Self::from_handle(LazyHandle::realized(collection))
    }

    /// Creates a pending collection fed by a one-shot iterator.
    ///
    /// The iterator is not touched until the collection (or a collection
    /// derived from it) is forced. Elements it yields are kept so that
    /// other derived collections can replay them.
    pub fn from_iterable<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_producer(Box::new(elements.into_iter().map(Ok)))
    }

    /// Creates a pending collection fed by a one-shot iterator that can fail.
    ///
    /// An `Err` from the iterator surfaces as [`Fault::Upstream`] when the
    /// collection is forced.
    pub fn from_try_iterable<I, E>(elements: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::from_producer(Box::new(
            elements.into_iter().map(|element| element.map_err(Fault::upstream)),
        ))
    }

    pub(crate) fn from_producer(producer: Producer<T>) -> Self {
        Self::pending(Pipeline::from_upstream(OneShot::new(producer)))
    }

    /// Creates a pending collection by unfolding a seed.
    ///
    /// `step` maps the current state to the next element and state; `None`
    /// ends the collection. The unfold is re-run from `seed` for every drain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let countdown = LazyVector::unfold(3, |n| (*n > 0).then(|| (*n, n - 1)));
    /// assert_eq!(countdown.to_vec().unwrap(), vec![3, 2, 1]);
    /// ```
    pub fn unfold<S, F>(seed: S, step: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(&S) -> Option<(T, S)> + Send + Sync + 'static,
    {
        let step = Arc::new(step);
        Self::replayable(move || -> Producer<T> {
            let step = Arc::clone(&step);
            let mut state = Some(seed.clone());
            Box::new(iter::from_fn(move || {
                let current = state.take()?;
                let (element, next) = step(&current)?;
                state = Some(next);
                Some(Ok(element))
            }))
        })
    }

    /// Creates a pending collection of `limit` supplied elements.
    ///
    /// The supplier runs only while the collection is being drained.
    pub fn generate<F>(limit: usize, supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let supplier = Arc::new(supplier);
        Self::replayable(move || -> Producer<T> {
            let supplier = Arc::clone(&supplier);
            Box::new(iter::repeat_with(move || Ok(supplier())).take(limit))
        })
    }

    /// Creates a pending collection `seed, f(seed), f(f(seed)), ...` of `limit` elements.
    pub fn iterate<F>(limit: usize, seed: T, f: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::replayable(move || -> Producer<T> {
            let f = Arc::clone(&f);
            Box::new(
                iter::successors(Some(seed.clone()), move |previous| Some(f(previous)))
                    .take(limit)
                    .map(Ok),
            )
        })
    }

    fn replayable<F>(factory: F) -> Self
    where
        F: Fn() -> Producer<T> + Send + Sync + 'static,
    {
        Self::pending(Pipeline::from_upstream(Replayable::new(factory)))
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    /// Forces the collection and returns a realized copy of it.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while draining.
    pub fn materialize(&self) -> LazyResult<Self> {
        Ok(Self::from_collection(self.handle.force()?))
    }

    /// Returns `true` once the contents have been computed. Never forces.
    pub fn is_materialized(&self) -> bool {
        self.handle.is_realized()
    }

    /// Returns the kind marker of this collection.
    pub const fn kind(&self) -> K {
        self.kind
    }

    /// Re-targets the collection at another kind without forcing it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    /// use lazy_persistent::kind::SetKind;
    ///
    /// let set = LazyVector::of([1, 1, 2]).with_kind::<SetKind>();
    /// assert_eq!(set.len().unwrap(), 2);
    /// ```
    pub fn with_kind<K2>(&self) -> LazyCollection<T, K2>
    where
        K2: Materialize<T>,
    {
        LazyCollection::pending(self.handle.pipeline())
    }
}

impl<K: Materialize<i32>> LazyCollection<i32, K> {
    /// Creates a pending collection of `start..end` (end exclusive).
    pub fn range(start: i32, end: i32) -> Self {
        Self::replayable(move || -> Producer<i32> { Box::new((start..end).map(Ok)) })
    }
}

impl<K: Materialize<i64>> LazyCollection<i64, K> {
    /// Creates a pending collection of `start..end` (end exclusive).
    pub fn range_long(start: i64, end: i64) -> Self {
        Self::replayable(move || -> Producer<i64> { Box::new((start..end).map(Ok)) })
    }
}

/// A pipeline that replays a captured vector on every drain.
pub(crate) fn replay<U: Element>(elements: Vector<U>) -> Pipeline<U> {
    Pipeline::from_upstream(Replayable::new(move || -> Producer<U> {
        Box::new(elements.clone().into_iter().map(Ok))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Bag, PersistentQueue};
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[rstest]
    fn of_is_realized_and_pending_sources_are_not() {
        assert!(LazyVector::of([1, 2]).is_materialized());
        assert!(LazyVector::<i32>::empty().is_materialized());
        assert!(!LazyVector::range(0, 3).is_materialized());
        assert!(!LazyVector::from_iterable(vec![1, 2]).is_materialized());
    }

    #[rstest]
    #[case(0, 0, vec![])]
    #[case(0, 4, vec![0, 1, 2, 3])]
    #[case(5, 2, vec![])]
    #[case(-2, 1, vec![-2, -1, 0])]
    fn range_excludes_the_end(#[case] start: i32, #[case] end: i32, #[case] expected: Vec<i32>) {
        assert_eq!(LazyVector::range(start, end).to_vec().unwrap(), expected);
    }

    #[rstest]
    fn range_long_covers_values_beyond_i32() {
        let start = i64::from(i32::MAX);
        let range: LazyVector<i64> = LazyCollection::range_long(start, start + 3);
        assert_eq!(range.last().unwrap(), Some(start + 2));
    }

    #[rstest]
    fn generate_runs_the_supplier_exactly_limit_times() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let generated = LazyVector::generate(4, move || counter.fetch_add(1, Ordering::SeqCst));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(generated.to_vec().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[rstest]
    fn iterate_starts_at_the_seed() {
        let powers = LazyVector::iterate(5, 1, |n| n * 2);
        assert_eq!(powers.to_vec().unwrap(), vec![1, 2, 4, 8, 16]);
    }

    #[rstest]
    fn unfold_is_replayed_for_every_drain() {
        let countdown = LazyVector::unfold(3_u8, |n| (*n > 0).then(|| (*n, n - 1)));
        let reversed = countdown.reverse();

        assert_eq!(countdown.to_vec().unwrap(), vec![3, 2, 1]);
        assert_eq!(reversed.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[rstest]
    fn from_try_iterable_surfaces_upstream_faults() {
        let elements: Vec<Result<i32, String>> = vec![Ok(1), Err("socket closed".to_owned())];
        let collection = LazyVector::from_try_iterable(elements);

        assert!(matches!(collection.len(), Err(Fault::Upstream(_))));
        assert!(!collection.is_materialized());
    }

    #[rstest]
    fn with_kind_changes_the_materialized_structure() {
        let vector = LazyVector::of([3, 1, 3, 2]);

        let queue: LazyQueue<i32> = vector.with_kind();
        let bag: LazyBag<i32> = vector.with_kind();
        let ordered: LazyOrderedSet<i32> = vector.with_kind();

        assert_eq!(
            queue.to_collection().unwrap(),
            [3, 1, 3, 2].into_iter().collect::<PersistentQueue<_>>()
        );
        assert_eq!(bag.to_collection().unwrap(), [1, 2, 3, 3].into_iter().collect::<Bag<_>>());
        assert_eq!(ordered.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[rstest]
    fn materialize_returns_a_realized_copy() {
        let pending = LazyVector::range(0, 3);
        let realized = pending.materialize().unwrap();

        assert!(realized.is_materialized());
        assert_eq!(realized, pending);
    }
}
