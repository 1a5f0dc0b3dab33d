//! Lazy transformations.
//!
//! None of these force the receiver. Each returns a new pending collection
//! whose pipeline is the receiver's pipeline plus one more step.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::error::Error as StdError;
use std::hash::Hash;
use std::iter;
use std::sync::Arc;

use im::Vector;

use super::{LazyCollection, replay};
use crate::error::{Fault, LazyResult};
use crate::kind::{DefaultBuildHasher, Element, Materialize};
use crate::monoid::Monoid;
use crate::pipeline::upstream::{
    Arranged, Arrangement, Batched, Boundary, Combiner, Expander, FlatMapped, GroupedBy, Indexed,
    KeyFunction, LeftStep, Mapped, Mapper, RightStep, Scanned, ScannedRight, Windowed, Zipped,
};
use crate::pipeline::{
    Adjacency, Drain, Fallback, Inspector, Merge, Operation, Pipeline, Predicate, Rearrangement, Test,
    Upstream,
};

impl<T: Element, K: Materialize<T>> LazyCollection<T, K> {
    fn derive(&self, operation: Operation<T>) -> Self {
        Self::from_handle(self.handle().append(operation))
    }

    fn restage<U, S>(&self, stage: impl FnOnce(Pipeline<T>) -> S) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        S: Upstream<U> + 'static,
    {
        LazyCollection::pending(Pipeline::from_upstream(stage(self.handle().pipeline())))
    }

    // =========================================================================
    // Mapping
    // =========================================================================

    /// Transforms every element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let lengths = LazyVector::of(["a", "bb", "ccc"]).map(str::len);
    /// assert_eq!(lengths.to_vec().unwrap(), vec![1, 2, 3]);
    /// ```
    pub fn map<U, F>(&self, f: F) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let mapper: Mapper<T, U> = Arc::new(move |element: T| -> LazyResult<U> { Ok(f(element)) });
        self.restage(|source| Mapped::new(source, mapper))
    }

    /// Transforms every element with a fallible function.
    ///
    /// The first `Err` aborts materialization with [`Fault::Callback`]; no
    /// partial result is published.
    pub fn try_map<U, E, F>(&self, f: F) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
    {
        let mapper: Mapper<T, U> =
            Arc::new(move |element: T| -> LazyResult<U> { f(element).map_err(Fault::callback) });
        self.restage(|source| Mapped::new(source, mapper))
    }

    /// Maps every element to an iterable and flattens the results one level.
    pub fn flat_map<U, I, F>(&self, f: F) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        I: IntoIterator<Item = U>,
        I::IntoIter: 'static,
        F: Fn(T) -> I + Send + Sync + 'static,
    {
        let expander: Expander<T, U> = Arc::new(move |element: T| -> Drain<'static, U> {
            Box::new(f(element).into_iter().map(Ok))
        });
        self.restage(|source| FlatMapped::new(source, expander))
    }

    /// Maps every element to another lazy collection and flattens the results.
    ///
    /// Each inner collection is forced while the outer one is drained; a
    /// fault from an inner collection aborts the outer materialization.
    pub fn flat_map_collection<U, K2, F>(&self, f: F) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        K2: Materialize<U>,
        F: Fn(T) -> LazyCollection<U, K2> + Send + Sync + 'static,
    {
        let expander: Expander<T, U> = Arc::new(move |element: T| -> Drain<'static, U> {
            match f(element).to_vec() {
                Ok(elements) => Box::new(elements.into_iter().map(Ok)),
                Err(fault) => Box::new(iter::once(Err(fault))),
            }
        });
        self.restage(|source| FlatMapped::new(source, expander))
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Keeps the elements `predicate` accepts.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let test: Test<T> = Arc::new(move |element: &T| -> LazyResult<bool> { Ok(predicate(element)) });
        self.derive(Operation::Filter(test))
    }

    /// Keeps the elements a fallible test accepts.
    ///
    /// An `Err` from the test surfaces as [`Fault::Callback`] when forced.
    pub fn try_filter<E, F>(&self, test: F) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: Fn(&T) -> Result<bool, E> + Send + Sync + 'static,
    {
        let test: Test<T> =
            Arc::new(move |element: &T| -> LazyResult<bool> { test(element).map_err(Fault::callback) });
        self.derive(Operation::Filter(test))
    }

    /// Drops the elements `predicate` accepts.
    pub fn filter_not<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter(move |element| !predicate(element))
    }

    /// Keeps elements at positions `from..to`. Bounds past the end are not an error.
    pub fn slice(&self, from: usize, to: usize) -> Self {
        self.derive(Operation::Slice { from, to })
    }

    /// Keeps at most the first `count` elements.
    ///
    /// Draining stops pulling from upstream once `count` elements were kept,
    /// which makes unbounded producers safe to force.
    pub fn take(&self, count: usize) -> Self {
        self.derive(Operation::Take(count))
    }

    /// Skips the first `count` elements.
    pub fn skip(&self, count: usize) -> Self {
        self.derive(Operation::Drop(count))
    }

    /// Keeps the last `count` elements.
    pub fn take_right(&self, count: usize) -> Self {
        self.derive(Operation::TakeRight(count))
    }

    /// Drops the last `count` elements.
    pub fn drop_right(&self, count: usize) -> Self {
        self.derive(Operation::DropRight(count))
    }

    /// Keeps elements up to (not including) the first one `predicate` rejects.
    pub fn take_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<T> = Arc::new(move |element: &T| predicate(element));
        self.derive(Operation::TakeWhile(predicate))
    }

    /// Skips elements up to (not including) the first one `predicate` rejects.
    pub fn drop_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<T> = Arc::new(move |element: &T| predicate(element));
        self.derive(Operation::DropWhile(predicate))
    }

    /// Keeps elements up to (not including) the first one `predicate` accepts.
    pub fn take_until<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.take_while(move |element| !predicate(element))
    }

    /// Skips elements up to (not including) the first one `predicate` accepts.
    pub fn drop_until<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.drop_while(move |element| !predicate(element))
    }

    // =========================================================================
    // Combining
    // =========================================================================

    /// Pairs elements with those of `other`, stopping at the shorter side.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let pairs = LazyVector::of([1, 2, 3]).zip(&LazyVector::of(['a', 'b']));
    /// assert_eq!(pairs.to_vec().unwrap(), vec![(1, 'a'), (2, 'b')]);
    /// ```
    pub fn zip<U, K2>(&self, other: &LazyCollection<U, K2>) -> LazyCollection<(T, U), K>
    where
        U: Element,
        K2: Materialize<U>,
        K: Materialize<(T, U)>,
    {
        self.zip_with(other, |left, right| (left, right))
    }

    /// Combines elements with those of `other`, stopping at the shorter side.
    ///
    /// `other` is pulled before the receiver for every pair, so an operation
    /// on the receiver (such as [`peek`](Self::peek)) only observes elements
    /// that end up paired.
    pub fn zip_with<U, K2, R, F>(&self, other: &LazyCollection<U, K2>, combine: F) -> LazyCollection<R, K>
    where
        U: Element,
        K2: Materialize<U>,
        R: Element,
        K: Materialize<R>,
        F: Fn(T, U) -> R + Send + Sync + 'static,
    {
        let right = other.handle().pipeline();
        let combiner: Combiner<T, U, R> = Arc::new(combine);
        self.restage(|left| Zipped::new(left, right, combiner))
    }

    /// Groups elements with those of two other collections, stopping at the
    /// shortest of the three.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let triples = LazyVector::of([1, 2, 3]).zip3(&LazyVector::of(['a', 'b']), &LazyVector::of([true, false, true]));
    /// assert_eq!(triples.to_vec().unwrap(), vec![(1, 'a', true), (2, 'b', false)]);
    /// ```
    pub fn zip3<U, V, K2, K3>(
        &self,
        second: &LazyCollection<U, K2>,
        third: &LazyCollection<V, K3>,
    ) -> LazyCollection<(T, U, V), K>
    where
        U: Element,
        V: Element,
        K2: Materialize<U>,
        K3: Materialize<V>,
        K: Materialize<(T, U, V)>,
    {
        let pair: Combiner<U, V, (U, V)> = Arc::new(|second: U, third: V| (second, third));
        let right = Pipeline::from_upstream(Zipped::new(second.handle().pipeline(), third.handle().pipeline(), pair));
        let combiner: Combiner<T, (U, V), (T, U, V)> =
            Arc::new(|first: T, (second, third): (U, V)| (first, second, third));
        self.restage(|left| Zipped::new(left, right, combiner))
    }

    /// Pairs elements with those of a plain iterable, stopping at the shorter side.
    ///
    /// The iterable is collected when this is called.
    pub fn zip_collection<U, I>(&self, elements: I) -> LazyCollection<(T, U), K>
    where
        U: Element,
        I: IntoIterator<Item = U>,
        K: Materialize<(T, U)>,
    {
        let right = replay(elements.into_iter().collect::<Vector<U>>());
        let combiner: Combiner<T, U, (T, U)> = Arc::new(|left: T, right: U| (left, right));
        self.restage(|left| Zipped::new(left, right, combiner))
    }

    /// Pairs every element with its position.
    pub fn zip_with_index(&self) -> LazyCollection<(T, usize), K>
    where
        K: Materialize<(T, usize)>,
    {
        self.restage(Indexed::new)
    }

    /// Running fold from the left. The result starts with `seed` and has one
    /// more element than the receiver.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let totals = LazyVector::of([1, 2, 3]).scan_left(0, |total, n| total + n);
    /// assert_eq!(totals.to_vec().unwrap(), vec![0, 1, 3, 6]);
    /// ```
    pub fn scan_left<U, F>(&self, seed: U, step: F) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        F: Fn(&U, T) -> U + Send + Sync + 'static,
    {
        let step: LeftStep<T, U> = Arc::new(move |total: &U, element: T| step(total, element));
        self.restage(|source| Scanned::new(source, seed, step))
    }

    /// Running fold from the right. The result ends with `seed`.
    pub fn scan_right<U, F>(&self, seed: U, step: F) -> LazyCollection<U, K>
    where
        U: Element,
        K: Materialize<U>,
        F: Fn(T, &U) -> U + Send + Sync + 'static,
    {
        let step: RightStep<T, U> = Arc::new(move |element: T, total: &U| step(element, total));
        self.restage(|source| ScannedRight::new(source, seed, step))
    }

    /// Running left fold with the monoid's identity as seed and `combine`
    /// as step.
    pub fn scan_left_monoid(&self) -> Self
    where
        T: Monoid,
    {
        self.scan_left(T::empty(), |total: &T, element: T| total.clone().combine(element))
    }

    /// Running right fold with the monoid's identity as seed and `combine`
    /// as step. The element is the left operand.
    pub fn scan_right_monoid(&self) -> Self
    where
        T: Monoid,
    {
        self.scan_right(T::empty(), |element: T, total: &T| element.combine(total.clone()))
    }

    /// Merges runs of adjacent elements.
    ///
    /// `adjacent` is asked about the value merged so far and the next
    /// element; when it accepts, `merge` folds the element in, otherwise the
    /// merged value is emitted and a new run starts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let runs = LazyVector::of([1, 1, 2, 1]).combine(|current, next| current == next, |current, _| current);
    /// assert_eq!(runs.to_vec().unwrap(), vec![1, 2, 1]);
    /// ```
    pub fn combine<P, F>(&self, adjacent: P, merge: F) -> Self
    where
        P: Fn(&T, &T) -> bool + Send + Sync + 'static,
        F: Fn(T, T) -> T + Send + Sync + 'static,
    {
        let adjacent: Adjacency<T> = Arc::new(move |current: &T, next: &T| adjacent(current, next));
        let merge: Merge<T> = Arc::new(move |current: T, next: T| merge(current, next));
        self.derive(Operation::Combine { adjacent, merge })
    }

    // =========================================================================
    // Reordering
    // =========================================================================

    /// Sorts the elements in ascending order.
    pub fn sorted(&self) -> Self
    where
        T: Ord,
    {
        let sort: Rearrangement<T> = Arc::new(|buffer: &mut Vec<T>| buffer.sort());
        self.derive(Operation::Sort(sort))
    }

    /// Sorts the elements with a comparator. The sort is stable.
    pub fn sorted_by<F>(&self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let sort: Rearrangement<T> = Arc::new(move |buffer: &mut Vec<T>| buffer.sort_by(&compare));
        self.derive(Operation::Sort(sort))
    }

    /// Sorts the elements by an extracted key. The sort is stable.
    pub fn sorted_by_key<Key, F>(&self, key: F) -> Self
    where
        Key: Ord,
        F: Fn(&T) -> Key + Send + Sync + 'static,
    {
        let sort: Rearrangement<T> = Arc::new(move |buffer: &mut Vec<T>| buffer.sort_by_key(&key));
        self.derive(Operation::Sort(sort))
    }

    /// Removes repeated elements, keeping the first occurrence of each.
    pub fn distinct(&self) -> Self
    where
        T: Hash + Eq,
    {
        let distinct: Rearrangement<T> = Arc::new(|buffer: &mut Vec<T>| {
            let mut seen: HashSet<T, DefaultBuildHasher> = HashSet::default();
            buffer.retain(|element| seen.insert(element.clone()));
        });
        self.derive(Operation::Distinct(distinct))
    }

    /// Reverses the order of the elements.
    pub fn reverse(&self) -> Self {
        self.derive(Operation::Reverse)
    }

    /// Shuffles the elements with a fresh random order on every drain.
    pub fn shuffle(&self) -> Self {
        self.derive(Operation::Shuffle(None))
    }

    /// Shuffles the elements deterministically from `seed`.
    pub fn shuffle_seeded(&self, seed: u64) -> Self {
        self.derive(Operation::Shuffle(Some(seed)))
    }

    /// Repeats the whole collection `times` times. Zero times yields an empty collection.
    pub fn cycle(&self, times: usize) -> Self {
        self.derive(Operation::Cycle(times))
    }

    /// Repeats the whole collection for as long as `predicate` accepts the
    /// next element.
    ///
    /// An empty collection stays empty. If `predicate` never rejects an
    /// element of a non-empty collection the result is unbounded and must
    /// be limited with [`take`](Self::take) before forcing.
    pub fn cycle_while<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate: Predicate<T> = Arc::new(move |element: &T| predicate(element));
        self.derive(Operation::CycleWhile(predicate))
    }

    /// Repeats the whole collection until `predicate` accepts the next element.
    pub fn cycle_until<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.cycle_while(move |element| !predicate(element))
    }

    /// Places `separator` between every two adjacent elements.
    pub fn intersperse(&self, separator: T) -> Self {
        self.derive(Operation::Intersperse(separator))
    }

    /// Calls `inspector` on every element as it is drained.
    ///
    /// The inspector runs once per element per materialization of the
    /// resulting collection, however many threads force it.
    pub fn peek<F>(&self, inspector: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let inspector: Inspector<T> = Arc::new(move |element: &T| inspector(element));
        self.derive(Operation::Peek(inspector))
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    /// Splits the elements into consecutive groups of `size`. The last group
    /// may be shorter.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn grouped(&self, size: usize) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
    {
        assert!(size > 0, "group size must be positive");
        self.restage(|source| Windowed::new(source, size, size))
    }

    /// Windows of `size` elements starting every `increment` elements.
    ///
    /// The last window emitted is the first one that reaches the end of the
    /// collection, so a short collection yields one short window.
    ///
    /// # Panics
    ///
    /// Panics if `size` or `increment` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let windows = LazyVector::of([1, 2, 3, 4]).sliding(2, 1);
    /// assert_eq!(
    ///     windows.to_vec().unwrap(),
    ///     vec![im::vector![1, 2], im::vector![2, 3], im::vector![3, 4]]
    /// );
    /// ```
    pub fn sliding(&self, size: usize, increment: usize) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
    {
        assert!(size > 0, "window size must be positive");
        assert!(increment > 0, "window increment must be positive");
        self.restage(|source| Windowed::new(source, size, increment))
    }

    /// Cuts the elements into groups, closing each group after the first
    /// element `predicate` accepts. A trailing open group is kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let groups = LazyVector::range(1, 6).grouped_until(|n| n % 2 == 0);
    /// assert_eq!(
    ///     groups.to_vec().unwrap(),
    ///     vec![im::vector![1, 2], im::vector![3, 4], im::vector![5]]
    /// );
    /// ```
    pub fn grouped_until<F>(&self, predicate: F) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let boundary: Boundary<T> = Arc::new(move |_: &Vector<T>, element: &T| predicate(element));
        self.restage(|source| Batched::new(source, boundary))
    }

    /// Cuts the elements into groups, closing each group after the first
    /// element `predicate` rejects.
    pub fn grouped_while<F>(&self, predicate: F) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.grouped_until(move |element| !predicate(element))
    }

    /// Cuts the elements into groups, closing a group once `predicate`
    /// accepts it. The predicate sees the group including the element just
    /// added, and that element.
    pub fn grouped_statefully_until<F>(&self, predicate: F) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
        F: Fn(&Vector<T>, &T) -> bool + Send + Sync + 'static,
    {
        let boundary: Boundary<T> = Arc::new(move |group: &Vector<T>, element: &T| predicate(group, element));
        self.restage(|source| Batched::new(source, boundary))
    }

    /// Every ordering of the elements, by position, in lexicographic order.
    ///
    /// The receiver is buffered when the drain starts. An empty collection
    /// has no permutations. The result grows factorially; bound it with
    /// [`take`](Self::take) for anything but small inputs.
    pub fn permutations(&self) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
    {
        self.restage(|source| Arranged::new(source, Arrangement::Permutations))
    }

    /// Every selection of `size` elements, keeping their relative order.
    ///
    /// A size of zero yields one empty selection; a size larger than the
    /// collection yields none.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let pairs = LazyVector::of([1, 2, 3]).combinations(2);
    /// assert_eq!(
    ///     pairs.to_vec().unwrap(),
    ///     vec![im::vector![1, 2], im::vector![1, 3], im::vector![2, 3]]
    /// );
    /// ```
    pub fn combinations(&self, size: usize) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
    {
        self.restage(|source| Arranged::new(source, Arrangement::Combinations(size)))
    }

    /// Every selection of every size, from the empty one up to the whole
    /// collection.
    pub fn all_combinations(&self) -> LazyCollection<Vector<T>, K>
    where
        K: Materialize<Vector<T>>,
    {
        self.restage(|source| Arranged::new(source, Arrangement::AllCombinations))
    }

    /// Groups elements by key, in order of each key's first appearance.
    pub fn grouped_by<Key, F>(&self, key: F) -> LazyCollection<(Key, Vector<T>), K>
    where
        Key: Element + Hash + Eq,
        K: Materialize<(Key, Vector<T>)>,
        F: Fn(&T) -> Key + Send + Sync + 'static,
    {
        let key: KeyFunction<T, Key> = Arc::new(move |element: &T| key(element));
        self.restage(|source| GroupedBy::new(source, key))
    }

    // =========================================================================
    // Defaults and lazy updates
    // =========================================================================

    /// Replaces an empty collection with a single `element`.
    pub fn on_empty(&self, element: T) -> Self {
        let fallback: Fallback<T> = Arc::new(move || -> LazyResult<Vec<T>> { Ok(vec![element.clone()]) });
        self.derive(Operation::OnEmpty(fallback))
    }

    /// Replaces an empty collection with a single supplied element.
    ///
    /// The supplier only runs when the collection turns out to be empty.
    pub fn on_empty_get<F>(&self, supplier: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let fallback: Fallback<T> = Arc::new(move || -> LazyResult<Vec<T>> { Ok(vec![supplier()]) });
        self.derive(Operation::OnEmpty(fallback))
    }

    /// Replaces an empty collection with the elements of a supplied one.
    ///
    /// The supplier only runs when the collection turns out to be empty,
    /// and the supplied collection is forced then; its fault aborts this
    /// materialization.
    pub fn on_empty_switch<K2, F>(&self, supplier: F) -> Self
    where
        K2: Materialize<T>,
        F: Fn() -> LazyCollection<T, K2> + Send + Sync + 'static,
    {
        let fallback: Fallback<T> = Arc::new(move || -> LazyResult<Vec<T>> { supplier().to_vec() });
        self.derive(Operation::OnEmpty(fallback))
    }

    /// Fails materialization with [`Fault::Callback`] if the collection
    /// turns out to be empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::{Fault, LazyVector};
    ///
    /// let required = LazyVector::<i32>::empty().on_empty_error(|| "at least one element is required");
    /// assert!(matches!(required.to_vec(), Err(Fault::Callback(_))));
    /// ```
    pub fn on_empty_error<E, F>(&self, error: F) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
        F: Fn() -> E + Send + Sync + 'static,
    {
        let fallback: Fallback<T> = Arc::new(move || -> LazyResult<Vec<T>> { Err(Fault::callback(error())) });
        self.derive(Operation::OnEmpty(fallback))
    }

    /// Appends `element` without forcing.
    pub fn plus_lazy(&self, element: T) -> Self {
        self.derive(Operation::Append(Vector::unit(element)))
    }

    /// Appends every element of `elements` without forcing.
    ///
    /// The iterable is collected when this is called.
    pub fn plus_all_lazy<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.derive(Operation::Append(elements.into_iter().collect()))
    }

    /// Removes the first element equal to `element` without forcing.
    pub fn minus_lazy(&self, element: T) -> Self
    where
        T: PartialEq,
    {
        let matches: Predicate<T> = Arc::new(move |candidate: &T| *candidate == element);
        self.derive(Operation::RemoveFirst(matches))
    }

    /// Removes every element equal to one of `elements` without forcing.
    pub fn remove_all<I>(&self, elements: I) -> Self
    where
        T: PartialEq,
        I: IntoIterator<Item = T>,
    {
        let removed: Vec<T> = elements.into_iter().collect();
        self.filter(move |element| !removed.contains(element))
    }

    /// Keeps only elements equal to one of `elements` without forcing.
    pub fn retain_all<I>(&self, elements: I) -> Self
    where
        T: PartialEq,
        I: IntoIterator<Item = T>,
    {
        let retained: Vec<T> = elements.into_iter().collect();
        self.filter(move |element| retained.contains(element))
    }
}
