//! Upstream stages: where a pipeline's elements come from.
//!
//! Leaf stages read a realized collection, re-run a generator, or replay a
//! one-shot producer. The remaining stages wrap another [`Pipeline`] and
//! change the element type on the way through.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::iter::{self, Peekable};
use std::marker::PhantomData;
use std::sync::Arc;

use im::Vector;
use parking_lot::Mutex;

use super::{Drain, Pipeline, Upstream, deferred};
use crate::error::{Fault, LazyResult};
use crate::kind::{DefaultBuildHasher, Element, PersistentCollection};

/// A producer iterator that may be moved to whichever thread forces.
pub(crate) type Producer<T> = Box<dyn Iterator<Item = LazyResult<T>> + Send>;

/// Creates a fresh producer for every drain.
pub(crate) type Factory<T> = Arc<dyn Fn() -> Producer<T> + Send + Sync>;

/// Maps one element to another, possibly failing.
pub(crate) type Mapper<S, T> = Arc<dyn Fn(S) -> LazyResult<T> + Send + Sync>;

/// Maps one element to a sequence of elements.
pub(crate) type Expander<S, T> = Arc<dyn Fn(S) -> Drain<'static, T> + Send + Sync>;

/// Combines one element from each side of a zip.
pub(crate) type Combiner<A, B, T> = Arc<dyn Fn(A, B) -> T + Send + Sync>;

/// Folds an element into an accumulator from the left.
pub(crate) type LeftStep<S, T> = Arc<dyn Fn(&T, S) -> T + Send + Sync>;

/// Folds an element into an accumulator from the right.
pub(crate) type RightStep<S, T> = Arc<dyn Fn(S, &T) -> T + Send + Sync>;

/// Extracts a grouping key.
pub(crate) type KeyFunction<S, Key> = Arc<dyn Fn(&S) -> Key + Send + Sync>;

/// Closes the current group once it holds the element just added.
pub(crate) type Boundary<S> = Arc<dyn Fn(&Vector<S>, &S) -> bool + Send + Sync>;

// =============================================================================
// Leaf stages
// =============================================================================

/// Iterates a realized collection. The collection is shared, not copied.
pub(crate) struct Realized<C> {
    collection: C,
}

impl<C> Realized<C> {
    pub(crate) const fn new(collection: C) -> Self {
        Self { collection }
    }
}

impl<T, C> Upstream<T> for Realized<C>
where
    T: Element,
    C: PersistentCollection<T>,
{
    fn open(&self) -> Drain<'_, T> {
        Box::new(self.collection.iter().cloned().map(Ok))
    }

    fn name(&self) -> &'static str {
        "Realized"
    }
}

/// Re-creates its producer on every drain (ranges, generators, unfolds).
pub(crate) struct Replayable<T> {
    factory: Factory<T>,
}

impl<T> Replayable<T> {
    pub(crate) fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Producer<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl<T: Element> Upstream<T> for Replayable<T> {
    fn open(&self) -> Drain<'_, T> {
        (self.factory)()
    }

    fn name(&self) -> &'static str {
        "Replayable"
    }
}

/// Shares a producer that can only be consumed once.
///
/// Every element pulled from the producer is kept in a replay buffer, so a
/// second drain (for example from a handle derived before the first one was
/// forced) sees the same elements. Once the producer has failed, cursors that
/// run past the buffered prefix get [`Fault::Drained`].
pub(crate) struct OneShot<T> {
    state: Mutex<ReplayState<T>>,
}

struct ReplayState<T> {
    producer: Option<Producer<T>>,
    buffer: Vec<T>,
    failed: bool,
}

impl<T> OneShot<T> {
    pub(crate) fn new(producer: Producer<T>) -> Self {
        Self {
            state: Mutex::new(ReplayState {
                producer: Some(producer),
                buffer: Vec::new(),
                failed: false,
            }),
        }
    }
}

impl<T: Element> Upstream<T> for OneShot<T> {
    fn open(&self) -> Drain<'_, T> {
        Box::new(ReplayCursor {
            state: &self.state,
            position: 0,
            finished: false,
        })
    }

    fn name(&self) -> &'static str {
        "OneShot"
    }
}

struct ReplayCursor<'a, T> {
    state: &'a Mutex<ReplayState<T>>,
    position: usize,
    finished: bool,
}

impl<T: Element> Iterator for ReplayCursor<'_, T> {
    type Item = LazyResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let mut state = self.state.lock();
        if let Some(element) = state.buffer.get(self.position) {
            self.position += 1;
            return Some(Ok(element.clone()));
        }
        if state.failed {
            self.finished = true;
            return Some(Err(Fault::Drained));
        }
        let Some(producer) = state.producer.as_mut() else {
            self.finished = true;
            return None;
        };
        match producer.next() {
            Some(Ok(element)) => {
                state.buffer.push(element.clone());
                self.position += 1;
                Some(Ok(element))
            }
            Some(Err(fault)) => {
                tracing::debug!(pulled = state.buffer.len(), error = %fault, "one-shot producer failed");
                state.producer = None;
                state.failed = true;
                self.finished = true;
                Some(Err(fault))
            }
            None => {
                tracing::debug!(pulled = state.buffer.len(), "one-shot producer exhausted");
                state.producer = None;
                self.finished = true;
                None
            }
        }
    }
}

// =============================================================================
// Element-type-changing stages
// =============================================================================

/// Applies a mapper to every element of the wrapped pipeline.
pub(crate) struct Mapped<S: Element, T> {
    source: Pipeline<S>,
    mapper: Mapper<S, T>,
}

impl<S: Element, T> Mapped<S, T> {
    pub(crate) const fn new(source: Pipeline<S>, mapper: Mapper<S, T>) -> Self {
        Self { source, mapper }
    }
}

impl<S: Element, T: Element> Upstream<T> for Mapped<S, T> {
    fn open(&self) -> Drain<'_, T> {
        Box::new(
            self.source
                .stream()
                .map(|element| element.and_then(|value| (self.mapper)(value))),
        )
    }

    fn name(&self) -> &'static str {
        "Map"
    }
}

/// Expands every element and flattens the results one level, in encounter order.
pub(crate) struct FlatMapped<S: Element, T> {
    source: Pipeline<S>,
    expander: Expander<S, T>,
}

impl<S: Element, T> FlatMapped<S, T> {
    pub(crate) const fn new(source: Pipeline<S>, expander: Expander<S, T>) -> Self {
        Self { source, expander }
    }
}

impl<S: Element, T: Element> Upstream<T> for FlatMapped<S, T> {
    fn open(&self) -> Drain<'_, T> {
        Box::new(
            self.source
                .stream()
                .flat_map(|element| -> Drain<'static, T> {
                    match element {
                        Ok(value) => (self.expander)(value),
                        Err(fault) => Box::new(iter::once(Err(fault))),
                    }
                }),
        )
    }

    fn name(&self) -> &'static str {
        "FlatMap"
    }
}

/// Pairs two pipelines element by element, stopping at the shorter one.
///
/// The right side is pulled first, so an operation observing the left side
/// never sees an element past the end of the right side. The right side may
/// be pulled once past the end of the left side.
pub(crate) struct Zipped<A: Element, B: Element, T> {
    left: Pipeline<A>,
    right: Pipeline<B>,
    combiner: Combiner<A, B, T>,
}

impl<A: Element, B: Element, T> Zipped<A, B, T> {
    pub(crate) const fn new(left: Pipeline<A>, right: Pipeline<B>, combiner: Combiner<A, B, T>) -> Self {
        Self { left, right, combiner }
    }
}

impl<A: Element, B: Element, T: Element> Upstream<T> for Zipped<A, B, T> {
    fn open(&self) -> Drain<'_, T> {
        let mut left = self.left.stream();
        let mut right = self.right.stream();
        Box::new(iter::from_fn(move || {
            let paired = right.next()?;
            let element = left.next()?;
            Some(element.and_then(|element| -> LazyResult<T> { Ok((self.combiner)(element, paired?)) }))
        }))
    }

    fn name(&self) -> &'static str {
        "Zip"
    }
}

/// Pairs every element with its position.
pub(crate) struct Indexed<S: Element> {
    source: Pipeline<S>,
}

impl<S: Element> Indexed<S> {
    pub(crate) const fn new(source: Pipeline<S>) -> Self {
        Self { source }
    }
}

impl<S: Element> Upstream<(S, usize)> for Indexed<S> {
    fn open(&self) -> Drain<'_, (S, usize)> {
        Box::new(
            self.source
                .stream()
                .enumerate()
                .map(|(index, element)| element.map(|value| (value, index))),
        )
    }

    fn name(&self) -> &'static str {
        "ZipWithIndex"
    }
}

/// Running left fold. The seed is emitted before any accumulated value.
pub(crate) struct Scanned<S: Element, T> {
    source: Pipeline<S>,
    seed: T,
    step: LeftStep<S, T>,
}

impl<S: Element, T> Scanned<S, T> {
    pub(crate) const fn new(source: Pipeline<S>, seed: T, step: LeftStep<S, T>) -> Self {
        Self { source, seed, step }
    }
}

impl<S: Element, T: Element> Upstream<T> for Scanned<S, T> {
    fn open(&self) -> Drain<'_, T> {
        let mut accumulator = self.seed.clone();
        let folded = self.source.stream().map(move |element| -> LazyResult<T> {
            accumulator = (self.step)(&accumulator, element?);
            Ok(accumulator.clone())
        });
        Box::new(iter::once(Ok(self.seed.clone())).chain(folded))
    }

    fn name(&self) -> &'static str {
        "Scan"
    }
}

/// Running right fold. The seed is emitted last; the full fold comes first.
pub(crate) struct ScannedRight<S: Element, T> {
    source: Pipeline<S>,
    seed: T,
    step: RightStep<S, T>,
}

impl<S: Element, T> ScannedRight<S, T> {
    pub(crate) const fn new(source: Pipeline<S>, seed: T, step: RightStep<S, T>) -> Self {
        Self { source, seed, step }
    }
}

impl<S: Element, T: Element> Upstream<T> for ScannedRight<S, T> {
    fn open(&self) -> Drain<'_, T> {
        deferred(|| {
            let elements = self.source.stream().collect::<LazyResult<Vec<S>>>()?;
            let mut accumulator = self.seed.clone();
            let mut folded = Vec::with_capacity(elements.len() + 1);
            folded.push(accumulator.clone());
            for element in elements.into_iter().rev() {
                accumulator = (self.step)(element, &accumulator);
                folded.push(accumulator.clone());
            }
            folded.reverse();
            Ok(folded)
        })
    }

    fn name(&self) -> &'static str {
        "ScanRight"
    }
}

/// Windows of up to `size` elements starting every `step` elements.
///
/// Windows are produced while the upstream is pulled, so a bounded
/// operation after this stage stops the drain early. Emission stops after
/// the first window that reaches the end of the upstream; that window may
/// be shorter than `size`.
pub(crate) struct Windowed<S: Element> {
    source: Pipeline<S>,
    size: usize,
    step: usize,
}

impl<S: Element> Windowed<S> {
    /// `size` and `step` must be positive; the facade checks both.
    pub(crate) const fn new(source: Pipeline<S>, size: usize, step: usize) -> Self {
        Self { source, size, step }
    }
}

impl<S: Element> Upstream<Vector<S>> for Windowed<S> {
    fn open(&self) -> Drain<'_, Vector<S>> {
        Box::new(Windows {
            upstream: self.source.stream().peekable(),
            window: VecDeque::with_capacity(self.size),
            size: self.size,
            step: self.step,
            pending_skip: 0,
            finished: false,
        })
    }

    fn name(&self) -> &'static str {
        "Window"
    }
}

struct Windows<'a, S> {
    upstream: Peekable<Drain<'a, S>>,
    window: VecDeque<S>,
    size: usize,
    step: usize,
    pending_skip: usize,
    finished: bool,
}

impl<S: Element> Windows<'_, S> {
    fn fail(&mut self, fault: Fault) -> Option<LazyResult<Vector<S>>> {
        self.finished = true;
        Some(Err(fault))
    }
}

impl<S: Element> Iterator for Windows<'_, S> {
    type Item = LazyResult<Vector<S>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        while self.pending_skip > 0 {
            match self.upstream.next() {
                Some(Ok(_)) => self.pending_skip -= 1,
                Some(Err(fault)) => return self.fail(fault),
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
        while self.window.len() < self.size {
            match self.upstream.next() {
                Some(Ok(element)) => self.window.push_back(element),
                Some(Err(fault)) => return self.fail(fault),
                None => break,
            }
        }
        if self.window.is_empty() {
            self.finished = true;
            return None;
        }
        let emitted: Vector<S> = self.window.iter().cloned().collect();
        if self.upstream.peek().is_none() {
            self.finished = true;
        } else if self.step < self.size {
            self.window.drain(..self.step);
        } else {
            self.pending_skip = self.step - self.size;
            self.window.clear();
        }
        Some(Ok(emitted))
    }
}

/// Groups elements by key, in order of each key's first appearance.
pub(crate) struct GroupedBy<S: Element, Key> {
    source: Pipeline<S>,
    key: KeyFunction<S, Key>,
    marker: PhantomData<fn() -> Key>,
}

impl<S: Element, Key> GroupedBy<S, Key> {
    pub(crate) const fn new(source: Pipeline<S>, key: KeyFunction<S, Key>) -> Self {
        Self {
            source,
            key,
            marker: PhantomData,
        }
    }
}

impl<S, Key> Upstream<(Key, Vector<S>)> for GroupedBy<S, Key>
where
    S: Element,
    Key: Element + Hash + Eq,
{
    fn open(&self) -> Drain<'_, (Key, Vector<S>)> {
        deferred(|| {
            let mut positions: HashMap<Key, usize, DefaultBuildHasher> = HashMap::default();
            let mut groups: Vec<(Key, Vector<S>)> = Vec::new();
            for element in self.source.stream() {
                let element = element?;
                let key = (self.key)(&element);
                match positions.get(&key) {
                    Some(&position) => groups[position].1.push_back(element),
                    None => {
                        positions.insert(key.clone(), groups.len());
                        groups.push((key, Vector::unit(element)));
                    }
                }
            }
            Ok(groups)
        })
    }

    fn name(&self) -> &'static str {
        "GroupBy"
    }
}

/// Cuts the sequence into consecutive groups.
///
/// Every element joins the open group, then the boundary decides whether
/// that group is complete. A trailing incomplete group is emitted at the end.
/// Groups are produced while the upstream is pulled.
pub(crate) struct Batched<S: Element> {
    source: Pipeline<S>,
    boundary: Boundary<S>,
}

impl<S: Element> Batched<S> {
    pub(crate) const fn new(source: Pipeline<S>, boundary: Boundary<S>) -> Self {
        Self { source, boundary }
    }
}

impl<S: Element> Upstream<Vector<S>> for Batched<S> {
    fn open(&self) -> Drain<'_, Vector<S>> {
        let mut upstream = self.source.stream();
        let mut group = Vector::new();
        let mut finished = false;
        Box::new(iter::from_fn(move || {
            while !finished {
                match upstream.next() {
                    Some(Ok(element)) => {
                        group.push_back(element.clone());
                        if (self.boundary)(&group, &element) {
                            return Some(Ok(std::mem::take(&mut group)));
                        }
                    }
                    Some(Err(fault)) => {
                        finished = true;
                        return Some(Err(fault));
                    }
                    None => {
                        finished = true;
                        if !group.is_empty() {
                            return Some(Ok(std::mem::take(&mut group)));
                        }
                    }
                }
            }
            None
        }))
    }

    fn name(&self) -> &'static str {
        "GroupUntil"
    }
}

/// Which arrangements of the buffered elements to enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arrangement {
    /// Every ordering of all elements.
    Permutations,
    /// Every selection of exactly this many elements, in positional order.
    Combinations(usize),
    /// Every selection of every size, smallest first.
    AllCombinations,
}

/// Enumerates arrangements of the upstream's elements by position.
///
/// The upstream is buffered when the drain starts; arrangements are then
/// produced one at a time in lexicographic order of positions. Equal
/// elements at different positions count as distinct.
pub(crate) struct Arranged<S: Element> {
    source: Pipeline<S>,
    arrangement: Arrangement,
}

impl<S: Element> Arranged<S> {
    pub(crate) const fn new(source: Pipeline<S>, arrangement: Arrangement) -> Self {
        Self { source, arrangement }
    }
}

impl<S: Element> Upstream<Vector<S>> for Arranged<S> {
    fn open(&self) -> Drain<'_, Vector<S>> {
        let arrangement = self.arrangement;
        Box::new(
            iter::once_with(|| self.source.stream().collect::<LazyResult<Vector<S>>>()).flat_map(
                move |elements| -> Drain<'static, Vector<S>> {
                    match elements {
                        Ok(elements) => arrangements(elements, arrangement),
                        Err(fault) => Box::new(iter::once(Err(fault))),
                    }
                },
            ),
        )
    }

    fn name(&self) -> &'static str {
        match self.arrangement {
            Arrangement::Permutations => "Permutations",
            Arrangement::Combinations(_) | Arrangement::AllCombinations => "Combinations",
        }
    }
}

fn arrangements<S: Element>(elements: Vector<S>, arrangement: Arrangement) -> Drain<'static, Vector<S>> {
    match arrangement {
        Arrangement::Permutations if elements.is_empty() => Box::new(iter::empty()),
        Arrangement::Permutations => {
            let first: Vec<usize> = (0..elements.len()).collect();
            Box::new(
                iter::successors(Some(first), |current| next_permutation(current))
                    .map(move |positions| Ok(pick(&elements, &positions))),
            )
        }
        Arrangement::Combinations(size) => combinations_of(elements, size),
        Arrangement::AllCombinations => {
            let count = elements.len();
            Box::new((0..=count).flat_map(move |size| combinations_of(elements.clone(), size)))
        }
    }
}

fn combinations_of<S: Element>(elements: Vector<S>, size: usize) -> Drain<'static, Vector<S>> {
    let count = elements.len();
    if size > count {
        return Box::new(iter::empty());
    }
    let first: Vec<usize> = (0..size).collect();
    Box::new(
        iter::successors(Some(first), move |current| next_combination(current, count))
            .map(move |positions| Ok(pick(&elements, &positions))),
    )
}

fn pick<S: Element>(elements: &Vector<S>, positions: &[usize]) -> Vector<S> {
    positions.iter().map(|&position| elements[position].clone()).collect()
}

// Next ordering in lexicographic order, or `None` after the last one.
fn next_permutation(current: &[usize]) -> Option<Vec<usize>> {
    let pivot = current.windows(2).rposition(|pair| pair[0] < pair[1])?;
    let mut next = current.to_vec();
    let successor = next.iter().rposition(|&position| position > next[pivot])?;
    next.swap(pivot, successor);
    next[pivot + 1..].reverse();
    Some(next)
}

// Next ascending selection of `current.len()` positions out of `count`.
fn next_combination(current: &[usize], count: usize) -> Option<Vec<usize>> {
    let size = current.len();
    let slot = (0..size).rev().find(|&slot| current[slot] < count - size + slot)?;
    let mut next = current.to_vec();
    next[slot] += 1;
    for following in slot + 1..size {
        next[following] = next[following - 1] + 1;
    }
    Some(next)
}
