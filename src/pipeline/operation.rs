//! Element-type-preserving pipeline operations.

use std::fmt;
use std::iter;
use std::sync::Arc;

use im::Vector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::{Drain, deferred};
use crate::error::LazyResult;
use crate::kind::Element;

/// A fallible element test. `Ok(true)` keeps the element.
pub type Test<T> = Arc<dyn Fn(&T) -> LazyResult<bool> + Send + Sync>;

/// An infallible element predicate.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A side-effecting observer of elements.
pub type Inspector<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// An in-place rearrangement of a fully buffered sequence.
pub type Rearrangement<T> = Arc<dyn Fn(&mut Vec<T>) + Send + Sync>;

/// Supplies replacement elements for an empty sequence, or the fault to
/// raise instead.
pub type Fallback<T> = Arc<dyn Fn() -> LazyResult<Vec<T>> + Send + Sync>;

/// Decides whether two adjacent elements should be merged.
pub type Adjacency<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Merges two adjacent elements into one.
pub type Merge<T> = Arc<dyn Fn(T, T) -> T + Send + Sync>;

/// One deferred step of a [`Pipeline`](super::Pipeline).
///
/// Variants marked *buffering* need the complete upstream before they can
/// emit anything. They still wait until the drain starts.
#[derive(Clone)]
pub enum Operation<T> {
    /// Keeps the elements the test accepts.
    Filter(Test<T>),
    /// Keeps elements at positions `from..to`.
    Slice {
        /// First position kept.
        from: usize,
        /// First position dropped after `from`.
        to: usize,
    },
    /// Keeps the first `n` elements and stops pulling afterwards.
    Take(usize),
    /// Skips the first `n` elements.
    Drop(usize),
    /// Skips the first element the predicate accepts.
    RemoveFirst(Predicate<T>),
    /// Keeps elements until the predicate first fails.
    TakeWhile(Predicate<T>),
    /// Skips elements until the predicate first fails.
    DropWhile(Predicate<T>),
    /// Keeps the last `n` elements (buffering).
    TakeRight(usize),
    /// Drops the last `n` elements (buffering).
    DropRight(usize),
    /// Sorts the sequence (buffering).
    Sort(Rearrangement<T>),
    /// Removes repeated elements, keeping first occurrences (buffering).
    Distinct(Rearrangement<T>),
    /// Observes every element as it passes.
    Peek(Inspector<T>),
    /// Reverses the sequence (buffering).
    Reverse,
    /// Shuffles the sequence, deterministically when seeded (buffering).
    Shuffle(Option<u64>),
    /// Repeats the whole sequence the given number of times (buffering).
    Cycle(usize),
    /// Repeats the whole sequence for as long as the predicate holds (buffering).
    ///
    /// A predicate that never fails on a non-empty sequence makes the
    /// result unbounded.
    CycleWhile(Predicate<T>),
    /// Merges runs of adjacent elements the test accepts.
    Combine {
        /// Tests the current merged value against the next element.
        adjacent: Adjacency<T>,
        /// Folds the next element into the current merged value.
        merge: Merge<T>,
    },
    /// Places the separator between adjacent elements.
    Intersperse(T),
    /// Appends elements after the upstream is exhausted.
    Append(Vector<T>),
    /// Replaces an empty sequence with the fallback's elements.
    OnEmpty(Fallback<T>),
}

impl<T: Element> Operation<T> {
    /// Returns the variant name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Filter(_) => "Filter",
            Self::Slice { .. } => "Slice",
            Self::Take(_) => "Take",
            Self::Drop(_) => "Drop",
            Self::RemoveFirst(_) => "RemoveFirst",
            Self::TakeWhile(_) => "TakeWhile",
            Self::DropWhile(_) => "DropWhile",
            Self::TakeRight(_) => "TakeRight",
            Self::DropRight(_) => "DropRight",
            Self::Sort(_) => "Sort",
            Self::Distinct(_) => "Distinct",
            Self::Peek(_) => "Peek",
            Self::Reverse => "Reverse",
            Self::Shuffle(_) => "Shuffle",
            Self::Cycle(_) => "Cycle",
            Self::CycleWhile(_) => "CycleWhile",
            Self::Combine { .. } => "Combine",
            Self::Intersperse(_) => "Intersperse",
            Self::Append(_) => "Append",
            Self::OnEmpty(_) => "OnEmpty",
        }
    }

    /// Chains this operation over `upstream`.
    pub(crate) fn apply<'a>(&'a self, upstream: Drain<'a, T>) -> Drain<'a, T> {
        match self {
            Self::Filter(test) => Box::new(upstream.filter_map(move |element| match element {
                Ok(value) => match test(&value) {
                    Ok(true) => Some(Ok(value)),
                    Ok(false) => None,
                    Err(fault) => Some(Err(fault)),
                },
                Err(fault) => Some(Err(fault)),
            })),
            Self::Slice { from, to } => take_ok(skip_ok(upstream, *from), to.saturating_sub(*from)),
            Self::Take(count) => take_ok(upstream, *count),
            Self::Drop(count) => skip_ok(upstream, *count),
            Self::RemoveFirst(predicate) => {
                let mut removed = false;
                Box::new(upstream.filter(move |element| match element {
                    Ok(value) if !removed && predicate(value) => {
                        removed = true;
                        false
                    }
                    _ => true,
                }))
            }
            Self::TakeWhile(predicate) => Box::new(
                upstream.take_while(move |element| element.as_ref().map_or(true, |value| predicate(value))),
            ),
            Self::DropWhile(predicate) => Box::new(
                upstream.skip_while(move |element| element.as_ref().is_ok_and(|value| predicate(value))),
            ),
            Self::TakeRight(count) => {
                let count = *count;
                buffered(upstream, move |buffer| {
                    let excess = buffer.len().saturating_sub(count);
                    buffer.drain(..excess);
                })
            }
            Self::DropRight(count) => {
                let count = *count;
                buffered(upstream, move |buffer| {
                    buffer.truncate(buffer.len().saturating_sub(count));
                })
            }
            Self::Sort(rearrangement) | Self::Distinct(rearrangement) => {
                buffered(upstream, move |buffer| rearrangement(buffer))
            }
            Self::Peek(inspector) => Box::new(upstream.inspect(move |element| {
                if let Ok(value) = element {
                    inspector(value);
                }
            })),
            Self::Reverse => buffered(upstream, |buffer| buffer.reverse()),
            Self::Shuffle(seed) => {
                let seed = *seed;
                buffered(upstream, move |buffer| {
                    let mut random = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
                    buffer.shuffle(&mut random);
                })
            }
            Self::Cycle(times) => {
                let times = *times;
                buffered(upstream, move |buffer| {
                    let once = std::mem::take(buffer);
                    *buffer = iter::repeat_n(once, times).flatten().collect();
                })
            }
            Self::CycleWhile(predicate) => {
                let buffer = iter::once_with(move || upstream.collect::<LazyResult<Vec<T>>>());
                Box::new(buffer.flat_map(move |buffer| -> Drain<'a, T> {
                    match buffer {
                        Ok(once) => Box::new(
                            once.into_iter()
                                .cycle()
                                .take_while(move |element| predicate(element))
                                .map(Ok),
                        ),
                        Err(fault) => Box::new(iter::once(Err(fault))),
                    }
                }))
            }
            Self::Combine { adjacent, merge } => Box::new(Merging {
                upstream,
                adjacent,
                merge,
                pending: None,
            }),
            Self::Intersperse(separator) => {
                let mut first = true;
                Box::new(upstream.flat_map(move |element| {
                    let lead = if first { None } else { Some(Ok(separator.clone())) };
                    first = false;
                    lead.into_iter().chain(iter::once(element))
                }))
            }
            Self::Append(elements) => Box::new(upstream.chain(elements.iter().cloned().map(Ok))),
            Self::OnEmpty(fallback) => Box::new(OrElse {
                upstream,
                fallback: Some(fallback),
                replacement: None,
            }),
        }
    }
}

impl<T: Clone> fmt::Debug for Operation<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice { from, to } => write!(formatter, "Slice({from}..{to})"),
            Self::Take(count) => write!(formatter, "Take({count})"),
            Self::Drop(count) => write!(formatter, "Drop({count})"),
            Self::TakeRight(count) => write!(formatter, "TakeRight({count})"),
            Self::DropRight(count) => write!(formatter, "DropRight({count})"),
            Self::Shuffle(seed) => write!(formatter, "Shuffle({seed:?})"),
            Self::Cycle(times) => write!(formatter, "Cycle({times})"),
            Self::Append(elements) => write!(formatter, "Append({} elements)", elements.len()),
            Self::Filter(_) => formatter.write_str("Filter"),
            Self::RemoveFirst(_) => formatter.write_str("RemoveFirst"),
            Self::TakeWhile(_) => formatter.write_str("TakeWhile"),
            Self::DropWhile(_) => formatter.write_str("DropWhile"),
            Self::Sort(_) => formatter.write_str("Sort"),
            Self::Distinct(_) => formatter.write_str("Distinct"),
            Self::Peek(_) => formatter.write_str("Peek"),
            Self::Reverse => formatter.write_str("Reverse"),
            Self::Intersperse(_) => formatter.write_str("Intersperse"),
            Self::CycleWhile(_) => formatter.write_str("CycleWhile"),
            Self::Combine { .. } => formatter.write_str("Combine"),
            Self::OnEmpty(_) => formatter.write_str("OnEmpty"),
        }
    }
}

// Take and Drop count successful elements only, so a fault is never
// swallowed and nothing past the bound is pulled from upstream.
fn take_ok<T: Element>(mut upstream: Drain<'_, T>, count: usize) -> Drain<'_, T> {
    let mut remaining = count;
    Box::new(iter::from_fn(move || {
        if remaining == 0 {
            return None;
        }
        let element = upstream.next()?;
        if element.is_ok() {
            remaining -= 1;
        }
        Some(element)
    }))
}

fn skip_ok<T: Element>(upstream: Drain<'_, T>, count: usize) -> Drain<'_, T> {
    let mut remaining = count;
    Box::new(upstream.filter(move |element| {
        if remaining > 0 && element.is_ok() {
            remaining -= 1;
            false
        } else {
            true
        }
    }))
}

fn buffered<'a, T, F>(upstream: Drain<'a, T>, rearrange: F) -> Drain<'a, T>
where
    T: Element,
    F: FnOnce(&mut Vec<T>) + 'a,
{
    deferred(move || {
        let mut buffer = upstream.collect::<LazyResult<Vec<T>>>()?;
        rearrange(&mut buffer);
        Ok(buffer)
    })
}

struct OrElse<'a, T> {
    upstream: Drain<'a, T>,
    fallback: Option<&'a Fallback<T>>,
    replacement: Option<std::vec::IntoIter<T>>,
}

impl<T> Iterator for OrElse<'_, T> {
    type Item = LazyResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(replacement) = self.replacement.as_mut() {
            return replacement.next().map(Ok);
        }
        match self.upstream.next() {
            Some(element) => {
                self.fallback = None;
                Some(element)
            }
            None => {
                let fallback = self.fallback.take()?;
                match fallback() {
                    Ok(elements) => self.replacement.insert(elements.into_iter()).next().map(Ok),
                    Err(fault) => {
                        self.replacement = Some(Vec::new().into_iter());
                        Some(Err(fault))
                    }
                }
            }
        }
    }
}

// Holds the merged run until an element arrives that does not belong to it.
struct Merging<'a, T> {
    upstream: Drain<'a, T>,
    adjacent: &'a Adjacency<T>,
    merge: &'a Merge<T>,
    pending: Option<T>,
}

impl<T> Iterator for Merging<'_, T> {
    type Item = LazyResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.upstream.next() {
                Some(Ok(element)) => match self.pending.take() {
                    None => self.pending = Some(element),
                    Some(current) if (self.adjacent)(&current, &element) => {
                        self.pending = Some((self.merge)(current, element));
                    }
                    Some(current) => {
                        self.pending = Some(element);
                        return Some(Ok(current));
                    }
                },
                Some(Err(fault)) => return Some(Err(fault)),
                None => return self.pending.take().map(Ok),
            }
        }
    }
}
