//! Bulk construction of persistent collections.
//!
//! When a collection kind offers a native bulk constructor (queried through
//! [`PersistentCollection::bulk_builder`]) the elements are appended in one
//! pass. Otherwise they are folded in one at a time with
//! [`PersistentCollection::plus`]. Both paths produce equal collections;
//! only their cost differs.
//!
//! # Examples
//!
//! ```rust
//! use lazy_persistent::bulk;
//! use lazy_persistent::kind::PersistentCollection;
//!
//! let squares: im::Vector<usize> = bulk::plus_loop(PersistentCollection::empty(), 4, |index| index * index);
//! let folded: im::Vector<usize> = bulk::fold_build(PersistentCollection::empty(), (0..4).map(|index| index * index));
//!
//! assert_eq!(squares, folded);
//! ```

use crate::error::LazyResult;
use crate::kind::{Element, PersistentCollection};

/// Appends `elements` to `base`, using the kind's bulk constructor when it has one.
pub fn build<T, C, I>(base: C, elements: I) -> C
where
    T: Element,
    C: PersistentCollection<T>,
    I: IntoIterator<Item = T>,
{
    match C::bulk_builder() {
        Some(builder) => builder.extend(base, &mut elements.into_iter()),
        None => fold_build(base, elements),
    }
}

/// Appends `elements` to `base` one element at a time with `plus`.
///
/// This is the fallback path of [`build`].
pub fn fold_build<T, C, I>(base: C, elements: I) -> C
where
    T: Element,
    C: PersistentCollection<T>,
    I: IntoIterator<Item = T>,
{
    elements
        .into_iter()
        .fold(base, |collection, element| collection.plus(element))
}

/// Builds from a fallible element stream, stopping at the first fault.
///
/// On a fault nothing is returned but the fault itself, so no partially
/// built collection can escape.
///
/// # Errors
///
/// Returns the first fault produced by `elements`.
pub fn try_build<T, C, I>(base: C, elements: I) -> LazyResult<C>
where
    T: Element,
    C: PersistentCollection<T>,
    I: IntoIterator<Item = LazyResult<T>>,
{
    let mut fault = None;
    let shunt = elements.into_iter().map_while(|element| match element {
        Ok(value) => Some(value),
        Err(error) => {
            fault = Some(error);
            None
        }
    });
    let built = build(base, shunt);
    fault.map_or(Ok(built), Err)
}

/// Index-bounded generation: appends `generator(0)` through `generator(max - 1)`.
///
/// The generator runs exactly `max` times.
pub fn plus_loop<T, C, F>(base: C, max: usize, generator: F) -> C
where
    T: Element,
    C: PersistentCollection<T>,
    F: FnMut(usize) -> T,
{
    build(base, (0..max).map(generator))
}

/// Supplier-bounded generation: appends supplied elements until the supplier returns `None`.
pub fn plus_loop_while<T, C, F>(base: C, supplier: F) -> C
where
    T: Element,
    C: PersistentCollection<T>,
    F: FnMut() -> Option<T>,
{
    build(base, std::iter::from_fn(supplier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use crate::kind::{Bag, PersistentQueue};
    use im::Vector;
    use rstest::rstest;

    #[rstest]
    fn plus_loop_runs_generator_exactly_max_times() {
        let mut calls = 0;
        let built: Vector<usize> = plus_loop(Vector::new(), 5, |index| {
            calls += 1;
            index
        });

        assert_eq!(calls, 5);
        assert_eq!(built, (0..5).collect::<Vector<_>>());
    }

    #[rstest]
    fn plus_loop_while_stops_at_first_none() {
        let mut remaining = vec![3, 2, 1];
        let built: PersistentQueue<i32> = plus_loop_while(PersistentQueue::new(), || remaining.pop());
        assert_eq!(built.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[rstest]
    fn try_build_stops_at_first_fault() {
        let mut pulled = 0;
        let elements = [Ok(1), Err(Fault::Drained), Ok(3)].into_iter().inspect(|_| pulled += 1);
        let built: LazyResult<Vector<i32>> = try_build(Vector::new(), elements);

        assert!(matches!(built, Err(Fault::Drained)));
        assert_eq!(pulled, 2);
    }

    #[rstest]
    fn fallback_kind_builds_by_folding() {
        let built: Bag<char> = build(Bag::new(), "abca".chars());
        assert_eq!(built.occurrences(&'a'), 2);
        assert_eq!(built.len(), 4);
    }
}
