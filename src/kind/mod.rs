//! Concrete persistent collection kinds and the adapter they share.
//!
//! A lazy collection materializes into exactly one concrete persistent
//! structure. Which one is chosen by a zero-sized kind marker (the
//! collection's descriptor):
//!
//! - [`VectorKind`]: `im::Vector`, ordered, duplicates allowed
//! - [`QueueKind`]: [`PersistentQueue`], FIFO, duplicates allowed
//! - [`SetKind`]: `im::HashSet`, unordered, unique
//! - [`OrderedSetKind`]: `im::OrdSet`, sorted, unique
//! - [`BagKind`]: [`Bag`], unordered multiset
//!
//! Every kind exposes the same capability set through
//! [`PersistentCollection`]; the engine never inspects which kind it is
//! talking to.
//!
//! # Examples
//!
//! ```rust
//! use lazy_persistent::kind::PersistentCollection;
//!
//! let vector: im::Vector<i32> = PersistentCollection::empty();
//! let updated = vector.plus(1).plus(2);
//!
//! assert_eq!(PersistentCollection::len(&vector), 0); // Original unchanged
//! assert_eq!(PersistentCollection::len(&updated), 2);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::LazyResult;

mod bag;
mod queue;
mod set;
mod vector;

pub use bag::{Bag, BagKind};
pub use queue::{PersistentQueue, QueueKind};
pub use set::{DefaultBuildHasher, OrderedSetKind, SetKind};
pub use vector::VectorKind;

/// Values that can flow through a lazy pipeline.
///
/// Elements are cloned out of realized structures and may be produced on
/// whichever thread forces the collection.
pub trait Element: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Element for T {}

// =============================================================================
// Bulk Builder
// =============================================================================

/// A specialized bulk constructor offered by a collection kind.
///
/// Returned from [`PersistentCollection::bulk_builder`]. Kinds without one
/// are built by folding [`PersistentCollection::plus`].
pub struct BulkBuilder<T, C> {
    extend: fn(C, &mut dyn Iterator<Item = T>) -> C,
}

impl<T, C> BulkBuilder<T, C> {
    /// Wraps a function that appends every element of an iterator to a base collection.
    pub const fn new(extend: fn(C, &mut dyn Iterator<Item = T>) -> C) -> Self {
        Self { extend }
    }

    /// Appends `elements` to `base` in one pass.
    pub fn extend(&self, base: C, elements: &mut dyn Iterator<Item = T>) -> C {
        (self.extend)(base, elements)
    }
}

impl<T, C> Clone for BulkBuilder<T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C> Copy for BulkBuilder<T, C> {}

impl<T, C> fmt::Debug for BulkBuilder<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("BulkBuilder")
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// The capability set every concrete persistent collection kind provides.
///
/// All update operations return a new collection and leave the receiver
/// untouched. Index-addressed operations on unordered kinds address
/// elements in iteration order.
pub trait PersistentCollection<T: Element>:
    Clone + IntoIterator<Item = T> + Send + Sync + 'static
{
    /// Whether iteration order is part of the collection's value.
    ///
    /// `false` for hashed kinds, where equal collections may iterate in
    /// different orders.
    const ORDER_SENSITIVE: bool = true;

    /// Creates an empty collection.
    fn empty() -> Self;

    /// Returns the number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if the collection holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index`, or `None` when out of range.
    fn get(&self, index: usize) -> Option<&T>;

    /// Returns `true` if an element equal to `element` is present.
    fn contains(&self, element: &T) -> bool;

    /// Returns an iterator over references to the elements.
    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_>;

    /// Returns a new collection with `element` added.
    #[must_use]
    fn plus(&self, element: T) -> Self;

    /// Returns a new collection with `element` inserted at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`](crate::Fault::Index) when `index > len`.
    fn plus_at(&self, index: usize, element: T) -> LazyResult<Self>;

    /// Returns a new collection with one occurrence of `element` removed.
    #[must_use]
    fn minus(&self, element: &T) -> Self;

    /// Returns a new collection without the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`](crate::Fault::Index) when `index >= len`.
    fn minus_at(&self, index: usize) -> LazyResult<Self>;

    /// Returns a new collection with the element at `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`](crate::Fault::Index) when `index >= len`.
    fn with(&self, index: usize, element: T) -> LazyResult<Self>;

    /// Returns a new collection with every element of `elements` added.
    #[must_use]
    fn plus_all<I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        crate::bulk::build(self.clone(), elements)
    }

    /// Returns a new collection with one occurrence of each of `elements` removed.
    #[must_use]
    fn minus_all<'a, I>(&self, elements: I) -> Self
    where
        I: IntoIterator<Item = &'a T>,
    {
        elements
            .into_iter()
            .fold(self.clone(), |collection, element| collection.minus(element))
    }

    /// Feeds the collection's value into `state`, consistently with its equality.
    ///
    /// Order-sensitive kinds hash their elements in sequence. The others
    /// hash every element on its own and combine the results with a
    /// wrapping sum, so iteration order does not matter.
    fn hash_contents<H: Hasher>(&self, state: &mut H)
    where
        T: Hash,
    {
        state.write_usize(self.len());
        if Self::ORDER_SENSITIVE {
            for element in self.iter() {
                element.hash(state);
            }
        } else {
            let combined = self
                .iter()
                .map(|element| {
                    let mut hasher = DefaultHasher::new();
                    element.hash(&mut hasher);
                    hasher.finish()
                })
                .fold(0_u64, u64::wrapping_add);
            state.write_u64(combined);
        }
    }

    /// Queries the kind's native bulk constructor, if it has one.
    fn bulk_builder() -> Option<BulkBuilder<T, Self>> {
        None
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// A zero-sized marker naming a concrete collection kind.
pub trait CollectionKind: Copy + Default + Send + Sync + fmt::Debug + 'static {
    /// The name used in textual output, as in `Vector[1, 2, 3]`.
    const NAME: &'static str;
}

/// Binds a collection kind to the concrete structure it builds for elements of type `T`.
///
/// Kinds with stronger element requirements (hashing, ordering) implement
/// this only for the element types that satisfy them.
pub trait Materialize<T: Element>: CollectionKind {
    /// The persistent structure a collection of this kind materializes into.
    type Collection: PersistentCollection<T>;
}
