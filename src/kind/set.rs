//! The set kinds: `im::HashSet` (unordered) and `im::OrdSet` (sorted).
//!
//! Index-addressed operations address elements in iteration order. For the
//! unordered kind that order is unspecified but stable for a given value.

use std::hash::Hash;

use im::{HashSet, OrdSet};

use super::{BulkBuilder, CollectionKind, Element, Materialize, PersistentCollection};
use crate::error::{Fault, LazyResult};

/// Hasher used by the hash-based kinds ([`SetKind`] and [`BagKind`](super::BagKind)).
///
/// Selected by feature flag: `fxhash` uses `rustc-hash`, `ahash` uses
/// `ahash`, otherwise the standard library's `RandomState`.
#[cfg(feature = "fxhash")]
pub type DefaultBuildHasher = rustc_hash::FxBuildHasher;

/// Hasher used by the hash-based kinds ([`SetKind`] and [`BagKind`](super::BagKind)).
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub type DefaultBuildHasher = ahash::RandomState;

/// Hasher used by the hash-based kinds ([`SetKind`] and [`BagKind`](super::BagKind)).
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub type DefaultBuildHasher = std::collections::hash_map::RandomState;

// =============================================================================
// SetKind
// =============================================================================

/// Descriptor for collections that materialize into an `im::HashSet`.
///
/// Duplicates collapse and iteration order is unspecified. Equality is
/// set equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SetKind;

impl CollectionKind for SetKind {
    const NAME: &'static str = "Set";
}

impl<T: Element + Hash + Eq> Materialize<T> for SetKind {
    type Collection = HashSet<T, DefaultBuildHasher>;
}

fn extend_hash_set<T: Element + Hash + Eq>(
    mut base: HashSet<T, DefaultBuildHasher>,
    elements: &mut dyn Iterator<Item = T>,
) -> HashSet<T, DefaultBuildHasher> {
    base.extend(elements);
    base
}

impl<T: Element + Hash + Eq> PersistentCollection<T> for HashSet<T, DefaultBuildHasher> {
    const ORDER_SENSITIVE: bool = false;

    fn empty() -> Self {
        Self::default()
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn get(&self, index: usize) -> Option<&T> {
        Self::iter(self).nth(index)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(Self::iter(self))
    }

    fn plus(&self, element: T) -> Self {
        self.update(element)
    }

    fn plus_at(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_insertion(index, Self::len(self))?;
        Ok(self.update(element))
    }

    fn minus(&self, element: &T) -> Self {
        self.without(element)
    }

    fn minus_at(&self, index: usize) -> LazyResult<Self> {
        let length = Self::len(self);
        let element = Self::iter(self)
            .nth(index)
            .ok_or(Fault::Index { index, length })?;
        Ok(self.without(element))
    }

    fn with(&self, index: usize, element: T) -> LazyResult<Self> {
        Ok(self.minus_at(index)?.update(element))
    }

    fn bulk_builder() -> Option<BulkBuilder<T, Self>> {
        Some(BulkBuilder::new(extend_hash_set::<T>))
    }
}

// =============================================================================
// OrderedSetKind
// =============================================================================

/// Descriptor for collections that materialize into an `im::OrdSet`.
///
/// Duplicates collapse and elements iterate in ascending order, so
/// `get(0)` is the minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OrderedSetKind;

impl CollectionKind for OrderedSetKind {
    const NAME: &'static str = "OrderedSet";
}

impl<T: Element + Ord> Materialize<T> for OrderedSetKind {
    type Collection = OrdSet<T>;
}

fn extend_ordered_set<T: Element + Ord>(
    mut base: OrdSet<T>,
    elements: &mut dyn Iterator<Item = T>,
) -> OrdSet<T> {
    base.extend(elements);
    base
}

impl<T: Element + Ord> PersistentCollection<T> for OrdSet<T> {
    fn empty() -> Self {
        Self::new()
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn get(&self, index: usize) -> Option<&T> {
        Self::iter(self).nth(index)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(Self::iter(self))
    }

    fn plus(&self, element: T) -> Self {
        self.update(element)
    }

    fn plus_at(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_insertion(index, Self::len(self))?;
        Ok(self.update(element))
    }

    fn minus(&self, element: &T) -> Self {
        self.without(element)
    }

    fn minus_at(&self, index: usize) -> LazyResult<Self> {
        let length = Self::len(self);
        let element = Self::iter(self)
            .nth(index)
            .ok_or(Fault::Index { index, length })?;
        Ok(self.without(element))
    }

    fn with(&self, index: usize, element: T) -> LazyResult<Self> {
        Ok(self.minus_at(index)?.update(element))
    }

    fn bulk_builder() -> Option<BulkBuilder<T, Self>> {
        Some(BulkBuilder::new(extend_ordered_set::<T>))
    }
}
