//! The bag kind: a persistent multiset.

use std::fmt;
use std::hash::Hash;
use std::iter;

use im::HashMap;

use super::{CollectionKind, DefaultBuildHasher, Element, Materialize, PersistentCollection};
use crate::error::{Fault, LazyResult};

/// Descriptor for collections that materialize into a [`Bag`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BagKind;

impl CollectionKind for BagKind {
    const NAME: &'static str = "Bag";
}

impl<T: Element + Hash + Eq> Materialize<T> for BagKind {
    type Collection = Bag<T>;
}

/// A persistent multiset.
///
/// Elements are stored with their multiplicity. Iteration visits each
/// distinct element once per occurrence, in unspecified order. Two bags
/// are equal when every element occurs the same number of times in both.
///
/// # Examples
///
/// ```rust
/// use lazy_persistent::kind::Bag;
///
/// let bag = Bag::new().insert("a").insert("b").insert("a");
/// assert_eq!(bag.len(), 3);
/// assert_eq!(bag.occurrences(&"a"), 2);
///
/// let removed = bag.remove_one(&"a");
/// assert_eq!(removed.occurrences(&"a"), 1);
/// assert_eq!(bag.occurrences(&"a"), 2); // Original unchanged
/// ```
#[derive(Clone)]
pub struct Bag<T: Clone> {
    counts: HashMap<T, usize, DefaultBuildHasher>,
    length: usize,
}

impl<T: Clone + Hash + Eq> Bag<T> {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self {
            counts: HashMap::default(),
            length: 0,
        }
    }

    /// Returns the total number of elements, counting duplicates.
    #[inline]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the bag holds no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of distinct elements.
    pub fn distinct_len(&self) -> usize {
        self.counts.len()
    }

    /// Returns how many times `element` occurs.
    pub fn occurrences(&self, element: &T) -> usize {
        self.counts.get(element).copied().unwrap_or(0)
    }

    /// Returns a new bag with one more occurrence of `element`.
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        let count = self.occurrences(&element);
        Self {
            counts: self.counts.update(element, count + 1),
            length: self.length + 1,
        }
    }

    /// Returns a new bag with one occurrence of `element` removed.
    #[must_use]
    pub fn remove_one(&self, element: &T) -> Self {
        match self.occurrences(element) {
            0 => self.clone(),
            1 => Self {
                counts: self.counts.without(element),
                length: self.length - 1,
            },
            count => Self {
                counts: self.counts.update(element.clone(), count - 1),
                length: self.length - 1,
            },
        }
    }

    /// Iterates every occurrence of every element.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.counts
            .iter()
            .flat_map(|(element, count)| iter::repeat_n(element, *count))
    }
}

impl<T: Clone + Hash + Eq> Default for Bag<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Hash + Eq> PartialEq for Bag<T> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length
            && self.counts.len() == other.counts.len()
            && self
                .counts
                .iter()
                .all(|(element, count)| other.occurrences(element) == *count)
    }
}

impl<T: Clone + Hash + Eq> Eq for Bag<T> {}

impl<T: Clone + Hash + Eq + fmt::Debug> fmt::Debug for Bag<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.counts.iter()).finish()
    }
}

impl<T: Clone + Hash + Eq> FromIterator<T> for Bag<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |bag, element| bag.insert(element))
    }
}

impl<T: Element + Hash + Eq> IntoIterator for Bag<T> {
    type Item = T;
    type IntoIter = Box<dyn Iterator<Item = T>>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(
            self.counts
                .into_iter()
                .flat_map(|(element, count)| iter::repeat_n(element, count)),
        )
    }
}

impl<T: Element + Hash + Eq> PersistentCollection<T> for Bag<T> {
    const ORDER_SENSITIVE: bool = false;

    fn empty() -> Self {
        Self::new()
    }

    fn len(&self) -> usize {
        self.length
    }

    fn get(&self, index: usize) -> Option<&T> {
        Self::iter(self).nth(index)
    }

    fn contains(&self, element: &T) -> bool {
        self.counts.contains_key(element)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(Self::iter(self))
    }

    fn plus(&self, element: T) -> Self {
        self.insert(element)
    }

    fn plus_at(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_insertion(index, self.length)?;
        Ok(self.insert(element))
    }

    fn minus(&self, element: &T) -> Self {
        self.remove_one(element)
    }

    fn minus_at(&self, index: usize) -> LazyResult<Self> {
        let length = self.length;
        let element = Self::iter(self)
            .nth(index)
            .ok_or(Fault::Index { index, length })?;
        Ok(self.remove_one(element))
    }

    fn with(&self, index: usize, element: T) -> LazyResult<Self> {
        Ok(self.minus_at(index)?.insert(element))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn bag_equality_ignores_insertion_order() {
        let left: Bag<i32> = [1, 2, 2, 3].into_iter().collect();
        let right: Bag<i32> = [2, 3, 2, 1].into_iter().collect();
        let fewer: Bag<i32> = [1, 2, 3].into_iter().collect();

        assert_eq!(left, right);
        assert_ne!(left, fewer);
    }

    #[rstest]
    fn remove_one_keeps_other_occurrences() {
        let bag: Bag<i32> = [7, 7, 7].into_iter().collect();
        let removed = bag.remove_one(&7).remove_one(&7);

        assert_eq!(removed.occurrences(&7), 1);
        assert_eq!(removed.len(), 1);
        assert_eq!(bag.remove_one(&8), bag);
    }

    #[rstest]
    fn into_iter_repeats_each_occurrence() {
        let bag: Bag<&str> = ["x", "y", "x"].into_iter().collect();
        let mut elements: Vec<_> = bag.into_iter().collect();
        elements.sort_unstable();
        assert_eq!(elements, vec!["x", "x", "y"]);
    }

    #[rstest]
    fn minus_at_out_of_range_is_an_index_fault() {
        let bag: Bag<i32> = [1].into_iter().collect();
        assert!(matches!(
            bag.minus_at(1),
            Err(Fault::Index { index: 1, length: 1 })
        ));
    }
}
