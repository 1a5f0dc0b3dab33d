//! Standard trait implementations for [`LazyCollection`].
//!
//! `Debug` never forces. `Display`, `PartialEq`, `Hash` and `Serialize`
//! force the collection; since they cannot return a [`Fault`](crate::Fault),
//! a failed materialization surfaces as `fmt::Error`, a panic, or a
//! serializer error respectively.

use std::fmt;
use std::hash::{Hash, Hasher};

use super::LazyCollection;
use crate::kind::{Element, Materialize, PersistentCollection};

impl<T: Element, K: Materialize<T>> Clone for LazyCollection<T, K> {
    fn clone(&self) -> Self {
        Self::from_handle(self.handle().clone())
    }
}

impl<T: Element, K: Materialize<T>> Default for LazyCollection<T, K> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Element, K: Materialize<T>> fmt::Debug for LazyCollection<T, K> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LazyCollection")
            .field("handle", self.handle())
            .finish()
    }
}

impl<T, K> fmt::Display for LazyCollection<T, K>
where
    T: Element + fmt::Display,
    K: Materialize<T>,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elements = self.iter().map_err(|_| fmt::Error)?;
        write!(formatter, "{}[", K::NAME)?;
        let mut first = true;
        for element in elements {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

/// # Panics
///
/// Panics if either side fails to materialize.
impl<T, K> PartialEq for LazyCollection<T, K>
where
    T: Element,
    K: Materialize<T>,
    K::Collection: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self.to_collection(), other.to_collection()) {
            (Ok(left), Ok(right)) => left == right,
            (Err(fault), _) | (_, Err(fault)) => {
                panic!("cannot compare lazy collections: {fault}")
            }
        }
    }
}

impl<T, K> Eq for LazyCollection<T, K>
where
    T: Element,
    K: Materialize<T>,
    K::Collection: Eq,
{
}

/// Hashed kinds hash independently of iteration order, so equal sets and
/// bags hash equally.
///
/// # Panics
///
/// Panics if the collection fails to materialize.
impl<T, K> Hash for LazyCollection<T, K>
where
    T: Element + Hash,
    K: Materialize<T>,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.to_collection() {
            Ok(collection) => collection.hash_contents(state),
            Err(fault) => panic!("cannot hash a lazy collection: {fault}"),
        }
    }
}

impl<T: Element, K: Materialize<T>> FromIterator<T> for LazyCollection<T, K> {
    /// Collects eagerly into a realized collection.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::of(iter)
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T, K> serde::Serialize for LazyCollection<T, K>
where
    T: Element + serde::Serialize,
    K: Materialize<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::{Error, SerializeSeq};
        let collection = self.to_collection().map_err(S::Error::custom)?;
        let mut seq = serializer.serialize_seq(Some(PersistentCollection::len(&collection)))?;
        for element in collection {
            seq.serialize_element(&element)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct LazyCollectionVisitor<T, K> {
    marker: std::marker::PhantomData<fn() -> (T, K)>,
}

#[cfg(feature = "serde")]
impl<T, K> LazyCollectionVisitor<T, K> {
    const fn new() -> Self {
        Self {
            marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, T, K> serde::de::Visitor<'de> for LazyCollectionVisitor<T, K>
where
    T: Element + serde::Deserialize<'de>,
    K: Materialize<T>,
{
    type Value = LazyCollection<T, K>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut collection = K::Collection::empty();
        while let Some(element) = seq.next_element()? {
            collection = collection.plus(element);
        }
        Ok(LazyCollection::from_collection(collection))
    }
}

#[cfg(feature = "serde")]
impl<'de, T, K> serde::Deserialize<'de> for LazyCollection<T, K>
where
    T: Element + serde::Deserialize<'de>,
    K: Materialize<T>,
{
    /// Builds a realized collection.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(LazyCollectionVisitor::new())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Fault;
    use crate::{LazyBag, LazyOrderedSet, LazySet, LazyVector};
    use rstest::rstest;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of<H: Hash>(value: &H) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[rstest]
    #[case(format!("{}", LazyVector::of([1, 2, 3])), "Vector[1, 2, 3]")]
    #[case(format!("{}", LazyVector::<i32>::empty()), "Vector[]")]
    #[case(format!("{}", LazyOrderedSet::of([3, 1, 2])), "OrderedSet[1, 2, 3]")]
    #[case(format!("{}", LazyVector::range(0, 3).reverse()), "Vector[2, 1, 0]")]
    fn display_forces_and_names_the_kind(#[case] rendered: String, #[case] expected: &str) {
        assert_eq!(rendered, expected);
    }

    #[rstest]
    fn display_reports_a_fault_as_a_format_error() {
        let failing = LazyVector::from_try_iterable(vec![Err::<i32, _>("boom")]);
        let mut rendered = String::new();
        assert!(std::fmt::write(&mut rendered, format_args!("{failing}")).is_err());
    }

    #[rstest]
    fn debug_does_not_force() {
        let pending = LazyVector::range(0, 3).map(|n| n + 1);
        let rendered = format!("{pending:?}");

        assert!(rendered.contains("Vector"));
        assert!(!pending.is_materialized());
    }

    #[rstest]
    fn equality_compares_materialized_contents() {
        assert_eq!(LazyVector::range(0, 3), LazyVector::of([0, 1, 2]));
        assert_ne!(LazyVector::range(0, 3), LazyVector::of([2, 1, 0]));
        assert_eq!(LazySet::of([1, 2, 3]), LazySet::of([3, 2, 1]));
        assert_eq!(LazyBag::of([1, 1, 2]), LazyBag::of([1, 2, 1]));
        assert_ne!(LazyBag::of([1, 1, 2]), LazyBag::of([1, 2, 2]));
    }

    #[rstest]
    fn equal_vectors_hash_equally() {
        assert_eq!(hash_of(&LazyVector::range(0, 4)), hash_of(&LazyVector::of([0, 1, 2, 3])));
    }

    #[rstest]
    fn equal_sets_hash_equally_whatever_the_insertion_order() {
        let ascending = LazySet::of(0..64);
        let descending = LazySet::of((0..64).rev());

        assert_eq!(ascending, descending);
        assert_eq!(hash_of(&ascending), hash_of(&descending));
    }

    #[rstest]
    fn equal_bags_hash_equally_whatever_the_insertion_order() {
        let first = LazyBag::of((0..40).chain(0..20));
        let second = LazyBag::of((0..20).rev().chain((0..40).rev()));

        assert_eq!(first, second);
        assert_eq!(hash_of(&first), hash_of(&second));
        assert_ne!(hash_of(&first), hash_of(&LazyBag::of(0..40)));
    }

    #[rstest]
    fn vector_hash_depends_on_order() {
        assert_ne!(hash_of(&LazyVector::of([1, 2])), hash_of(&LazyVector::of([2, 1])));
    }

    #[rstest]
    #[should_panic(expected = "cannot compare lazy collections")]
    fn equality_panics_on_a_fault() {
        let failing = LazyVector::from_try_iterable(vec![Err::<i32, _>(Fault::Drained)]);
        let _ = failing == LazyVector::empty();
    }

    #[rstest]
    fn collect_builds_a_realized_collection() {
        let collected: LazyVector<i32> = (1..=3).collect();
        assert!(collected.is_materialized());
        assert_eq!(collected.to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[rstest]
    fn clones_share_the_materialization() {
        let pending = LazyVector::range(0, 3);
        let shared = pending.clone();

        let _ = pending.len().unwrap();
        assert!(shared.is_materialized());
    }
}
