//! The vector kind, backed by `im::Vector`.

use im::Vector;

use super::{BulkBuilder, CollectionKind, Element, Materialize, PersistentCollection};
use crate::error::{Fault, LazyResult};

/// Descriptor for collections that materialize into an `im::Vector`.
///
/// Insertion order is preserved and duplicates are kept. Indexed access
/// is O(log n).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VectorKind;

impl CollectionKind for VectorKind {
    const NAME: &'static str = "Vector";
}

impl<T: Element + PartialEq> Materialize<T> for VectorKind {
    type Collection = Vector<T>;
}

fn extend_vector<T: Clone>(mut base: Vector<T>, elements: &mut dyn Iterator<Item = T>) -> Vector<T> {
    base.extend(elements);
    base
}

impl<T: Element + PartialEq> PersistentCollection<T> for Vector<T> {
    fn empty() -> Self {
        Self::new()
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn get(&self, index: usize) -> Option<&T> {
        Self::get(self, index)
    }

    fn contains(&self, element: &T) -> bool {
        Self::contains(self, element)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(Self::iter(self))
    }

    fn plus(&self, element: T) -> Self {
        let mut updated = self.clone();
        updated.push_back(element);
        updated
    }

    fn plus_at(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_insertion(index, Self::len(self))?;
        let mut updated = self.clone();
        updated.insert(index, element);
        Ok(updated)
    }

    fn minus(&self, element: &T) -> Self {
        match self.index_of(element) {
            Some(index) => {
                let mut updated = self.clone();
                updated.remove(index);
                updated
            }
            None => self.clone(),
        }
    }

    fn minus_at(&self, index: usize) -> LazyResult<Self> {
        Fault::check_index(index, Self::len(self))?;
        let mut updated = self.clone();
        updated.remove(index);
        Ok(updated)
    }

    fn with(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_index(index, Self::len(self))?;
        Ok(self.update(index, element))
    }

    fn bulk_builder() -> Option<BulkBuilder<T, Self>> {
        Some(BulkBuilder::new(extend_vector::<T>))
    }
}
