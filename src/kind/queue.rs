//! The queue kind: a persistent FIFO queue.

use im::Vector;
use im::vector::ConsumingIter;

use super::{CollectionKind, Element, Materialize, PersistentCollection};
use crate::error::{Fault, LazyResult};

/// Descriptor for collections that materialize into a [`PersistentQueue`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QueueKind;

impl CollectionKind for QueueKind {
    const NAME: &'static str = "Queue";
}

impl<T: Element + PartialEq> Materialize<T> for QueueKind {
    type Collection = PersistentQueue<T>;
}

/// A persistent first-in first-out queue.
///
/// Elements are enqueued at the back and dequeued from the front. Index 0
/// is the front of the queue.
///
/// The queue has no native bulk constructor, so lazy collections of this
/// kind are materialized by enqueueing one element at a time.
///
/// # Examples
///
/// ```rust
/// use lazy_persistent::kind::PersistentQueue;
///
/// let queue = PersistentQueue::new().enqueue(1).enqueue(2);
/// let (front, rest) = queue.dequeue().unwrap();
///
/// assert_eq!(front, 1);
/// assert_eq!(rest.len(), 1);
/// assert_eq!(queue.len(), 2); // Original unchanged
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersistentQueue<T: Clone> {
    elements: Vector<T>,
}

impl<T: Clone> PersistentQueue<T> {
    /// Creates an empty queue.
    #[inline]
    pub fn new() -> Self {
        Self {
            elements: Vector::new(),
        }
    }

    /// Returns the number of queued elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if nothing is queued.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the element at the front without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.elements.front()
    }

    /// Returns a new queue with `element` added at the back.
    #[must_use]
    pub fn enqueue(&self, element: T) -> Self {
        let mut elements = self.elements.clone();
        elements.push_back(element);
        Self { elements }
    }

    /// Removes the front element, returning it together with the remaining queue.
    pub fn dequeue(&self) -> Option<(T, Self)> {
        let mut elements = self.elements.clone();
        elements
            .pop_front()
            .map(|front| (front, Self { elements }))
    }

    /// Iterates from front to back.
    pub fn iter(&self) -> im::vector::Iter<'_, T> {
        self.elements.iter()
    }
}

impl<T: Clone> Default for PersistentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for PersistentQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<T: Clone> IntoIterator for PersistentQueue<T> {
    type Item = T;
    type IntoIter = ConsumingIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<T: Element + PartialEq> PersistentCollection<T> for PersistentQueue<T> {
    fn empty() -> Self {
        Self::new()
    }

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    fn contains(&self, element: &T) -> bool {
        self.elements.contains(element)
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.elements.iter())
    }

    fn plus(&self, element: T) -> Self {
        self.enqueue(element)
    }

    fn plus_at(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_insertion(index, self.elements.len())?;
        let mut elements = self.elements.clone();
        elements.insert(index, element);
        Ok(Self { elements })
    }

    fn minus(&self, element: &T) -> Self {
        self.elements
            .index_of(element)
            .and_then(|index| self.minus_at(index).ok())
            .unwrap_or_else(|| self.clone())
    }

    fn minus_at(&self, index: usize) -> LazyResult<Self> {
        Fault::check_index(index, self.elements.len())?;
        let mut elements = self.elements.clone();
        elements.remove(index);
        Ok(Self { elements })
    }

    fn with(&self, index: usize, element: T) -> LazyResult<Self> {
        Fault::check_index(index, self.elements.len())?;
        Ok(Self {
            elements: self.elements.update(index, element),
        })
    }
}
