//! Deferred transformation pipelines.
//!
//! A [`Pipeline`] is an upstream stage (where elements come from) followed
//! by an ordered list of [`Operation`]s that keep the element type. Nothing
//! runs until the pipeline is drained, and draining applies every operation
//! in recorded order in a single pass.
//!
//! Transformations that change the element type (map, flat map, zip, scan,
//! windowing, grouping) wrap the previous pipeline in a new upstream stage
//! instead of appending an operation.
//!
//! Pipelines are immutable: [`Pipeline::append`] returns a new pipeline
//! sharing structure with the old one.

use std::fmt;
use std::iter;
use std::sync::Arc;

use im::Vector;

use crate::bulk;
use crate::error::LazyResult;
use crate::kind::{Element, PersistentCollection};

mod operation;
pub(crate) mod upstream;

pub use operation::{Adjacency, Fallback, Inspector, Merge, Operation, Predicate, Rearrangement, Test};

/// A stream of elements being drained, each of which may be a fault.
pub(crate) type Drain<'a, T> = Box<dyn Iterator<Item = LazyResult<T>> + 'a>;

/// Where a pipeline's elements come from.
///
/// `open` may be called once per drain; stages that wrap a one-shot
/// producer replay what earlier drains already pulled.
pub(crate) trait Upstream<T>: Send + Sync {
    /// Starts a new pass over the stage's elements.
    fn open(&self) -> Drain<'_, T>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;
}

/// An upstream stage plus the ordered operations applied to its elements.
pub struct Pipeline<T: Element> {
    upstream: Arc<dyn Upstream<T>>,
    operations: Vector<Operation<T>>,
}

impl<T: Element> Pipeline<T> {
    pub(crate) fn from_upstream<U>(upstream: U) -> Self
    where
        U: Upstream<T> + 'static,
    {
        Self {
            upstream: Arc::new(upstream),
            operations: Vector::new(),
        }
    }

    /// Creates a pipeline whose upstream is an already realized collection.
    ///
    /// The collection is shared, not copied.
    pub fn from_collection<C>(collection: C) -> Self
    where
        C: PersistentCollection<T>,
    {
        Self::from_upstream(upstream::Realized::new(collection))
    }

    /// Returns a new pipeline with `operation` appended.
    #[must_use]
    pub fn append(&self, operation: Operation<T>) -> Self {
        let mut operations = self.operations.clone();
        operations.push_back(operation);
        Self {
            upstream: Arc::clone(&self.upstream),
            operations,
        }
    }

    /// Returns the number of recorded operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if no operation has been recorded.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Iterates the recorded operations in application order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation<T>> + '_ {
        self.operations.iter()
    }

    /// Short name of the upstream stage.
    pub fn upstream_name(&self) -> &'static str {
        self.upstream.name()
    }

    /// Opens the upstream and chains every operation over it.
    pub(crate) fn stream(&self) -> Drain<'_, T> {
        self.operations
            .iter()
            .fold(self.upstream.open(), |drain, operation| operation.apply(drain))
    }

    /// Drains the pipeline into `base` in one pass.
    ///
    /// # Errors
    ///
    /// Returns the first fault raised by the upstream or by a callback.
    /// Nothing is built in that case.
    pub fn drain_into<C>(&self, base: C) -> LazyResult<C>
    where
        C: PersistentCollection<T>,
    {
        bulk::try_build(base, self.stream())
    }
}

impl<T: Element> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
            operations: self.operations.clone(),
        }
    }
}

impl<T: Element> fmt::Debug for Pipeline<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Pipeline")
            .field("upstream", &self.upstream.name())
            .field("operations", &self.operations)
            .finish()
    }
}

/// Defers `fill` until the first element is pulled, then yields its buffer.
///
/// Operations that need the whole upstream (sorting, reversing, windowing)
/// are built on this so that nothing is buffered before the drain starts.
pub(crate) fn deferred<'a, T, F>(fill: F) -> Drain<'a, T>
where
    T: Element,
    F: FnOnce() -> LazyResult<Vec<T>> + 'a,
{
    Box::new(
        iter::once_with(fill).flat_map(|buffer| -> Drain<'a, T> {
            match buffer {
                Ok(elements) => Box::new(elements.into_iter().map(Ok)),
                Err(fault) => Box::new(iter::once(Err(fault))),
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;
    use rstest::rstest;

    fn numbers() -> Pipeline<i32> {
        Pipeline::from_collection((1..=5).collect::<Vector<i32>>())
    }

    #[rstest]
    fn append_leaves_the_original_pipeline_untouched() {
        let original = numbers();
        let extended = original.append(Operation::Reverse);

        assert_eq!(original.len(), 0);
        assert_eq!(extended.len(), 1);
        assert_eq!(
            original.drain_into(Vector::new()).unwrap(),
            (1..=5).collect::<Vector<_>>()
        );
    }

    #[rstest]
    fn operations_apply_in_recorded_order() {
        let pipeline = numbers()
            .append(Operation::Take(3))
            .append(Operation::Reverse);
        let drained: Vector<i32> = pipeline.drain_into(Vector::new()).unwrap();
        assert_eq!(drained, Vector::from(vec![3, 2, 1]));
    }

    #[rstest]
    fn deferred_does_not_fill_before_the_first_pull() {
        let mut filled = false;
        {
            let _drain = deferred(|| {
                filled = true;
                Ok(vec![1])
            });
        }
        assert!(!filled);
    }

    #[rstest]
    fn deferred_surfaces_a_fill_fault() {
        let mut drain = deferred::<i32, _>(|| Err(Fault::Drained));
        assert!(matches!(drain.next(), Some(Err(Fault::Drained))));
        assert!(drain.next().is_none());
    }
}
