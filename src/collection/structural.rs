//! Queries and eager structural updates.
//!
//! Everything here forces the receiver first. Updates then go through the
//! kind's persistent adapter and return a new, realized collection; the
//! receiver (and anything sharing its handle) is left as it was.

use super::LazyCollection;
use crate::bulk;
use crate::error::{Fault, LazyResult};
use crate::kind::{Element, Materialize, PersistentCollection};

impl<T: Element, K: Materialize<T>> LazyCollection<T, K> {
    // =========================================================================
    // Queries
    // =========================================================================

    /// Forces the collection and returns the concrete persistent structure.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while draining. The collection stays pending.
    pub fn to_collection(&self) -> LazyResult<K::Collection> {
        self.handle().force()
    }

    /// Returns the number of elements.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn len(&self) -> LazyResult<usize> {
        Ok(self.to_collection()?.len())
    }

    /// Returns `true` if the collection has no elements.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn is_empty(&self) -> LazyResult<bool> {
        Ok(self.to_collection()?.is_empty())
    }

    /// Returns the element at `index`.
    ///
    /// For unordered kinds the index addresses iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`] when `index` is out of range, or the fault
    /// raised while forcing.
    pub fn get(&self, index: usize) -> LazyResult<T> {
        let collection = self.to_collection()?;
        collection.get(index).cloned().ok_or(Fault::Index {
            index,
            length: collection.len(),
        })
    }

    /// Returns the first element, if any.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn first(&self) -> LazyResult<Option<T>> {
        Ok(self.to_collection()?.get(0).cloned())
    }

    /// Returns the last element, if any.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn last(&self) -> LazyResult<Option<T>> {
        let collection = self.to_collection()?;
        Ok(collection
            .len()
            .checked_sub(1)
            .and_then(|index| collection.get(index))
            .cloned())
    }

    /// Returns `true` if an element equal to `element` is present.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn contains(&self, element: &T) -> LazyResult<bool> {
        Ok(self.to_collection()?.contains(element))
    }

    /// Returns the position of the first element equal to `element`.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn index_of(&self, element: &T) -> LazyResult<Option<usize>>
    where
        T: PartialEq,
    {
        let collection = self.to_collection()?;
        let position = PersistentCollection::iter(&collection).position(|candidate| candidate == element);
        Ok(position)
    }

    /// Returns the position of the last element equal to `element`.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn last_index_of(&self, element: &T) -> LazyResult<Option<usize>>
    where
        T: PartialEq,
    {
        let collection = self.to_collection()?;
        let position = PersistentCollection::iter(&collection)
            .enumerate()
            .filter(|(_, candidate)| *candidate == element)
            .last()
            .map(|(index, _)| index);
        Ok(position)
    }

    /// Iterates the elements by value.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn iter(&self) -> LazyResult<<K::Collection as IntoIterator>::IntoIter> {
        Ok(self.to_collection()?.into_iter())
    }

    /// Collects the elements into a `Vec`, in iteration order.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn to_vec(&self) -> LazyResult<Vec<T>> {
        Ok(self.iter()?.collect())
    }

    /// Folds every element into an accumulator.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn fold<A, F>(&self, initial: A, f: F) -> LazyResult<A>
    where
        F: FnMut(A, T) -> A,
    {
        Ok(self.iter()?.fold(initial, f))
    }

    /// Counts the elements `predicate` accepts.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn count<F>(&self, mut predicate: F) -> LazyResult<usize>
    where
        F: FnMut(&T) -> bool,
    {
        Ok(self.iter()?.filter(|element| predicate(element)).count())
    }

    /// Calls `f` on every element.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn for_each<F>(&self, f: F) -> LazyResult<()>
    where
        F: FnMut(T),
    {
        self.iter()?.for_each(f);
        Ok(())
    }

    // =========================================================================
    // Structural updates
    // =========================================================================

    fn update<F>(&self, f: F) -> LazyResult<Self>
    where
        F: FnOnce(&K::Collection) -> LazyResult<K::Collection>,
    {
        let collection = self.to_collection()?;
        Ok(Self::from_collection(f(&collection)?))
    }

    /// Returns a new collection with `element` added.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing the receiver.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let original = LazyVector::of([1, 2]);
    /// let extended = original.plus(3).unwrap();
    ///
    /// assert_eq!(extended.to_vec().unwrap(), vec![1, 2, 3]);
    /// assert_eq!(original.to_vec().unwrap(), vec![1, 2]); // Original unchanged
    /// ```
    pub fn plus(&self, element: T) -> LazyResult<Self> {
        self.update(|collection| Ok(collection.plus(element)))
    }

    /// Returns a new collection with `element` inserted at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`] when `index > len`, or the fault raised while
    /// forcing.
    pub fn plus_at(&self, index: usize, element: T) -> LazyResult<Self> {
        self.update(|collection| collection.plus_at(index, element))
    }

    /// Returns a new collection with one occurrence of `element` removed.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing the receiver.
    pub fn minus(&self, element: &T) -> LazyResult<Self> {
        self.update(|collection| Ok(collection.minus(element)))
    }

    /// Returns a new collection without the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`] when `index >= len`, or the fault raised while
    /// forcing.
    pub fn minus_at(&self, index: usize) -> LazyResult<Self> {
        self.update(|collection| collection.minus_at(index))
    }

    /// Returns a new collection with the element at `index` replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`] when `index >= len`, or the fault raised while
    /// forcing.
    pub fn with(&self, index: usize, element: T) -> LazyResult<Self> {
        self.update(|collection| collection.with(index, element))
    }

    /// Returns a new collection with every element of `elements` added.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing the receiver.
    pub fn plus_all<I>(&self, elements: I) -> LazyResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        self.update(|collection| Ok(collection.plus_all(elements)))
    }

    /// Returns a new collection with `elements` inserted in order starting at `index`.
    ///
    /// Only `index` itself is checked against the receiver's length. Kinds
    /// that collapse duplicates may grow by less than the number of
    /// elements, so later positions are clamped to the updated length.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Index`] when `index > len`, or the fault raised while
    /// forcing.
    pub fn plus_all_at<I>(&self, index: usize, elements: I) -> LazyResult<Self>
    where
        I: IntoIterator<Item = T>,
    {
        self.update(|collection| {
            Fault::check_insertion(index, collection.len())?;
            elements
                .into_iter()
                .enumerate()
                .try_fold(collection.clone(), |updated, (offset, element)| {
                    let position = (index + offset).min(updated.len());
                    updated.plus_at(position, element)
                })
        })
    }

    /// Returns a new collection with one occurrence of each of `elements` removed.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing the receiver.
    pub fn minus_all<'a, I>(&self, elements: I) -> LazyResult<Self>
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.update(|collection| Ok(collection.minus_all(elements)))
    }

    /// Appends `generator(0)` through `generator(max - 1)`.
    ///
    /// The generator runs exactly `max` times, through the kind's bulk
    /// constructor when it has one.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing the receiver.
    pub fn plus_loop<F>(&self, max: usize, generator: F) -> LazyResult<Self>
    where
        F: FnMut(usize) -> T,
    {
        self.update(|collection| Ok(bulk::plus_loop(collection.clone(), max, generator)))
    }

    /// Appends supplied elements until `supplier` returns `None`.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing the receiver.
    pub fn plus_loop_while<F>(&self, supplier: F) -> LazyResult<Self>
    where
        F: FnMut() -> Option<T>,
    {
        self.update(|collection| Ok(bulk::plus_loop_while(collection.clone(), supplier)))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Fault;
    use crate::{LazyOrderedSet, LazyQueue, LazySet, LazyVector};
    use rstest::rstest;

    #[rstest]
    fn queries_force_and_delegate() {
        let numbers = LazyVector::range(0, 5).map(|n| n * 2);

        assert_eq!(numbers.len().unwrap(), 5);
        assert!(!numbers.is_empty().unwrap());
        assert_eq!(numbers.get(2).unwrap(), 4);
        assert_eq!(numbers.first().unwrap(), Some(0));
        assert_eq!(numbers.last().unwrap(), Some(8));
        assert!(numbers.contains(&6).unwrap());
        assert_eq!(numbers.fold(0, |total, n| total + n).unwrap(), 20);
        assert_eq!(numbers.count(|n| *n > 3).unwrap(), 3);
    }

    #[rstest]
    fn empty_collection_has_no_first_or_last() {
        let empty = LazyVector::<i32>::empty();
        assert_eq!(empty.first().unwrap(), None);
        assert_eq!(empty.last().unwrap(), None);
    }

    #[rstest]
    fn index_of_and_last_index_of_find_both_ends() {
        let letters = LazyVector::of(['a', 'b', 'a', 'c']);

        assert_eq!(letters.index_of(&'a').unwrap(), Some(0));
        assert_eq!(letters.last_index_of(&'a').unwrap(), Some(2));
        assert_eq!(letters.index_of(&'z').unwrap(), None);
    }

    #[rstest]
    #[case::get(LazyVector::of([1, 2, 3]).get(3).map(|_| ()))]
    #[case::with(LazyVector::of([1, 2, 3]).with(3, 0).map(|_| ()))]
    #[case::minus_at(LazyVector::of([1, 2, 3]).minus_at(5).map(|_| ()))]
    #[case::plus_at(LazyVector::of([1, 2, 3]).plus_at(4, 0).map(|_| ()))]
    #[case::plus_all_at(LazyVector::of([1, 2, 3]).plus_all_at(4, [0]).map(|_| ()))]
    fn out_of_range_indices_are_never_clamped(#[case] outcome: Result<(), Fault>) {
        assert!(matches!(outcome, Err(Fault::Index { length: 3, .. })));
    }

    #[rstest]
    fn structural_updates_leave_the_receiver_untouched() {
        let original = LazyVector::range(0, 4);

        let inserted = original.plus_at(1, 10).unwrap();
        let removed = original.minus_at(0).unwrap();
        let replaced = original.with(3, 30).unwrap();
        let spliced = original.plus_all_at(2, [7, 8]).unwrap();

        assert_eq!(inserted.to_vec().unwrap(), vec![0, 10, 1, 2, 3]);
        assert_eq!(removed.to_vec().unwrap(), vec![1, 2, 3]);
        assert_eq!(replaced.to_vec().unwrap(), vec![0, 1, 2, 30]);
        assert_eq!(spliced.to_vec().unwrap(), vec![0, 1, 7, 8, 2, 3]);
        assert_eq!(original.to_vec().unwrap(), vec![0, 1, 2, 3]);
    }

    #[rstest]
    fn minus_removes_a_single_occurrence() {
        let numbers = LazyVector::of([1, 2, 1, 3]);

        assert_eq!(numbers.minus(&1).unwrap().to_vec().unwrap(), vec![2, 1, 3]);
        assert_eq!(numbers.minus_all([&1, &3]).unwrap().to_vec().unwrap(), vec![2, 1]);
    }

    #[rstest]
    fn plus_loop_appends_generated_elements() {
        let squares = LazyVector::of([100]).plus_loop(4, |index| index * index).unwrap();
        assert_eq!(squares.to_vec().unwrap(), vec![100, 0, 1, 4, 9]);

        let mut remaining = 3;
        let countdown = LazyQueue::<usize>::empty()
            .plus_loop_while(|| {
                remaining -= 1;
                (remaining > 0).then_some(remaining)
            })
            .unwrap();
        assert_eq!(countdown.to_vec().unwrap(), vec![2, 1]);
    }

    #[rstest]
    fn plus_all_at_tolerates_duplicates_in_a_set() {
        let set = LazySet::of([1, 2]).plus_all_at(2, [1, 5]).unwrap();
        let mut elements = set.to_vec().unwrap();
        elements.sort_unstable();
        assert_eq!(elements, vec![1, 2, 5]);
    }

    #[rstest]
    fn plus_all_at_tolerates_duplicates_in_an_ordered_set() {
        let set = LazyOrderedSet::of([1, 2]).plus_all_at(2, [2, 5]).unwrap();
        assert_eq!(set.to_vec().unwrap(), vec![1, 2, 5]);
    }

    #[rstest]
    fn plus_all_at_still_checks_the_starting_index() {
        let outcome = LazySet::of([1, 2]).plus_all_at(3, [4]);
        assert!(matches!(outcome, Err(Fault::Index { index: 3, length: 2 })));
    }

    #[rstest]
    fn set_updates_collapse_duplicates() {
        let set = LazySet::of([1, 2]).plus(2).unwrap().plus_all([3, 3]).unwrap();
        assert_eq!(set.len().unwrap(), 3);
    }
}
