//! Associative combination with an identity, used by the monoid scans.
//!
//! A [`Monoid`] gives [`LazyCollection::scan_left_monoid`] and
//! [`LazyCollection::scan_right_monoid`] their seed (`empty`) and their step
//! (`combine`).
//!
//! # Laws
//!
//! ```text
//! (a.combine(b)).combine(c) == a.combine(b.combine(c))
//! T::empty().combine(a) == a == a.combine(T::empty())
//! ```
//!
//! # Examples
//!
//! ```rust
//! use lazy_persistent::LazyVector;
//! use lazy_persistent::monoid::Sum;
//!
//! let totals = LazyVector::of([1, 2, 3]).map(Sum).scan_left_monoid();
//! assert_eq!(totals.to_vec().unwrap(), vec![Sum(0), Sum(1), Sum(3), Sum(6)]);
//! ```
//!
//! [`LazyCollection::scan_left_monoid`]: crate::LazyCollection::scan_left_monoid
//! [`LazyCollection::scan_right_monoid`]: crate::LazyCollection::scan_right_monoid

use std::ops::{Add, Mul};

use im::Vector;

/// Types with an associative binary operation.
pub trait Semigroup {
    /// Combines two values into one. Must be associative.
    #[must_use]
    fn combine(self, other: Self) -> Self;

    /// Combines two values by reference.
    #[must_use]
    fn combine_ref(&self, other: &Self) -> Self
    where
        Self: Clone,
    {
        self.clone().combine(other.clone())
    }
}

/// Semigroups with an identity element.
pub trait Monoid: Semigroup {
    /// The identity element for `combine`.
    fn empty() -> Self;

    /// Combines every value from the left, starting at `empty`.
    fn combine_all<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Self>,
        Self: Sized,
    {
        values.into_iter().fold(Self::empty(), Self::combine)
    }
}

/// Numbers combined by addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Sum<A>(pub A);

/// Numbers combined by multiplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Product<A>(pub A);

// =============================================================================
// Semigroup instances
// =============================================================================

impl Semigroup for String {
    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

impl<T> Semigroup for Vec<T> {
    fn combine(mut self, mut other: Self) -> Self {
        self.append(&mut other);
        self
    }
}

impl<T: Clone> Semigroup for Vector<T> {
    fn combine(mut self, other: Self) -> Self {
        self.append(other);
        self
    }
}

/// `None` is the identity; two `Some` values combine their contents.
impl<S: Semigroup> Semigroup for Option<S> {
    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Some(left), Some(right)) => Some(left.combine(right)),
            (Some(value), None) | (None, Some(value)) => Some(value),
            (None, None) => None,
        }
    }
}

impl<A: Add<Output = A>> Semigroup for Sum<A> {
    fn combine(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl<A: Mul<Output = A>> Semigroup for Product<A> {
    fn combine(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }
}

// =============================================================================
// Monoid instances
// =============================================================================

impl Monoid for String {
    fn empty() -> Self {
        Self::new()
    }
}

impl<T> Monoid for Vec<T> {
    fn empty() -> Self {
        Self::new()
    }
}

impl<T: Clone> Monoid for Vector<T> {
    fn empty() -> Self {
        Self::new()
    }
}

impl<S: Semigroup> Monoid for Option<S> {
    fn empty() -> Self {
        None
    }
}

impl<A: Add<Output = A> + Default> Monoid for Sum<A> {
    fn empty() -> Self {
        Self(A::default())
    }
}

macro_rules! product_monoid {
    ($($number:ty => $one:expr),* $(,)?) => {
        $(
            impl Monoid for Product<$number> {
                fn empty() -> Self {
                    Self($one)
                }
            }
        )*
    };
}

product_monoid!(
    i8 => 1, i16 => 1, i32 => 1, i64 => 1, i128 => 1, isize => 1,
    u8 => 1, u16 => 1, u32 => 1, u64 => 1, u128 => 1, usize => 1,
    f32 => 1.0, f64 => 1.0,
);
