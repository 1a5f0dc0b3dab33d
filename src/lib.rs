//! # lazy-persistent
//!
//! Lazy persistent collections: immutable collections whose transformations
//! are recorded instead of executed, and materialized into a concrete
//! persistent structure only when something needs the elements.
//!
//! ## Overview
//!
//! - **Facade**: [`LazyCollection`] and its kind aliases ([`LazyVector`],
//!   [`LazyQueue`], [`LazySet`], [`LazyOrderedSet`], [`LazyBag`])
//! - **Handle**: [`handle::LazyHandle`], the shared memoizing state that
//!   drains a pipeline at most once
//! - **Pipeline**: [`pipeline::Pipeline`], the deferred, ordered list of
//!   transformations over an upstream source
//! - **Kinds**: [`kind::PersistentCollection`], the adapter every concrete
//!   persistent structure implements, and the kind markers selecting one
//! - **Bulk building**: [`bulk`], the fast construction path used whenever a
//!   pipeline is materialized
//! - **Monoids**: [`monoid`], the seed and step of the monoid scans
//!
//! ## Feature Flags
//!
//! - `async` (default): build collections from `futures` streams
//! - `serde`: `Serialize` / `Deserialize` for lazy collections
//! - `fxhash`: hash set and bag kinds use `rustc-hash`
//! - `ahash`: hash set and bag kinds use `ahash`
//! - `full`: `async` and `serde`
//!
//! ## Example
//!
//! ```rust
//! use lazy_persistent::prelude::*;
//!
//! let words = LazyVector::of(["lazy", "persistent", "collections"]);
//! let long = words.filter(|word| word.len() > 4).map(str::to_uppercase);
//!
//! assert!(!long.is_materialized());
//! assert_eq!(long.to_string(), "Vector[PERSISTENT, COLLECTIONS]");
//! assert_eq!(words.len().unwrap(), 3); // Original unchanged
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// ```rust
/// use lazy_persistent::prelude::*;
/// ```
pub mod prelude {
    pub use crate::collection::{
        LazyBag, LazyCollection, LazyOrderedSet, LazyQueue, LazySet, LazyVector,
    };
    pub use crate::error::{Fault, LazyResult};
    pub use crate::kind::{
        Bag, BagKind, OrderedSetKind, PersistentCollection, PersistentQueue, QueueKind, SetKind,
        VectorKind,
    };
    pub use crate::monoid::{Monoid, Product, Semigroup, Sum};
}

pub mod bulk;
mod collection;
pub mod error;
pub mod handle;
pub mod kind;
pub mod monoid;
pub mod pipeline;

pub use collection::{LazyBag, LazyCollection, LazyOrderedSet, LazyQueue, LazySet, LazyVector};
pub use error::{Fault, LazyResult, SharedError};
