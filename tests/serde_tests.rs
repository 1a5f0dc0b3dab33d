#![cfg(feature = "serde")]

//! Integration tests for serde support.
//!
//! Serializing forces the collection; deserializing builds a realized one.

use lazy_persistent::prelude::*;
use rstest::rstest;

#[rstest]
fn test_pending_vector_serializes_its_materialized_elements() {
    let pending = LazyVector::range(0, 4).map(|n| n * 10);
    let json = serde_json::to_string(&pending).unwrap();

    assert_eq!(json, "[0,10,20,30]");
    assert!(pending.is_materialized());
}

#[rstest]
fn test_vector_json_roundtrip() {
    let vector = LazyVector::of(["lazy".to_owned(), "persistent".to_owned()]);
    let json = serde_json::to_string(&vector).unwrap();
    let restored: LazyVector<String> = serde_json::from_str(&json).unwrap();

    assert!(restored.is_materialized());
    assert_eq!(vector, restored);
}

#[rstest]
fn test_set_deserialization_collapses_duplicates() {
    let restored: LazySet<i32> = serde_json::from_str("[1,2,2,3]").unwrap();
    assert_eq!(restored.len().unwrap(), 3);
}

#[rstest]
fn test_bag_json_roundtrip_keeps_multiplicity() {
    let bag = LazyBag::of([7, 7, 8]);
    let json = serde_json::to_string(&bag).unwrap();
    let restored: LazyBag<i32> = serde_json::from_str(&json).unwrap();

    assert_eq!(bag, restored);
}

#[rstest]
fn test_serializing_a_failing_collection_is_an_error() {
    let failing = LazyVector::from_try_iterable(vec![Err::<i32, _>("unavailable")]);
    let error = serde_json::to_string(&failing).unwrap_err();
    assert!(error.to_string().contains("unavailable"));
}
