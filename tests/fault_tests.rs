//! Fault propagation tests.
//!
//! A failed materialization publishes nothing, leaves the collection
//! pending and surfaces the fault at the call that forced it.

use lazy_persistent::prelude::*;
use rstest::rstest;
use std::io;

fn broken_stream() -> LazyVector<i32> {
    LazyVector::from_try_iterable(vec![
        Ok(1),
        Ok(2),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
        Ok(4),
    ])
}

#[rstest]
fn upstream_fault_surfaces_at_the_forcing_call() {
    let collection = broken_stream();

    let fault = collection.to_vec().unwrap_err();

    assert!(matches!(fault, Fault::Upstream(_)));
    assert!(fault.to_string().contains("reset by peer"));
    assert!(!collection.is_materialized());
}

#[rstest]
fn failed_one_shot_producer_reports_drained_on_retry() {
    let collection = broken_stream();

    assert!(matches!(collection.len(), Err(Fault::Upstream(_))));
    assert!(matches!(collection.len(), Err(Fault::Drained)));
}

#[rstest]
fn bounded_pipeline_never_reaches_the_fault() {
    let collection = broken_stream().take(2);
    assert_eq!(collection.to_vec().unwrap(), vec![1, 2]);
}

#[rstest]
fn callback_fault_is_reproduced_on_retry() {
    let parsed = LazyVector::of(["7", "eight"]).try_map(|text| text.parse::<i32>());

    assert!(matches!(parsed.len(), Err(Fault::Callback(_))));
    assert!(matches!(parsed.len(), Err(Fault::Callback(_))));
    assert!(!parsed.is_materialized());
}

#[rstest]
fn structural_update_on_a_failing_collection_returns_the_fault() {
    let parsed = LazyVector::of(["x"]).try_map(|text| text.parse::<i32>());
    assert!(matches!(parsed.plus(1), Err(Fault::Callback(_))));
}

#[rstest]
#[case(0, 0)]
#[case(3, 3)]
#[case(10, 3)]
fn get_reports_index_and_length(#[case] index: usize, #[case] length: i32) {
    let collection = LazyVector::range(0, length);
    if index < usize::try_from(length).unwrap() {
        assert!(collection.get(index).is_ok());
    } else {
        let fault = collection.get(index).unwrap_err();
        assert!(matches!(
            fault,
            Fault::Index { index: reported, length: reported_length }
                if reported == index && reported_length == usize::try_from(length).unwrap()
        ));
    }
}

#[rstest]
fn faults_are_cloneable_and_keep_their_source() {
    use std::error::Error;

    let fault = broken_stream().to_vec().unwrap_err();
    let cloned = fault.clone();

    assert_eq!(fault.to_string(), cloned.to_string());
    assert!(cloned.source().is_some());
}
