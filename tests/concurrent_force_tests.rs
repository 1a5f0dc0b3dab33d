//! Concurrency tests for first-force publication.
//!
//! Many threads forcing the same pending collection must observe one
//! published value, and pipeline side effects must run once.

use lazy_persistent::prelude::*;
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

#[rstest]
fn racing_forcers_observe_one_value() {
    let peeks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&peeks);
    let collection = LazyVector::range(0, 1_000)
        .peek(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .map(|n| n * 2);
    let barrier = Arc::new(Barrier::new(THREADS));

    let results: Vec<Vec<i32>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let collection = collection.clone();
                let barrier = Arc::clone(&barrier);
                scope.spawn(move || {
                    barrier.wait();
                    collection.to_vec().unwrap()
                })
            })
            .collect();
        workers.into_iter().map(|worker| worker.join().unwrap()).collect()
    });

    let expected: Vec<i32> = (0..1_000).map(|n| n * 2).collect();
    assert!(results.iter().all(|result| *result == expected));
    assert_eq!(peeks.load(Ordering::SeqCst), 1_000);
}

#[rstest]
fn waiters_block_until_the_winner_publishes() {
    let started = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&started);
    let slow = LazyVector::range(0, 3).peek(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
    });

    thread::scope(|scope| {
        let winner = {
            let slow = slow.clone();
            scope.spawn(move || slow.len().unwrap())
        };
        let waiter = {
            let slow = slow.clone();
            scope.spawn(move || slow.len().unwrap())
        };
        assert_eq!(winner.join().unwrap(), 3);
        assert_eq!(waiter.join().unwrap(), 3);
    });

    assert_eq!(started.load(Ordering::SeqCst), 3);
    assert!(slow.is_materialized());
}

#[rstest]
fn deriving_during_a_force_waits_and_reuses_the_published_value() {
    let peeks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&peeks);
    let (started, draining) = mpsc::channel();
    let slow = LazyVector::range(0, 4).peek(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = started.send(());
        thread::sleep(Duration::from_millis(5));
    });

    thread::scope(|scope| {
        let winner = {
            let slow = slow.clone();
            scope.spawn(move || slow.to_vec().unwrap())
        };
        draining.recv().unwrap();

        let doubled = slow.map(|n| n * 2);
        assert!(slow.is_materialized());
        assert_eq!(doubled.to_vec().unwrap(), vec![0, 2, 4, 6]);
        assert_eq!(winner.join().unwrap(), vec![0, 1, 2, 3]);
    });

    assert_eq!(peeks.load(Ordering::SeqCst), 4);
}

#[rstest]
fn lazy_collections_move_across_threads() {
    let collection = LazySet::of(["a", "b"]).map(str::len);
    let length = thread::spawn(move || collection.len().unwrap()).join().unwrap();
    assert_eq!(length, 1);
}

#[rstest]
fn panicking_callback_leaves_the_collection_pending() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);
    let fragile = LazyVector::range(0, 3).map(move |n| {
        assert!(counter.fetch_add(1, Ordering::SeqCst) > 0, "first attempt fails");
        n
    });

    let first = {
        let fragile = fragile.clone();
        thread::spawn(move || fragile.len()).join()
    };

    assert!(first.is_err());
    assert!(!fragile.is_materialized());
    assert_eq!(fragile.len().unwrap(), 3);
}
