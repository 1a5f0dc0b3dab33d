#![cfg(feature = "async")]
//! Tests for collections fed by asynchronous streams.
//!
//! Producers run on a tokio runtime and hand elements over a channel; the
//! forcing thread blocks until the stream completes or faults.

use futures::stream::{self, StreamExt};
use lazy_persistent::prelude::*;
use rstest::rstest;
use std::time::Duration;
use tokio::sync::mpsc;

fn channel_stream(receiver: mpsc::Receiver<i32>) -> impl futures::Stream<Item = i32> + Send + 'static {
    stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|element| (element, receiver))
    })
}

#[rstest]
fn forcing_blocks_until_the_producer_completes() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap();
    let (sender, receiver) = mpsc::channel(4);

    let collection = LazyVector::from_stream(channel_stream(receiver));
    runtime.spawn(async move {
        for element in 0..10 {
            tokio::time::sleep(Duration::from_millis(1)).await;
            if sender.send(element).await.is_err() {
                break;
            }
        }
    });

    assert_eq!(collection.map(|n| n * n).len().unwrap(), 10);
    assert_eq!(collection.to_vec().unwrap(), (0..10).collect::<Vec<_>>());
}

#[rstest]
fn stream_source_is_not_polled_before_forcing() {
    let (sender, receiver) = mpsc::channel(1);
    let collection = LazyVector::from_stream(channel_stream(receiver));
    let derived = collection.filter(|n| *n > 0);

    drop(sender);

    assert!(!derived.is_materialized());
    assert!(derived.is_empty().unwrap());
}

#[rstest]
fn take_stops_polling_an_endless_stream() {
    let endless = LazyVector::from_stream(stream::iter(0_u64..).map(|n| n * 3));
    assert_eq!(endless.take(4).to_vec().unwrap(), vec![0, 3, 6, 9]);
}

#[rstest]
fn try_stream_error_becomes_an_upstream_fault() {
    let items: Vec<Result<i32, std::io::Error>> = vec![
        Ok(1),
        Err(std::io::Error::other("stream closed")),
    ];
    let collection = LazyVector::from_try_stream(stream::iter(items));

    assert!(matches!(collection.to_vec(), Err(Fault::Upstream(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn to_stream_feeds_async_consumers() {
    let collection = LazyOrderedSet::of([3, 1, 2]);
    let collected: Vec<i32> = collection.to_stream().unwrap().collect().await;
    assert_eq!(collected, vec![1, 2, 3]);
}
