//! Asynchronous stream sources and sinks.
//!
//! A stream-fed collection is pending until forced. Forcing drains the
//! stream with `futures::executor::block_on_stream` on the forcing thread,
//! which blocks until the stream ends, fails, or a bounding operation such
//! as `take` stops pulling. Do not force such a collection from inside an
//! async task running on a single-threaded executor that also drives the
//! stream's producer.

use std::error::Error as StdError;

use futures::executor;
use futures::stream::{self, Stream, TryStream, TryStreamExt};

use super::LazyCollection;
use crate::error::{Fault, LazyResult};
use crate::kind::{Element, Materialize};

impl<T: Element, K: Materialize<T>> LazyCollection<T, K> {
    /// Creates a pending collection fed by an asynchronous stream.
    ///
    /// The stream is shared like a one-shot iterator: elements it already
    /// yielded are replayed to collections derived from this one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazy_persistent::LazyVector;
    ///
    /// let streamed = LazyVector::from_stream(futures::stream::iter(1..=3));
    /// assert_eq!(streamed.map(|n| n * n).to_vec().unwrap(), vec![1, 4, 9]);
    /// ```
    pub fn from_stream<S>(elements: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        let blocking = executor::block_on_stream(Box::pin(elements));
        Self::from_producer(Box::new(blocking.map(Ok)))
    }

    /// Creates a pending collection fed by a fallible asynchronous stream.
    ///
    /// An `Err` item surfaces as [`Fault::Upstream`] when the collection is
    /// forced; the stream is not polled again afterwards.
    pub fn from_try_stream<S>(elements: S) -> Self
    where
        S: TryStream<Ok = T> + Send + 'static,
        S::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let blocking = executor::block_on_stream(Box::pin(elements.into_stream()));
        Self::from_producer(Box::new(
            blocking.map(|element| element.map_err(Fault::upstream)),
        ))
    }

    /// Forces the collection and returns its elements as a stream.
    ///
    /// # Errors
    ///
    /// Returns the fault raised while forcing.
    pub fn to_stream(&self) -> LazyResult<impl Stream<Item = T> + Send + 'static> {
        Ok(stream::iter(self.to_vec()?))
    }
}

#[cfg(test)]
mod tests {
    use crate::LazyVector;
    use crate::error::Fault;
    use futures::StreamExt;
    use futures::executor::block_on;
    use futures::stream;
    use rstest::rstest;

    #[rstest]
    fn stream_is_not_polled_until_forced() {
        let polled = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = std::sync::Arc::clone(&polled);
        let streamed = LazyVector::from_stream(stream::iter(0..3).inspect(move |_| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }));

        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(streamed.len().unwrap(), 3);
        assert!(polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[rstest]
    fn try_stream_failure_surfaces_as_upstream_fault() {
        let items: Vec<Result<i32, String>> = vec![Ok(1), Err("reset".to_owned())];
        let streamed = LazyVector::from_try_stream(stream::iter(items));

        assert!(matches!(streamed.to_vec(), Err(Fault::Upstream(_))));
        assert!(!streamed.is_materialized());
    }

    #[rstest]
    fn to_stream_yields_the_materialized_elements() {
        let collected: Vec<i32> = block_on(LazyVector::range(0, 3).to_stream().unwrap().collect());
        assert_eq!(collected, vec![0, 1, 2]);
    }
}
