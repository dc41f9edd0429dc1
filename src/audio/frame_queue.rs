//! Bounded, non-blocking-on-the-producer-side queue between device
//! callbacks/tasks and the processing task.
//!
//! Grounded on `fae::audio::capture::CpalCapture::run`'s `try_send` /
//! `TrySendError` handling over a `tokio::sync::mpsc` channel — the same
//! "producer never blocks, consumer suspends" shape spec §4.3 asks for,
//! pulled out into a small named type so the `Overflow` contract and drop
//! counter are explicit instead of inlined into an audio callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Producer-side overflow signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

/// Bounded FIFO queue. `try_push` never blocks; `pop` suspends when empty.
///
/// Holds only the receiver: the queue never keeps a sender of its own, so
/// `pop` can observe `None` as soon as every [`FrameProducer`] handed out by
/// [`Self::new`] has been dropped — there is no hidden extra sender keeping
/// the channel open.
pub struct FrameQueue<T> {
    rx: mpsc::Receiver<T>,
    overflow_count: Arc<AtomicU64>,
}

/// Producer handle: the only side allowed on a realtime thread.
#[derive(Clone)]
pub struct FrameProducer<T> {
    tx: mpsc::Sender<T>,
    overflow_count: Arc<AtomicU64>,
}

impl<T: Send + 'static> FrameQueue<T> {
    /// Create a queue with bounded capacity `q` (default 16 per spec §4.3),
    /// returning the queue paired with its one producer handle. Clone the
    /// producer if more than one task needs to push into the same queue;
    /// the queue itself never retains a sender.
    pub fn new(capacity: usize) -> (Self, FrameProducer<T>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let overflow_count = Arc::new(AtomicU64::new(0));
        let queue = Self {
            rx,
            overflow_count: Arc::clone(&overflow_count),
        };
        let producer = FrameProducer { tx, overflow_count };
        (queue, producer)
    }

    /// Suspends when the queue is empty; returns `None` once every
    /// [`FrameProducer`] has been dropped and the channel is drained.
    pub async fn pop(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Pre-emptively close from the consumer side so in-flight `try_push`
    /// calls start failing even before the last producer is dropped.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl<T> FrameProducer<T> {
    /// Non-blocking push. On full, increments the overflow counter and
    /// returns [`Overflow`] so the caller can count/drop (spec §4.3, §8).
    pub fn try_push(&self, item: T) -> Result<(), Overflow> {
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                Err(Overflow)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(Overflow),
        }
    }

    pub fn overflow_count(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Suspending push, for the one producer spec §5 singles out as a
    /// deliberate backpressure point rather than a drop site: "at
    /// `output_queue.push` ... if the output queue is full, the processing
    /// task waits — this is the intended backpressure signal because it
    /// means playback is falling behind." Every other producer in this
    /// crate uses [`Self::try_push`]; this method exists only for that one
    /// call site.
    ///
    /// Returns `Err` once the queue has been closed and will never drain.
    pub async fn push(&self, item: T) -> Result<(), Overflow> {
        self.tx.send(item).await.map_err(|_| Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fifo_order_preserved() {
        let (mut queue, producer): (FrameQueue<u32>, _) = FrameQueue::new(16);
        for i in 0..5 {
            producer.try_push(i).unwrap();
        }
        for i in 0..5 {
            assert_eq!(queue.pop().await, Some(i));
        }
    }

    #[test]
    fn overflow_increments_counter_and_discards() {
        let (_queue, producer): (FrameQueue<u32>, _) = FrameQueue::new(2);
        producer.try_push(1).unwrap();
        producer.try_push(2).unwrap();
        let result = producer.try_push(3);
        assert_eq!(result, Err(Overflow));
        assert_eq!(producer.overflow_count(), 1);
    }

    #[tokio::test]
    async fn blocking_push_suspends_until_a_slot_frees_then_succeeds() {
        let (mut queue, producer): (FrameQueue<u32>, _) = FrameQueue::new(1);
        producer.push(1).await.unwrap();

        let pusher = tokio::spawn(async move { producer.push(2).await });
        // Give the spawned push a moment to park on the full channel.
        tokio::task::yield_now().await;
        assert_eq!(queue.pop().await, Some(1));
        assert!(pusher.await.unwrap().is_ok());
        assert_eq!(queue.pop().await, Some(2));
    }

    #[tokio::test]
    async fn pop_suspends_until_push_then_returns_none_after_close() {
        let (mut queue, producer): (FrameQueue<u32>, _) = FrameQueue::new(4);
        producer.try_push(42).unwrap();
        drop(producer);

        assert_eq!(queue.pop().await, Some(42));
        assert_eq!(queue.pop().await, None);
    }
}
