// src/processing/queue.rs
//! Bounded single-producer/single-consumer queue with an explicit overflow policy

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};

/// What happens to a push when the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Reject the incoming item
    DropNewest,
    /// Discard the oldest queued item to make room
    EvictOldest,
}

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Queued without discarding anything
    Accepted,
    /// Queue full, incoming item discarded
    Dropped,
    /// Queue full, oldest item discarded, incoming item queued
    Evicted,
    /// Consumer side is gone
    Disconnected,
}

/// Constructor for a connected producer/consumer pair
pub struct BoundedQueue;

impl BoundedQueue {
    /// Create a queue holding at most `capacity` items (minimum 1)
    pub fn new<T>(capacity: usize, policy: OverflowPolicy) -> (QueueProducer<T>, QueueConsumer<T>) {
        let capacity = capacity.max(1);
        let (sender, receiver) = channel::bounded(capacity);

        let evictor = match policy {
            OverflowPolicy::EvictOldest => Some(receiver.clone()),
            OverflowPolicy::DropNewest => None,
        };
        let consumer_alive = Arc::new(AtomicBool::new(true));

        (
            QueueProducer {
                sender,
                evictor,
                consumer_alive: Arc::clone(&consumer_alive),
                policy,
                capacity,
            },
            QueueConsumer {
                receiver,
                alive: consumer_alive,
            },
        )
    }
}

/// Sending half. Never blocks.
pub struct QueueProducer<T> {
    sender: Sender<T>,
    /// Receiver clone used to pop the oldest item under `EvictOldest`.
    /// It keeps the channel connected, so consumer liveness is tracked separately.
    evictor: Option<Receiver<T>>,
    consumer_alive: Arc<AtomicBool>,
    policy: OverflowPolicy,
    capacity: usize,
}

impl<T> QueueProducer<T> {
    /// Queue `item` according to the overflow policy. Reports `Disconnected`
    /// once the consumer has been dropped, under either policy.
    pub fn push(&self, item: T) -> PushOutcome {
        if !self.consumer_alive.load(Ordering::Acquire) {
            return PushOutcome::Disconnected;
        }

        let item = match self.sender.try_send(item) {
            Ok(()) => return PushOutcome::Accepted,
            Err(TrySendError::Disconnected(_)) => return PushOutcome::Disconnected,
            Err(TrySendError::Full(item)) => item,
        };

        let Some(evictor) = &self.evictor else {
            return PushOutcome::Dropped;
        };

        let mut pending = item;
        let mut evicted = false;
        loop {
            if evictor.try_recv().is_ok() {
                evicted = true;
            }
            match self.sender.try_send(pending) {
                Ok(()) => {
                    return if evicted {
                        PushOutcome::Evicted
                    } else {
                        PushOutcome::Accepted
                    }
                }
                Err(TrySendError::Full(back)) => pending = back,
                Err(TrySendError::Disconnected(_)) => return PushOutcome::Disconnected,
            }
        }
    }

    /// Overflow policy
    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Maximum number of queued items
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }
}

/// Receiving half
pub struct QueueConsumer<T> {
    receiver: Receiver<T>,
    alive: Arc<AtomicBool>,
}

impl<T> Drop for QueueConsumer<T> {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl<T> QueueConsumer<T> {
    /// Oldest queued item, without blocking
    pub fn try_pop(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything queued and return the newest item with the count drained
    pub fn drain_latest(&self) -> (Option<T>, usize) {
        let mut latest = None;
        let mut drained = 0;
        while let Some(item) = self.try_pop() {
            latest = Some(item);
            drained += 1;
        }
        (latest, drained)
    }

    /// Wait up to `timeout` for an item. `None` on timeout or disconnect.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        match self.receiver.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Underlying receiver, for use in `select!`
    pub fn receiver(&self) -> &Receiver<T> {
        &self.receiver
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
