//! Bounded multi-producer/multi-consumer record queue.
//!
//! Every tail engine pushes into one shared queue; every sink worker pulls
//! from it. The capacity bound is the pipeline's only backpressure mechanism:
//! [`QueueSender::send`] suspends while the queue is full, which in turn
//! stalls the sending engine's event loop. [`QueueReceiver::next`] returns
//! `None` once every sender has been dropped *and* the queue is drained,
//! which is how workers learn that no more records are coming.

use std::fmt;

/// Sending half of the queue. Cheap to clone; one clone per tail engine.
pub struct QueueSender<T> {
    tx: flume::Sender<T>,
}

/// The receiving side of the queue is gone. A producer can only see this if
/// the orchestrator's shutdown ordering was violated — an invariant bug, not
/// a recoverable condition.
#[derive(Debug, PartialEq, Eq)]
pub struct Disconnected;

impl fmt::Display for Disconnected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record queue disconnected")
    }
}

impl std::error::Error for Disconnected {}

impl<T> QueueSender<T> {
    /// Push one item, suspending while the queue is at capacity.
    pub async fn send(&self, item: T) -> Result<(), Disconnected> {
        self.tx.send_async(item).await.map_err(|_| Disconnected)
    }

    /// Items currently buffered.
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Receiving half of the queue. Cheap to clone; one clone per sink worker.
pub struct QueueReceiver<T> {
    rx: flume::Receiver<T>,
}

impl<T> QueueReceiver<T> {
    /// Pull the next item, suspending while the queue is empty. Returns
    /// `None` once the queue is closed (all senders dropped) and drained.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }
}

impl<T> Clone for QueueReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

/// Create a queue holding at most `capacity` items.
pub fn bounded<T>(capacity: usize) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = flume::bounded(capacity);
    (QueueSender { tx }, QueueReceiver { rx })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
