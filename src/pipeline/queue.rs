//! FIFO hand-off queue with a cooperative stop flag
//!
//! Pushing never blocks. A blocked `pop` wakes every poll interval to check
//! whether a stop was requested, so consumers can be shut down even while
//! producers still hold senders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Shared stop request flag
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Outcome of a `pop`
#[derive(Debug, PartialEq, Eq)]
pub enum Popped<T> {
    Item(T),
    /// Stop requested and nothing left to drain
    Stopped,
    /// Every sender dropped and nothing left to drain
    Closed,
}

/// Producer side; cheap to clone
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::UnboundedSender<T>,
    stop: StopHandle,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            stop: self.stop.clone(),
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueue without blocking; false once the receiver is gone
    pub fn push(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }

    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

/// Consumer side
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::UnboundedReceiver<T>,
    stop: StopHandle,
    poll_interval: Duration,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next item, a drained stop, or a drained close
    pub async fn pop(&mut self) -> Popped<T> {
        loop {
            match tokio::time::timeout(self.poll_interval, self.rx.recv()).await {
                Ok(Some(item)) => return Popped::Item(item),
                Ok(None) => return Popped::Closed,
                Err(_) if self.stop.is_stop_requested() => {
                    return match self.rx.try_recv() {
                        Ok(item) => Popped::Item(item),
                        Err(TryRecvError::Empty) => Popped::Stopped,
                        Err(TryRecvError::Disconnected) => Popped::Closed,
                    };
                }
                Err(_) => continue,
            }
        }
    }

    pub fn request_stop(&self) {
        self.stop.request_stop();
    }
}

/// Queue with its own stop flag
pub fn channel<T>(poll_interval: Duration) -> (QueueSender<T>, QueueReceiver<T>) {
    channel_with_stop(poll_interval, StopHandle::new())
}

/// Queue sharing an existing stop flag
pub fn channel_with_stop<T>(
    poll_interval: Duration,
    stop: StopHandle,
) -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        QueueSender {
            tx,
            stop: stop.clone(),
        },
        QueueReceiver {
            rx,
            stop,
            poll_interval,
        },
    )
}
