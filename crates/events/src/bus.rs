//! Publish/subscribe for committed events.
//!
//! The store is the source of truth and the bus only distributes, at least
//! once. The order projection, the notification fan-out and the realtime
//! feed all sit behind one subscription each and tolerate duplicates.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Outcome of waiting on a subscription.
#[derive(Debug, PartialEq, Eq)]
pub enum Next<M> {
    Message(M),
    /// Nothing arrived in time.
    Idle,
    /// The bus is gone; no more messages will come.
    Closed,
}

/// One consumer's copy of the stream. Drain it from a single thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Already-delivered message, if any.
    pub fn try_recv(&self) -> Option<M> {
        self.receiver.try_recv().ok()
    }

    /// Wait at most `timeout`; worker loops use this to notice shutdown.
    pub fn next_within(&self, timeout: Duration) -> Next<M> {
        match self.receiver.recv_timeout(timeout) {
            Ok(msg) => Next::Message(msg),
            Err(RecvTimeoutError::Timeout) => Next::Idle,
            Err(RecvTimeoutError::Disconnected) => Next::Closed,
        }
    }
}

/// Transport-agnostic bus. `publish` runs after the append, so a failure
/// here leaves the events committed and is reported to the caller.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
