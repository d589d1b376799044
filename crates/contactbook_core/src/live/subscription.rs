use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Receiving end of one subscriber registration.
///
/// Dropping the subscription unregisters it; the dispatcher prunes it on
/// its next delivery.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub(crate) fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Blocks for the next message. `None` once the book has shut down.
    pub fn recv(&self) -> Option<M> {
        self.receiver.recv().ok()
    }

    /// Waits up to `timeout` for the next message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<M> {
        match self.receiver.recv_timeout(timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<M> {
        match self.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drains everything already delivered and returns the newest message.
    pub fn latest(&self) -> Option<M> {
        self.receiver.try_iter().last()
    }
}
