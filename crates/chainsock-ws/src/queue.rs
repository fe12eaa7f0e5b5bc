//! FIFO of requests awaiting the connection.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chainsock_core::{JsonRpcRequest, JsonRpcResponse};
use tokio::sync::Notify;
use tokio::time::{self, Instant};

use crate::channel::Channel;

/// A request and the channel its response is delivered to.
#[derive(Debug)]
pub struct Pending {
    pub request: JsonRpcRequest,
    pub channel: Channel<JsonRpcResponse>,
}

/// Unbounded queue with front insertion for redelivery.
#[derive(Debug, Default)]
pub struct RequestQueue {
    items: Mutex<VecDeque<Pending>>,
    notify: Notify,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<Pending>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_back(&self, item: Pending) {
        self.items().push_back(item);
        self.notify.notify_one();
    }

    /// Put an item back at the head so it is served next.
    pub fn push_front(&self, item: Pending) {
        self.items().push_front(item);
        self.notify.notify_one();
    }

    /// Take the head item, waiting at most `timeout` for one to arrive.
    pub async fn pop(&self, timeout: Duration) -> Option<Pending> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(item) = self.items().pop_front() {
                return Some(item);
            }
            if time::timeout_at(deadline, self.notify.notified()).await.is_err() {
                return self.items().pop_front();
            }
        }
    }

    /// Remove and return everything queued.
    pub fn drain(&self) -> Vec<Pending> {
        self.items().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}
