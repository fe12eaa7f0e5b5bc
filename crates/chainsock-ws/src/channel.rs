//! Single-assignment rendezvous between a request and its response.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chainsock_core::TransportError;
use tokio::sync::Notify;

struct Inner<T, E> {
    slot: Mutex<Option<Result<T, E>>>,
    notify: Notify,
}

/// A write-once slot that any number of tasks can await.
///
/// Cloning yields another handle to the same slot. The first resolution
/// wakes every waiter; resolving a second time is a contract violation and
/// panics.
pub struct Channel<T, E = TransportError> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for Channel<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for Channel<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for Channel<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T, E> Channel<T, E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Result<T, E>>> {
        self.inner.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_resolved(&self) -> bool {
        self.slot().is_some()
    }

    /// Store the outcome and wake all waiters.
    ///
    /// # Panics
    /// If the channel was already resolved.
    pub fn resolve(&self, outcome: Result<T, E>) {
        {
            let mut slot = self.slot();
            assert!(slot.is_none(), "channel resolved twice");
            *slot = Some(outcome);
        }
        self.inner.notify.notify_waiters();
    }

    pub fn set_value(&self, value: T) {
        self.resolve(Ok(value));
    }

    pub fn set_error(&self, error: E) {
        self.resolve(Err(error));
    }
}

impl<T: Clone, E: Clone> Channel<T, E> {
    /// Non-suspending probe; `None` while pending.
    pub fn try_get(&self) -> Option<Result<T, E>> {
        self.slot().clone()
    }

    /// Wait for the outcome.
    pub async fn get(&self) -> Result<T, E> {
        loop {
            // Registered before the check so a concurrent resolve cannot be missed.
            let notified = self.inner.notify.notified();
            if let Some(outcome) = self.try_get() {
                return outcome;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn all_waiters_wake_on_resolve() {
        let ch: Channel<u32, String> = Channel::new();
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let ch = ch.clone();
                tokio::spawn(async move { ch.get().await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(ch.try_get().is_none());
        ch.set_value(7);
        for w in waiters {
            assert_eq!(w.await.unwrap(), Ok(7));
        }
    }

    #[tokio::test]
    async fn get_after_resolve_returns_immediately() {
        let ch: Channel<u32, String> = Channel::new();
        ch.set_error("boom".into());
        assert!(ch.is_resolved());
        assert_eq!(ch.get().await, Err("boom".to_string()));
        assert_eq!(ch.try_get(), Some(Err("boom".to_string())));
    }

    #[test]
    #[should_panic(expected = "channel resolved twice")]
    fn second_resolution_panics() {
        let ch: Channel<u32, String> = Channel::new();
        ch.set_value(1);
        ch.set_value(2);
    }
}
