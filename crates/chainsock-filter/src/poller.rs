//! Block-height poller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chainsock_core::{TransportError, Uint256};
use tokio::sync::watch;
use tokio::time;

use crate::error::FilterError;
use crate::handler::BlockHandler;
use crate::source::BlockSource;

/// Configuration for [`Poller`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Expected block time. The head is polled every `block_time / 2`.
    pub block_time: Duration,
    /// First height to deliver. Defaults to the head seen on the first tick,
    /// so blocks mined before the poller starts are not delivered unless a
    /// start block is set.
    pub start_block: Option<Uint256>,
    /// Bound on each head query. A query that exceeds it is skipped.
    pub query_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            block_time: Duration::from_secs(8),
            start_block: None,
            query_timeout: Duration::from_secs(8),
        }
    }
}

/// Delivers every block height to a [`BlockHandler`], in order and without
/// gaps, as the chain head advances.
///
/// The cursor lives on the poller, so stopping and running again resumes
/// where delivery left off.
pub struct Poller<S> {
    source: S,
    handler: Arc<dyn BlockHandler>,
    config: PollerConfig,
    /// Next height to deliver.
    cursor: Mutex<Option<Uint256>>,
    stop: watch::Sender<bool>,
}

impl<S: BlockSource> Poller<S> {
    pub fn new(source: S, handler: Arc<dyn BlockHandler>, config: PollerConfig) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            source,
            handler,
            cursor: Mutex::new(config.start_block),
            config,
            stop,
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Next height that will be delivered, once known.
    pub fn next_block(&self) -> Option<Uint256> {
        *self.cursor()
    }

    fn cursor(&self) -> MutexGuard<'_, Option<Uint256>> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask a running loop to return after the current delivery.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Clear a previous [`Poller::stop`] so `run` can be called again.
    pub fn resume(&self) {
        self.stop.send_replace(false);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Poll until stopped.
    ///
    /// Head queries that time out are skipped. Any other query error, and
    /// any handler error, ends the loop; the failed height is not consumed.
    pub async fn run(&self) -> Result<(), FilterError> {
        let interval = self.config.block_time / 2;
        let mut stop = self.stop.subscribe();
        tracing::info!(interval_ms = interval.as_millis() as u64, "poller started");

        loop {
            if *stop.borrow_and_update() {
                tracing::info!("poller stopped");
                return Ok(());
            }
            tokio::select! {
                _ = time::sleep(interval) => {}
                _ = stop.changed() => continue,
            }

            let head = match self.head().await {
                Ok(head) => head,
                Err(e) if e.is_timeout() => {
                    tracing::debug!(error = %e, "head query timed out");
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "head query failed, poller exiting");
                    return Err(e);
                }
            };

            let mut next = *self.cursor().get_or_insert(head);
            while next <= head {
                if self.is_stopped() {
                    break;
                }
                self.handler.on_block(next).await?;
                next = next.checked_add(&Uint256::try_from(1u64)?)?;
                *self.cursor() = Some(next);
            }
        }
    }

    async fn head(&self) -> Result<Uint256, FilterError> {
        let timeout = self.config.query_timeout;
        match time::timeout(timeout, self.source.block_number()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Timeout {
                ms: timeout.as_millis() as u64,
            }
            .into()),
        }
    }
}
