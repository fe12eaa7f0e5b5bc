//! Callback traits invoked by the filter pipeline and the poller.
//!
//! Implement a trait directly, or wrap an async closure with
//! [`handler_fn`]:
//!
//! ```
//! use chainsock_core::TransactionReceipt;
//! use chainsock_filter::{handler_fn, FilterError};
//!
//! let on_receipt = handler_fn(|receipt: TransactionReceipt| async move {
//!     println!("mined in block {}", receipt.block_number);
//!     Ok::<(), FilterError>(())
//! });
//! # let _ = on_receipt;
//! ```

use std::future::Future;

use async_trait::async_trait;
use chainsock_abi::DecodedEvent;
use chainsock_core::{Log, Transaction, TransactionReceipt, Uint256};

use crate::error::FilterError;

/// Called for each log that passes an event filter.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_event(&self, event: &DecodedEvent, log: &Log) -> Result<(), FilterError>;
}

/// Called once with the receipt of a watched transaction hash.
#[async_trait]
pub trait ReceiptHandler: Send + Sync {
    async fn on_receipt(&self, receipt: &TransactionReceipt) -> Result<(), FilterError>;
}

/// Called for each transaction sent from or to a watched address.
#[async_trait]
pub trait TransactionHandler: Send + Sync {
    async fn on_transaction(&self, tx: &Transaction) -> Result<(), FilterError>;
}

/// Called by the poller for every block height, in order and without gaps.
#[async_trait]
pub trait BlockHandler: Send + Sync {
    async fn on_block(&self, number: Uint256) -> Result<(), FilterError>;
}

/// Adapter turning an async closure into a handler. See [`handler_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FnHandler<F>(F);

/// Wrap an async closure taking owned arguments as a handler.
pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> EventHandler for FnHandler<F>
where
    F: Fn(DecodedEvent, Log) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), FilterError>> + Send,
{
    async fn on_event(&self, event: &DecodedEvent, log: &Log) -> Result<(), FilterError> {
        (self.0)(event.clone(), log.clone()).await
    }
}

#[async_trait]
impl<F, Fut> ReceiptHandler for FnHandler<F>
where
    F: Fn(TransactionReceipt) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), FilterError>> + Send,
{
    async fn on_receipt(&self, receipt: &TransactionReceipt) -> Result<(), FilterError> {
        (self.0)(receipt.clone()).await
    }
}

#[async_trait]
impl<F, Fut> TransactionHandler for FnHandler<F>
where
    F: Fn(Transaction) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), FilterError>> + Send,
{
    async fn on_transaction(&self, tx: &Transaction) -> Result<(), FilterError> {
        (self.0)(tx.clone()).await
    }
}

#[async_trait]
impl<F, Fut> BlockHandler for FnHandler<F>
where
    F: Fn(Uint256) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), FilterError>> + Send,
{
    async fn on_block(&self, number: Uint256) -> Result<(), FilterError> {
        (self.0)(number).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn closure_block_handler() {
        let seen = Arc::new(AtomicU64::new(0));
        let handler = handler_fn({
            let seen = seen.clone();
            move |n: Uint256| {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(n.as_u64().unwrap_or_default(), Ordering::SeqCst);
                    Ok::<(), FilterError>(())
                }
            }
        });
        handler.on_block(Uint256::try_from(5u64).unwrap()).await.unwrap();
        handler.on_block(Uint256::try_from(6u64).unwrap()).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 11);
    }
}
