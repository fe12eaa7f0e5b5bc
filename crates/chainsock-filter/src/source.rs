//! Where the pipeline reads chain data from.

use std::sync::Arc;

use async_trait::async_trait;
use chainsock_core::methods::eth;
use chainsock_core::{
    Block, Bytes32, RpcTransport, Transaction, TransactionReceipt, TransportError, Uint256,
};

/// Chain reads needed by [`crate::Filter`] and [`crate::Poller`].
#[async_trait]
pub trait BlockSource: Send + Sync + 'static {
    async fn block_number(&self) -> Result<Uint256, TransportError>;

    async fn block(&self, number: Uint256) -> Result<Option<Block>, TransportError>;

    async fn receipt(&self, hash: Bytes32) -> Result<Option<TransactionReceipt>, TransportError>;

    async fn transaction(&self, hash: Bytes32) -> Result<Option<Transaction>, TransportError>;
}

/// [`BlockSource`] backed by JSON-RPC calls over any transport.
pub struct RpcSource<T> {
    transport: Arc<T>,
}

impl<T> RpcSource<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

impl<T> Clone for RpcSource<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

#[async_trait]
impl<T: RpcTransport> BlockSource for RpcSource<T> {
    async fn block_number(&self) -> Result<Uint256, TransportError> {
        self.transport.execute(eth::block_number()).await
    }

    async fn block(&self, number: Uint256) -> Result<Option<Block>, TransportError> {
        self.transport.execute(eth::get_block_by_number(number)).await
    }

    async fn receipt(&self, hash: Bytes32) -> Result<Option<TransactionReceipt>, TransportError> {
        self.transport.execute(eth::get_transaction_receipt(hash)).await
    }

    async fn transaction(&self, hash: Bytes32) -> Result<Option<Transaction>, TransportError> {
        self.transport.execute(eth::get_transaction_by_hash(hash)).await
    }
}
