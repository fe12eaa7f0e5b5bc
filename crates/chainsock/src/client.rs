//! The client facade: typed calls, contracts, filters and the poller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chainsock_abi::Contract;
use chainsock_core::methods::{eth, personal};
use chainsock_core::{
    Address, Block, BlockId, Bytes32, MethodCall, RpcTransport, SyncStatus, Transaction,
    TransactionObject, TransactionReceipt, TransportError, Uint256,
};
use chainsock_filter::{
    BlockHandler, EventFilter, EventHandler, Filter, FilterError, Poller, PollerConfig,
    ReceiptHandler, RpcSource, TransactionHandler,
};
use chainsock_ws::{Channel, WsTransport};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::contract::CallableContract;
use crate::error::ClientError;

type Source<T> = RpcSource<T>;

/// Async Web3 client over any [`RpcTransport`].
///
/// ```no_run
/// use chainsock::{ClientConfig, Web3Client};
///
/// # async fn run() -> Result<(), chainsock::ClientError> {
/// let client = Web3Client::connect(ClientConfig::new("ws://127.0.0.1:8546"))?;
/// let head = client.block_number().await?;
/// println!("head = {head}");
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Web3Client<T: RpcTransport> {
    transport: Arc<T>,
    filter: Arc<Filter<Source<T>>>,
    poller: Arc<Poller<Source<T>>>,
    poller_task: Mutex<Option<JoinHandle<Result<(), FilterError>>>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    contracts: Mutex<HashMap<String, Arc<Contract>>>,
}

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Web3Client<WsTransport> {
    /// Build a WebSocket transport from `config`, spawn its connection loop
    /// on the current runtime and return the client. The connection is
    /// opened by the loop; requests made before it is up wait in the queue.
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let transport = Arc::new(WsTransport::new(config.url.clone(), config.transport_config()));
        let run = transport.spawn();
        let url = config.url.clone();
        let driver = tokio::spawn(async move {
            match run.await {
                Ok(Ok(())) => tracing::debug!(%url, "transport loop finished"),
                Ok(Err(failure)) => tracing::error!(%url, error = %failure, "transport stopped"),
                Err(e) => tracing::error!(%url, error = %e, "transport task panicked"),
            }
        });
        let client = Self::new(transport, config.poller_config()?);
        *lock(&client.driver) = Some(driver);
        tracing::info!(url = %config.url, "client started");
        Ok(client)
    }

    /// Stop the poller and close the connection.
    pub async fn close(&self) {
        self.stop_poller().await;
        self.transport.close().await;
        let driver = lock(&self.driver).take();
        if let Some(driver) = driver {
            if !driver.is_finished() {
                driver.abort();
            }
        }
    }
}

impl<T: RpcTransport> Web3Client<T> {
    pub fn new(transport: Arc<T>, poller: PollerConfig) -> Self {
        let source = RpcSource::new(Arc::clone(&transport));
        let filter = Arc::new(Filter::new(source.clone()));
        let handler: Arc<dyn BlockHandler> = filter.clone();
        Self {
            poller: Arc::new(Poller::new(source, handler, poller)),
            filter,
            transport,
            poller_task: Mutex::new(None),
            driver: Mutex::new(None),
            contracts: Mutex::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn filter(&self) -> &Arc<Filter<Source<T>>> {
        &self.filter
    }

    /// Run any typed request.
    pub async fn execute<R: DeserializeOwned + Send>(
        &self,
        call: MethodCall<R>,
    ) -> Result<R, ClientError> {
        Ok(self.transport.execute(call).await?)
    }

    // ── eth_* ──

    pub async fn syncing(&self) -> Result<SyncStatus, ClientError> {
        self.execute(eth::syncing()).await
    }

    pub async fn coinbase(&self) -> Result<Address, ClientError> {
        self.execute(eth::coinbase()).await
    }

    pub async fn gas_price(&self) -> Result<Uint256, ClientError> {
        self.execute(eth::gas_price()).await
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.execute(eth::accounts()).await
    }

    pub async fn block_number(&self) -> Result<Uint256, ClientError> {
        self.execute(eth::block_number()).await
    }

    pub async fn get_balance(&self, account: Address, block: BlockId) -> Result<Uint256, ClientError> {
        self.execute(eth::get_balance(account, block)).await
    }

    pub async fn get_block_by_hash(&self, hash: Bytes32) -> Result<Option<Block>, ClientError> {
        self.execute(eth::get_block_by_hash(hash)).await
    }

    pub async fn get_block_by_number(&self, number: Uint256) -> Result<Option<Block>, ClientError> {
        self.execute(eth::get_block_by_number(number)).await
    }

    pub async fn get_transaction_by_hash(
        &self,
        hash: Bytes32,
    ) -> Result<Option<Transaction>, ClientError> {
        self.execute(eth::get_transaction_by_hash(hash)).await
    }

    pub async fn get_transaction_receipt(
        &self,
        hash: Bytes32,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        self.execute(eth::get_transaction_receipt(hash)).await
    }

    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Bytes32, ClientError> {
        self.execute(eth::send_raw_transaction(raw)).await
    }

    /// `eth_call`, returning the raw hex return data.
    pub async fn call(&self, tx: &TransactionObject, block: BlockId) -> Result<String, ClientError> {
        self.execute(eth::call(tx, block)).await
    }

    // ── personal_* ──

    pub async fn personal_send_transaction(
        &self,
        tx: &TransactionObject,
        password: &str,
    ) -> Result<Bytes32, ClientError> {
        self.execute(personal::send_transaction(tx, password)).await
    }

    // ── contracts ──

    /// Parse `abi` and register it under `name`, replacing any previous
    /// registration.
    pub fn register_contract(&self, abi: &str, name: impl Into<String>) -> Result<(), ClientError> {
        let contract = Contract::from_json(abi)?;
        let name = name.into();
        tracing::debug!(contract = %name, "contract registered");
        lock(&self.contracts).insert(name, Arc::new(contract));
        Ok(())
    }

    fn registered(&self, name: &str) -> Result<Arc<Contract>, ClientError> {
        lock(&self.contracts)
            .get(name)
            .cloned()
            .ok_or_else(|| ClientError::UnknownContract(name.to_string()))
    }

    /// A registered contract bound to this client's transport.
    pub fn contract(&self, name: &str) -> Result<CallableContract<T>, ClientError> {
        Ok(CallableContract::new(
            Arc::clone(&self.transport),
            self.registered(name)?,
        ))
    }

    // ── filters ──

    /// Fire `handler` for logs of `contract.event` that pass `filter`.
    pub fn register_event_filter(
        &self,
        contract: &str,
        event: &str,
        filter: EventFilter,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ClientError> {
        let abi = self
            .registered(contract)?
            .event(event)
            .cloned()
            .ok_or_else(|| chainsock_abi::AbiError::UnknownEvent(event.to_string()))?;
        self.filter.set_event_filter(abi, filter, handler)?;
        Ok(())
    }

    pub fn unregister_event_filter(&self, contract: &str, event: &str) -> Result<bool, ClientError> {
        let topic = self
            .registered(contract)?
            .event(event)
            .map(|e| e.topic())
            .ok_or_else(|| chainsock_abi::AbiError::UnknownEvent(event.to_string()))?;
        Ok(self.filter.remove_event_filter(&topic))
    }

    /// Fire `handler` once with the receipt of `hash` when its block is
    /// processed.
    pub fn register_transaction_hash_filter(&self, hash: Bytes32, handler: Arc<dyn ReceiptHandler>) {
        self.filter.set_transaction_hash_filter(hash, handler);
    }

    pub fn unregister_transaction_hash_filter(&self, hash: &Bytes32) -> bool {
        self.filter.remove_transaction_hash_filter(hash)
    }

    pub fn register_address_filter(&self, address: Address, handler: Arc<dyn TransactionHandler>) {
        self.filter.set_address_filter(address, handler);
    }

    pub fn unregister_address_filter(&self, address: &Address) -> bool {
        self.filter.remove_address_filter(address)
    }

    /// Wait for the receipt of `hash` to appear in a processed block.
    ///
    /// Needs the poller running (or blocks fed to [`Web3Client::filter`]).
    /// On timeout the hash filter is removed and `ClientError::Timeout` is
    /// returned.
    pub async fn wait_for_transaction(
        &self,
        hash: Bytes32,
        timeout: Duration,
    ) -> Result<TransactionReceipt, ClientError> {
        let slot = Channel::new();
        self.filter
            .set_transaction_hash_filter(hash, Arc::new(ReceiptSlot(slot.clone())));
        match tokio::time::timeout(timeout, slot.get()).await {
            Ok(receipt) => Ok(receipt?),
            Err(_) => {
                self.filter.remove_transaction_hash_filter(&hash);
                Err(ClientError::Timeout {
                    ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    // ── poller ──

    /// Start delivering blocks to the filter pipeline. A no-op while the
    /// poller is already running.
    pub fn start_poller(&self) {
        let mut task = lock(&self.poller_task);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            tracing::debug!("poller already running");
            return;
        }
        self.poller.resume();
        let poller = Arc::clone(&self.poller);
        *task = Some(tokio::spawn(async move {
            let result = poller.run().await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "poller exited");
            }
            result
        }));
    }

    /// Stop the poller and wait for its loop to exit. The block cursor is
    /// kept, so a later [`Web3Client::start_poller`] resumes without gaps.
    pub async fn stop_poller(&self) {
        self.poller.stop();
        let task = lock(&self.poller_task).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "poller task failed");
            }
        }
    }

    /// Next height the poller will deliver, once known.
    pub fn next_block(&self) -> Option<Uint256> {
        self.poller.next_block()
    }
}

/// Resolves a channel with the first receipt it is handed.
struct ReceiptSlot(Channel<TransactionReceipt, TransportError>);

#[async_trait]
impl ReceiptHandler for ReceiptSlot {
    async fn on_receipt(&self, receipt: &TransactionReceipt) -> Result<(), FilterError> {
        if !self.0.is_resolved() {
            self.0.set_value(receipt.clone());
        }
        Ok(())
    }
}
