//! Per-block dispatch of transaction-hash, event and address filters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chainsock_abi::AbiEvent;
use chainsock_core::{Address, Bytes32, Log, Transaction, TransactionReceipt, Uint256};
use futures::future::try_join_all;

use crate::error::FilterError;
use crate::handler::{BlockHandler, EventHandler, ReceiptHandler, TransactionHandler};
use crate::predicate::EventFilter;
use crate::source::BlockSource;

struct EventRegistration {
    event: AbiEvent,
    filter: EventFilter,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
struct Registry {
    /// Keyed by event topic. One registration per event.
    events: HashMap<Bytes32, Arc<EventRegistration>>,
    /// One-shot: removed before the handler fires.
    tx_hashes: HashMap<Bytes32, Arc<dyn ReceiptHandler>>,
    addresses: HashMap<Address, Arc<dyn TransactionHandler>>,
}

/// Runs registered filters against each block handed to [`Filter::on_block`].
///
/// The registry lock is released before any handler runs, so handlers may
/// register or remove filters themselves.
pub struct Filter<S> {
    source: S,
    registry: Mutex<Registry>,
}

impl<S: BlockSource> Filter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Watch logs of `event`. Replaces any filter already set for the same
    /// event topic.
    pub fn set_event_filter(
        &self,
        event: AbiEvent,
        filter: EventFilter,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), FilterError> {
        filter.validate(&event)?;
        let topic = event.topic();
        tracing::debug!(event = event.name(), %topic, "event filter registered");
        let registration = EventRegistration {
            event,
            filter,
            handler,
        };
        self.registry().events.insert(topic, Arc::new(registration));
        Ok(())
    }

    /// Returns `true` if a filter was removed.
    pub fn remove_event_filter(&self, topic: &Bytes32) -> bool {
        self.registry().events.remove(topic).is_some()
    }

    /// Fire `handler` once with the receipt of `hash`.
    pub fn set_transaction_hash_filter(&self, hash: Bytes32, handler: Arc<dyn ReceiptHandler>) {
        self.registry().tx_hashes.insert(hash, handler);
    }

    pub fn remove_transaction_hash_filter(&self, hash: &Bytes32) -> bool {
        self.registry().tx_hashes.remove(hash).is_some()
    }

    /// Fire `handler` for each transaction sent from or to `address`.
    pub fn set_address_filter(&self, address: Address, handler: Arc<dyn TransactionHandler>) {
        self.registry().addresses.insert(address, handler);
    }

    pub fn remove_address_filter(&self, address: &Address) -> bool {
        self.registry().addresses.remove(address).is_some()
    }

    /// Registered (event, transaction hash, address) filter counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        let registry = self.registry();
        (
            registry.events.len(),
            registry.tx_hashes.len(),
            registry.addresses.len(),
        )
    }

    /// Fetch block `number` with its receipts and transactions, then run
    /// hash filters, event filters and address filters in that order.
    pub async fn process_block(&self, number: Uint256) -> Result<(), FilterError> {
        let block = self
            .source
            .block(number)
            .await?
            .ok_or_else(|| FilterError::Missing {
                kind: "block",
                id: number.to_string(),
            })?;

        let receipts = try_join_all(block.transactions.iter().map(|hash| async move {
            self.source
                .receipt(*hash)
                .await?
                .ok_or_else(|| FilterError::Missing {
                    kind: "receipt",
                    id: hash.to_string(),
                })
        }))
        .await?;
        let transactions = try_join_all(block.transactions.iter().map(|hash| async move {
            self.source
                .transaction(*hash)
                .await?
                .ok_or_else(|| FilterError::Missing {
                    kind: "transaction",
                    id: hash.to_string(),
                })
        }))
        .await?;

        tracing::debug!(
            block = %number,
            transactions = transactions.len(),
            "processing block"
        );

        self.run_hash_filters(&receipts).await;
        self.run_event_filters(&receipts).await;
        self.run_address_filters(&transactions).await;
        Ok(())
    }

    async fn run_hash_filters(&self, receipts: &[TransactionReceipt]) {
        for receipt in receipts {
            let handler = self.registry().tx_hashes.remove(&receipt.transaction_hash);
            if let Some(handler) = handler {
                if let Err(e) = handler.on_receipt(receipt).await {
                    tracing::warn!(tx = %receipt.transaction_hash, error = %e, "receipt handler failed");
                }
            }
        }
    }

    async fn run_event_filters(&self, receipts: &[TransactionReceipt]) {
        for log in receipts.iter().flat_map(|r| r.logs.iter()) {
            self.run_event_filter(log).await;
        }
    }

    async fn run_event_filter(&self, log: &Log) {
        let Some(topic) = log.topic() else { return };
        let registration = self.registry().events.get(topic).cloned();
        let Some(registration) = registration else { return };

        let event = match registration.event.decode_log(log) {
            Ok(Some(event)) => event,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(event = registration.event.name(), error = %e, "log decode failed");
                return;
            }
        };
        match registration.filter.test(&event, log) {
            Ok(true) => {
                if let Err(e) = registration.handler.on_event(&event, log).await {
                    tracing::warn!(event = %event.name, error = %e, "event handler failed");
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(event = %event.name, error = %e, "event filter predicate failed, skipping log");
            }
        }
    }

    async fn run_address_filters(&self, transactions: &[Transaction]) {
        for tx in transactions {
            let handler = {
                let registry = self.registry();
                registry
                    .addresses
                    .get(&tx.from)
                    .or_else(|| tx.to.as_ref().and_then(|to| registry.addresses.get(to)))
                    .cloned()
            };
            if let Some(handler) = handler {
                if let Err(e) = handler.on_transaction(tx).await {
                    tracing::warn!(tx = %tx.hash, error = %e, "transaction handler failed");
                }
            }
        }
    }
}

#[async_trait]
impl<S: BlockSource> BlockHandler for Filter<S> {
    async fn on_block(&self, number: Uint256) -> Result<(), FilterError> {
        self.process_block(number).await
    }
}
