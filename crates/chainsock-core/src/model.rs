//! Domain structs decoded from node responses.
//!
//! Every numeric field is a [`Uint256`] parsed from a JSON-RPC quantity and
//! every hash or address is range checked at decode time, so a malformed
//! node response fails the request instead of leaking a bad value.

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::types::{Address, Bytes32, Uint256, Uint8};

/// A block header with transaction hashes (`eth_getBlockBy*` with
/// `full_transactions = false`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: Uint256,
    pub hash: Bytes32,
    pub parent_hash: Bytes32,
    pub sha3_uncles: Bytes32,
    #[serde(default)]
    pub logs_bloom: String,
    pub transactions_root: Bytes32,
    pub state_root: Bytes32,
    pub receipts_root: Option<Bytes32>,
    pub miner: Address,
    #[serde(default)]
    pub difficulty: Uint256,
    pub total_difficulty: Option<Uint256>,
    #[serde(default)]
    pub extra_data: String,
    pub size: Option<Uint256>,
    pub gas_limit: Uint256,
    pub gas_used: Uint256,
    pub timestamp: Uint256,
    #[serde(default)]
    pub transactions: Vec<Bytes32>,
    #[serde(default)]
    pub uncles: Vec<Bytes32>,
}

/// A transaction as returned by `eth_getTransactionByHash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: Bytes32,
    pub nonce: Uint256,
    pub block_hash: Option<Bytes32>,
    pub block_number: Option<Uint256>,
    pub transaction_index: Option<Uint256>,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: Uint256,
    pub gas: Uint256,
    pub gas_price: Option<Uint256>,
    #[serde(default)]
    pub input: String,
}

/// A mined transaction's receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: Bytes32,
    pub transaction_index: Uint256,
    pub block_hash: Bytes32,
    pub block_number: Uint256,
    pub from: Option<Address>,
    pub to: Option<Address>,
    /// Set only when the transaction created a contract.
    pub contract_address: Option<Address>,
    pub gas_used: Uint256,
    pub cumulative_gas_used: Option<Uint256>,
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(default)]
    pub logs_bloom: String,
    pub root: Option<Bytes32>,
    /// `1` for success, `0` for failure (post-Byzantium).
    pub status: Option<Uint8>,
}

impl TransactionReceipt {
    /// `true` unless the receipt carries an explicit failure status.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s != Uint8::ZERO)
    }
}

/// A log entry emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<Bytes32>,
    #[serde(default)]
    pub data: String,
    pub block_hash: Option<Bytes32>,
    pub block_number: Option<Uint256>,
    pub transaction_hash: Option<Bytes32>,
    pub transaction_index: Option<Uint256>,
    pub log_index: Option<Uint256>,
    #[serde(default)]
    pub removed: bool,
}

impl Log {
    /// The leading topic, which is the event signature hash for
    /// non-anonymous events.
    pub fn topic(&self) -> Option<&Bytes32> {
        self.topics.first()
    }

    /// Decoded `data` payload.
    pub fn data_bytes(&self) -> Result<Vec<u8>, ValueError> {
        crate::hex::decode(&self.data)
    }
}

/// Sync progress reported by `eth_syncing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProgress {
    pub starting_block: Uint256,
    pub current_block: Uint256,
    pub highest_block: Uint256,
}

/// Result of `eth_syncing`: `false` or a progress object.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    NotSyncing,
    Syncing(SyncProgress),
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool {
        matches!(self, Self::Syncing(_))
    }
}

impl<'de> Deserialize<'de> for SyncStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Progress(SyncProgress),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::NotSyncing),
            Raw::Flag(true) => Err(serde::de::Error::custom(
                "eth_syncing returned `true` without progress",
            )),
            Raw::Progress(p) => Ok(Self::Syncing(p)),
        }
    }
}

/// Call / transaction parameters for `eth_call` and
/// `personal_sendTransaction`. Unset fields are omitted from the wire form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Uint256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<Uint256>,
}

impl TransactionObject {
    pub fn to(to: Address) -> Self {
        Self {
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn from_address(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Attach calldata, hex encoded.
    pub fn data(mut self, data: impl AsRef<[u8]>) -> Self {
        self.data = Some(crate::hex::encode_prefixed(data));
        self
    }

    pub fn value(mut self, value: Uint256) -> Self {
        self.value = Some(value);
        self
    }

    pub fn gas(mut self, gas: Uint256) -> Self {
        self.gas = Some(gas);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
    const ADDR: &str = "0xa7d9ddbe1f17865597fbd27ec712455208b6b76d";

    #[test]
    fn receipt_with_null_contract_address() {
        let receipt: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": HASH,
            "transactionIndex": "0x1",
            "blockHash": HASH,
            "blockNumber": "0xb",
            "from": ADDR,
            "to": ADDR,
            "contractAddress": null,
            "gasUsed": "0x4dc",
            "cumulativeGasUsed": "0x33bc",
            "logs": [{
                "address": ADDR,
                "topics": [HASH],
                "data": "0x",
                "blockNumber": "0xb",
                "logIndex": "0x0"
            }],
            "logsBloom": "0x00",
            "status": "0x1"
        }))
        .unwrap();
        assert!(receipt.contract_address.is_none());
        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number.as_u64(), Some(11));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].topic().unwrap().as_str(), HASH);
        assert!(receipt.logs[0].data_bytes().unwrap().is_empty());
    }

    #[test]
    fn bad_hash_width_fails_decode() {
        let res: Result<Log, _> = serde_json::from_value(json!({
            "address": ADDR,
            "topics": ["0x1234"],
            "data": "0x"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn contract_creation_has_no_recipient() {
        let tx: Transaction = serde_json::from_value(json!({
            "hash": HASH,
            "nonce": "0x0",
            "blockHash": null,
            "blockNumber": null,
            "transactionIndex": null,
            "from": ADDR,
            "to": null,
            "value": "0x0",
            "gas": "0x5208",
            "gasPrice": "0x1",
            "input": "0x6060"
        }))
        .unwrap();
        assert!(tx.to.is_none());
        assert!(tx.block_number.is_none());
        assert_eq!(tx.gas.as_u64(), Some(21000));
    }

    #[test]
    fn syncing_accepts_false_or_object() {
        let not: SyncStatus = serde_json::from_value(json!(false)).unwrap();
        assert_eq!(not, SyncStatus::NotSyncing);
        let busy: SyncStatus = serde_json::from_value(json!({
            "startingBlock": "0x0",
            "currentBlock": "0x10",
            "highestBlock": "0x20"
        }))
        .unwrap();
        assert!(busy.is_syncing());
    }

    #[test]
    fn transaction_object_skips_unset_fields() {
        let to = Address::from_hex(ADDR).unwrap();
        let obj = TransactionObject::to(to).from_address(to).data([0xa9, 0x05]);
        let v = serde_json::to_value(&obj).unwrap();
        assert_eq!(v, json!({ "to": ADDR, "from": ADDR, "data": "0xa905" }));
    }
}
