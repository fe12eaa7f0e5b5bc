//! Typed request builders for the supported JSON-RPC methods.
//!
//! Each builder validates its arguments through the codec types and returns
//! a [`MethodCall`] that knows how to decode its own result.
//!
//! ```
//! use chainsock_core::methods::eth;
//!
//! let call = eth::block_number();
//! assert_eq!(call.method(), "eth_blockNumber");
//! ```

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, RpcId};
use crate::types::{Address, Bytes32, Uint256};

/// A method name, its parameters, and the type its result decodes into.
#[derive(Debug, Clone)]
pub struct MethodCall<T> {
    method: &'static str,
    params: Vec<Value>,
    _result: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> MethodCall<T> {
    pub fn new(method: &'static str, params: Vec<Value>) -> Self {
        Self {
            method,
            params,
            _result: PhantomData,
        }
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Wire request with the given id.
    pub fn into_request(self, id: RpcId) -> JsonRpcRequest {
        JsonRpcRequest::new(id, self.method, self.params)
    }

    /// Wire request with a fresh random id.
    pub fn request(&self) -> JsonRpcRequest {
        JsonRpcRequest::new(RpcId::random(), self.method, self.params.clone())
    }

    /// Decode the `result` member of the response.
    pub fn decode(&self, result: Value) -> Result<T, TransportError> {
        serde_json::from_value(result).map_err(|e| {
            TransportError::Deserialization(format!("{}: {e}", self.method))
        })
    }
}

/// Which block a state query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    #[default]
    Latest,
    Earliest,
    Pending,
    Number(Uint256),
    Hash(Bytes32),
}

impl BlockId {
    pub fn to_param(&self) -> Value {
        match self {
            Self::Latest => json!("latest"),
            Self::Earliest => json!("earliest"),
            Self::Pending => json!("pending"),
            Self::Number(n) => json!(n.to_quantity()),
            Self::Hash(h) => json!({ "blockHash": h.as_str() }),
        }
    }
}

impl From<Uint256> for BlockId {
    fn from(n: Uint256) -> Self {
        Self::Number(n)
    }
}

/// `eth_*` namespace.
pub mod eth {
    use super::*;
    use crate::model::{Block, SyncStatus, Transaction, TransactionObject, TransactionReceipt};

    pub fn syncing() -> MethodCall<SyncStatus> {
        MethodCall::new("eth_syncing", vec![])
    }

    pub fn coinbase() -> MethodCall<Address> {
        MethodCall::new("eth_coinbase", vec![])
    }

    pub fn gas_price() -> MethodCall<Uint256> {
        MethodCall::new("eth_gasPrice", vec![])
    }

    pub fn accounts() -> MethodCall<Vec<Address>> {
        MethodCall::new("eth_accounts", vec![])
    }

    pub fn block_number() -> MethodCall<Uint256> {
        MethodCall::new("eth_blockNumber", vec![])
    }

    pub fn get_balance(account: Address, block: BlockId) -> MethodCall<Uint256> {
        MethodCall::new("eth_getBalance", vec![json!(account), block.to_param()])
    }

    /// Block with transaction hashes only. Unknown hashes yield `None`.
    pub fn get_block_by_hash(hash: Bytes32) -> MethodCall<Option<Block>> {
        MethodCall::new("eth_getBlockByHash", vec![json!(hash), json!(false)])
    }

    pub fn get_block_by_number(number: Uint256) -> MethodCall<Option<Block>> {
        MethodCall::new(
            "eth_getBlockByNumber",
            vec![json!(number.to_quantity()), json!(false)],
        )
    }

    pub fn get_transaction_by_hash(hash: Bytes32) -> MethodCall<Option<Transaction>> {
        MethodCall::new("eth_getTransactionByHash", vec![json!(hash)])
    }

    /// `None` while the transaction is still pending.
    pub fn get_transaction_receipt(hash: Bytes32) -> MethodCall<Option<TransactionReceipt>> {
        MethodCall::new("eth_getTransactionReceipt", vec![json!(hash)])
    }

    pub fn send_raw_transaction(raw: &[u8]) -> MethodCall<Bytes32> {
        MethodCall::new(
            "eth_sendRawTransaction",
            vec![json!(crate::hex::encode_prefixed(raw))],
        )
    }

    /// Returns the raw hex-encoded return data.
    pub fn call(tx: &TransactionObject, block: BlockId) -> MethodCall<String> {
        MethodCall::new("eth_call", vec![json!(tx), block.to_param()])
    }
}

/// `personal_*` namespace.
pub mod personal {
    use super::*;
    use crate::model::TransactionObject;

    /// Sign with an unlocked node account and submit; returns the tx hash.
    pub fn send_transaction(tx: &TransactionObject, password: &str) -> MethodCall<Bytes32> {
        MethodCall::new("personal_sendTransaction", vec![json!(tx), json!(password)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_number_builder() {
        let call = eth::block_number();
        let req = call.request();
        assert_eq!(req.method, "eth_blockNumber");
        assert!(req.params.is_empty());
        let n = call.decode(json!("0x1b4")).unwrap();
        assert_eq!(n.as_u64(), Some(436));
    }

    #[test]
    fn get_balance_params() {
        let addr = Address::from_array([0x11; 20]);
        let call = eth::get_balance(addr, BlockId::Number(Uint256::try_from(16u64).unwrap()));
        assert_eq!(call.params()[0], json!(addr.as_str()));
        assert_eq!(call.params()[1], json!("0x10"));
        let latest = eth::get_balance(addr, BlockId::default());
        assert_eq!(latest.params()[1], json!("latest"));
    }

    #[test]
    fn block_by_number_uses_quantity() {
        let call = eth::get_block_by_number(Uint256::try_from(255u64).unwrap());
        assert_eq!(call.params(), &[json!("0xff"), json!(false)]);
        assert_eq!(call.decode(Value::Null).unwrap(), None);
    }

    #[test]
    fn decode_failure_names_method() {
        let err = eth::coinbase().decode(json!("0x12")).unwrap_err();
        assert!(matches!(err, TransportError::Deserialization(ref m) if m.starts_with("eth_coinbase")));
    }

    #[test]
    fn into_request_keeps_id() {
        let req = eth::gas_price().into_request(RpcId::number(9));
        assert_eq!(req.id, RpcId::Number(9));
    }
}
