//! Call and transact sugar over a registered contract.

use std::sync::Arc;

use chainsock_abi::{AbiFunction, Contract, DecodedReturn};
use chainsock_core::methods::{eth, personal};
use chainsock_core::{BlockId, Bytes32, RpcTransport, TransactionObject, Value};

use crate::error::ClientError;

/// A contract bound to a transport.
pub struct CallableContract<T> {
    transport: Arc<T>,
    contract: Arc<Contract>,
}

impl<T> Clone for CallableContract<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            contract: Arc::clone(&self.contract),
        }
    }
}

impl<T: RpcTransport> CallableContract<T> {
    pub fn new(transport: Arc<T>, contract: Arc<Contract>) -> Self {
        Self {
            transport,
            contract,
        }
    }

    pub fn abi(&self) -> &Contract {
        &self.contract
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Result<CallableFunction<'_, T>, ClientError> {
        let function = self
            .contract
            .function(name)
            .ok_or_else(|| chainsock_abi::AbiError::UnknownFunction(name.to_string()))?;
        Ok(CallableFunction {
            transport: &self.transport,
            function,
        })
    }
}

/// A function of a [`CallableContract`], ready to take arguments.
pub struct CallableFunction<'a, T> {
    transport: &'a Arc<T>,
    function: &'a AbiFunction,
}

impl<T: RpcTransport> CallableFunction<'_, T> {
    /// Encode `args` into calldata. Arguments are type checked against the
    /// declared inputs.
    pub fn encode(&self, args: &[Value]) -> Result<EncodedCall<T>, ClientError> {
        let calldata = self.function.encode_call(args)?;
        Ok(EncodedCall {
            transport: Arc::clone(self.transport),
            function: self.function.clone(),
            calldata,
        })
    }
}

/// Encoded calldata plus the function it was built from.
pub struct EncodedCall<T> {
    transport: Arc<T>,
    function: AbiFunction,
    calldata: Vec<u8>,
}

impl<T: RpcTransport> EncodedCall<T> {
    pub fn calldata(&self) -> &[u8] {
        &self.calldata
    }

    pub fn function(&self) -> &AbiFunction {
        &self.function
    }

    /// Run `eth_call` against the latest block and decode the return data.
    ///
    /// `tx` supplies `to` and any other call fields; its `data` is replaced
    /// by the encoded calldata.
    pub async fn call(&self, tx: TransactionObject) -> Result<DecodedReturn, ClientError> {
        let tx = tx.data(&self.calldata);
        let raw = self
            .transport
            .execute(eth::call(&tx, BlockId::Latest))
            .await?;
        tracing::debug!(function = self.function.name(), bytes = raw.len() / 2, "eth_call returned");
        Ok(self.function.decode_return_hex(&raw)?)
    }

    /// Sign with an unlocked node account and submit through
    /// `personal_sendTransaction`. Returns the transaction hash.
    pub async fn transact(
        &self,
        tx: TransactionObject,
        password: &str,
    ) -> Result<Bytes32, ClientError> {
        let tx = tx.data(&self.calldata);
        let hash = self
            .transport
            .execute(personal::send_transaction(&tx, password))
            .await?;
        tracing::info!(function = self.function.name(), %hash, "transaction submitted");
        Ok(hash)
    }
}
