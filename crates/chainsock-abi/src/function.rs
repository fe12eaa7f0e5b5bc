//! Contract functions: selector, call encoding and return decoding.

use chainsock_core::{keccak, Bytes4, Value};
use indexmap::IndexMap;

use crate::codec::{self, Param};
use crate::entry::AbiEntry;
use crate::error::AbiError;

/// A callable contract function.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiFunction {
    name: String,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    signature: String,
    selector: Bytes4,
    constant: bool,
    state_mutability: Option<String>,
    payable: bool,
}

/// Decoded return data.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedReturn {
    /// Exactly one declared output.
    Single(Value),
    /// Zero or several outputs, keyed by name in declaration order.
    Named(IndexMap<String, Value>),
}

impl DecodedReturn {
    pub fn into_single(self) -> Option<Value> {
        match self {
            Self::Single(v) => Some(v),
            Self::Named(_) => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Single(_) => None,
            Self::Named(map) => map.get(name),
        }
    }
}

impl AbiFunction {
    pub fn from_entry(entry: &AbiEntry) -> Result<Self, AbiError> {
        let inputs = codec::resolve_all(&entry.inputs, &entry.name)?;
        let outputs = codec::resolve_all(&entry.outputs, &entry.name)?;
        let signature = codec::signature(&entry.name, &inputs);
        let selector = keccak::selector(&signature);
        let mutability = entry.state_mutability.clone();
        let constant = entry.constant.unwrap_or(matches!(
            mutability.as_deref(),
            Some("view") | Some("pure")
        ));
        let payable = entry
            .payable
            .unwrap_or(mutability.as_deref() == Some("payable"));
        Ok(Self {
            name: entry.name.clone(),
            inputs,
            outputs,
            signature,
            selector,
            constant,
            state_mutability: mutability,
            payable,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn selector(&self) -> Bytes4 {
        self.selector
    }

    /// `true` for read-only functions (`constant`, `view` or `pure`).
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn state_mutability(&self) -> Option<&str> {
        self.state_mutability.as_deref()
    }

    pub fn is_payable(&self) -> bool {
        self.payable
    }

    /// Selector followed by the positional encoding of `args`.
    pub fn encode_call(&self, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        let body = codec::encode_params(&self.name, &self.inputs, args)?;
        let mut out = Vec::with_capacity(4 + body.len());
        out.extend_from_slice(self.selector.as_array());
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode return data into codec values.
    pub fn decode_return(&self, data: &[u8]) -> Result<DecodedReturn, AbiError> {
        let values = codec::decode_params(&self.outputs, data)?;
        if self.outputs.len() == 1 {
            if let Some(v) = values.into_iter().next() {
                return Ok(DecodedReturn::Single(v));
            }
            return Err(AbiError::Decode {
                reason: format!("{}: missing return value", self.name),
            });
        }
        let named = self
            .outputs
            .iter()
            .enumerate()
            .map(|(i, p)| codec::field_name(p, i))
            .zip(values)
            .collect();
        Ok(DecodedReturn::Named(named))
    }

    /// Decode a hex-encoded `eth_call` result.
    pub fn decode_return_hex(&self, data: &str) -> Result<DecodedReturn, AbiError> {
        let bytes = chainsock_core::hex::decode(data)?;
        self.decode_return(&bytes)
    }
}
