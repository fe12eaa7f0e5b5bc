//! Contract events: topic hashing and log decoding.

use std::collections::HashSet;

use chainsock_core::{keccak, Bytes32, Log, Value};
use indexmap::IndexMap;

use crate::codec::{self, Param};
use crate::entry::AbiEntry;
use crate::error::AbiError;

/// An event declared by a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiEvent {
    name: String,
    inputs: Vec<Param>,
    signature: String,
    topic: Bytes32,
    anonymous: bool,
}

/// A log decoded against its event.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub name: String,
    /// Every parameter, indexed or not, in declaration order.
    pub fields: IndexMap<String, Value>,
}

impl DecodedEvent {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl AbiEvent {
    pub fn from_entry(entry: &AbiEntry) -> Result<Self, AbiError> {
        let inputs = codec::resolve_all(&entry.inputs, &entry.name)?;
        let signature = codec::signature(&entry.name, &inputs);
        let topic = keccak::signature_hash(&signature);
        Ok(Self {
            name: entry.name.clone(),
            inputs,
            signature,
            topic,
            anonymous: entry.anonymous,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// `keccak256` of the canonical signature over all parameter types.
    pub fn topic(&self) -> Bytes32 {
        self.topic
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Declared parameter named `name`.
    pub fn field(&self, name: &str) -> Option<&Param> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Decode `log` against this event.
    ///
    /// Returns `Ok(None)` when the log's topic count does not match the
    /// number of indexed parameters, which means the log belongs to a
    /// different event sharing the signature hash or to an anonymous one.
    pub fn decode_log(&self, log: &Log) -> Result<Option<DecodedEvent>, AbiError> {
        self.check_names()?;

        let topics: &[Bytes32] = if self.anonymous {
            &log.topics
        } else {
            log.topics.get(1..).unwrap_or(&[])
        };
        let (indexed, data): (Vec<&Param>, Vec<&Param>) =
            self.inputs.iter().partition(|p| p.indexed);
        if topics.len() != indexed.len() {
            return Ok(None);
        }

        let mut topic_values = Vec::with_capacity(indexed.len());
        for (param, topic) in indexed.iter().zip(topics) {
            topic_values.push(decode_topic(param, topic)?);
        }

        let data_params: Vec<Param> = data.into_iter().cloned().collect();
        let data_bytes = log.data_bytes()?;
        let data_values = codec::decode_params(&data_params, &data_bytes)?;

        let mut topic_iter = topic_values.into_iter();
        let mut data_iter = data_values.into_iter();
        let mut fields = IndexMap::with_capacity(self.inputs.len());
        for (i, param) in self.inputs.iter().enumerate() {
            let value = if param.indexed {
                topic_iter.next()
            } else {
                data_iter.next()
            };
            let value = value.ok_or_else(|| AbiError::Decode {
                reason: format!("{}: missing value for '{}'", self.name, param.name),
            })?;
            fields.insert(codec::field_name(param, i), value);
        }

        Ok(Some(DecodedEvent {
            name: self.name.clone(),
            fields,
        }))
    }

    fn check_names(&self) -> Result<(), AbiError> {
        let indexed: HashSet<&str> = self
            .inputs
            .iter()
            .filter(|p| p.indexed && !p.name.is_empty())
            .map(|p| p.name.as_str())
            .collect();
        match self
            .inputs
            .iter()
            .find(|p| !p.indexed && indexed.contains(p.name.as_str()))
        {
            Some(p) => Err(AbiError::NameCollision {
                event: self.name.clone(),
                name: p.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Indexed value types are stored padded to 32 bytes and can be decoded;
/// `string` and `bytes` are stored as their hash, which is returned raw.
fn decode_topic(param: &Param, topic: &Bytes32) -> Result<Value, AbiError> {
    if param.is_dynamic() {
        return Ok(Value::Bytes32(*topic));
    }
    let decoded = param
        .dyn_ty
        .abi_decode(topic.as_array())
        .map_err(|e| AbiError::Decode {
            reason: format!("topic decode: {e}"),
        })?;
    param.from_dyn(decoded)
}
