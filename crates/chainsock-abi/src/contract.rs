//! Immutable contract model built from an ABI description.

use std::collections::HashMap;

use chainsock_core::{Bytes32, Bytes4, Value};
use tracing::debug;

use crate::codec::{self, Param};
use crate::entry::{AbiEntry, EntryKind};
use crate::error::AbiError;
use crate::event::AbiEvent;
use crate::function::AbiFunction;

/// The optional constructor entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiConstructor {
    pub inputs: Vec<Param>,
    pub state_mutability: Option<String>,
    pub payable: bool,
}

impl AbiConstructor {
    /// Positional encoding of constructor arguments (no selector), to be
    /// appended to deployment bytecode.
    pub fn encode_args(&self, args: &[Value]) -> Result<Vec<u8>, AbiError> {
        codec::encode_params("constructor", &self.inputs, args)
    }
}

/// The optional fallback entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiFallback {
    pub state_mutability: Option<String>,
    pub payable: bool,
}

/// A parsed contract interface.
///
/// Functions are looked up by name or selector and events by name or
/// topic. Overloading is not modelled: when two functions share a name the
/// later one wins the name lookup, though both stay reachable by selector.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    functions: Vec<AbiFunction>,
    events: Vec<AbiEvent>,
    functions_by_name: HashMap<String, usize>,
    functions_by_selector: HashMap<Bytes4, usize>,
    events_by_name: HashMap<String, usize>,
    events_by_topic: HashMap<Bytes32, usize>,
    constructor: Option<AbiConstructor>,
    fallback: Option<AbiFallback>,
}

impl Contract {
    /// Parse a standard JSON ABI array.
    pub fn from_json(abi: &str) -> Result<Self, AbiError> {
        let entries: Vec<AbiEntry> = serde_json::from_str(abi)?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<AbiEntry>) -> Result<Self, AbiError> {
        let fallbacks = entries
            .iter()
            .filter(|e| e.kind == EntryKind::Fallback)
            .count();
        if fallbacks > 1 {
            return Err(AbiError::MultipleFallbacks { count: fallbacks });
        }

        let mut contract = Self::default();
        for entry in &entries {
            match entry.kind {
                EntryKind::Function => contract.add_function(AbiFunction::from_entry(entry)?),
                EntryKind::Event => contract.add_event(AbiEvent::from_entry(entry)?),
                EntryKind::Constructor => {
                    contract.constructor = Some(AbiConstructor {
                        inputs: codec::resolve_all(&entry.inputs, "constructor")?,
                        state_mutability: entry.state_mutability.clone(),
                        payable: is_payable(entry),
                    });
                }
                EntryKind::Fallback => {
                    contract.fallback = Some(AbiFallback {
                        state_mutability: entry.state_mutability.clone(),
                        payable: is_payable(entry),
                    });
                }
                EntryKind::Other => {}
            }
        }
        Ok(contract)
    }

    fn add_function(&mut self, function: AbiFunction) {
        let idx = self.functions.len();
        if self
            .functions_by_name
            .insert(function.name().to_string(), idx)
            .is_some()
        {
            debug!(function = function.name(), "overloaded function; last declaration wins by name");
        }
        self.functions_by_selector.insert(function.selector(), idx);
        self.functions.push(function);
    }

    fn add_event(&mut self, event: AbiEvent) {
        let idx = self.events.len();
        self.events_by_name.insert(event.name().to_string(), idx);
        self.events_by_topic.insert(event.topic(), idx);
        self.events.push(event);
    }

    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        self.functions_by_name.get(name).map(|&i| &self.functions[i])
    }

    pub fn function_by_selector(&self, selector: &Bytes4) -> Option<&AbiFunction> {
        self.functions_by_selector
            .get(selector)
            .map(|&i| &self.functions[i])
    }

    pub fn event(&self, name: &str) -> Option<&AbiEvent> {
        self.events_by_name.get(name).map(|&i| &self.events[i])
    }

    pub fn event_by_topic(&self, topic: &Bytes32) -> Option<&AbiEvent> {
        self.events_by_topic.get(topic).map(|&i| &self.events[i])
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiFunction> {
        self.functions.iter()
    }

    pub fn events(&self) -> impl Iterator<Item = &AbiEvent> {
        self.events.iter()
    }

    pub fn constructor(&self) -> Option<&AbiConstructor> {
        self.constructor.as_ref()
    }

    pub fn fallback(&self) -> Option<&AbiFallback> {
        self.fallback.as_ref()
    }
}

fn is_payable(entry: &AbiEntry) -> bool {
    entry
        .payable
        .unwrap_or(entry.state_mutability.as_deref() == Some("payable"))
}
