//! Serde model of a standard JSON interface description.

use serde::{Deserialize, Serialize};

/// The `type` member of an ABI entry. Kinds the model does not use
/// (`receive`, `error`, anything newer) deserialize as [`EntryKind::Other`]
/// and are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Function,
    Event,
    Constructor,
    Fallback,
    #[serde(other)]
    Other,
}

/// One element of the top-level ABI array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    /// Missing `type` means `function`.
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
    #[serde(default)]
    pub anonymous: bool,
}

/// A function input/output or event parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub indexed: bool,
    /// Present on tuple parameters, which are rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<serde_json::Value>>,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            indexed: false,
            components: None,
        }
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}
