//! Contract ABI model and the codec/builder/decoder layers on top of it
//!
//! A [`ContractAbi`] is parsed once from JSON (either the bare entry array or
//! the wrapped object a node returns with contract metadata) and is read-only
//! afterwards. Everything else in this module is a pure function over the
//! parsed ABI and byte buffers.

mod builder;
mod codec;
mod event;
mod signature;
mod types;
mod value;

pub use builder::CallBuilder;
pub use codec::{decode, decode_tuple, encode, encode_tuple};
pub use event::{
    decode_event, decode_outputs, decode_single, DecodedEvent, DecodedParam, EventLog,
    InterpretedLog, LogDecoder,
};
pub use signature::{canonical_signature, selector, split_call, topic};
pub use types::AbiType;
pub use value::AbiValue;

use alloy_primitives::B256;
use serde::Deserialize;

use crate::error::{Error, Result};

/// What kind of ABI entry this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Constructor,
    Function,
    Event,
    Fallback,
}

/// Declared state mutability of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

impl StateMutability {
    /// Pure and view functions can be executed without broadcasting a
    /// transaction.
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

/// A named, typed parameter of a function or event.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub kind: AbiType,
    /// Events only: stored in the log's topic list instead of its data.
    pub indexed: bool,
}

/// One entry of a contract ABI.
#[derive(Debug, Clone)]
pub struct AbiEntry {
    pub kind: EntryKind,
    /// Empty for constructors and fallbacks.
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
    /// Events only: anonymous events do not put their topic at index 0.
    pub anonymous: bool,
}

impl AbiEntry {
    /// Canonical signature derived from the ordered input types.
    pub fn signature(&self) -> String {
        let types: Vec<AbiType> = self.inputs.iter().map(|p| p.kind.clone()).collect();
        signature::canonical_signature(&self.name, &types)
    }

    /// Method selector for a function entry.
    pub fn selector(&self) -> [u8; 4] {
        signature::selector(&self.signature())
    }

    /// Event topic for an event entry.
    pub fn topic(&self) -> B256 {
        signature::topic(&self.signature())
    }

    pub fn input_types(&self) -> Vec<AbiType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<AbiType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }
}

/// An ordered, immutable contract ABI.
#[derive(Debug, Clone, Default)]
pub struct ContractAbi {
    entries: Vec<AbiEntry>,
}

impl ContractAbi {
    /// Parse from JSON. Accepts the bare entry array, or an object wrapping
    /// it under `"entrys"` (node contract metadata) or `"abi"` (compiler
    /// output).
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidAbi(e.to_string()))?;
        let array = match &value {
            serde_json::Value::Array(_) => &value,
            serde_json::Value::Object(map) => map
                .get("entrys")
                .or_else(|| map.get("abi"))
                .ok_or_else(|| Error::InvalidAbi("no entry array found".into()))?,
            _ => return Err(Error::InvalidAbi("expected array or object".into())),
        };
        let raw: Vec<RawEntry> = serde_json::from_value(array.clone())
            .map_err(|e| Error::InvalidAbi(e.to_string()))?;

        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            if let Some(converted) = entry.convert()? {
                entries.push(converted);
            }
        }
        Ok(ContractAbi { entries })
    }

    pub fn entries(&self) -> &[AbiEntry] {
        &self.entries
    }

    /// First function entry with the given name, in ABI declaration order.
    ///
    /// Overloads sharing a name resolve to the first declaration; callers
    /// needing a specific overload must go through the full signature.
    pub fn function(&self, name: &str) -> Result<&AbiEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Function && e.name == name)
            .ok_or_else(|| Error::UnknownMethod(name.to_string()))
    }

    /// First event entry with the given name, same overload caveat as
    /// [`function`](Self::function).
    pub fn event(&self, name: &str) -> Result<&AbiEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Event && e.name == name)
            .ok_or_else(|| Error::UnknownEvent(name.to_string()))
    }

    pub fn constructor(&self) -> Option<&AbiEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == EntryKind::Constructor)
    }

    pub fn events(&self) -> impl Iterator<Item = &AbiEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Event)
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Function)
    }

    pub fn method_signature(&self, name: &str) -> Result<String> {
        Ok(self.function(name)?.signature())
    }

    pub fn event_signature(&self, name: &str) -> Result<String> {
        Ok(self.event(name)?.signature())
    }

    pub fn methods_signatures(&self) -> Vec<String> {
        self.functions().map(AbiEntry::signature).collect()
    }

    pub fn events_signatures(&self) -> Vec<String> {
        self.events().map(AbiEntry::signature).collect()
    }

    pub fn state_mutability(&self, name: &str) -> Result<StateMutability> {
        Ok(self.function(name)?.state_mutability)
    }

    pub fn is_read_only(&self, name: &str) -> Result<bool> {
        Ok(self.state_mutability(name)?.is_read_only())
    }
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    indexed: bool,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(rename = "stateMutability")]
    state_mutability: Option<String>,
    // Legacy pre-mutability flags still seen in deployed-contract metadata.
    constant: Option<bool>,
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

impl RawEntry {
    /// Convert to the typed entry, or `None` for entry kinds this toolkit
    /// does not model (errors, receive).
    fn convert(self) -> Result<Option<AbiEntry>> {
        let kind = match self.kind.to_ascii_lowercase().as_str() {
            "constructor" => EntryKind::Constructor,
            "function" => EntryKind::Function,
            "event" => EntryKind::Event,
            "fallback" => EntryKind::Fallback,
            _ => return Ok(None),
        };

        let state_mutability = match self.state_mutability.as_deref() {
            Some(s) => match s.to_ascii_lowercase().as_str() {
                "pure" => StateMutability::Pure,
                "view" => StateMutability::View,
                "payable" => StateMutability::Payable,
                "nonpayable" => StateMutability::Nonpayable,
                other => {
                    return Err(Error::InvalidAbi(format!(
                        "unknown stateMutability '{}'",
                        other
                    )))
                }
            },
            None => {
                if self.payable == Some(true) {
                    StateMutability::Payable
                } else if self.constant == Some(true) {
                    StateMutability::View
                } else {
                    StateMutability::Nonpayable
                }
            }
        };

        Ok(Some(AbiEntry {
            kind,
            name: self.name,
            inputs: convert_params(self.inputs)?,
            outputs: convert_params(self.outputs)?,
            state_mutability,
            anonymous: self.anonymous,
        }))
    }
}

fn convert_params(raw: Vec<RawParam>) -> Result<Vec<Param>> {
    raw.into_iter()
        .map(|p| {
            let kind = AbiType::parse(&p.kind)
                .map_err(|_| Error::InvalidAbi(format!("unknown type '{}'", p.kind)))?;
            Ok(Param {
                name: p.name,
                kind,
                indexed: p.indexed,
            })
        })
        .collect()
}
