//! Event log interpretation
//!
//! A receipt log carries an ordered topic list and an opaque data buffer.
//! Topic 0 of a non-anonymous event is the event's topic hash; the remaining
//! topics hold the indexed parameters, one word each, and the data buffer
//! holds the non-indexed parameters in tuple encoding. Logs that match no
//! declared event, or that fail to decode against the matched one, come back
//! as [`InterpretedLog::Unrecognized`] so callers can branch without error
//! handling.

use std::collections::BTreeMap;

use alloy_primitives::B256;

use crate::address::Address;
use crate::error::{Error, Result};

use super::codec;
use super::types::AbiType;
use super::value::AbiValue;
use super::{AbiEntry, ContractAbi, EntryKind};

/// An event log as reported by a transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    /// Contract that emitted the log.
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
}

/// One decoded event parameter.
#[derive(Debug, Clone)]
pub struct DecodedParam {
    pub name: String,
    pub kind: AbiType,
    pub indexed: bool,
    pub value: AbiValue,
}

/// A log successfully decoded against a declared event.
///
/// Parameters keep indexed-first ordering: all indexed parameters in
/// declaration order, then all non-indexed ones.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    pub name: String,
    pub signature: String,
    pub params: Vec<DecodedParam>,
}

impl DecodedEvent {
    pub fn value(&self, name: &str) -> Option<&AbiValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn kind(&self, name: &str) -> Option<&AbiType> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.kind)
    }

    /// Parameter name → value view.
    pub fn value_map(&self) -> BTreeMap<&str, &AbiValue> {
        self.params
            .iter()
            .map(|p| (p.name.as_str(), &p.value))
            .collect()
    }

    /// Parameter name → type view.
    pub fn type_map(&self) -> BTreeMap<&str, &AbiType> {
        self.params
            .iter()
            .map(|p| (p.name.as_str(), &p.kind))
            .collect()
    }
}

/// Outcome of matching a log against a contract's declared events.
#[derive(Debug, Clone)]
pub enum InterpretedLog {
    Event(DecodedEvent),
    /// Topic 0 matched no declared event, or the topic/data shape failed to
    /// decode against the matched one. Carries the raw log for fallback
    /// display.
    Unrecognized(EventLog),
}

impl InterpretedLog {
    pub fn is_recognized(&self) -> bool {
        matches!(self, InterpretedLog::Event(_))
    }

    pub fn event(&self) -> Option<&DecodedEvent> {
        match self {
            InterpretedLog::Event(e) => Some(e),
            InterpretedLog::Unrecognized(_) => None,
        }
    }
}

/// Matches logs against one contract's declared events by topic hash.
#[derive(Debug, Clone)]
pub struct LogDecoder {
    /// Non-anonymous events with their precomputed topics, in declaration
    /// order; the first topic match wins.
    events: Vec<(B256, AbiEntry)>,
}

impl LogDecoder {
    pub fn new(abi: &ContractAbi) -> Self {
        let events = abi
            .events()
            .filter(|e| !e.anonymous)
            .map(|e| (e.topic(), e.clone()))
            .collect();
        LogDecoder { events }
    }

    /// Interpret a log. Never fails: anything that cannot be decoded comes
    /// back as [`InterpretedLog::Unrecognized`].
    pub fn interpret(&self, log: EventLog) -> InterpretedLog {
        let Some(first_topic) = log.topics.first() else {
            return InterpretedLog::Unrecognized(log);
        };
        let Some((_, entry)) = self.events.iter().find(|(topic, _)| topic == first_topic) else {
            return InterpretedLog::Unrecognized(log);
        };
        match decode_event(entry, &log) {
            Ok(event) => InterpretedLog::Event(event),
            Err(_) => InterpretedLog::Unrecognized(log),
        }
    }
}

/// Decode a log against a specific event entry.
///
/// Indexed parameters are consumed one per topic starting at topic 1 (topic 0
/// for anonymous events); static indexed types are decoded from the topic
/// word, dynamic indexed types surface as the stored 32-byte hash.
/// Non-indexed parameters are decoded from the data buffer with the tuple
/// rule.
pub fn decode_event(entry: &AbiEntry, log: &EventLog) -> Result<DecodedEvent> {
    debug_assert_eq!(entry.kind, EntryKind::Event);

    let indexed: Vec<&super::Param> = entry.inputs.iter().filter(|p| p.indexed).collect();
    let plain: Vec<&super::Param> = entry.inputs.iter().filter(|p| !p.indexed).collect();

    let first_value_topic = if entry.anonymous { 0 } else { 1 };
    let available = log.topics.len().saturating_sub(first_value_topic);
    if indexed.len() != available {
        return Err(Error::MalformedAbiData(format!(
            "event '{}' declares {} indexed parameters but log carries {} value topics",
            entry.name,
            indexed.len(),
            available
        )));
    }

    let mut params = Vec::with_capacity(entry.inputs.len());

    let value_topics = log.topics.get(first_value_topic..).unwrap_or(&[]);
    for (param, topic) in indexed.iter().zip(value_topics) {
        let value = if param.kind.is_dynamic() {
            // Dynamic indexed values are stored hashed; the original content
            // is unrecoverable.
            AbiValue::FixedBytes(topic.as_slice().to_vec())
        } else {
            codec::decode(&param.kind, topic.as_slice(), 0)?.0
        };
        params.push(DecodedParam {
            name: param.name.clone(),
            kind: param.kind.clone(),
            indexed: true,
            value,
        });
    }

    let plain_types: Vec<AbiType> = plain.iter().map(|p| p.kind.clone()).collect();
    let values = codec::decode_tuple(&plain_types, &log.data)?;
    for (param, value) in plain.iter().zip(values) {
        params.push(DecodedParam {
            name: param.name.clone(),
            kind: param.kind.clone(),
            indexed: false,
            value,
        });
    }

    Ok(DecodedEvent {
        name: entry.name.clone(),
        signature: entry.signature(),
        params,
    })
}

/// Decode a method result buffer against the declared output types.
pub fn decode_outputs(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>> {
    codec::decode_tuple(types, data)
}

/// Decode a result buffer assumed to hold exactly one value of `ty`.
///
/// Violations of that assumption (short buffer, trailing bytes on a static
/// type, bad array shape) fail with [`Error::InvalidCallData`].
pub fn decode_single(ty: &AbiType, data: &[u8]) -> Result<AbiValue> {
    if !ty.is_dynamic() && data.len() != ty.head_size() {
        return Err(Error::InvalidCallData(format!(
            "expected {} bytes for {}, got {}",
            ty.head_size(),
            ty.canonical_name(),
            data.len()
        )));
    }
    let mut values = codec::decode_tuple(std::slice::from_ref(ty), data)
        .map_err(|e| Error::InvalidCallData(e.to_string()))?;
    Ok(values.remove(0))
}
