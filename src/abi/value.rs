//! Decoded / to-be-encoded ABI values

use alloy_primitives::{I256, U256};

use crate::address::Address;

/// A typed ABI value, mirroring the shape of [`AbiType`](super::AbiType).
///
/// Produced by decoding, or supplied by a caller before encoding. Both fixed
/// and dynamic arrays use the `Array` variant; the companion type carries the
/// shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    Int(I256),
    Uint(U256),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<AbiValue>),
}

impl AbiValue {
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            AbiValue::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            AbiValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Content of either bytes variant.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::FixedBytes(b) | AbiValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[AbiValue]> {
        match self {
            AbiValue::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<Address> for AbiValue {
    fn from(a: Address) -> Self {
        AbiValue::Address(a)
    }
}

impl From<bool> for AbiValue {
    fn from(b: bool) -> Self {
        AbiValue::Bool(b)
    }
}

impl From<U256> for AbiValue {
    fn from(u: U256) -> Self {
        AbiValue::Uint(u)
    }
}

impl From<u64> for AbiValue {
    fn from(u: u64) -> Self {
        AbiValue::Uint(U256::from(u))
    }
}

impl From<I256> for AbiValue {
    fn from(i: I256) -> Self {
        AbiValue::Int(i)
    }
}

impl From<i64> for AbiValue {
    fn from(i: i64) -> Self {
        AbiValue::Int(I256::try_from(i).expect("i64 always fits"))
    }
}

impl From<&str> for AbiValue {
    fn from(s: &str) -> Self {
        AbiValue::String(s.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(s: String) -> Self {
        AbiValue::String(s)
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(b: Vec<u8>) -> Self {
        AbiValue::Bytes(b)
    }
}
