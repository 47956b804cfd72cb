//! Call data builder
//!
//! Two authoring surfaces over the same encoder: typed `add_*` setters for
//! programmatic callers, and [`CallBuilder::args_from_strings`] which coerces
//! user-facing text (decimal or hex numbers, hex byte strings, Base58 or hex
//! addresses, `[a,b,c]` arrays) before delegating to the typed path.

use alloy_primitives::{I256, U256};

use crate::address::Address;
use crate::error::{Error, Result};

use super::codec;
use super::signature::{canonical_signature, selector, split_call};
use super::types::AbiType;
use super::value::AbiValue;
use super::ContractAbi;

/// Builds the byte payload for a contract call or constructor.
#[derive(Debug, Clone)]
pub struct CallBuilder {
    signature: String,
    params: Vec<AbiType>,
    args: Vec<AbiValue>,
}

impl CallBuilder {
    /// From a full call string like `"transfer(address,uint256)"`.
    pub fn new(call: &str) -> Result<Self> {
        let (name, params) = split_call(call)?;
        Ok(CallBuilder {
            signature: canonical_signature(&name, &params),
            params,
            args: Vec::new(),
        })
    }

    /// From a bare method name resolved against a contract ABI
    /// (first-match-wins across overloads).
    pub fn for_function(abi: &ContractAbi, name: &str) -> Result<Self> {
        let entry = abi.function(name)?;
        Ok(CallBuilder {
            signature: entry.signature(),
            params: entry.input_types(),
            args: Vec::new(),
        })
    }

    /// For a contract's constructor; [`build_constructor`](Self::build_constructor)
    /// omits the selector. A missing constructor entry means a parameterless
    /// deployment.
    pub fn for_constructor(abi: &ContractAbi) -> Self {
        let params = abi
            .constructor()
            .map(|e| e.input_types())
            .unwrap_or_default();
        CallBuilder {
            signature: String::new(),
            params,
            args: Vec::new(),
        }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn selector(&self) -> [u8; 4] {
        selector(&self.signature)
    }

    pub fn add_address(self, addr: Address) -> Self {
        self.add_value(AbiValue::Address(addr))
    }

    pub fn add_bool(self, b: bool) -> Self {
        self.add_value(AbiValue::Bool(b))
    }

    pub fn add_uint(self, u: U256) -> Self {
        self.add_value(AbiValue::Uint(u))
    }

    pub fn add_int(self, i: I256) -> Self {
        self.add_value(AbiValue::Int(i))
    }

    pub fn add_fixed_bytes(self, bytes: Vec<u8>) -> Self {
        self.add_value(AbiValue::FixedBytes(bytes))
    }

    pub fn add_bytes(self, bytes: Vec<u8>) -> Self {
        self.add_value(AbiValue::Bytes(bytes))
    }

    pub fn add_string(self, s: impl Into<String>) -> Self {
        self.add_value(AbiValue::String(s.into()))
    }

    pub fn add_array(self, items: Vec<AbiValue>) -> Self {
        self.add_value(AbiValue::Array(items))
    }

    pub fn add_value(mut self, value: AbiValue) -> Self {
        self.args.push(value);
        self
    }

    /// Bulk stringified surface: coerce each argument to the parameter type
    /// at its position. Arity is checked before any coercion.
    pub fn args_from_strings(mut self, args: &[&str]) -> Result<Self> {
        if args.len() != self.params.len() {
            return Err(Error::ParameterCountMismatch {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        for (ty, arg) in self.params.iter().zip(args) {
            self.args.push(coerce(ty, arg)?);
        }
        Ok(self)
    }

    /// Selector followed by the head/tail-encoded arguments.
    ///
    /// Arity is checked before any encoding; a mismatch returns
    /// [`Error::ParameterCountMismatch`] with no partial buffer.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = self.selector().to_vec();
        out.extend_from_slice(&self.encode_args()?);
        Ok(out)
    }

    /// Encoded arguments without a selector, for appending to deployment
    /// bytecode.
    pub fn build_constructor(&self) -> Result<Vec<u8>> {
        self.encode_args()
    }

    fn encode_args(&self) -> Result<Vec<u8>> {
        if self.args.len() != self.params.len() {
            return Err(Error::ParameterCountMismatch {
                expected: self.params.len(),
                actual: self.args.len(),
            });
        }
        codec::encode_tuple(&self.params, &self.args)
    }
}

/// Coerce one stringified value to its declared ABI type.
fn coerce(ty: &AbiType, arg: &str) -> Result<AbiValue> {
    let arg = arg.trim();
    let invalid = |reason: String| Error::InvalidArgument {
        kind: ty.canonical_name(),
        reason,
    };

    match ty {
        AbiType::Address => Ok(AbiValue::Address(
            Address::parse(arg).map_err(|e| invalid(e.to_string()))?,
        )),
        AbiType::Bool => match arg.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(AbiValue::Bool(true)),
            "false" | "0" => Ok(AbiValue::Bool(false)),
            other => Err(invalid(format!("expected true/false, got '{}'", other))),
        },
        AbiType::Uint(_) => {
            let value = if let Some(hex_digits) = strip_hex_prefix(arg) {
                U256::from_str_radix(hex_digits, 16)
            } else {
                U256::from_str_radix(arg, 10)
            }
            .map_err(|e| invalid(e.to_string()))?;
            Ok(AbiValue::Uint(value))
        }
        AbiType::Int(_) => {
            let value = if let Some(hex_digits) = strip_hex_prefix(arg) {
                // Hex input is taken as the raw two's-complement word.
                U256::from_str_radix(hex_digits, 16)
                    .map(I256::from_raw)
                    .map_err(|e| invalid(e.to_string()))?
            } else {
                arg.parse::<I256>().map_err(|e| invalid(e.to_string()))?
            };
            Ok(AbiValue::Int(value))
        }
        AbiType::FixedBytes(len) => {
            let bytes = decode_hex_arg(arg).map_err(invalid)?;
            if bytes.len() != *len {
                return Err(invalid(format!(
                    "expected {} bytes, got {}",
                    len,
                    bytes.len()
                )));
            }
            Ok(AbiValue::FixedBytes(bytes))
        }
        AbiType::Bytes => Ok(AbiValue::Bytes(decode_hex_arg(arg).map_err(invalid)?)),
        AbiType::String => Ok(AbiValue::String(strip_quotes(arg).to_string())),
        AbiType::FixedArray(elem, len) => {
            let items = coerce_array(elem, arg)?;
            if items.len() != *len {
                return Err(invalid(format!(
                    "expected {} elements, got {}",
                    len,
                    items.len()
                )));
            }
            Ok(AbiValue::Array(items))
        }
        AbiType::Array(elem) => Ok(AbiValue::Array(coerce_array(elem, arg)?)),
    }
}

fn coerce_array(elem: &AbiType, arg: &str) -> Result<Vec<AbiValue>> {
    let inner = arg
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| Error::InvalidArgument {
            kind: format!("{}[]", elem.canonical_name()),
            reason: "array values use [a,b,c] form".into(),
        })?;
    split_elements(inner)
        .into_iter()
        .map(|item| coerce(elem, item))
        .collect()
}

/// Split on top-level commas only; nested `[...]` groups stay intact.
fn split_elements(s: &str) -> Vec<&str> {
    let s = s.trim();
    if s.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

fn decode_hex_arg(arg: &str) -> std::result::Result<Vec<u8>, String> {
    let digits = strip_hex_prefix(arg).unwrap_or(arg);
    hex::decode(digits).map_err(|e| format!("bad hex: {}", e))
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"'))
            || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
