//! Solidity ABI v1 encoder/decoder
//!
//! Head/tail encoding: static values are inlined into 32-byte slots, dynamic
//! values get a 32-byte offset word in the head and their content appended to
//! the tail. Addresses are the one chain-specific case: an ABI slot carries
//! the bare 20-byte account hash, while the rest of the toolkit works with the
//! 21-byte prefixed form, so encoding strips the marker and decoding restores
//! it.
//!
//! Integer slots are not range-checked against the declared bit width; an
//! oversized value is truncated on encode and a wide value is taken as-is on
//! decode, matching the silent-truncation behavior of the wire format's other
//! clients.

use alloy_primitives::{I256, U256};

use crate::address::Address;
use crate::error::{Error, Result};

use super::types::AbiType;
use super::value::AbiValue;

const WORD: usize = 32;

/// Encode a single value.
///
/// For static types this is the inline slot form; for dynamic types it is the
/// tail content (length header plus padded payload), without the offset word a
/// parent tuple would add.
pub fn encode(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>> {
    match (ty, value) {
        (AbiType::Address, AbiValue::Address(addr)) => {
            let mut slot = [0u8; WORD];
            slot[12..].copy_from_slice(addr.payload());
            Ok(slot.to_vec())
        }
        (AbiType::Bool, AbiValue::Bool(b)) => {
            let mut slot = [0u8; WORD];
            slot[31] = *b as u8;
            Ok(slot.to_vec())
        }
        (AbiType::Uint(bits), AbiValue::Uint(u)) => {
            let masked = if *bits < 256 {
                *u & ((U256::from(1u8) << *bits) - U256::from(1u8))
            } else {
                *u
            };
            Ok(masked.to_be_bytes::<WORD>().to_vec())
        }
        (AbiType::Int(_), AbiValue::Int(i)) => Ok(i.to_be_bytes::<WORD>().to_vec()),
        (AbiType::FixedBytes(len), AbiValue::FixedBytes(bytes)) => {
            if bytes.len() != *len {
                return Err(Error::InvalidArgument {
                    kind: ty.canonical_name(),
                    reason: format!("expected {} bytes, got {}", len, bytes.len()),
                });
            }
            let mut slot = [0u8; WORD];
            slot[..*len].copy_from_slice(bytes);
            Ok(slot.to_vec())
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => Ok(encode_length_prefixed(bytes)),
        (AbiType::String, AbiValue::String(s)) => Ok(encode_length_prefixed(s.as_bytes())),
        (AbiType::FixedArray(elem, len), AbiValue::Array(items)) => {
            if items.len() != *len {
                return Err(Error::InvalidArgument {
                    kind: ty.canonical_name(),
                    reason: format!("expected {} elements, got {}", len, items.len()),
                });
            }
            encode_array_body(elem, items)
        }
        (AbiType::Array(elem), AbiValue::Array(items)) => {
            let mut out = encode_usize(items.len()).to_vec();
            out.extend_from_slice(&encode_array_body(elem, items)?);
            Ok(out)
        }
        (ty, value) => Err(Error::InvalidArgument {
            kind: ty.canonical_name(),
            reason: format!("value {:?} does not match type", value),
        }),
    }
}

/// Encode an ordered argument list with the tuple head/tail rule.
///
/// This is what follows the selector in call data and what a constructor
/// appends to deployment bytecode.
pub fn encode_tuple(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>> {
    if types.len() != values.len() {
        return Err(Error::ParameterCountMismatch {
            expected: types.len(),
            actual: values.len(),
        });
    }

    let head_len: usize = types.iter().map(AbiType::head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for (ty, value) in types.iter().zip(values) {
        if ty.is_dynamic() {
            head.extend_from_slice(&encode_usize(head_len + tail.len()));
            tail.extend_from_slice(&encode(ty, value)?);
        } else {
            head.extend_from_slice(&encode(ty, value)?);
        }
    }

    head.extend_from_slice(&tail);
    Ok(head)
}

/// Element area of an array: inline for static elements, per-element offsets
/// (relative to the start of the area) plus tails for dynamic ones.
fn encode_array_body(elem: &AbiType, items: &[AbiValue]) -> Result<Vec<u8>> {
    if elem.is_dynamic() {
        let head_len = items.len() * WORD;
        let mut head = Vec::with_capacity(head_len);
        let mut tail: Vec<u8> = Vec::new();
        for item in items {
            head.extend_from_slice(&encode_usize(head_len + tail.len()));
            tail.extend_from_slice(&encode(elem, item)?);
        }
        head.extend_from_slice(&tail);
        Ok(head)
    } else {
        let mut out = Vec::with_capacity(items.len() * elem.head_size());
        for item in items {
            out.extend_from_slice(&encode(elem, item)?);
        }
        Ok(out)
    }
}

fn encode_length_prefixed(content: &[u8]) -> Vec<u8> {
    let mut out = encode_usize(content.len()).to_vec();
    out.extend_from_slice(content);
    out.resize(WORD + padded_len(content.len()), 0);
    out
}

fn encode_usize(n: usize) -> [u8; WORD] {
    U256::from(n).to_be_bytes::<WORD>()
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Decode one value of `ty` whose encoding starts at `offset`.
///
/// For dynamic types `offset` must point at the start of the content (the
/// length header), not at an offset word; [`decode_tuple`] resolves the
/// indirection. Returns the value and the offset one past the last byte it
/// consumed.
pub fn decode(ty: &AbiType, buf: &[u8], offset: usize) -> Result<(AbiValue, usize)> {
    match ty {
        AbiType::Address => {
            let slot = word(buf, offset)?;
            let addr = Address::from_bytes(&slot[12..])
                .map_err(|e| Error::MalformedAbiData(e.to_string()))?;
            Ok((AbiValue::Address(addr), offset + WORD))
        }
        AbiType::Bool => {
            let slot = word(buf, offset)?;
            Ok((AbiValue::Bool(slot.iter().any(|b| *b != 0)), offset + WORD))
        }
        AbiType::Uint(_) => {
            let slot = word(buf, offset)?;
            Ok((AbiValue::Uint(U256::from_be_slice(slot)), offset + WORD))
        }
        AbiType::Int(_) => {
            let slot = word(buf, offset)?;
            let mut arr = [0u8; WORD];
            arr.copy_from_slice(slot);
            Ok((AbiValue::Int(I256::from_be_bytes(arr)), offset + WORD))
        }
        AbiType::FixedBytes(len) => {
            let slot = word(buf, offset)?;
            Ok((AbiValue::FixedBytes(slot[..*len].to_vec()), offset + WORD))
        }
        AbiType::Bytes => {
            let (content, next) = decode_length_prefixed(buf, offset)?;
            Ok((AbiValue::Bytes(content.to_vec()), next))
        }
        AbiType::String => {
            let (content, next) = decode_length_prefixed(buf, offset)?;
            let s = std::str::from_utf8(content)
                .map_err(|_| Error::MalformedAbiData("string content is not UTF-8".into()))?;
            Ok((AbiValue::String(s.to_string()), next))
        }
        AbiType::FixedArray(elem, len) => {
            let (items, next) = decode_array_body(elem, *len, buf, offset)?;
            Ok((AbiValue::Array(items), next))
        }
        AbiType::Array(elem) => {
            let len = decode_usize(buf, offset)?;
            // A length header must not promise more element slots than the
            // buffer can hold.
            let remaining = buf.len().saturating_sub(offset + WORD);
            if len.saturating_mul(elem.head_size()) > remaining {
                return Err(Error::MalformedAbiData(format!(
                    "array length {} overruns buffer ({} bytes remaining)",
                    len, remaining
                )));
            }
            let (items, next) = decode_array_body(elem, len, buf, offset + WORD)?;
            Ok((AbiValue::Array(items), next))
        }
    }
}

/// Decode an ordered result/argument list with the tuple head/tail rule.
pub fn decode_tuple(types: &[AbiType], buf: &[u8]) -> Result<Vec<AbiValue>> {
    let mut values = Vec::with_capacity(types.len());
    let mut head_offset = 0usize;

    for ty in types {
        if ty.is_dynamic() {
            let content = decode_usize(buf, head_offset)?;
            let (value, _) = decode(ty, buf, content)?;
            values.push(value);
            head_offset += WORD;
        } else {
            let (value, next) = decode(ty, buf, head_offset)?;
            values.push(value);
            head_offset = next;
        }
    }

    Ok(values)
}

fn decode_array_body(
    elem: &AbiType,
    len: usize,
    buf: &[u8],
    base: usize,
) -> Result<(Vec<AbiValue>, usize)> {
    let mut items = Vec::with_capacity(len.min(1024));
    if elem.is_dynamic() {
        // Element offsets are relative to the start of the element area.
        let mut end = base + len * WORD;
        for i in 0..len {
            let rel = decode_usize(buf, base + i * WORD)?;
            let (value, elem_end) = decode(elem, buf, base + rel)?;
            items.push(value);
            end = end.max(elem_end);
        }
        Ok((items, end))
    } else {
        let mut offset = base;
        for _ in 0..len {
            let (value, next) = decode(elem, buf, offset)?;
            items.push(value);
            offset = next;
        }
        Ok((items, offset))
    }
}

fn decode_length_prefixed(buf: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    let len = decode_usize(buf, offset)?;
    let start = offset + WORD;
    if buf.len() < start + len {
        return Err(Error::MalformedAbiData(format!(
            "length header {} overruns buffer of {} bytes",
            len,
            buf.len()
        )));
    }
    Ok((&buf[start..start + len], start + padded_len(len)))
}

fn decode_usize(buf: &[u8], offset: usize) -> Result<usize> {
    let slot = word(buf, offset)?;
    let n = U256::from_be_slice(slot);
    usize::try_from(n)
        .map_err(|_| Error::MalformedAbiData(format!("length word {} does not fit usize", n)))
}

fn word(buf: &[u8], offset: usize) -> Result<&[u8]> {
    if buf.len() < offset + WORD {
        return Err(Error::MalformedAbiData(format!(
            "need 32 bytes at offset {}, buffer is {} bytes",
            offset,
            buf.len()
        )));
    }
    Ok(&buf[offset..offset + WORD])
}
