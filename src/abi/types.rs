//! Solidity ABI type names
//!
//! Types are parsed once from their Solidity name (`"uint256[3]"`) and reused;
//! the canonical rendering below is the exact string form that feeds selector
//! and topic hashing, so it must match Solidity's canonicalization.

use std::fmt;

use crate::error::{Error, Result};

/// A parsed Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Bool,
    /// Signed integer, bit width in [8, 256], multiple of 8.
    Int(usize),
    /// Unsigned integer, bit width in [8, 256], multiple of 8.
    Uint(usize),
    /// `bytes1` .. `bytes32`.
    FixedBytes(usize),
    /// Dynamic `bytes`.
    Bytes,
    String,
    /// `T[n]`, n >= 1.
    FixedArray(Box<AbiType>, usize),
    /// `T[]`.
    Array(Box<AbiType>),
}

impl AbiType {
    /// Parse a Solidity type-name string.
    pub fn parse(name: &str) -> Result<Self> {
        let s = name.trim();
        if s.is_empty() {
            return Err(Error::InvalidTypeName(name.to_string()));
        }

        // Array suffixes bind outermost-last: "uint8[2][]" is a dynamic
        // array of uint8[2].
        if let Some(stripped) = s.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Error::InvalidTypeName(name.to_string()))?;
            let elem = Self::parse(&stripped[..open])?;
            let len_str = &stripped[open + 1..];
            return if len_str.is_empty() {
                Ok(AbiType::Array(Box::new(elem)))
            } else {
                let len: usize = len_str
                    .parse()
                    .map_err(|_| Error::InvalidTypeName(name.to_string()))?;
                if len == 0 {
                    return Err(Error::InvalidTypeName(name.to_string()));
                }
                Ok(AbiType::FixedArray(Box::new(elem), len))
            };
        }

        match s {
            "address" => Ok(AbiType::Address),
            "bool" => Ok(AbiType::Bool),
            "string" => Ok(AbiType::String),
            "bytes" => Ok(AbiType::Bytes),
            // Bare int/uint are aliases for the 256-bit width.
            "int" => Ok(AbiType::Int(256)),
            "uint" => Ok(AbiType::Uint(256)),
            _ => {
                if let Some(bits) = s.strip_prefix("uint") {
                    return parse_bits(bits, name).map(AbiType::Uint);
                }
                if let Some(bits) = s.strip_prefix("int") {
                    return parse_bits(bits, name).map(AbiType::Int);
                }
                if let Some(len) = s.strip_prefix("bytes") {
                    let len: usize = len
                        .parse()
                        .map_err(|_| Error::InvalidTypeName(name.to_string()))?;
                    if (1..=32).contains(&len) {
                        return Ok(AbiType::FixedBytes(len));
                    }
                }
                Err(Error::InvalidTypeName(name.to_string()))
            }
        }
    }

    /// The canonical Solidity name, as hashed into selectors and topics.
    pub fn canonical_name(&self) -> String {
        match self {
            AbiType::Address => "address".into(),
            AbiType::Bool => "bool".into(),
            AbiType::Int(bits) => format!("int{}", bits),
            AbiType::Uint(bits) => format!("uint{}", bits),
            AbiType::FixedBytes(len) => format!("bytes{}", len),
            AbiType::Bytes => "bytes".into(),
            AbiType::String => "string".into(),
            AbiType::FixedArray(elem, len) => format!("{}[{}]", elem.canonical_name(), len),
            AbiType::Array(elem) => format!("{}[]", elem.canonical_name()),
        }
    }

    /// Whether the type uses head/tail (offset) encoding in a parent tuple.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(elem, _) => elem.is_dynamic(),
            _ => false,
        }
    }

    /// Bytes this type occupies in a tuple's head region: the full inline
    /// encoding for static types, one 32-byte offset slot for dynamic ones.
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::FixedArray(elem, len) if !self.is_dynamic() => len * elem.head_size(),
            _ => 32,
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

fn parse_bits(s: &str, original: &str) -> Result<usize> {
    let bits: usize = s
        .parse()
        .map_err(|_| Error::InvalidTypeName(original.to_string()))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(Error::InvalidTypeName(original.to_string()));
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalars() {
        assert_eq!(AbiType::parse("address").unwrap(), AbiType::Address);
        assert_eq!(AbiType::parse("bool").unwrap(), AbiType::Bool);
        assert_eq!(AbiType::parse("uint256").unwrap(), AbiType::Uint(256));
        assert_eq!(AbiType::parse("uint8").unwrap(), AbiType::Uint(8));
        assert_eq!(AbiType::parse("int64").unwrap(), AbiType::Int(64));
        assert_eq!(AbiType::parse("uint").unwrap(), AbiType::Uint(256));
        assert_eq!(AbiType::parse("int").unwrap(), AbiType::Int(256));
        assert_eq!(AbiType::parse("bytes32").unwrap(), AbiType::FixedBytes(32));
        assert_eq!(AbiType::parse("bytes1").unwrap(), AbiType::FixedBytes(1));
        assert_eq!(AbiType::parse("bytes").unwrap(), AbiType::Bytes);
        assert_eq!(AbiType::parse("string").unwrap(), AbiType::String);
    }

    #[test]
    fn parse_arrays() {
        assert_eq!(
            AbiType::parse("uint256[]").unwrap(),
            AbiType::Array(Box::new(AbiType::Uint(256)))
        );
        assert_eq!(
            AbiType::parse("uint256[3]").unwrap(),
            AbiType::FixedArray(Box::new(AbiType::Uint(256)), 3)
        );
        assert_eq!(
            AbiType::parse("uint8[2][]").unwrap(),
            AbiType::Array(Box::new(AbiType::FixedArray(Box::new(AbiType::Uint(8)), 2)))
        );
    }

    #[test]
    fn reject_bad_names() {
        assert!(AbiType::parse("uint7").is_err());
        assert!(AbiType::parse("uint512").is_err());
        assert!(AbiType::parse("bytes0").is_err());
        assert!(AbiType::parse("bytes33").is_err());
        assert!(AbiType::parse("uint256[0]").is_err());
        assert!(AbiType::parse("").is_err());
        assert!(AbiType::parse("mapping").is_err());
    }

    #[test]
    fn canonical_round_trip() {
        for name in ["address", "uint256", "int8", "bytes32", "bytes", "string", "uint64[4]", "address[]"] {
            assert_eq!(AbiType::parse(name).unwrap().canonical_name(), name);
        }
    }

    #[test]
    fn dynamic_flags() {
        assert!(AbiType::parse("bytes").unwrap().is_dynamic());
        assert!(AbiType::parse("string").unwrap().is_dynamic());
        assert!(AbiType::parse("uint256[]").unwrap().is_dynamic());
        assert!(AbiType::parse("string[2]").unwrap().is_dynamic());
        assert!(!AbiType::parse("uint256[3]").unwrap().is_dynamic());
        assert!(!AbiType::parse("address").unwrap().is_dynamic());
    }

    #[test]
    fn head_sizes() {
        assert_eq!(AbiType::parse("uint256").unwrap().head_size(), 32);
        assert_eq!(AbiType::parse("uint256[3]").unwrap().head_size(), 96);
        assert_eq!(AbiType::parse("uint8[2][3]").unwrap().head_size(), 192);
        // Dynamic types occupy a single offset slot.
        assert_eq!(AbiType::parse("string").unwrap().head_size(), 32);
        assert_eq!(AbiType::parse("string[2]").unwrap().head_size(), 32);
    }
}
