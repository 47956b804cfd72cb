//! Chain-native account addresses
//!
//! Addresses on the wire are 21 bytes: a fixed one-byte network marker
//! followed by the 20-byte account hash. The textual form is Base58Check
//! over the full 21 bytes. Inside a 32-byte ABI slot only the 20-byte hash
//! appears; the codec strips and re-attaches the marker.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Network marker byte prefixing every native address.
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Length of the native (prefixed) address form.
pub const ADDRESS_LEN: usize = 21;

/// A 21-byte prefixed account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero account hash, still carrying the network marker.
    pub fn zero() -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        Address(bytes)
    }

    /// Build from raw bytes: either the 21-byte prefixed form or the bare
    /// 20-byte account hash (the marker is attached).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            ADDRESS_LEN => {
                if bytes[0] != ADDRESS_PREFIX {
                    return Err(Error::InvalidAddress(format!(
                        "expected prefix byte 0x{:02x}, got 0x{:02x}",
                        ADDRESS_PREFIX, bytes[0]
                    )));
                }
                let mut arr = [0u8; ADDRESS_LEN];
                arr.copy_from_slice(bytes);
                Ok(Address(arr))
            }
            20 => {
                let mut arr = [0u8; ADDRESS_LEN];
                arr[0] = ADDRESS_PREFIX;
                arr[1..].copy_from_slice(bytes);
                Ok(Address(arr))
            }
            n => Err(Error::InvalidAddress(format!(
                "expected 20 or 21 bytes, got {}",
                n
            ))),
        }
    }

    /// Parse a hex string (40 or 42 hex chars, optional `0x`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let normalized = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(normalized)
            .map_err(|e| Error::InvalidAddress(format!("bad hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a Base58Check string, validating checksum and marker byte.
    pub fn from_base58(s: &str) -> Result<Self> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| Error::InvalidAddress(format!("bad base58: {}", e)))?;
        if raw.len() != ADDRESS_LEN + 4 {
            return Err(Error::InvalidAddress(format!(
                "base58 payload is {} bytes, expected {}",
                raw.len(),
                ADDRESS_LEN + 4
            )));
        }
        let (body, checksum) = raw.split_at(ADDRESS_LEN);
        if double_sha256(body)[..4] != *checksum {
            return Err(Error::InvalidAddress("base58 checksum mismatch".into()));
        }
        Self::from_bytes(body)
    }

    /// Parse either textual form: Base58Check, or hex when the string looks
    /// like one (`0x` prefix or 40/42 hex chars).
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let looks_hex = trimmed.starts_with("0x")
            || trimmed.starts_with("0X")
            || ((trimmed.len() == 40 || trimmed.len() == 42)
                && trimmed.chars().all(|c| c.is_ascii_hexdigit()));
        if looks_hex {
            Self::from_hex(trimmed)
        } else {
            Self::from_base58(trimmed)
        }
    }

    /// Base58Check rendering of the full prefixed address.
    pub fn to_base58(&self) -> String {
        let mut body = Vec::with_capacity(ADDRESS_LEN + 4);
        body.extend_from_slice(&self.0);
        body.extend_from_slice(&double_sha256(&self.0)[..4]);
        bs58::encode(body).into_string()
    }

    /// Hex rendering of the full prefixed address.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Full 21-byte prefixed form.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// The 20-byte account hash without the marker, as it appears inside
    /// an ABI slot.
    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}
