//! Canonical signatures, selectors and event topics

use alloy_primitives::{keccak256, B256};

use crate::error::{Error, Result};

use super::types::AbiType;

/// Render the canonical signature `name(type1,type2,...)` for an ordered
/// type list. This exact string feeds selector and topic hashing.
pub fn canonical_signature(name: &str, types: &[AbiType]) -> String {
    let type_names: Vec<String> = types.iter().map(AbiType::canonical_name).collect();
    format!("{}({})", name, type_names.join(","))
}

/// First 4 bytes of keccak256 over the signature string: the method selector.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&hash[..4]);
    sel
}

/// Full 32-byte keccak256 of the signature string: the event topic.
pub fn topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

/// Split a full call string like `"transfer(address,uint256)"` into its name
/// and parsed parameter types.
///
/// The closing parenthesis is matched by depth so trailing text (a `returns`
/// clause, say) is tolerated; array brackets inside the list are handled by
/// the type parser.
pub fn split_call(call: &str) -> Result<(String, Vec<AbiType>)> {
    let call = call.trim();
    let open = call
        .find('(')
        .ok_or_else(|| Error::InvalidTypeName(format!("'{}' has no parameter list", call)))?;

    let mut depth = 0usize;
    let mut close = None;
    for (i, c) in call.char_indices() {
        if i < open {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close
        .ok_or_else(|| Error::InvalidTypeName(format!("'{}' has no closing ')'", call)))?;

    let name = call[..open].trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidTypeName(format!("'{}' has no method name", call)));
    }

    let list = call[open + 1..close].trim();
    let types = if list.is_empty() {
        Vec::new()
    } else {
        list.split(',')
            .map(|t| AbiType::parse(t.trim()))
            .collect::<Result<Vec<_>>>()?
    };

    Ok((name, types))
}
