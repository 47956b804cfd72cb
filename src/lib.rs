//! tvmkit: client-side toolkit for TVM-style smart-contract chains
//!
//! Turns human-level intent — "call `transfer(address,uint256)` with these
//! arguments", "tell me what this log means" — into exact wire bytes and
//! back, and keeps a resumable block-by-block view of the chain flowing to
//! registered consumers.
//!
//! - [`abi`]: contract ABI model, the Solidity-ABI codec, call building,
//!   result and event-log decoding
//! - [`address`]: the chain's 21-byte prefixed account addresses
//! - [`chain`]: the collaborator traits a transport layer implements
//! - [`watcher`]: the sequential block polling loop and its handlers
//! - [`confirm`]: bounded polling for transaction confirmation
//!
//! The toolkit does no network I/O and holds no keys; signing, transport and
//! persistence belong to the collaborators behind the [`chain`] traits.

pub mod abi;
pub mod address;
pub mod chain;
pub mod config;
pub mod confirm;
pub mod error;
pub mod watcher;

pub use address::Address;
pub use error::{Error, Result};
