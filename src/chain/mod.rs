//! External chain collaborators
//!
//! The toolkit performs no network I/O of its own; all chain access goes
//! through these traits. Every call is one atomic attempt that either returns
//! data or fails — retry policy lives with the callers (the watcher and the
//! confirmation poller), not here. Implementations sit in the transport layer
//! (gRPC, HTTP) outside this crate.

use async_trait::async_trait;

use crate::abi::{ContractAbi, EventLog};
use crate::address::Address;

/// A block as reported by the data source.
#[derive(Debug, Clone)]
pub struct ChainBlock {
    pub number: u64,
    /// Block id/hash in the node's textual form.
    pub id: String,
    pub timestamp: u64,
    pub transactions: Vec<ChainTransaction>,
}

/// A transaction inside a block.
#[derive(Debug, Clone)]
pub struct ChainTransaction {
    pub id: String,
    /// Sender account.
    pub owner: Option<Address>,
    /// Target contract, absent for plain transfers and deployments.
    pub to: Option<Address>,
    /// Call data (selector plus encoded arguments) for contract calls.
    pub data: Vec<u8>,
}

/// Execution receipt of a transaction.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Containing block, 0 while the transaction is unconfirmed.
    pub block_number: u64,
    pub success: bool,
    /// Node-supplied result message, empty on success.
    pub message: String,
    pub logs: Vec<EventLog>,
}

impl TxReceipt {
    /// A receipt counts as confirmed once it reports a containing block.
    pub fn is_confirmed(&self) -> bool {
        self.block_number > 0
    }
}

/// Block and receipt source.
///
/// `block_by_number` must return a block whose reported number the caller can
/// compare against the request: some nodes answer a not-yet-produced height
/// with their current head instead of an error, and the watcher relies on the
/// comparison to tell the two apart.
#[async_trait]
pub trait ChainSource: Send + Sync + 'static {
    /// The current chain head.
    async fn head_block(&self) -> anyhow::Result<ChainBlock>;

    /// The block at an exact height.
    async fn block_by_number(&self, number: u64) -> anyhow::Result<ChainBlock>;

    /// The execution receipt for a transaction id.
    async fn transaction_receipt(&self, txid: &str) -> anyhow::Result<TxReceipt>;
}

/// Published-ABI lookup for deployed contracts.
#[async_trait]
pub trait AbiSource: Send + Sync + 'static {
    /// `None` when the address has no published ABI.
    async fn contract_abi(&self, address: &Address) -> anyhow::Result<Option<ContractAbi>>;
}

/// Broadcast of signed transaction bytes. Used by callers submitting built
/// calls; the watcher and poller never broadcast.
#[async_trait]
pub trait TransactionBroadcaster: Send + Sync + 'static {
    /// Returns the node's acknowledgement (typically the transaction id).
    async fn submit(&self, signed_transaction: &[u8]) -> anyhow::Result<String>;
}
