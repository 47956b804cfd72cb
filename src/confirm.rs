//! Transaction confirmation polling

use std::time::Duration;

use tracing::debug;

use crate::chain::{ChainSource, TxReceipt};
use crate::error::{Error, Result};

/// Poll until a submitted transaction's receipt reports a containing block.
///
/// Blocks the calling task for up to `max_attempts × poll_interval`. A fetch
/// error counts as an ordinary unconfirmed attempt; the node may simply not
/// know the transaction yet. Exhausting the attempts yields
/// [`Error::ConfirmationTimeout`], which means "not confirmed yet" — the
/// transaction may still land, and the caller re-checks out of band. Callers
/// needing cancellation race this future against their own signal.
pub async fn wait_for_confirmation(
    source: &dyn ChainSource,
    txid: &str,
    max_attempts: u32,
    poll_interval: Duration,
) -> Result<TxReceipt> {
    for attempt in 1..=max_attempts {
        match source.transaction_receipt(txid).await {
            Ok(receipt) if receipt.is_confirmed() => {
                debug!(txid, attempt, block = receipt.block_number, "transaction confirmed");
                return Ok(receipt);
            }
            Ok(_) => {
                debug!(txid, attempt, "transaction not yet in a block");
            }
            Err(err) => {
                debug!(txid, attempt, error = %err, "receipt fetch failed");
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(poll_interval).await;
        }
    }

    Err(Error::ConfirmationTimeout {
        txid: txid.to_string(),
        attempts: max_attempts,
    })
}
