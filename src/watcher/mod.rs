//! Sequential block watcher
//!
//! One polling task owns the cursor and walks the chain block by block,
//! dispatching each block (and, unless configured blocks-only, each
//! transaction with its receipt) to every registered handler in registration
//! order. Any fetch failure — including a block that does not exist yet —
//! leaves the cursor in place, sleeps one interval and retries the same
//! height, so transient node unavailability can never skip a block. A block
//! whose receipt fetching fails part-way is redispatched from the top on the
//! next attempt; delivery is at-least-once.
//!
//! Handlers run sequentially on the polling task: a slow handler stalls
//! ingestion. Handler failures are logged and offered to an optional error
//! observer, and never affect other handlers or the loop.

mod listener;

pub use listener::{AbiCache, ContractEventListener};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::chain::{ChainBlock, ChainSource, ChainTransaction, TxReceipt};

/// Where the watcher's cursor begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartBlock {
    /// Resolve the chain head once at start and begin there.
    Head,
    Number(u64),
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub start: StartBlock,
    /// Delay before retrying an unavailable block and between dry polls.
    /// The chain's target block production interval is the natural choice.
    pub poll_interval: Duration,
    /// Dispatch blocks only, skipping per-transaction receipt fetches.
    pub blocks_only: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        WatcherConfig {
            start: StartBlock::Head,
            poll_interval: Duration::from_secs(3),
            blocks_only: false,
        }
    }
}

/// Callbacks dispatched by the watcher.
///
/// Both callbacks run on the polling task. Returning `Err` marks this
/// handler's delivery as failed without affecting anything else.
#[async_trait]
pub trait BlockHandler: Send + Sync + 'static {
    async fn on_block(&self, block: &ChainBlock) -> anyhow::Result<()>;

    async fn on_transaction(
        &self,
        tx: &ChainTransaction,
        receipt: &TxReceipt,
    ) -> anyhow::Result<()> {
        let _ = (tx, receipt);
        Ok(())
    }
}

type ErrorObserver = dyn Fn(&anyhow::Error) + Send + Sync;

/// The watcher under construction. Handlers are registered here, before the
/// loop exists, so the running loop never sees the list change.
pub struct BlockWatcher {
    source: Arc<dyn ChainSource>,
    config: WatcherConfig,
    handlers: Vec<Arc<dyn BlockHandler>>,
    error_observer: Option<Arc<ErrorObserver>>,
}

impl BlockWatcher {
    pub fn new(source: Arc<dyn ChainSource>, config: WatcherConfig) -> Self {
        BlockWatcher {
            source,
            config,
            handlers: Vec::new(),
            error_observer: None,
        }
    }

    /// Register a handler. Dispatch order is registration order.
    pub fn add_handler(&mut self, handler: Arc<dyn BlockHandler>) {
        self.handlers.push(handler);
    }

    /// Remove a previously registered handler (pointer identity).
    pub fn remove_handler(&mut self, handler: &Arc<dyn BlockHandler>) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| !Arc::ptr_eq(h, handler));
        self.handlers.len() != before
    }

    /// Observe handler failures without weakening their isolation.
    pub fn on_handler_error(&mut self, observer: impl Fn(&anyhow::Error) + Send + Sync + 'static) {
        self.error_observer = Some(Arc::new(observer));
    }

    /// Spawn the polling loop. The returned handle is the only way to stop
    /// it; dropping the handle detaches the loop.
    pub fn start(self) -> WatcherHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_loop(
            self.source,
            self.config,
            self.handlers,
            self.error_observer,
            Arc::clone(&stop),
        ));
        WatcherHandle { stop, task }
    }
}

/// Handle to a running watcher.
pub struct WatcherHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Request a cooperative stop. The flag is checked once per loop
    /// iteration; in-flight dispatch for the current block finishes first.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }

    /// Stop and wait.
    pub async fn shutdown(self) {
        self.stop();
        self.join().await;
    }
}

async fn run_loop(
    source: Arc<dyn ChainSource>,
    config: WatcherConfig,
    handlers: Vec<Arc<dyn BlockHandler>>,
    error_observer: Option<Arc<ErrorObserver>>,
    stop: Arc<AtomicBool>,
) {
    let mut next = loop {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        match config.start {
            StartBlock::Number(n) => break n,
            StartBlock::Head => match source.head_block().await {
                Ok(head) => break head.number,
                Err(err) => {
                    warn!(error = %err, "head lookup failed, retrying");
                    tokio::time::sleep(config.poll_interval).await;
                }
            },
        }
    };
    debug!(start_block = next, "watcher started");

    'poll: while !stop.load(Ordering::Relaxed) {
        let block = match source.block_by_number(next).await {
            Ok(block) if block.number == next => block,
            Ok(block) => {
                // The node answered with a different height: the requested
                // block does not exist yet.
                debug!(requested = next, reported = block.number, "block not yet produced");
                tokio::time::sleep(config.poll_interval).await;
                continue;
            }
            Err(err) => {
                warn!(block = next, error = %err, "block fetch failed, will retry");
                tokio::time::sleep(config.poll_interval).await;
                continue;
            }
        };

        for handler in &handlers {
            if let Err(err) = handler.on_block(&block).await {
                warn!(block = block.number, error = %err, "block handler failed");
                if let Some(observer) = &error_observer {
                    observer(&err);
                }
            }
        }

        if !config.blocks_only {
            for tx in &block.transactions {
                let receipt = match source.transaction_receipt(&tx.id).await {
                    Ok(receipt) => receipt,
                    Err(err) => {
                        // Abort this block's dispatch and refetch it whole;
                        // handlers already called will see it again.
                        warn!(block = next, txid = %tx.id, error = %err,
                              "receipt fetch failed, retrying block");
                        tokio::time::sleep(config.poll_interval).await;
                        continue 'poll;
                    }
                };
                for handler in &handlers {
                    if let Err(err) = handler.on_transaction(tx, &receipt).await {
                        warn!(block = block.number, txid = %tx.id, error = %err,
                              "transaction handler failed");
                        if let Some(observer) = &error_observer {
                            observer(&err);
                        }
                    }
                }
            }
        }

        next += 1;
    }
    debug!(next_block = next, "watcher stopped");
}
