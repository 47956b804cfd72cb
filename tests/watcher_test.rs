//! Watcher loop behavior against a scripted chain source
//!
//! Runs under paused tokio time, so the fixed retry sleeps cost nothing and
//! the scripts can express "unavailable for the first k polls" directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use tvmkit::chain::{ChainBlock, ChainSource, ChainTransaction, TxReceipt};
use tvmkit::watcher::{BlockHandler, BlockWatcher, StartBlock, WatcherConfig};

fn make_tx(block: u64, tag: &str) -> ChainTransaction {
    ChainTransaction {
        id: format!("tx-{}-{}", block, tag),
        owner: None,
        to: None,
        data: vec![],
    }
}

fn make_block(number: u64, txs: Vec<ChainTransaction>) -> ChainBlock {
    ChainBlock {
        number,
        id: format!("block-{}", number),
        timestamp: 1_700_000_000 + number * 3,
        transactions: txs,
    }
}

/// A chain source driven by per-block failure budgets. Heights above
/// `max_block` answer with the head block, exercising the number-mismatch
/// retry path.
struct ScriptedSource {
    max_block: u64,
    txs: HashMap<u64, Vec<ChainTransaction>>,
    block_failures: Mutex<HashMap<u64, u32>>,
    receipt_failures: Mutex<HashMap<String, u32>>,
    /// Every block_by_number request, in order.
    fetches: Mutex<Vec<u64>>,
    receipt_fetches: AtomicUsize,
}

impl ScriptedSource {
    fn new(max_block: u64) -> Self {
        ScriptedSource {
            max_block,
            txs: HashMap::new(),
            block_failures: Mutex::new(HashMap::new()),
            receipt_failures: Mutex::new(HashMap::new()),
            fetches: Mutex::new(Vec::new()),
            receipt_fetches: AtomicUsize::new(0),
        }
    }

    fn with_txs(mut self, block: u64, tags: &[&str]) -> Self {
        self.txs
            .insert(block, tags.iter().map(|t| make_tx(block, t)).collect());
        self
    }

    fn failing_block(self, number: u64, failures: u32) -> Self {
        self.block_failures.lock().unwrap().insert(number, failures);
        self
    }

    fn failing_receipt(self, txid: &str, failures: u32) -> Self {
        self.receipt_failures
            .lock()
            .unwrap()
            .insert(txid.to_string(), failures);
        self
    }

    fn block(&self, number: u64) -> ChainBlock {
        make_block(number, self.txs.get(&number).cloned().unwrap_or_default())
    }

    fn fetches_of(&self, number: u64) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|n| **n == number)
            .count()
    }
}

#[async_trait]
impl ChainSource for ScriptedSource {
    async fn head_block(&self) -> anyhow::Result<ChainBlock> {
        Ok(self.block(self.max_block))
    }

    async fn block_by_number(&self, number: u64) -> anyhow::Result<ChainBlock> {
        self.fetches.lock().unwrap().push(number);
        if let Some(left) = self.block_failures.lock().unwrap().get_mut(&number) {
            if *left > 0 {
                *left -= 1;
                anyhow::bail!("node unavailable");
            }
        }
        if number > self.max_block {
            // Not produced yet: the node answers with its head instead.
            return Ok(self.block(self.max_block));
        }
        Ok(self.block(number))
    }

    async fn transaction_receipt(&self, txid: &str) -> anyhow::Result<TxReceipt> {
        self.receipt_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(left) = self.receipt_failures.lock().unwrap().get_mut(txid) {
            if *left > 0 {
                *left -= 1;
                anyhow::bail!("receipt unavailable");
            }
        }
        Ok(TxReceipt {
            block_number: 1,
            success: true,
            message: String::new(),
            logs: vec![],
        })
    }
}

/// Records every callback in order; optionally fails each one.
struct Recorder {
    label: &'static str,
    failing: bool,
    seen: Mutex<Vec<String>>,
}

impl Recorder {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Recorder {
            label,
            failing: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(label: &'static str) -> Arc<Self> {
        Arc::new(Recorder {
            label,
            failing: true,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlockHandler for Recorder {
    async fn on_block(&self, block: &ChainBlock) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(format!("block:{}", block.number));
        if self.failing {
            anyhow::bail!("{} always fails", self.label);
        }
        Ok(())
    }

    async fn on_transaction(
        &self,
        tx: &ChainTransaction,
        _receipt: &TxReceipt,
    ) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(tx.id.clone());
        if self.failing {
            anyhow::bail!("{} always fails", self.label);
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(start: u64) -> WatcherConfig {
    WatcherConfig {
        start: StartBlock::Number(start),
        poll_interval: Duration::from_secs(3),
        blocks_only: false,
    }
}

/// Wait (in virtual time) until the recorder has seen `entry`.
async fn wait_for(recorder: &Recorder, entry: &str) {
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            if recorder.seen().iter().any(|e| e == entry) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never saw {}", entry));
}

#[tokio::test(start_paused = true)]
async fn cursor_is_monotonic_across_retries() {
    init_tracing();
    let source = Arc::new(
        ScriptedSource::new(7).failing_block(6, 2),
    );
    let recorder = Recorder::new("r");

    let mut watcher = BlockWatcher::new(source.clone(), config(5));
    watcher.add_handler(recorder.clone());
    let handle = watcher.start();

    wait_for(&recorder, "block:7").await;
    handle.shutdown().await;

    // Block 6: two failed polls plus the success, nothing more.
    assert_eq!(source.fetches_of(6), 3);
    // Never requested again after succeeding: every fetch of 6 precedes the
    // first fetch of 7.
    let fetches = source.fetches.lock().unwrap().clone();
    let first_7 = fetches.iter().position(|n| *n == 7).unwrap();
    let last_6 = fetches.iter().rposition(|n| *n == 6).unwrap();
    assert!(last_6 < first_7);

    // Each block delivered exactly once, in order.
    let blocks: Vec<String> = recorder
        .seen()
        .into_iter()
        .filter(|e| e.starts_with("block:"))
        .collect();
    assert_eq!(blocks, ["block:5", "block:6", "block:7"]);
}

#[tokio::test(start_paused = true)]
async fn failing_handler_does_not_affect_others() {
    let source = Arc::new(ScriptedSource::new(6).with_txs(5, &["a"]).with_txs(6, &["b"]));
    let bad = Recorder::failing("bad");
    let good = Recorder::new("good");
    let observed = Arc::new(AtomicUsize::new(0));
    let observed_inner = observed.clone();

    let mut watcher = BlockWatcher::new(source.clone(), config(5));
    watcher.add_handler(bad.clone());
    watcher.add_handler(good.clone());
    watcher.on_handler_error(move |_| {
        observed_inner.fetch_add(1, Ordering::SeqCst);
    });
    let handle = watcher.start();

    wait_for(&good, "tx-6-b").await;
    handle.shutdown().await;

    // The good handler saw the full ordered stream.
    let expected = vec!["block:5", "tx-5-a", "block:6", "tx-6-b"];
    let seen: Vec<String> = good.seen().into_iter().take(expected.len()).collect();
    assert_eq!(seen, expected);
    // The bad handler was still called every time.
    let seen: Vec<String> = bad.seen().into_iter().take(expected.len()).collect();
    assert_eq!(seen, expected);
    // Every failure reached the observer.
    assert!(observed.load(Ordering::SeqCst) >= expected.len());
}

#[tokio::test(start_paused = true)]
async fn receipt_failure_redispatches_the_block() {
    let source = Arc::new(
        ScriptedSource::new(5)
            .with_txs(5, &["a", "b"])
            .failing_receipt("tx-5-b", 1),
    );
    let recorder = Recorder::new("r");

    let mut watcher = BlockWatcher::new(source.clone(), config(5));
    watcher.add_handler(recorder.clone());
    let handle = watcher.start();

    wait_for(&recorder, "tx-5-b").await;
    handle.shutdown().await;

    // First pass: block + tx a, then the receipt for b fails and the whole
    // block is redispatched. At-least-once, duplicates included.
    let seen: Vec<String> = recorder.seen().into_iter().take(5).collect();
    assert_eq!(seen, vec!["block:5", "tx-5-a", "block:5", "tx-5-a", "tx-5-b"]);
}

#[tokio::test(start_paused = true)]
async fn blocks_only_skips_receipts() {
    let source = Arc::new(ScriptedSource::new(6).with_txs(5, &["a"]));
    let recorder = Recorder::new("r");

    let mut watcher = BlockWatcher::new(
        source.clone(),
        WatcherConfig {
            start: StartBlock::Number(5),
            poll_interval: Duration::from_secs(3),
            blocks_only: true,
        },
    );
    watcher.add_handler(recorder.clone());
    let handle = watcher.start();

    wait_for(&recorder, "block:6").await;
    handle.shutdown().await;

    assert_eq!(source.receipt_fetches.load(Ordering::SeqCst), 0);
    assert!(recorder.seen().iter().all(|e| e.starts_with("block:")));
}

#[tokio::test(start_paused = true)]
async fn starts_from_resolved_head() {
    let source = Arc::new(ScriptedSource::new(42));
    let recorder = Recorder::new("r");

    let mut watcher = BlockWatcher::new(
        source.clone(),
        WatcherConfig {
            start: StartBlock::Head,
            poll_interval: Duration::from_secs(3),
            blocks_only: true,
        },
    );
    watcher.add_handler(recorder.clone());
    let handle = watcher.start();

    wait_for(&recorder, "block:42").await;
    handle.shutdown().await;

    // Nothing below the head at start time was fetched.
    assert_eq!(source.fetches_of(41), 0);
    assert_eq!(recorder.seen()[0], "block:42");
}

#[tokio::test(start_paused = true)]
async fn stop_is_cooperative_and_final() {
    let source = Arc::new(ScriptedSource::new(10_000));
    let recorder = Recorder::new("r");

    let mut watcher = BlockWatcher::new(source.clone(), config(1));
    watcher.add_handler(recorder.clone());
    let handle = watcher.start();

    wait_for(&recorder, "block:3").await;
    handle.shutdown().await;

    let after_join = recorder.seen().len();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(recorder.seen().len(), after_join);
}
