//! Contract event listener
//!
//! A [`BlockHandler`] that interprets every receipt log against the emitting
//! contract's ABI and forwards the outcome to a pair of injected callbacks:
//! one for decoded events, one for logs nothing could interpret. ABIs are
//! resolved through an explicit [`AbiCache`] owned by the listener, fetched
//! once per unseen address for the lifetime of the listening session.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::abi::{ContractAbi, DecodedEvent, EventLog, InterpretedLog, LogDecoder};
use crate::address::Address;
use crate::chain::{AbiSource, ChainBlock, ChainTransaction, TxReceipt};

use super::BlockHandler;

/// Address → log-decoder map for one listening session.
///
/// Addresses known to have no published ABI are cached too, so they are not
/// refetched on every log.
#[derive(Default)]
pub struct AbiCache {
    decoders: HashMap<Address, Option<Arc<LogDecoder>>>,
}

impl AbiCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with a known contract, skipping the remote fetch for
    /// its address.
    pub fn preload(&mut self, address: Address, abi: &ContractAbi) {
        self.decoders
            .insert(address, Some(Arc::new(LogDecoder::new(abi))));
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.decoders.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    fn get(&self, address: &Address) -> Option<Option<Arc<LogDecoder>>> {
        self.decoders.get(address).cloned()
    }

    fn insert(&mut self, address: Address, decoder: Option<Arc<LogDecoder>>) {
        self.decoders.insert(address, decoder);
    }
}

type EventCallback = dyn Fn(&ChainTransaction, &DecodedEvent) + Send + Sync;
type RawLogCallback = dyn Fn(&ChainTransaction, &EventLog) + Send + Sync;

/// Decodes receipt logs and fans them out to two callback slots.
pub struct ContractEventListener {
    abi_source: Arc<dyn AbiSource>,
    cache: Mutex<AbiCache>,
    on_event: Box<EventCallback>,
    on_unrecognized: Box<RawLogCallback>,
}

impl ContractEventListener {
    pub fn new(
        abi_source: Arc<dyn AbiSource>,
        cache: AbiCache,
        on_event: impl Fn(&ChainTransaction, &DecodedEvent) + Send + Sync + 'static,
        on_unrecognized: impl Fn(&ChainTransaction, &EventLog) + Send + Sync + 'static,
    ) -> Self {
        ContractEventListener {
            abi_source,
            cache: Mutex::new(cache),
            on_event: Box::new(on_event),
            on_unrecognized: Box::new(on_unrecognized),
        }
    }

    async fn decoder_for(&self, address: &Address) -> anyhow::Result<Option<Arc<LogDecoder>>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(address) {
            return Ok(cached);
        }
        debug!(address = %address, "fetching ABI for unseen contract");
        let decoder = self
            .abi_source
            .contract_abi(address)
            .await?
            .map(|abi| Arc::new(LogDecoder::new(&abi)));
        cache.insert(*address, decoder.clone());
        Ok(decoder)
    }
}

#[async_trait]
impl BlockHandler for ContractEventListener {
    async fn on_block(&self, _block: &ChainBlock) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_transaction(
        &self,
        tx: &ChainTransaction,
        receipt: &TxReceipt,
    ) -> anyhow::Result<()> {
        for log in &receipt.logs {
            match self.decoder_for(&log.address).await? {
                Some(decoder) => match decoder.interpret(log.clone()) {
                    InterpretedLog::Event(event) => (self.on_event)(tx, &event),
                    InterpretedLog::Unrecognized(raw) => (self.on_unrecognized)(tx, &raw),
                },
                // No published ABI: every log from this address is raw.
                None => (self.on_unrecognized)(tx, log),
            }
        }
        Ok(())
    }
}
