use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::watcher::{StartBlock, WatcherConfig};

/// Chain-level settings shared by the watcher and the confirmation poller.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    /// Target block production interval; drives retry and poll delays.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,

    /// Default attempt budget for [`wait_for_confirmation`](crate::confirm::wait_for_confirmation).
    #[serde(default = "default_confirmation_attempts")]
    pub confirmation_attempts: u32,

    /// Watch blocks only, skipping per-transaction receipt fetches.
    #[serde(default)]
    pub blocks_only: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            block_interval_ms: default_block_interval_ms(),
            confirmation_attempts: default_confirmation_attempts(),
            blocks_only: false,
        }
    }
}

impl ChainConfig {
    pub fn block_interval(&self) -> Duration {
        Duration::from_millis(self.block_interval_ms)
    }

    /// Watcher settings derived from this chain profile.
    pub fn watcher_config(&self, start: StartBlock) -> WatcherConfig {
        WatcherConfig {
            start,
            poll_interval: self.block_interval(),
            blocks_only: self.blocks_only,
        }
    }
}

fn default_block_interval_ms() -> u64 {
    3000
}

fn default_confirmation_attempts() -> u32 {
    20
}

/// Load the chain profile, falling back to defaults on any miss.
pub fn load() -> ChainConfig {
    let Some(path) = config_path() else {
        return ChainConfig::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return ChainConfig::default(),
    };
    toml::from_str::<ChainConfig>(&content).unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TVMKIT_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("tvmkit").join("config.toml"));
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".config").join("tvmkit").join("config.toml"))
}
