//! Tuning knobs for history reconstruction.

use serde::{Deserialize, Serialize};

/// Environment variable overriding the lookback in blocks
pub const LOOKBACK_BLOCKS_ENV: &str = "FEED_LOOKBACK_BLOCKS";

/// Environment variable overriding the expected block time in seconds
pub const BLOCK_TIME_SECS_ENV: &str = "FEED_BLOCK_TIME_SECS";

/// Environment variable overriding the timestamp fetch concurrency
pub const MAX_CONCURRENT_FETCHES_ENV: &str = "FEED_MAX_CONCURRENT_FETCHES";

/// Ledger time covered by the default window
pub const DEFAULT_LOOKBACK_SECS: u64 = 3 * 24 * 60 * 60;

/// Expected block production interval (Ethereum mainnet)
pub const DEFAULT_BLOCK_TIME_SECS: u64 = 12;

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Explicit lookback in blocks. When unset it is derived from
    /// `DEFAULT_LOOKBACK_SECS / expected_block_time_secs`.
    pub lookback_blocks: Option<u64>,
    pub expected_block_time_secs: u64,
    /// Upper bound on concurrent block timestamp fetches
    pub max_concurrent_fetches: usize,
    /// Token decimals used to render amounts in descriptions
    pub token_decimals: Option<u8>,
    pub token_symbol: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            lookback_blocks: None,
            expected_block_time_secs: DEFAULT_BLOCK_TIME_SECS,
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            token_decimals: None,
            token_symbol: None,
        }
    }
}

impl FeedConfig {
    /// Number of blocks scanned behind the current height
    pub fn lookback(&self) -> u64 {
        self.lookback_blocks.unwrap_or_else(|| {
            DEFAULT_LOOKBACK_SECS / self.expected_block_time_secs.max(1)
        })
    }

    pub fn with_lookback_blocks(mut self, blocks: u64) -> Self {
        self.lookback_blocks = Some(blocks);
        self
    }

    pub fn with_block_time_secs(mut self, secs: u64) -> Self {
        self.expected_block_time_secs = secs;
        self
    }

    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    pub fn with_token(mut self, decimals: u8, symbol: impl Into<String>) -> Self {
        self.token_decimals = Some(decimals);
        self.token_symbol = Some(symbol.into());
        self
    }

    /// Apply `FEED_*` environment overrides; unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(blocks) = env_parse::<u64>(LOOKBACK_BLOCKS_ENV) {
            self.lookback_blocks = Some(blocks);
        }
        if let Some(secs) = env_parse::<u64>(BLOCK_TIME_SECS_ENV) {
            self.expected_block_time_secs = secs;
        }
        if let Some(limit) = env_parse::<usize>(MAX_CONCURRENT_FETCHES_ENV) {
            self.max_concurrent_fetches = limit;
        }
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
