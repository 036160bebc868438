use activity_feed::FeedConfig;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "payroll.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc_url: String,
    pub payroll_address: Address,
    /// Payment token; read from the payroll contract when unset
    pub token_address: Option<Address>,
    pub feed: FeedConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            payroll_address: Address::ZERO,
            token_address: None,
            feed: FeedConfig::default(),
        }
    }
}

impl AppConfig {
    pub async fn load_from_file(path: &Path) -> eyre::Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Load `payroll.json` from `dir`, falling back to defaults, then apply
    /// environment overrides.
    pub async fn load(dir: &Path) -> eyre::Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let config = if path.exists() {
            Self::load_from_file(&path).await?
        } else {
            tracing::warn!(path = %path.display(), "payroll.json not found, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(address) = env_address("PAYROLL_ADDRESS") {
            self.payroll_address = address;
        }
        if let Some(address) = env_address("TOKEN_ADDRESS") {
            self.token_address = Some(address);
        }
        self.feed = self.feed.with_env_overrides();
        self
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.payroll_address.is_zero() {
            eyre::bail!("payroll_address is not configured (set it in payroll.json or PAYROLL_ADDRESS)");
        }
        Ok(())
    }
}

fn env_address(key: &str) -> Option<Address> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse() {
        Ok(address) => Some(address),
        Err(e) => {
            tracing::warn!(key, value = %value, error = %e, "Ignoring invalid address override");
            None
        }
    }
}
