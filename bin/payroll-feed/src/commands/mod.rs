pub mod deposit;
pub mod history;

use activity_feed::{AlloyLedger, FeedConfig};
use alloy::providers::Provider;
use alloy_primitives::Address;

use crate::config::AppConfig;

/// Payment token from config, or as reported by the payroll contract.
pub async fn payment_token<P: Provider>(
    ledger: &AlloyLedger<P>,
    config: &AppConfig,
) -> eyre::Result<Address> {
    match config.token_address {
        Some(token) => Ok(token),
        None => Ok(ledger.payroll_token().await?),
    }
}

/// Fill in token decimals and symbol from the chain unless configured.
pub async fn feed_config<P: Provider>(ledger: &AlloyLedger<P>, config: &AppConfig) -> FeedConfig {
    let feed = config.feed.clone();
    if feed.token_decimals.is_some() {
        return feed;
    }

    let metadata = match payment_token(ledger, config).await {
        Ok(token) => ledger.token_metadata(token).await.map_err(eyre::Report::from),
        Err(e) => Err(e),
    };

    match metadata {
        Ok((decimals, symbol)) => {
            tracing::debug!(decimals, symbol = %symbol, "Loaded token metadata");
            feed.with_token(decimals, symbol)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Token metadata unavailable, showing raw amounts");
            feed
        }
    }
}
