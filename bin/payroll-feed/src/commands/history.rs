use activity_feed::{ActivityAggregator, ActivityHistory, AlloyLedger, HistoryError, Role};
use alloy::providers::ProviderBuilder;
use alloy_primitives::Address;
use eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::feed_config;
use crate::config::AppConfig;

pub async fn run(
    config: &AppConfig,
    address: Address,
    role: Role,
    max: usize,
    watch: Option<u64>,
) -> Result<()> {
    let provider = ProviderBuilder::new().connect_http(config.rpc_url.parse()?);
    let ledger = AlloyLedger::new(provider, config.payroll_address);
    let feed = feed_config(&ledger, config).await;
    let aggregator = ActivityAggregator::new(Arc::new(ledger), feed);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        shutdown.cancel();
    });

    let Some(secs) = watch else {
        let history = aggregator.get_history(address, role, max, &cancel).await?;
        return print_history(&history);
    };

    tracing::info!(%address, %role, interval_secs = secs, "Watching history");
    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match aggregator.get_history(address, role, max, &cancel).await {
                    Ok(history) => print_history(&history)?,
                    Err(HistoryError::Cancelled) => break,
                    Err(e) => tracing::error!(error = %e, "History unavailable"),
                }
            }
        }
    }

    Ok(())
}

fn print_history(history: &ActivityHistory) -> Result<()> {
    for warning in &history.warnings {
        tracing::warn!(warning = %warning, "Partial history");
    }
    println!("{}", serde_json::to_string_pretty(history)?);
    Ok(())
}
