use activity_feed::{AlloyLedger, ApprovalGatedTransfer, TransferOutcome, TransferRequest};
use alloy::network::EthereumWallet;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::U256;
use eyre::Result;
use std::sync::Arc;

use super::payment_token;
use crate::config::AppConfig;

pub async fn run(config: &AppConfig, amount: U256, private_key: &str) -> Result<()> {
    let signer: PrivateKeySigner = private_key.parse()?;
    let owner = signer.address();
    let wallet = EthereumWallet::from(signer);

    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(config.rpc_url.parse()?);
    let ledger = AlloyLedger::new(provider, config.payroll_address).with_sender(owner);
    let token = payment_token(&ledger, config).await?;

    let request = TransferRequest {
        owner,
        token,
        spender: config.payroll_address,
        amount,
    };

    let outcome = ApprovalGatedTransfer::new(Arc::new(ledger), request)
        .run()
        .await;

    println!("{}", serde_json::to_string_pretty(&summary(&outcome))?);

    match outcome.error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn summary(outcome: &TransferOutcome) -> serde_json::Value {
    serde_json::json!({
        "owner": outcome.request.owner,
        "token": outcome.request.token,
        "amount": outcome.request.amount.to_string(),
        "states": outcome.states.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "approval_tx": outcome.approval_tx,
        "transfer_tx": outcome.transfer_receipt.as_ref().map(|r| r.tx_hash),
        "block_number": outcome.transfer_receipt.as_ref().map(|r| r.block_number),
        "error": outcome.error.as_ref().map(ToString::to_string),
    })
}
