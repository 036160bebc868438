//! JSON-RPC backed ledger using alloy.

use alloy::eips::BlockNumberOrTag;
use alloy::providers::{PendingTransactionBuilder, Provider};
use alloy::rpc::types::{Filter, TransactionRequest};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use common::interfaces::payroll::IPayroll;
use common::interfaces::token::IToken;

use crate::errors::LedgerError;
use crate::ledger::{LedgerClient, LogQuery, RawLogEntry, TokenLedger, TransferRequest, TxReceipt};

/// Ledger view over one payroll contract.
///
/// Read paths work with any provider. Submissions need a provider built with
/// a wallet; `from` is set on outgoing requests when known.
#[derive(Debug, Clone)]
pub struct AlloyLedger<P> {
    provider: P,
    payroll_address: Address,
    from: Option<Address>,
}

impl<P: Provider> AlloyLedger<P> {
    pub fn new(provider: P, payroll_address: Address) -> Self {
        Self {
            provider,
            payroll_address,
            from: None,
        }
    }

    pub fn with_sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn payroll_address(&self) -> Address {
        self.payroll_address
    }

    /// Token the payroll contract pays out in
    pub async fn payroll_token(&self) -> Result<Address, LedgerError> {
        self.view(self.payroll_address, IPayroll::tokenCall {}).await
    }

    /// Decimals and symbol of a token, for rendering amounts
    pub async fn token_metadata(&self, token: Address) -> Result<(u8, String), LedgerError> {
        let decimals = self.view(token, IToken::decimalsCall {}).await?;
        let symbol = self.view(token, IToken::symbolCall {}).await?;
        Ok((decimals, symbol))
    }

    async fn view<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, LedgerError> {
        let tx = TransactionRequest::default()
            .to(to)
            .input(call.abi_encode().into());
        let output: Bytes = self
            .provider
            .call(tx)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;
        C::abi_decode_returns(&output).map_err(|e| LedgerError::Rpc(e.to_string()))
    }

    async fn send<C: SolCall>(&self, to: Address, call: C) -> Result<B256, LedgerError> {
        let mut tx = TransactionRequest::default()
            .to(to)
            .input(call.abi_encode().into());
        if let Some(from) = self.from {
            tx = tx.from(from);
        }

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;
        let tx_hash = *pending.tx_hash();

        tracing::debug!(target: "approval_transfer", %tx_hash, %to, "Transaction sent");

        Ok(tx_hash)
    }
}

#[async_trait::async_trait]
impl<P: Provider> LedgerClient for AlloyLedger<P> {
    async fn current_height(&self) -> Result<u64, LedgerError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }

    async fn block_timestamp(&self, sequence: u64) -> Result<u64, LedgerError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(sequence))
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?
            .ok_or(LedgerError::BlockNotFound { sequence })?;
        Ok(block.header.timestamp)
    }

    async fn scan_logs(&self, query: &LogQuery) -> Result<Vec<RawLogEntry>, LedgerError> {
        let mut filter = Filter::new()
            .address(self.payroll_address)
            .event_signature(query.signature)
            .from_block(query.from_sequence)
            .to_block(query.to_sequence);

        let [topic1, topic2, topic3] = query.topic_filters();
        if let Some(topic) = topic1 {
            filter = filter.topic1(topic);
        }
        if let Some(topic) = topic2 {
            filter = filter.topic2(topic);
        }
        if let Some(topic) = topic3 {
            filter = filter.topic3(topic);
        }

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))?;

        tracing::debug!(
            target: "activity_feed",
            kind = %query.kind,
            from = query.from_sequence,
            to = query.to_sequence,
            logs = logs.len(),
            "Fetched logs"
        );

        // Pending logs have no block yet and cannot be placed in history
        Ok(logs
            .into_iter()
            .filter_map(|log| {
                Some(RawLogEntry {
                    sequence_number: log.block_number?,
                    log_index: log.log_index?,
                    event_hash: log.transaction_hash?,
                    topics: log.topics().to_vec(),
                    data: log.data().data.clone(),
                })
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl<P: Provider> TokenLedger for AlloyLedger<P> {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        self.view(token, IToken::allowanceCall { owner, spender }).await
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, LedgerError> {
        self.view(token, IToken::balanceOfCall { account: owner }).await
    }

    async fn submit_approval(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, LedgerError> {
        self.send(
            token,
            IToken::approveCall {
                spender,
                value: amount,
            },
        )
        .await
    }

    async fn submit_transfer(&self, request: &TransferRequest) -> Result<B256, LedgerError> {
        // depositFunds pulls the approved tokens from the caller
        self.send(
            request.spender,
            IPayroll::depositFundsCall {
                amount: request.amount,
            },
        )
        .await
    }

    async fn await_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LedgerError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .get_receipt()
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;

        Ok(TxReceipt {
            tx_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            success: receipt.status(),
        })
    }
}
