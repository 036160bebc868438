//! Approval-gated token transfer.
//!
//! A transfer into the payroll contract needs the contract to hold an
//! allowance for at least the amount. The workflow reads allowance and
//! balance fresh, approves exactly the missing amount when needed, then
//! submits the transfer. Nothing is retried; a failed run is terminal and a
//! new attempt needs a new instance.

use alloy_primitives::B256;
use std::fmt;
use std::sync::Arc;

use crate::errors::TransferError;
use crate::ledger::{TokenLedger, TransferRequest, TxReceipt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalState {
    Unchecked,
    Sufficient,
    InsufficientNeedsApproval,
    ApprovalSubmitted,
    ApprovalConfirmed,
    TransferSubmitted,
    TransferConfirmed,
    Failed(TransferError),
}

impl ApprovalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TransferConfirmed | Self::Failed(_))
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchecked => write!(f, "Unchecked"),
            Self::Sufficient => write!(f, "Sufficient"),
            Self::InsufficientNeedsApproval => write!(f, "InsufficientNeedsApproval"),
            Self::ApprovalSubmitted => write!(f, "ApprovalSubmitted"),
            Self::ApprovalConfirmed => write!(f, "ApprovalConfirmed"),
            Self::TransferSubmitted => write!(f, "TransferSubmitted"),
            Self::TransferConfirmed => write!(f, "TransferConfirmed"),
            Self::Failed(e) => write!(f, "Failed({})", e),
        }
    }
}

/// Everything a finished run observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub request: TransferRequest,
    /// Visited states in order, starting with `Unchecked`
    pub states: Vec<ApprovalState>,
    pub approval_tx: Option<B256>,
    pub transfer_receipt: Option<TxReceipt>,
    pub error: Option<TransferError>,
}

impl TransferOutcome {
    pub fn final_state(&self) -> &ApprovalState {
        // states always starts with Unchecked
        self.states.last().unwrap_or(&ApprovalState::Unchecked)
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.final_state(), ApprovalState::TransferConfirmed)
    }

    pub fn into_result(self) -> Result<TxReceipt, TransferError> {
        match (self.transfer_receipt, self.error) {
            (_, Some(e)) => Err(e),
            (Some(receipt), None) => Ok(receipt),
            (None, None) => Err(TransferError::TransferRejected {
                reason: "transfer did not complete".to_string(),
            }),
        }
    }
}

pub struct ApprovalGatedTransfer<L: TokenLedger + ?Sized> {
    ledger: Arc<L>,
    request: TransferRequest,
    states: Vec<ApprovalState>,
    approval_tx: Option<B256>,
}

impl<L: TokenLedger + ?Sized> ApprovalGatedTransfer<L> {
    pub fn new(ledger: Arc<L>, request: TransferRequest) -> Self {
        Self {
            ledger,
            request,
            states: vec![ApprovalState::Unchecked],
            approval_tx: None,
        }
    }

    pub fn state(&self) -> &ApprovalState {
        self.states.last().unwrap_or(&ApprovalState::Unchecked)
    }

    /// Drive the workflow to a terminal state.
    pub async fn run(mut self) -> TransferOutcome {
        tracing::info!(
            target: "approval_transfer",
            owner = %self.request.owner,
            token = %self.request.token,
            spender = %self.request.spender,
            amount = %self.request.amount,
            "Starting approval-gated transfer"
        );

        let checked = match self.check().await {
            Ok(state) => state,
            Err(e) => return self.fail(e),
        };
        let needs_approval = checked == ApprovalState::InsufficientNeedsApproval;
        self.transition(checked);

        if needs_approval {
            if let Err(e) = self.approve().await {
                return self.fail(e);
            }
        }

        match self.transfer().await {
            Ok(receipt) => {
                self.transition(ApprovalState::TransferConfirmed);
                self.finish(Some(receipt), None)
            }
            Err(e) => self.fail(e),
        }
    }

    async fn check(&self) -> Result<ApprovalState, TransferError> {
        let TransferRequest {
            owner,
            token,
            spender,
            amount,
        } = self.request;

        let allowance = self
            .ledger
            .allowance(token, owner, spender)
            .await
            .map_err(TransferError::LedgerUnavailable)?;
        let balance = self
            .ledger
            .balance_of(token, owner)
            .await
            .map_err(TransferError::LedgerUnavailable)?;

        tracing::debug!(
            target: "approval_transfer",
            %allowance,
            %balance,
            %amount,
            "Read allowance and balance"
        );

        if balance < amount {
            return Err(TransferError::InsufficientBalance {
                balance,
                required: amount,
            });
        }

        Ok(if allowance >= amount {
            ApprovalState::Sufficient
        } else {
            ApprovalState::InsufficientNeedsApproval
        })
    }

    async fn approve(&mut self) -> Result<(), TransferError> {
        let rejected = |reason: String| TransferError::ApprovalRejected { reason };

        let tx_hash = self
            .ledger
            .submit_approval(self.request.token, self.request.spender, self.request.amount)
            .await
            .map_err(|e| rejected(e.to_string()))?;
        self.approval_tx = Some(tx_hash);
        self.transition(ApprovalState::ApprovalSubmitted);

        let receipt = self
            .ledger
            .await_receipt(tx_hash)
            .await
            .map_err(|e| rejected(e.to_string()))?;
        if !receipt.success {
            return Err(rejected(format!("approval {} reverted", tx_hash)));
        }

        self.transition(ApprovalState::ApprovalConfirmed);
        Ok(())
    }

    async fn transfer(&mut self) -> Result<TxReceipt, TransferError> {
        let rejected = |reason: String| TransferError::TransferRejected { reason };

        let tx_hash = self
            .ledger
            .submit_transfer(&self.request)
            .await
            .map_err(|e| rejected(e.to_string()))?;
        self.transition(ApprovalState::TransferSubmitted);

        let receipt = self
            .ledger
            .await_receipt(tx_hash)
            .await
            .map_err(|e| rejected(e.to_string()))?;
        if !receipt.success {
            return Err(rejected(format!("transfer {} reverted", tx_hash)));
        }

        Ok(receipt)
    }

    fn transition(&mut self, next: ApprovalState) {
        tracing::info!(
            target: "approval_transfer",
            owner = %self.request.owner,
            token = %self.request.token,
            from = %self.state(),
            to = %next,
            "Transfer state changed"
        );
        self.states.push(next);
    }

    fn fail(mut self, error: TransferError) -> TransferOutcome {
        tracing::warn!(target: "approval_transfer", error = %error, "Transfer failed");
        self.transition(ApprovalState::Failed(error.clone()));
        self.finish(None, Some(error))
    }

    fn finish(self, receipt: Option<TxReceipt>, error: Option<TransferError>) -> TransferOutcome {
        TransferOutcome {
            request: self.request,
            states: self.states,
            approval_tx: self.approval_tx,
            transfer_receipt: receipt,
            error,
        }
    }
}
