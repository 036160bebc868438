//! Payroll activity feed reconstructed from contract event logs.
//!
//! Provides:
//! - Per-address history for employers and employees, rebuilt on demand
//!   from a bounded window of logs
//! - Strict per-kind log decoding and batched block timestamp resolution
//! - An approval-gated token transfer into the payroll contract
//! - An alloy-backed ledger implementing both ledger seams

pub mod aggregator;
pub mod alloy_client;
pub mod approval;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod ledger;
pub mod resolver;
pub mod types;

pub use aggregator::ActivityAggregator;
pub use alloy_client::AlloyLedger;
pub use approval::{ApprovalGatedTransfer, ApprovalState, TransferOutcome};
pub use config::FeedConfig;
pub use errors::{HistoryError, HistoryWarning, LedgerError, TransferError};
pub use ledger::{LedgerClient, LogQuery, RawLogEntry, TokenLedger, TransferRequest, TxReceipt};
pub use types::{ActivityHistory, ActivityRecord, EventKind, Role, Window};
