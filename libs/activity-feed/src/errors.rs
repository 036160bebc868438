//! Error types for history reconstruction and approval-gated transfers.

use alloy_primitives::{B256, U256};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::types::EventKind;

/// Failure talking to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("block {sequence} not found")]
    BlockNotFound { sequence: u64 },
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// Location of a raw log entry, carried by decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryRef {
    pub sequence_number: u64,
    pub log_index: u64,
    pub event_hash: B256,
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x}#{} (block {})",
            self.event_hash, self.log_index, self.sequence_number
        )
    }
}

/// Why a raw entry did not match its kind's schema
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum DecodeFailure {
    #[error("log has no topics")]
    MissingSignature,
    #[error("signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch { expected: B256, found: B256 },
    #[error("expected {expected} topics, found {found}")]
    TopicCount { expected: usize, found: usize },
    #[error("ABI decode failed: {0}")]
    Abi(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("failed to decode {kind} entry {entry}: {reason}")]
pub struct DecodeError {
    pub kind: EventKind,
    pub entry: EntryRef,
    pub reason: DecodeFailure,
}

/// Non-fatal problems reported alongside a (partial) history.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type")]
pub enum HistoryWarning {
    #[error("scan for {kind} failed: {reason}")]
    ScanFailed { kind: EventKind, reason: String },
    #[error(transparent)]
    DecodeError(DecodeError),
    #[error("timestamp unavailable for block {sequence}: {reason}")]
    TimestampUnavailable { sequence: u64, reason: String },
}

impl HistoryWarning {
    pub fn kind(&self) -> Option<EventKind> {
        match self {
            HistoryWarning::ScanFailed { kind, .. } => Some(*kind),
            HistoryWarning::DecodeError(e) => Some(e.kind),
            HistoryWarning::TimestampUnavailable { .. } => None,
        }
    }
}

/// Fatal history failures; no records are returned.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[source] LedgerError),
    #[error("history request cancelled")]
    Cancelled,
}

/// Terminal failures of an approval-gated transfer. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: U256, required: U256 },
    #[error("approval rejected: {reason}")]
    ApprovalRejected { reason: String },
    #[error("transfer rejected: {reason}")]
    TransferRejected { reason: String },
    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(#[source] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        let error = DecodeError {
            kind: EventKind::PaymentSent,
            entry: EntryRef {
                sequence_number: 42,
                log_index: 3,
                event_hash: B256::ZERO,
            },
            reason: DecodeFailure::TopicCount { expected: 3, found: 2 },
        };
        let display = error.to_string();
        assert!(display.contains("PaymentSent"));
        assert!(display.contains("block 42"));
        assert!(display.contains("expected 3 topics"));
    }

    #[test]
    fn test_history_warning_kind() {
        let warning = HistoryWarning::ScanFailed {
            kind: EventKind::MemberAdded,
            reason: "timeout".to_string(),
        };
        assert_eq!(warning.kind(), Some(EventKind::MemberAdded));
        assert!(warning.to_string().contains("MemberAdded"));

        let warning = HistoryWarning::TimestampUnavailable {
            sequence: 9,
            reason: "gone".to_string(),
        };
        assert_eq!(warning.kind(), None);
    }

    #[test]
    fn test_warning_serializes_with_type_tag() {
        let warning = HistoryWarning::ScanFailed {
            kind: EventKind::RateChanged,
            reason: "boom".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["type"], "ScanFailed");
        assert_eq!(json["kind"], "RateChanged");
    }

    #[test]
    fn test_transfer_error_display() {
        let error = TransferError::InsufficientBalance {
            balance: U256::from(100),
            required: U256::from(500),
        };
        assert!(error.to_string().contains("100"));
        assert!(error.to_string().contains("500"));
    }
}
