//! Ledger capability seams consumed by the feed and the transfer workflow.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use std::collections::BTreeMap;

use crate::errors::{EntryRef, LedgerError};
use crate::types::{EventKind, IndexedField, Window};

/// A raw log entry as returned by a filtered scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogEntry {
    pub sequence_number: u64,
    pub log_index: u64,
    /// Originating transaction hash
    pub event_hash: B256,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl RawLogEntry {
    /// Build an entry from a typed event, as a node would emit it.
    pub fn from_event<E: SolEvent>(
        event: &E,
        sequence_number: u64,
        log_index: u64,
        event_hash: B256,
    ) -> Self {
        let log_data = event.encode_log_data();
        Self {
            sequence_number,
            log_index,
            event_hash,
            topics: log_data.topics().to_vec(),
            data: log_data.data,
        }
    }

    pub fn entry_ref(&self) -> EntryRef {
        EntryRef {
            sequence_number: self.sequence_number,
            log_index: self.log_index,
            event_hash: self.event_hash,
        }
    }
}

/// One filtered log scan: a single event kind over an inclusive block range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub kind: EventKind,
    pub signature: B256,
    pub indexed_filters: BTreeMap<IndexedField, Address>,
    pub from_sequence: u64,
    pub to_sequence: u64,
}

impl LogQuery {
    pub fn new(kind: EventKind, window: Window) -> Self {
        Self {
            kind,
            signature: kind.signature(),
            indexed_filters: BTreeMap::new(),
            from_sequence: window.from_sequence,
            to_sequence: window.to_sequence,
        }
    }

    pub fn with_filter(mut self, field: IndexedField, address: Address) -> Self {
        self.indexed_filters.insert(field, address);
        self
    }

    /// Topic filters by position (index 0 is topic1).
    ///
    /// Filters naming a field the kind does not index are dropped.
    pub fn topic_filters(&self) -> [Option<B256>; 3] {
        let mut topics = [None; 3];
        for (field, address) in &self.indexed_filters {
            if let Some(position) = self.kind.topic_position(*field) {
                topics[position - 1] = Some(address.into_word());
            }
        }
        topics
    }

    /// Whether an entry satisfies this query's signature and topic filters.
    pub fn matches(&self, entry: &RawLogEntry) -> bool {
        if entry.topics.first() != Some(&self.signature) {
            return false;
        }
        if entry.sequence_number < self.from_sequence || entry.sequence_number > self.to_sequence {
            return false;
        }
        self.topic_filters()
            .iter()
            .enumerate()
            .all(|(i, wanted)| match wanted {
                Some(topic) => entry.topics.get(i + 1) == Some(topic),
                None => true,
            })
    }
}

/// Read-only view of the event ledger.
///
/// Implementations are stateless and safe to share across concurrent
/// history calls.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    /// Latest confirmed block number
    async fn current_height(&self) -> Result<u64, LedgerError>;

    /// Wall-clock timestamp (unix seconds) of a block
    async fn block_timestamp(&self, sequence: u64) -> Result<u64, LedgerError>;

    async fn scan_logs(&self, query: &LogQuery) -> Result<Vec<RawLogEntry>, LedgerError>;
}

/// Outcome of waiting for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

/// Request to move `amount` of `token` from `owner` into `spender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub owner: Address,
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Token-ledger operations used by the approval-gated transfer.
#[async_trait::async_trait]
pub trait TokenLedger: Send + Sync {
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, LedgerError>;

    /// Submit `approve(spender, amount)`; returns the transaction hash.
    async fn submit_approval(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, LedgerError>;

    /// Submit the transfer itself; returns the transaction hash.
    async fn submit_transfer(&self, request: &TransferRequest) -> Result<B256, LedgerError>;

    async fn await_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LedgerError>;
}
