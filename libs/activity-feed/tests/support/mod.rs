#![allow(dead_code)]

use activity_feed::errors::LedgerError;
use activity_feed::ledger::{
    LedgerClient, LogQuery, RawLogEntry, TokenLedger, TransferRequest, TxReceipt,
};
use activity_feed::types::EventKind;
use alloy_primitives::{Address, B256, U256};
use common::interfaces::payroll::{
    BonusAwarded, FundsDeposited, MemberAdded, MemberRemoved, PaymentSent, RateChanged,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

pub fn employer() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn employee() -> Address {
    Address::repeat_byte(0xb2)
}

pub fn other_employee() -> Address {
    Address::repeat_byte(0xc3)
}

pub fn tx_hash(sequence: u64, log_index: u64) -> B256 {
    B256::from(U256::from(sequence * 1_000 + log_index).to_be_bytes::<32>())
}

/// In-memory event ledger honouring signature, range and topic filters.
#[derive(Default)]
pub struct MockLedger {
    pub height: u64,
    pub entries: Vec<RawLogEntry>,
    pub timestamps: HashMap<u64, u64>,
    pub failing_kinds: HashSet<EventKind>,
    pub height_unavailable: bool,
    /// Return every entry with the right signature regardless of topics
    pub ignore_topic_filters: bool,
    pub scan_delay: Option<Duration>,
    pub height_calls: Mutex<usize>,
    pub scans: Mutex<Vec<LogQuery>>,
    pub timestamp_fetches: Mutex<Vec<u64>>,
}

impl MockLedger {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    /// Add an entry; its block gets timestamp `1_700_000_000 + sequence * 12`.
    pub fn push(&mut self, entry: RawLogEntry) -> &mut Self {
        self.timestamps
            .entry(entry.sequence_number)
            .or_insert(1_700_000_000 + entry.sequence_number * 12);
        self.entries.push(entry);
        self
    }

    pub fn deposit(&mut self, sequence: u64, log_index: u64, from: Address, amount: u64) -> &mut Self {
        let event = FundsDeposited {
            initiator: from,
            amount: U256::from(amount),
        };
        self.push(RawLogEntry::from_event(&event, sequence, log_index, tx_hash(sequence, log_index)))
    }

    pub fn payment(
        &mut self,
        sequence: u64,
        log_index: u64,
        from: Address,
        to: Address,
        amount: u64,
    ) -> &mut Self {
        let event = PaymentSent {
            initiator: from,
            recipient: to,
            amount: U256::from(amount),
        };
        self.push(RawLogEntry::from_event(&event, sequence, log_index, tx_hash(sequence, log_index)))
    }

    pub fn hire(
        &mut self,
        sequence: u64,
        log_index: u64,
        from: Address,
        to: Address,
        name: &str,
        rate: u64,
    ) -> &mut Self {
        let event = MemberAdded {
            initiator: from,
            recipient: to,
            name: name.to_string(),
            rate: U256::from(rate),
        };
        self.push(RawLogEntry::from_event(&event, sequence, log_index, tx_hash(sequence, log_index)))
    }

    pub fn removal(&mut self, sequence: u64, log_index: u64, from: Address, to: Address) -> &mut Self {
        let event = MemberRemoved {
            initiator: from,
            recipient: to,
        };
        self.push(RawLogEntry::from_event(&event, sequence, log_index, tx_hash(sequence, log_index)))
    }

    pub fn rate_change(
        &mut self,
        sequence: u64,
        log_index: u64,
        from: Address,
        to: Address,
        rate: u64,
    ) -> &mut Self {
        let event = RateChanged {
            initiator: from,
            recipient: to,
            new_rate: U256::from(rate),
        };
        self.push(RawLogEntry::from_event(&event, sequence, log_index, tx_hash(sequence, log_index)))
    }

    pub fn bonus(&mut self, sequence: u64, log_index: u64, to: Address, amount: u64) -> &mut Self {
        let event = BonusAwarded {
            recipient: to,
            amount: U256::from(amount),
        };
        self.push(RawLogEntry::from_event(&event, sequence, log_index, tx_hash(sequence, log_index)))
    }

    pub fn height_calls(&self) -> usize {
        *self.height_calls.lock()
    }

    pub fn scan_count(&self) -> usize {
        self.scans.lock().len()
    }

    pub fn timestamp_fetch_count(&self) -> usize {
        self.timestamp_fetches.lock().len()
    }

    pub fn total_calls(&self) -> usize {
        self.height_calls() + self.scan_count() + self.timestamp_fetch_count()
    }
}

#[async_trait::async_trait]
impl LedgerClient for MockLedger {
    async fn current_height(&self) -> Result<u64, LedgerError> {
        *self.height_calls.lock() += 1;
        if self.height_unavailable {
            return Err(LedgerError::Rpc("connection refused".to_string()));
        }
        Ok(self.height)
    }

    async fn block_timestamp(&self, sequence: u64) -> Result<u64, LedgerError> {
        self.timestamp_fetches.lock().push(sequence);
        self.timestamps
            .get(&sequence)
            .copied()
            .ok_or(LedgerError::BlockNotFound { sequence })
    }

    async fn scan_logs(&self, query: &LogQuery) -> Result<Vec<RawLogEntry>, LedgerError> {
        self.scans.lock().push(query.clone());
        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_kinds.contains(&query.kind) {
            return Err(LedgerError::Rpc(format!("{} scan timed out", query.kind)));
        }

        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                if self.ignore_topic_filters {
                    entry.topics.first() == Some(&query.signature)
                } else {
                    query.matches(entry)
                }
            })
            .cloned()
            .collect())
    }
}

/// What a receipt lookup should report for a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptBehaviour {
    Success,
    Reverted,
    Unavailable,
}

pub const APPROVAL_TX: B256 = B256::repeat_byte(0x0a);
pub const TRANSFER_TX: B256 = B256::repeat_byte(0x0b);

/// Token ledger recording every read and submission.
pub struct MockTokenLedger {
    pub allowance: U256,
    pub balance: U256,
    pub reads_fail: bool,
    pub approval_submit_fails: bool,
    pub approval_receipt: ReceiptBehaviour,
    pub transfer_submit_fails: bool,
    pub transfer_receipt: ReceiptBehaviour,
    pub allowance_reads: Mutex<usize>,
    pub approvals: Mutex<Vec<(Address, Address, U256)>>,
    pub transfers: Mutex<Vec<TransferRequest>>,
}

impl MockTokenLedger {
    pub fn new(allowance: u64, balance: u64) -> Self {
        Self {
            allowance: U256::from(allowance),
            balance: U256::from(balance),
            reads_fail: false,
            approval_submit_fails: false,
            approval_receipt: ReceiptBehaviour::Success,
            transfer_submit_fails: false,
            transfer_receipt: ReceiptBehaviour::Success,
            allowance_reads: Mutex::new(0),
            approvals: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
        }
    }

    pub fn submissions(&self) -> usize {
        self.approvals.lock().len() + self.transfers.lock().len()
    }
}

#[async_trait::async_trait]
impl TokenLedger for MockTokenLedger {
    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
    ) -> Result<U256, LedgerError> {
        *self.allowance_reads.lock() += 1;
        if self.reads_fail {
            return Err(LedgerError::Rpc("node offline".to_string()));
        }
        Ok(self.allowance)
    }

    async fn balance_of(&self, _token: Address, _owner: Address) -> Result<U256, LedgerError> {
        if self.reads_fail {
            return Err(LedgerError::Rpc("node offline".to_string()));
        }
        Ok(self.balance)
    }

    async fn submit_approval(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, LedgerError> {
        if self.approval_submit_fails {
            return Err(LedgerError::Transaction("user rejected".to_string()));
        }
        self.approvals.lock().push((token, spender, amount));
        Ok(APPROVAL_TX)
    }

    async fn submit_transfer(&self, request: &TransferRequest) -> Result<B256, LedgerError> {
        if self.transfer_submit_fails {
            return Err(LedgerError::Transaction("insufficient gas".to_string()));
        }
        self.transfers.lock().push(*request);
        Ok(TRANSFER_TX)
    }

    async fn await_receipt(&self, tx_hash: B256) -> Result<TxReceipt, LedgerError> {
        let behaviour = if tx_hash == APPROVAL_TX {
            self.approval_receipt
        } else {
            self.transfer_receipt
        };
        match behaviour {
            ReceiptBehaviour::Unavailable => {
                Err(LedgerError::Transaction("receipt timed out".to_string()))
            }
            ReceiptBehaviour::Success | ReceiptBehaviour::Reverted => Ok(TxReceipt {
                tx_hash,
                block_number: 42,
                success: behaviour == ReceiptBehaviour::Success,
            }),
        }
    }
}
