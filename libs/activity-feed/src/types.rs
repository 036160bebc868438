//! Data model for reconstructed activity history.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use common::interfaces::payroll::{
    BonusAwarded, FundsDeposited, MemberAdded, MemberRemoved, PaymentSent, RateChanged,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::errors::HistoryWarning;

/// Payroll contract event kinds tracked by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    FundsDeposited,
    PaymentSent,
    MemberAdded,
    MemberRemoved,
    RateChanged,
    BonusAwarded,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::FundsDeposited,
        EventKind::PaymentSent,
        EventKind::MemberAdded,
        EventKind::MemberRemoved,
        EventKind::RateChanged,
        EventKind::BonusAwarded,
    ];

    /// Event signature hash (topic0)
    pub fn signature(&self) -> B256 {
        match self {
            EventKind::FundsDeposited => FundsDeposited::SIGNATURE_HASH,
            EventKind::PaymentSent => PaymentSent::SIGNATURE_HASH,
            EventKind::MemberAdded => MemberAdded::SIGNATURE_HASH,
            EventKind::MemberRemoved => MemberRemoved::SIGNATURE_HASH,
            EventKind::RateChanged => RateChanged::SIGNATURE_HASH,
            EventKind::BonusAwarded => BonusAwarded::SIGNATURE_HASH,
        }
    }

    /// Indexed fields in topic order (topic1, topic2, ...)
    pub fn indexed_fields(&self) -> &'static [IndexedField] {
        match self {
            EventKind::FundsDeposited => &[IndexedField::Initiator],
            EventKind::BonusAwarded => &[IndexedField::Recipient],
            EventKind::PaymentSent
            | EventKind::MemberAdded
            | EventKind::MemberRemoved
            | EventKind::RateChanged => &[IndexedField::Initiator, IndexedField::Recipient],
        }
    }

    /// Topic position of an indexed field, counting topic0 as position 0.
    pub fn topic_position(&self, field: IndexedField) -> Option<usize> {
        self.indexed_fields()
            .iter()
            .position(|f| *f == field)
            .map(|i| i + 1)
    }

    /// Field that holds the subject address when scanning for `role`.
    ///
    /// Returns `None` when the kind is not part of that role's history.
    pub fn subject_field(&self, role: Role) -> Option<IndexedField> {
        match (self, role) {
            (EventKind::FundsDeposited, Role::Employer) => Some(IndexedField::Initiator),
            (EventKind::FundsDeposited, Role::Employee) => None,
            (EventKind::BonusAwarded, Role::Employer) => None,
            (EventKind::BonusAwarded, Role::Employee) => Some(IndexedField::Recipient),
            (_, Role::Employer) => Some(IndexedField::Initiator),
            (_, Role::Employee) => Some(IndexedField::Recipient),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::FundsDeposited => "FundsDeposited",
            EventKind::PaymentSent => "PaymentSent",
            EventKind::MemberAdded => "MemberAdded",
            EventKind::MemberRemoved => "MemberRemoved",
            EventKind::RateChanged => "RateChanged",
            EventKind::BonusAwarded => "BonusAwarded",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named indexed positions shared by the payroll events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndexedField {
    Initiator,
    Recipient,
}

impl fmt::Display for IndexedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexedField::Initiator => write!(f, "initiator"),
            IndexedField::Recipient => write!(f, "recipient"),
        }
    }
}

/// Perspective a history is reconstructed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Employee,
}

impl Role {
    /// Kinds scanned for this role, in scan order.
    pub fn tracked_kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .iter()
            .copied()
            .filter(|kind| kind.subject_field(*self).is_some())
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Employer => write!(f, "employer"),
            Role::Employee => write!(f, "employee"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employer" => Ok(Role::Employer),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role '{}', expected employer or employee", other)),
        }
    }
}

/// Kind-specific payload of a decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccurrenceFields {
    FundsDeposited {
        initiator: Address,
        amount: U256,
    },
    PaymentSent {
        initiator: Address,
        recipient: Address,
        amount: U256,
    },
    MemberAdded {
        initiator: Address,
        recipient: Address,
        name: String,
        rate: U256,
    },
    MemberRemoved {
        initiator: Address,
        recipient: Address,
    },
    RateChanged {
        initiator: Address,
        recipient: Address,
        new_rate: U256,
    },
    BonusAwarded {
        recipient: Address,
        amount: U256,
    },
}

impl OccurrenceFields {
    pub fn kind(&self) -> EventKind {
        match self {
            OccurrenceFields::FundsDeposited { .. } => EventKind::FundsDeposited,
            OccurrenceFields::PaymentSent { .. } => EventKind::PaymentSent,
            OccurrenceFields::MemberAdded { .. } => EventKind::MemberAdded,
            OccurrenceFields::MemberRemoved { .. } => EventKind::MemberRemoved,
            OccurrenceFields::RateChanged { .. } => EventKind::RateChanged,
            OccurrenceFields::BonusAwarded { .. } => EventKind::BonusAwarded,
        }
    }

    pub fn initiator(&self) -> Option<Address> {
        match self {
            OccurrenceFields::FundsDeposited { initiator, .. }
            | OccurrenceFields::PaymentSent { initiator, .. }
            | OccurrenceFields::MemberAdded { initiator, .. }
            | OccurrenceFields::MemberRemoved { initiator, .. }
            | OccurrenceFields::RateChanged { initiator, .. } => Some(*initiator),
            OccurrenceFields::BonusAwarded { .. } => None,
        }
    }

    pub fn recipient(&self) -> Option<Address> {
        match self {
            OccurrenceFields::FundsDeposited { .. } => None,
            OccurrenceFields::PaymentSent { recipient, .. }
            | OccurrenceFields::MemberAdded { recipient, .. }
            | OccurrenceFields::MemberRemoved { recipient, .. }
            | OccurrenceFields::RateChanged { recipient, .. }
            | OccurrenceFields::BonusAwarded { recipient, .. } => Some(*recipient),
        }
    }

    pub fn field(&self, field: IndexedField) -> Option<Address> {
        match field {
            IndexedField::Initiator => self.initiator(),
            IndexedField::Recipient => self.recipient(),
        }
    }
}

/// One decoded raw event, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Block number containing the event
    pub sequence_number: u64,
    /// Position of the log within its block
    pub log_index: u64,
    /// Hash of the originating transaction
    pub event_hash: B256,
    pub fields: OccurrenceFields,
}

impl Occurrence {
    pub fn kind(&self) -> EventKind {
        self.fields.kind()
    }

    /// Identity derived from `(event_hash, log_index)`
    pub fn id(&self) -> String {
        format!("{:#x}-{}", self.event_hash, self.log_index)
    }
}

/// Normalized, display-ready history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    pub kind: EventKind,
    pub timestamp_seconds: u64,
    pub amount: Option<U256>,
    pub counterparty: Option<Address>,
    pub description: String,
    pub sequence_number: u64,
    pub log_index: u64,
}

impl ActivityRecord {
    /// Total order used for history output: newest first.
    ///
    /// Ties on timestamp fall back to `(sequence_number, log_index)` and
    /// finally `id`, all descending.
    pub fn newest_first(a: &ActivityRecord, b: &ActivityRecord) -> Ordering {
        b.timestamp_seconds
            .cmp(&a.timestamp_seconds)
            .then_with(|| b.sequence_number.cmp(&a.sequence_number))
            .then_with(|| b.log_index.cmp(&a.log_index))
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// Inclusive range of blocks scanned by one history call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from_sequence: u64,
    pub to_sequence: u64,
}

impl Window {
    pub fn ending_at(current_height: u64, lookback: u64) -> Self {
        Self {
            from_sequence: current_height.saturating_sub(lookback),
            to_sequence: current_height,
        }
    }

    pub fn contains(&self, sequence: u64) -> bool {
        sequence >= self.from_sequence && sequence <= self.to_sequence
    }

    /// Number of blocks covered
    pub fn block_count(&self) -> u64 {
        self.to_sequence - self.from_sequence + 1
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.from_sequence, self.to_sequence)
    }
}

/// Result of a history call that was not aborted.
///
/// An empty `records` with no warnings means "no activity"; non-empty
/// `warnings` means the history is partial.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityHistory {
    pub records: Vec<ActivityRecord>,
    pub warnings: Vec<HistoryWarning>,
    pub window: Option<Window>,
}

impl ActivityHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
