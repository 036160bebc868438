//! Per-kind decoding of raw payroll logs into typed occurrences.
//!
//! Decoding is strict: an entry whose topic layout does not match the
//! kind's schema is rejected before any ABI decoding is attempted.

use alloy_sol_types::SolEvent;
use common::interfaces::payroll::{
    BonusAwarded, FundsDeposited, MemberAdded, MemberRemoved, PaymentSent, RateChanged,
};

use crate::errors::{DecodeError, DecodeFailure};
use crate::ledger::RawLogEntry;
use crate::types::{EventKind, Occurrence, OccurrenceFields};

/// Decode one raw entry retrieved by a scan for `kind`.
pub fn decode_entry(kind: EventKind, entry: &RawLogEntry) -> Result<Occurrence, DecodeError> {
    check_layout(kind, entry)?;

    let fields = match kind {
        EventKind::FundsDeposited => {
            let event = decode_event::<FundsDeposited>(kind, entry)?;
            OccurrenceFields::FundsDeposited {
                initiator: event.initiator,
                amount: event.amount,
            }
        }
        EventKind::PaymentSent => {
            let event = decode_event::<PaymentSent>(kind, entry)?;
            OccurrenceFields::PaymentSent {
                initiator: event.initiator,
                recipient: event.recipient,
                amount: event.amount,
            }
        }
        EventKind::MemberAdded => {
            let event = decode_event::<MemberAdded>(kind, entry)?;
            OccurrenceFields::MemberAdded {
                initiator: event.initiator,
                recipient: event.recipient,
                name: event.name,
                rate: event.rate,
            }
        }
        EventKind::MemberRemoved => {
            let event = decode_event::<MemberRemoved>(kind, entry)?;
            OccurrenceFields::MemberRemoved {
                initiator: event.initiator,
                recipient: event.recipient,
            }
        }
        EventKind::RateChanged => {
            let event = decode_event::<RateChanged>(kind, entry)?;
            OccurrenceFields::RateChanged {
                initiator: event.initiator,
                recipient: event.recipient,
                new_rate: event.new_rate,
            }
        }
        EventKind::BonusAwarded => {
            let event = decode_event::<BonusAwarded>(kind, entry)?;
            OccurrenceFields::BonusAwarded {
                recipient: event.recipient,
                amount: event.amount,
            }
        }
    };

    Ok(Occurrence {
        sequence_number: entry.sequence_number,
        log_index: entry.log_index,
        event_hash: entry.event_hash,
        fields,
    })
}

fn check_layout(kind: EventKind, entry: &RawLogEntry) -> Result<(), DecodeError> {
    let topic0 = entry
        .topics
        .first()
        .ok_or_else(|| failure(kind, entry, DecodeFailure::MissingSignature))?;

    if *topic0 != kind.signature() {
        return Err(failure(
            kind,
            entry,
            DecodeFailure::SignatureMismatch {
                expected: kind.signature(),
                found: *topic0,
            },
        ));
    }

    let expected = 1 + kind.indexed_fields().len();
    if entry.topics.len() != expected {
        return Err(failure(
            kind,
            entry,
            DecodeFailure::TopicCount {
                expected,
                found: entry.topics.len(),
            },
        ));
    }

    Ok(())
}

fn decode_event<E: SolEvent>(kind: EventKind, entry: &RawLogEntry) -> Result<E, DecodeError> {
    E::decode_raw_log(entry.topics.iter().copied(), &entry.data)
        .map_err(|e| failure(kind, entry, DecodeFailure::Abi(e.to_string())))
}

fn failure(kind: EventKind, entry: &RawLogEntry, reason: DecodeFailure) -> DecodeError {
    DecodeError {
        kind,
        entry: entry.entry_ref(),
        reason,
    }
}
