//! Activity history reconstruction.
//!
//! There is no stored history anywhere: every call rebuilds it from a bounded
//! window of immutable logs.
//!
//! 1. Read the current height and derive the scan window
//! 2. Scan every tracked event kind for the role concurrently
//! 3. Decode entries, keeping only those whose subject field holds the subject
//! 4. Resolve block timestamps in one batch
//! 5. Normalize, deduplicate, sort newest first, truncate
//!
//! Scan, decode and timestamp failures degrade the result into a partial
//! history with warnings. Only a missing height or cancellation fails the call.

use alloy_primitives::utils::format_units;
use alloy_primitives::{Address, U256};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::FeedConfig;
use crate::decoder::decode_entry;
use crate::errors::{HistoryError, HistoryWarning};
use crate::ledger::{LedgerClient, LogQuery};
use crate::resolver::TimestampResolver;
use crate::types::{
    ActivityHistory, ActivityRecord, EventKind, Occurrence, OccurrenceFields, Role, Window,
};

/// Rebuilds per-address payroll history from ledger logs.
pub struct ActivityAggregator<L: LedgerClient + ?Sized> {
    ledger: Arc<L>,
    config: FeedConfig,
}

impl<L: LedgerClient + ?Sized> ActivityAggregator<L> {
    pub fn new(ledger: Arc<L>, config: FeedConfig) -> Self {
        Self { ledger, config }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Reconstruct the newest `max_results` records for `subject` seen as
    /// `role`.
    ///
    /// Cancelling `cancel` drops every in-flight ledger call and yields
    /// `HistoryError::Cancelled`; no partial records are returned in that case.
    pub async fn get_history(
        &self,
        subject: Address,
        role: Role,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<ActivityHistory, HistoryError> {
        if max_results == 0 {
            return Ok(ActivityHistory::empty());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(target: "activity_feed", %subject, %role, "History request cancelled");
                Err(HistoryError::Cancelled)
            }
            result = self.reconstruct(subject, role, max_results) => result,
        }
    }

    async fn reconstruct(
        &self,
        subject: Address,
        role: Role,
        max_results: usize,
    ) -> Result<ActivityHistory, HistoryError> {
        let height = self
            .ledger
            .current_height()
            .await
            .map_err(HistoryError::LedgerUnavailable)?;
        let window = Window::ending_at(height, self.config.lookback());

        tracing::debug!(
            target: "activity_feed",
            %subject,
            %role,
            %window,
            "Reconstructing history"
        );

        let mut warnings = Vec::new();
        let occurrences = self.scan_and_decode(subject, role, window, &mut warnings).await;

        let resolver = TimestampResolver::new(&*self.ledger, self.config.max_concurrent_fetches);
        let resolved = resolver
            .resolve(occurrences.iter().map(|o| o.sequence_number))
            .await;
        warnings.extend(resolved.warnings());

        let mut seen = HashSet::new();
        let mut records: Vec<ActivityRecord> = occurrences
            .iter()
            .filter_map(|occurrence| {
                let timestamp = resolved.get(occurrence.sequence_number)?;
                Some(normalize(occurrence, role, timestamp, &self.config))
            })
            .filter(|record| seen.insert(record.id.clone()))
            .collect();

        records.sort_by(ActivityRecord::newest_first);
        records.truncate(max_results);

        tracing::info!(
            target: "activity_feed",
            %subject,
            %role,
            records = records.len(),
            warnings = warnings.len(),
            "History reconstructed"
        );

        Ok(ActivityHistory {
            records,
            warnings,
            window: Some(window),
        })
    }

    /// One scan per tracked kind, joined before decoding.
    async fn scan_and_decode(
        &self,
        subject: Address,
        role: Role,
        window: Window,
        warnings: &mut Vec<HistoryWarning>,
    ) -> Vec<Occurrence> {
        let scans = role.tracked_kinds().into_iter().filter_map(|kind| {
            let field = kind.subject_field(role)?;
            let query = LogQuery::new(kind, window).with_filter(field, subject);
            let ledger = &self.ledger;
            Some(async move {
                let result = ledger.scan_logs(&query).await;
                (kind, field, result)
            })
        });

        let mut occurrences = Vec::new();
        // join_all keeps input order, so decode order does not depend on
        // which scan finished first
        for (kind, field, result) in join_all(scans).await {
            let entries = match result {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        target: "activity_feed",
                        %kind,
                        error = %e,
                        "Log scan failed, continuing with other kinds"
                    );
                    warnings.push(HistoryWarning::ScanFailed {
                        kind,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            tracing::debug!(target: "activity_feed", %kind, entries = entries.len(), "Scan complete");

            for entry in &entries {
                match decode_entry(kind, entry) {
                    Ok(occurrence) if occurrence.fields.field(field) == Some(subject) => {
                        occurrences.push(occurrence);
                    }
                    Ok(occurrence) => {
                        tracing::debug!(
                            target: "activity_feed",
                            %kind,
                            id = %occurrence.id(),
                            "Skipping entry that does not involve the subject"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(target: "activity_feed", error = %e, "Dropping undecodable entry");
                        warnings.push(HistoryWarning::DecodeError(e));
                    }
                }
            }
        }

        occurrences
    }
}

/// Map an occurrence to the caller-facing record for `role`.
pub fn normalize(
    occurrence: &Occurrence,
    role: Role,
    timestamp_seconds: u64,
    config: &FeedConfig,
) -> ActivityRecord {
    let amount_text = |value: &U256| render_amount(*value, config);

    let (amount, counterparty, description) = match (&occurrence.fields, role) {
        (OccurrenceFields::FundsDeposited { amount, .. }, _) => {
            (Some(*amount), None, format!("Deposited {}", amount_text(amount)))
        }
        (OccurrenceFields::PaymentSent { recipient, amount, .. }, Role::Employer) => (
            Some(*amount),
            Some(*recipient),
            format!("Paid salary of {} to {}", amount_text(amount), recipient),
        ),
        (OccurrenceFields::PaymentSent { initiator, amount, .. }, Role::Employee) => (
            Some(*amount),
            Some(*initiator),
            format!("Received salary payment of {}", amount_text(amount)),
        ),
        (OccurrenceFields::MemberAdded { recipient, name, rate, .. }, Role::Employer) => (
            Some(*rate),
            Some(*recipient),
            format!("Added employee {} with salary {}", name, amount_text(rate)),
        ),
        (OccurrenceFields::MemberAdded { initiator, name, rate, .. }, Role::Employee) => (
            Some(*rate),
            Some(*initiator),
            format!("Joined payroll as {} with salary {}", name, amount_text(rate)),
        ),
        (OccurrenceFields::MemberRemoved { recipient, .. }, Role::Employer) => (
            None,
            Some(*recipient),
            format!("Removed employee {}", recipient),
        ),
        (OccurrenceFields::MemberRemoved { initiator, .. }, Role::Employee) => {
            (None, Some(*initiator), "Removed from payroll".to_string())
        }
        (OccurrenceFields::RateChanged { recipient, new_rate, .. }, Role::Employer) => (
            Some(*new_rate),
            Some(*recipient),
            format!("Updated salary of {} to {}", recipient, amount_text(new_rate)),
        ),
        (OccurrenceFields::RateChanged { initiator, new_rate, .. }, Role::Employee) => (
            Some(*new_rate),
            Some(*initiator),
            format!("Salary updated to {}", amount_text(new_rate)),
        ),
        (OccurrenceFields::BonusAwarded { amount, .. }, _) => {
            (Some(*amount), None, format!("Received bonus of {}", amount_text(amount)))
        }
    };

    ActivityRecord {
        id: occurrence.id(),
        kind: occurrence.kind(),
        timestamp_seconds,
        amount,
        counterparty,
        description,
        sequence_number: occurrence.sequence_number,
        log_index: occurrence.log_index,
    }
}

/// Render a token amount for descriptions.
///
/// With decimals configured the value is scaled and trailing zeros trimmed;
/// otherwise the raw integer is used.
pub fn render_amount(amount: U256, config: &FeedConfig) -> String {
    let mut text = match config.token_decimals {
        Some(decimals) => match format_units(amount, decimals) {
            Ok(scaled) => trim_fraction(scaled),
            Err(_) => amount.to_string(),
        },
        None => amount.to_string(),
    };
    if let Some(symbol) = &config.token_symbol {
        text.push(' ');
        text.push_str(symbol);
    }
    text
}

fn trim_fraction(scaled: String) -> String {
    if !scaled.contains('.') {
        return scaled;
    }
    scaled.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Kinds whose records carry an amount
pub fn carries_amount(kind: EventKind) -> bool {
    !matches!(kind, EventKind::MemberRemoved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn occurrence(fields: OccurrenceFields) -> Occurrence {
        Occurrence {
            sequence_number: 10,
            log_index: 1,
            event_hash: B256::repeat_byte(0x11),
            fields,
        }
    }

    #[test]
    fn test_normalize_deposit() {
        let record = normalize(
            &occurrence(OccurrenceFields::FundsDeposited {
                initiator: Address::repeat_byte(1),
                amount: U256::from(500),
            }),
            Role::Employer,
            1_700_000_000,
            &FeedConfig::default(),
        );
        assert_eq!(record.kind, EventKind::FundsDeposited);
        assert_eq!(record.amount, Some(U256::from(500)));
        assert_eq!(record.counterparty, None);
        assert_eq!(record.description, "Deposited 500");
        assert_eq!(record.timestamp_seconds, 1_700_000_000);
    }

    #[test]
    fn test_normalize_payment_counterparty_depends_on_role() {
        let employer = Address::repeat_byte(1);
        let employee = Address::repeat_byte(2);
        let payment = occurrence(OccurrenceFields::PaymentSent {
            initiator: employer,
            recipient: employee,
            amount: U256::from(200),
        });

        let as_employer = normalize(&payment, Role::Employer, 0, &FeedConfig::default());
        assert_eq!(as_employer.counterparty, Some(employee));
        assert!(as_employer.description.starts_with("Paid salary of 200 to"));

        let as_employee = normalize(&payment, Role::Employee, 0, &FeedConfig::default());
        assert_eq!(as_employee.counterparty, Some(employer));
        assert_eq!(as_employee.description, "Received salary payment of 200");
        assert_eq!(as_employer.id, as_employee.id);
    }

    #[test]
    fn test_normalize_bonus_and_removal() {
        let bonus = normalize(
            &occurrence(OccurrenceFields::BonusAwarded {
                recipient: Address::repeat_byte(2),
                amount: U256::from(75),
            }),
            Role::Employee,
            0,
            &FeedConfig::default(),
        );
        assert_eq!(bonus.counterparty, None);
        assert_eq!(bonus.description, "Received bonus of 75");

        let removed = normalize(
            &occurrence(OccurrenceFields::MemberRemoved {
                initiator: Address::repeat_byte(1),
                recipient: Address::repeat_byte(2),
            }),
            Role::Employee,
            0,
            &FeedConfig::default(),
        );
        assert_eq!(removed.amount, None);
        assert!(!carries_amount(removed.kind));
        assert_eq!(removed.description, "Removed from payroll");
    }

    #[test]
    fn test_normalize_member_added_uses_name() {
        let record = normalize(
            &occurrence(OccurrenceFields::MemberAdded {
                initiator: Address::repeat_byte(1),
                recipient: Address::repeat_byte(2),
                name: "Grace".to_string(),
                rate: U256::from(4_000),
            }),
            Role::Employer,
            0,
            &FeedConfig::default(),
        );
        assert_eq!(record.amount, Some(U256::from(4_000)));
        assert_eq!(record.description, "Added employee Grace with salary 4000");
    }

    #[test]
    fn test_render_amount_with_decimals() {
        let config = FeedConfig::default().with_token(6, "USDC");
        assert_eq!(render_amount(U256::from(1_500_000), &config), "1.5 USDC");
        assert_eq!(render_amount(U256::from(2_000_000), &config), "2 USDC");
        assert_eq!(render_amount(U256::ZERO, &config), "0 USDC");
    }

    #[test]
    fn test_render_amount_raw() {
        assert_eq!(render_amount(U256::from(42), &FeedConfig::default()), "42");
    }

    #[test]
    fn test_trim_fraction_keeps_integers() {
        assert_eq!(trim_fraction("100".to_string()), "100");
        assert_eq!(trim_fraction("1.000".to_string()), "1");
        assert_eq!(trim_fraction("0.050".to_string()), "0.05");
    }
}
