//! Batched block timestamp resolution.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{HistoryWarning, LedgerError};
use crate::ledger::LedgerClient;

/// Timestamps for the blocks that resolved, plus the error for each block
/// that did not.
#[derive(Debug, Clone, Default)]
pub struct ResolvedTimestamps {
    pub timestamps: BTreeMap<u64, u64>,
    pub unavailable: BTreeMap<u64, LedgerError>,
}

impl ResolvedTimestamps {
    pub fn get(&self, sequence: u64) -> Option<u64> {
        self.timestamps.get(&sequence).copied()
    }

    /// One `TimestampUnavailable` warning per failed block, ascending.
    pub fn warnings(&self) -> Vec<HistoryWarning> {
        self.unavailable
            .iter()
            .map(|(sequence, e)| HistoryWarning::TimestampUnavailable {
                sequence: *sequence,
                reason: e.to_string(),
            })
            .collect()
    }
}

/// Resolves block numbers to wall-clock time with one fetch per distinct block.
pub struct TimestampResolver<'a, L: LedgerClient + ?Sized> {
    ledger: &'a L,
    max_concurrent: usize,
}

impl<'a, L: LedgerClient + ?Sized> TimestampResolver<'a, L> {
    pub fn new(ledger: &'a L, max_concurrent: usize) -> Self {
        Self {
            ledger,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetch all distinct sequences concurrently and wait for every fetch.
    pub async fn resolve<I>(&self, sequences: I) -> ResolvedTimestamps
    where
        I: IntoIterator<Item = u64>,
    {
        let distinct: BTreeSet<u64> = sequences.into_iter().collect();
        if distinct.is_empty() {
            return ResolvedTimestamps::default();
        }

        tracing::debug!(
            target: "activity_feed",
            blocks = distinct.len(),
            max_concurrent = self.max_concurrent,
            "Resolving block timestamps"
        );

        let ledger = self.ledger;
        let results: Vec<_> = stream::iter(distinct)
            .map(|sequence| async move { (sequence, ledger.block_timestamp(sequence).await) })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut resolved = ResolvedTimestamps::default();
        for (sequence, result) in results {
            match result {
                Ok(timestamp) => {
                    resolved.timestamps.insert(sequence, timestamp);
                }
                Err(e) => {
                    tracing::warn!(
                        target: "activity_feed",
                        sequence,
                        error = %e,
                        "Block timestamp unavailable"
                    );
                    resolved.unavailable.insert(sequence, e);
                }
            }
        }

        resolved
    }
}
