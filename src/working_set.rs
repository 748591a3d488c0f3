use std::collections::HashSet;

use crate::data::{PairRecord, PositiveCorpus};
use crate::errors::SamplerError;
use crate::types::PairKey;

/// Outcome of attempting to append a sampled row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The pair was new and is now part of the set.
    Inserted,
    /// The `(source, target)` key was already present; the first occurrence is
    /// kept and the attempted row is handed back.
    Duplicate(PairRecord),
}

/// Append-only arena of labeled pairs with incremental duplicate tracking.
///
/// Positives are seeded first and negatives appended behind them, so the
/// positives-before-negatives order is preserved by construction. The seen-key
/// set makes duplicate detection O(1) per append instead of a full-table scan
/// after every merge.
#[derive(Debug)]
pub struct WorkingSet {
    rows: Vec<PairRecord>,
    seen: HashSet<PairKey>,
    positive_len: usize,
}

impl WorkingSet {
    /// Seed the arena with the positive corpus.
    ///
    /// A duplicate positive pair is a modeling bug upstream and aborts loudly
    /// instead of being silently collapsed.
    pub fn seed(positives: &PositiveCorpus) -> Result<Self, SamplerError> {
        let mut set = Self {
            rows: Vec::with_capacity(positives.len() * 2),
            seen: HashSet::with_capacity(positives.len() * 2),
            positive_len: 0,
        };
        for (source, target) in positives.rows() {
            let record = PairRecord::positive(source.clone(), target.clone());
            if !set.seen.insert(record.key()) {
                return Err(SamplerError::InvariantViolation(format!(
                    "duplicate positive pair ({source}, {target}) in the input corpus"
                )));
            }
            set.rows.push(record);
        }
        set.positive_len = set.rows.len();
        Ok(set)
    }

    /// Append a sampled row, keeping the first occurrence on key collision.
    pub fn append(&mut self, record: PairRecord) -> AppendOutcome {
        if self.seen.contains(&record.key()) {
            return AppendOutcome::Duplicate(record);
        }
        self.seen.insert(record.key());
        self.rows.push(record);
        AppendOutcome::Inserted
    }

    /// All rows, positives first.
    pub fn rows(&self) -> &[PairRecord] {
        &self.rows
    }

    /// The seeded positive prefix.
    pub fn positive_rows(&self) -> &[PairRecord] {
        &self.rows[..self.positive_len]
    }

    /// Number of appended negatives.
    pub fn negative_count(&self) -> usize {
        self.rows.len() - self.positive_len
    }

    /// True if a `(source, target)` key is already present under any label.
    pub fn contains(&self, key: &PairKey) -> bool {
        self.seen.contains(key)
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are present.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consume the set and return its rows.
    pub fn into_rows(self) -> Vec<PairRecord> {
        self.rows
    }
}
