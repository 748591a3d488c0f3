use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ColumnSpec;
use crate::constants::corpus::{
    BACKGROUND_CORPUS, NEGATIVE_LABEL, POSITIVE_CORPUS, POSITIVE_LABEL, REFERENCE_CORPUS,
};
use crate::errors::SamplerError;
use crate::types::{ColumnName, PairKey, SourceItem, TargetItem};
use crate::utils::within_length;

/// Class label for a pairing row.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PairLabel {
    /// Observed binding pair.
    Positive,
    /// Manufactured non-binding pair.
    Negative,
}

impl PairLabel {
    /// Numeric wire value: `1` positive, `0` negative.
    pub fn as_u8(self) -> u8 {
        match self {
            PairLabel::Positive => 1,
            PairLabel::Negative => 0,
        }
    }
}

/// A single labeled pairing row. Immutable once labeled.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairRecord {
    /// Source-side item.
    pub source: SourceItem,
    /// Target-side item.
    pub target: TargetItem,
    /// Class label.
    pub label: PairLabel,
}

impl PairRecord {
    /// Build a positive row.
    pub fn positive(source: SourceItem, target: TargetItem) -> Self {
        Self {
            source,
            target,
            label: PairLabel::Positive,
        }
    }

    /// Build a negative row.
    pub fn negative(source: SourceItem, target: TargetItem) -> Self {
        Self {
            source,
            target,
            label: PairLabel::Negative,
        }
    }

    /// Label-independent deduplication key.
    pub fn key(&self) -> PairKey {
        (self.source.clone(), self.target.clone())
    }
}

/// Minimal parsed table: a header row plus string cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header names in file order.
    pub columns: Vec<ColumnName>,
    /// Row cells in file order.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

fn require_column(
    table: &RawTable,
    name: &str,
    corpus_name: &str,
) -> Result<usize, SamplerError> {
    table
        .column_index(name)
        .ok_or_else(|| SamplerError::InvalidInput {
            corpus: corpus_name.to_string(),
            reason: format!("missing required column '{name}'"),
        })
}

/// Extract `(source, target)` pairs, skipping rows with an empty cell in
/// either item column. Upstream exports occasionally carry blank rows; they
/// carry no pairing information and are dropped with a count.
fn collect_pairs(
    table: &RawTable,
    source_idx: usize,
    target_idx: usize,
    corpus_name: &str,
) -> Vec<PairKey> {
    let mut rows = Vec::with_capacity(table.rows.len());
    let mut skipped = 0usize;
    for cells in &table.rows {
        let source = cells.get(source_idx).map(String::as_str).unwrap_or("");
        let target = cells.get(target_idx).map(String::as_str).unwrap_or("");
        if source.is_empty() || target.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push((source.to_string(), target.to_string()));
    }
    if skipped > 0 {
        warn!(corpus = corpus_name, skipped, "dropped rows with empty item cells");
    }
    rows
}

/// Ordered positive pair corpus: the working subset after any upstream length
/// filtering or fold splitting.
#[derive(Clone, Debug, Default)]
pub struct PositiveCorpus {
    rows: Vec<PairKey>,
}

impl PositiveCorpus {
    /// Build from in-memory pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = PairKey>) -> Self {
        Self {
            rows: pairs.into_iter().collect(),
        }
    }

    /// Build from a parsed table.
    ///
    /// The label column may be present but every row must carry the positive
    /// label; a negative row in the positive corpus is malformed input.
    pub fn from_table(table: &RawTable, columns: &ColumnSpec) -> Result<Self, SamplerError> {
        let source_idx = require_column(table, &columns.source, POSITIVE_CORPUS)?;
        let target_idx = require_column(table, &columns.target, POSITIVE_CORPUS)?;
        if let Some(label_idx) = table.column_index(&columns.label) {
            for (row_idx, cells) in table.rows.iter().enumerate() {
                let label = cells.get(label_idx).map(String::as_str).unwrap_or("");
                if parse_label(label) != Some(PairLabel::Positive) {
                    return Err(SamplerError::InvalidInput {
                        corpus: POSITIVE_CORPUS.to_string(),
                        reason: format!(
                            "row {row_idx} carries label '{label}' but only '{POSITIVE_LABEL}' is allowed"
                        ),
                    });
                }
            }
        }
        Ok(Self {
            rows: collect_pairs(table, source_idx, target_idx, POSITIVE_CORPUS),
        })
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[PairKey] {
        &self.rows
    }

    /// Number of positive rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are present.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unique target items in first-seen order.
    pub fn unique_targets(&self) -> IndexSet<TargetItem> {
        self.rows.iter().map(|(_, target)| target.clone()).collect()
    }

    /// Unique source items in first-seen order.
    pub fn unique_sources(&self) -> IndexSet<SourceItem> {
        self.rows.iter().map(|(source, _)| source.clone()).collect()
    }
}

/// Full unfiltered reference corpus, used exclusively to compute exclusions.
/// Never mutated.
#[derive(Clone, Debug, Default)]
pub struct ReferenceCorpus {
    rows: Vec<PairKey>,
}

impl ReferenceCorpus {
    /// Build from in-memory pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = PairKey>) -> Self {
        Self {
            rows: pairs.into_iter().collect(),
        }
    }

    /// Build from a parsed table.
    ///
    /// The reference corpus holds known positives only, so a label column is
    /// rejected outright: its presence means the caller handed over a working
    /// set rather than the raw reference data.
    pub fn from_table(table: &RawTable, columns: &ColumnSpec) -> Result<Self, SamplerError> {
        if table.column_index(&columns.label).is_some() {
            return Err(SamplerError::InvalidInput {
                corpus: REFERENCE_CORPUS.to_string(),
                reason: format!("label column '{}' present where disallowed", columns.label),
            });
        }
        let source_idx = require_column(table, &columns.source, REFERENCE_CORPUS)?;
        let target_idx = require_column(table, &columns.target, REFERENCE_CORPUS)?;
        Ok(Self {
            rows: collect_pairs(table, source_idx, target_idx, REFERENCE_CORPUS),
        })
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[PairKey] {
        &self.rows
    }

    /// Number of reference rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are present.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// External pool of source items known to have no in-domain target
/// association at all.
#[derive(Clone, Debug, Default)]
pub struct BackgroundPool {
    items: Vec<SourceItem>,
}

impl BackgroundPool {
    /// Build from in-memory items.
    pub fn from_items(items: impl IntoIterator<Item = SourceItem>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Build from a single-column parsed table.
    pub fn from_table(table: &RawTable, column: &str) -> Result<Self, SamplerError> {
        let item_idx = require_column(table, column, BACKGROUND_CORPUS)?;
        let mut items = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;
        for cells in &table.rows {
            let item = cells.get(item_idx).map(String::as_str).unwrap_or("");
            if item.is_empty() {
                skipped += 1;
                continue;
            }
            items.push(item.to_string());
        }
        if skipped > 0 {
            warn!(corpus = BACKGROUND_CORPUS, skipped, "dropped rows with empty item cells");
        }
        Ok(Self { items })
    }

    /// Keep only items whose length falls within the inclusive range, so the
    /// pool matches the length window of the working corpus.
    pub fn retain_length_range(mut self, min: usize, max: usize) -> Self {
        let before = self.items.len();
        self.items.retain(|item| within_length(item, min, max));
        let dropped = before - self.items.len();
        if dropped > 0 {
            debug!(dropped, min, max, "filtered background items outside the length range");
        }
        self
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[SourceItem] {
        &self.items
    }

    /// Number of pool items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parse the wire value of a label cell.
pub fn parse_label(value: &str) -> Option<PairLabel> {
    match value {
        POSITIVE_LABEL => Some(PairLabel::Positive),
        NEGATIVE_LABEL => Some(PairLabel::Negative),
        _ => None,
    }
}
