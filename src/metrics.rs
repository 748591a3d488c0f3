use indexmap::IndexMap;

use crate::data::{PairLabel, PairRecord};
use crate::types::TargetItem;

/// Aggregate class balance over a labeled pair table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelBalance {
    pub total: usize,
    pub positives: usize,
    pub negatives: usize,
}

impl LabelBalance {
    /// Negatives per positive; infinite when no positives are present.
    pub fn ratio(&self) -> f64 {
        if self.positives == 0 {
            f64::INFINITY
        } else {
            self.negatives as f64 / self.positives as f64
        }
    }
}

/// Compute class balance; `None` for an empty table.
pub fn label_balance(rows: &[PairRecord]) -> Option<LabelBalance> {
    if rows.is_empty() {
        return None;
    }
    let positives = rows
        .iter()
        .filter(|row| row.label == PairLabel::Positive)
        .count();
    Some(LabelBalance {
        total: rows.len(),
        positives,
        negatives: rows.len() - positives,
    })
}

/// Per-target row counts split by label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetShare {
    pub target: TargetItem,
    pub positives: usize,
    pub negatives: usize,
}

/// Per-target shares sorted by total count descending, then target name, so
/// output ordering is stable for logs and assertions.
pub fn target_shares(rows: &[PairRecord]) -> Vec<TargetShare> {
    let mut counts: IndexMap<TargetItem, (usize, usize)> = IndexMap::new();
    for row in rows {
        let entry = counts.entry(row.target.clone()).or_insert((0, 0));
        match row.label {
            PairLabel::Positive => entry.0 += 1,
            PairLabel::Negative => entry.1 += 1,
        }
    }
    let mut shares: Vec<TargetShare> = counts
        .into_iter()
        .map(|(target, (positives, negatives))| TargetShare {
            target,
            positives,
            negatives,
        })
        .collect();
    shares.sort_by(|a, b| {
        (b.positives + b.negatives)
            .cmp(&(a.positives + a.negatives))
            .then_with(|| a.target.cmp(&b.target))
    });
    shares
}
