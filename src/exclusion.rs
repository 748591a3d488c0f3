use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::data::{PositiveCorpus, ReferenceCorpus};
use crate::types::{SourceItem, TargetItem};

/// Forbidden-partner lookup derived from the reference corpus merged with the
/// in-progress positive set.
///
/// Built once per builder invocation and read-only afterward. An absent key
/// means the item has no known positive partner, so everything is permitted.
#[derive(Debug, Default)]
pub struct ExclusionIndex {
    targets_by_source: HashMap<SourceItem, HashSet<TargetItem>>,
    sources_by_target: HashMap<TargetItem, HashSet<SourceItem>>,
}

fn empty_targets() -> &'static HashSet<TargetItem> {
    static EMPTY: OnceLock<HashSet<TargetItem>> = OnceLock::new();
    EMPTY.get_or_init(HashSet::new)
}

impl ExclusionIndex {
    /// Merge `reference` with `extra` (deduplicated through the set inserts)
    /// and index forbidden partners in both directions.
    ///
    /// Merging matters when the working positive set is not contained in the
    /// reference corpus, e.g. an external validation subset.
    pub fn build(reference: &ReferenceCorpus, extra: &PositiveCorpus) -> Self {
        let mut index = Self::default();
        for (source, target) in reference.rows().iter().chain(extra.rows()) {
            index
                .targets_by_source
                .entry(source.clone())
                .or_default()
                .insert(target.clone());
            index
                .sources_by_target
                .entry(target.clone())
                .or_default()
                .insert(source.clone());
        }
        index
    }

    /// Target items `source` is known to positively pair with.
    pub fn forbidden_targets(&self, source: &str) -> &HashSet<TargetItem> {
        self.targets_by_source
            .get(source)
            .unwrap_or_else(|| empty_targets())
    }

    /// Source items `target` is known to positively pair with.
    pub fn forbidden_sources(&self, target: &str) -> &HashSet<SourceItem> {
        self.sources_by_target
            .get(target)
            .unwrap_or_else(|| empty_targets())
    }

    /// True if `(source, target)` is a known positive pairing.
    pub fn is_forbidden(&self, source: &str, target: &str) -> bool {
        self.forbidden_targets(source).contains(target)
    }
}
