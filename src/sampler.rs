use indexmap::{IndexMap, IndexSet};
use rand::seq::IndexedRandom;
use tracing::warn;

use crate::config::SamplingMode;
use crate::constants::strategy::{
    BACKGROUND_LABEL, BACKGROUND_TARGET_LABEL, PER_SOURCE_LABEL, PER_TARGET_LABEL,
};
use crate::convergence::SamplingReport;
use crate::data::{BackgroundPool, PairRecord};
use crate::exclusion::ExclusionIndex;
use crate::hash::item_draw_seed;
use crate::types::{SourceItem, TargetItem};
use crate::working_set::WorkingSet;

/// Small deterministic RNG used for reproducible draws.
///
/// Splitmix64 core; every draw site seeds a fresh instance from a stable hash
/// so no shared mutable RNG state exists anywhere in the engine.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create an RNG seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64_internal(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9E3779B97F4A7C15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }
}

impl rand::RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64_internal() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_u64_internal()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut offset = 0;
        while offset < dest.len() {
            let value = self.next_u64_internal();
            let bytes = value.to_le_bytes();
            let remaining = dest.len() - offset;
            let copy_len = remaining.min(bytes.len());
            dest[offset..offset + copy_len].copy_from_slice(&bytes[..copy_len]);
            offset += copy_len;
        }
    }
}

/// Read-only inputs shared by every sampling strategy for one invocation.
///
/// Derived once from the seeded working set; the positive prefix never changes
/// while the loop runs, so the context stays valid across retries.
pub struct SamplingContext<'a> {
    /// Invocation seed all per-item draw seeds derive from.
    pub seed: u64,
    /// Forbidden-partner index. Background sampling ignores it by
    /// construction.
    pub exclusions: &'a ExclusionIndex,
    /// Unique source items over the positive rows, in first-seen order.
    pub unique_sources: IndexSet<SourceItem>,
    /// Unique target items with their positive-row counts, in first-seen
    /// order.
    pub target_counts: IndexMap<TargetItem, usize>,
    /// Every positive-row target with multiplicity. Sampling from this
    /// unreduced distribution keeps the negative target marginal close to the
    /// positive one instead of flattening it to uniform-over-unique.
    pub target_distribution: Vec<TargetItem>,
    /// External source-item pool for background augmentation.
    pub background: Option<&'a BackgroundPool>,
}

impl<'a> SamplingContext<'a> {
    /// Derive the context from the seeded working set.
    pub fn from_working(
        working: &WorkingSet,
        exclusions: &'a ExclusionIndex,
        background: Option<&'a BackgroundPool>,
        seed: u64,
    ) -> Self {
        let mut unique_sources = IndexSet::new();
        let mut target_counts: IndexMap<TargetItem, usize> = IndexMap::new();
        let mut target_distribution = Vec::with_capacity(working.positive_rows().len());
        for record in working.positive_rows() {
            unique_sources.insert(record.source.clone());
            *target_counts.entry(record.target.clone()).or_insert(0) += 1;
            target_distribution.push(record.target.clone());
        }
        Self {
            seed,
            exclusions,
            unique_sources,
            target_counts,
            target_distribution,
            background,
        }
    }
}

/// Work outstanding for one sampling pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SampleRequest {
    /// Draw one negative for each listed item. The item side is
    /// strategy-defined: source items for per-source sampling, target items
    /// for per-target sampling.
    Items(Vec<String>),
    /// Draw this many background pairs.
    Amount(usize),
    /// Nothing left to draw.
    Done,
}

impl SampleRequest {
    /// Number of negatives this request asks for.
    pub fn len(&self) -> usize {
        match self {
            SampleRequest::Items(items) => items.len(),
            SampleRequest::Amount(amount) => *amount,
            SampleRequest::Done => 0,
        }
    }

    /// True when no work remains.
    pub fn is_done(&self) -> bool {
        match self {
            SampleRequest::Items(items) => items.is_empty(),
            SampleRequest::Amount(amount) => *amount == 0,
            SampleRequest::Done => true,
        }
    }
}

/// A negative-pair sampling strategy driven by the convergence loop.
///
/// Implementations draw candidate negatives for a request; the loop owns
/// merging, duplicate detection, and retry bookkeeping.
pub trait PairSamplingStrategy {
    /// Stable label used in logs and reports.
    fn label(&self) -> &'static str;

    /// Work outstanding before the first pass.
    fn initial_request(&self, ctx: &SamplingContext<'_>) -> SampleRequest;

    /// Draw negatives for `request` in retry round `round`. Items that cannot
    /// be satisfied are recorded on the report and skipped, never fatal.
    fn draw(
        &self,
        ctx: &SamplingContext<'_>,
        request: &SampleRequest,
        round: u32,
        report: &mut SamplingReport,
    ) -> Vec<PairRecord>;

    /// Map the duplicates rejected during merging and the remaining shortfall
    /// into the next request. `Done` ends the loop with the shortfall
    /// accepted.
    fn retry_request(&self, rejected: &[PairRecord], outstanding: usize) -> SampleRequest;
}

/// One negative partner per unique source item.
///
/// Guarantees exactly one attempt per unique source item per pass; an item
/// whose forbidden set covers every available target contributes zero
/// negatives and is reported.
pub struct PerSourceItemSampler;

impl PairSamplingStrategy for PerSourceItemSampler {
    fn label(&self) -> &'static str {
        PER_SOURCE_LABEL
    }

    fn initial_request(&self, ctx: &SamplingContext<'_>) -> SampleRequest {
        SampleRequest::Items(ctx.unique_sources.iter().cloned().collect())
    }

    fn draw(
        &self,
        ctx: &SamplingContext<'_>,
        request: &SampleRequest,
        round: u32,
        report: &mut SamplingReport,
    ) -> Vec<PairRecord> {
        let SampleRequest::Items(items) = request else {
            return Vec::new();
        };
        let mut drawn = Vec::with_capacity(items.len());
        for item in items {
            let forbidden = ctx.exclusions.forbidden_targets(item);
            let candidates: Vec<&TargetItem> = ctx
                .target_distribution
                .iter()
                .filter(|target| !forbidden.contains(*target))
                .collect();
            if candidates.is_empty() {
                warn!(
                    source = %item,
                    "source item is paired with every available target and is discarded from the negatives"
                );
                report.record_unsatisfiable(item);
                continue;
            }
            let mut rng = DeterministicRng::new(item_draw_seed(ctx.seed, item, round));
            if let Some(target) = candidates.choose(&mut rng) {
                drawn.push(PairRecord::negative(item.clone(), (*target).clone()));
            }
        }
        drawn
    }

    fn retry_request(&self, rejected: &[PairRecord], _outstanding: usize) -> SampleRequest {
        SampleRequest::Items(rejected.iter().map(|record| record.source.clone()).collect())
    }
}

/// A batch of unique source items per target item, preserving the per-target
/// positive/negative ratio.
///
/// Sources are drawn without replacement within a target, so the draws for
/// one target never collide with each other, and keys differ across targets;
/// the trade-off is that a source item may serve as the negative partner of
/// several targets.
pub struct PerTargetGroupSampler;

impl PairSamplingStrategy for PerTargetGroupSampler {
    fn label(&self) -> &'static str {
        PER_TARGET_LABEL
    }

    fn initial_request(&self, ctx: &SamplingContext<'_>) -> SampleRequest {
        SampleRequest::Items(ctx.target_counts.keys().cloned().collect())
    }

    fn draw(
        &self,
        ctx: &SamplingContext<'_>,
        request: &SampleRequest,
        round: u32,
        report: &mut SamplingReport,
    ) -> Vec<PairRecord> {
        let SampleRequest::Items(targets) = request else {
            return Vec::new();
        };
        let mut drawn = Vec::new();
        for target in targets {
            let needed = ctx.target_counts.get(target).copied().unwrap_or(0);
            if needed == 0 {
                continue;
            }
            let forbidden = ctx.exclusions.forbidden_sources(target);
            let pool: Vec<&SourceItem> = ctx
                .unique_sources
                .iter()
                .filter(|source| !forbidden.contains(*source))
                .collect();
            if pool.is_empty() {
                warn!(
                    target = %target,
                    "target is paired with every available source item and is discarded from the negatives"
                );
                report.record_skipped_target(target);
                continue;
            }
            let granted = needed.min(pool.len());
            if granted < needed {
                warn!(
                    target = %target,
                    needed,
                    available = pool.len(),
                    "pool too small to preserve the per-target ratio; clipping"
                );
                report.record_clipped_target(target, needed, granted);
            }
            let mut rng = DeterministicRng::new(item_draw_seed(ctx.seed, target, round));
            for source in pool.choose_multiple(&mut rng, granted) {
                drawn.push(PairRecord::negative((*source).clone(), target.clone()));
            }
        }
        drawn
    }

    fn retry_request(&self, _rejected: &[PairRecord], _outstanding: usize) -> SampleRequest {
        // Per-target draws cannot collide: sources are unique within a target
        // and keys differ across targets. Clip shortfall is not retryable.
        SampleRequest::Done
    }
}

/// Pairs background source items with targets drawn from the positive target
/// distribution.
///
/// The pool is defined as having no in-domain target association, so a false
/// negative is impossible by construction and the exclusion index is not
/// consulted. Duplicate draws across rounds are still possible and are
/// resolved by the convergence loop. Items are drawn without replacement
/// within a round and with replacement across rounds.
pub struct BackgroundPoolSampler {
    /// Total number of background negatives to generate.
    pub amount: usize,
}

impl PairSamplingStrategy for BackgroundPoolSampler {
    fn label(&self) -> &'static str {
        BACKGROUND_LABEL
    }

    fn initial_request(&self, _ctx: &SamplingContext<'_>) -> SampleRequest {
        SampleRequest::Amount(self.amount)
    }

    fn draw(
        &self,
        ctx: &SamplingContext<'_>,
        request: &SampleRequest,
        round: u32,
        report: &mut SamplingReport,
    ) -> Vec<PairRecord> {
        let SampleRequest::Amount(amount) = request else {
            return Vec::new();
        };
        let Some(pool) = ctx.background else {
            return Vec::new();
        };
        if pool.is_empty() || ctx.target_distribution.is_empty() {
            if round == 0 {
                warn!("background pool or target distribution is empty; no augmentation possible");
                report.record_empty_pool();
            }
            return Vec::new();
        }
        let take = (*amount).min(pool.len());
        let mut item_rng =
            DeterministicRng::new(item_draw_seed(ctx.seed, BACKGROUND_LABEL, round));
        let mut target_rng =
            DeterministicRng::new(item_draw_seed(ctx.seed, BACKGROUND_TARGET_LABEL, round));
        pool.items()
            .choose_multiple(&mut item_rng, take)
            .map(|item| {
                let target = ctx
                    .target_distribution
                    .choose(&mut target_rng)
                    .cloned()
                    .unwrap_or_default();
                PairRecord::negative(item.clone(), target)
            })
            .collect()
    }

    fn retry_request(&self, _rejected: &[PairRecord], outstanding: usize) -> SampleRequest {
        if outstanding == 0 {
            SampleRequest::Done
        } else {
            SampleRequest::Amount(outstanding)
        }
    }
}

/// Resolve the configured mode into a strategy implementation.
pub fn strategy_for_mode(mode: &SamplingMode) -> Box<dyn PairSamplingStrategy> {
    match mode {
        SamplingMode::PerSourceItem => Box::new(PerSourceItemSampler),
        SamplingMode::PerTargetGroup => Box::new(PerTargetGroupSampler),
        SamplingMode::BackgroundPool { amount } => {
            Box::new(BackgroundPoolSampler { amount: *amount })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{PositiveCorpus, ReferenceCorpus};

    fn pairs(rows: &[(&str, &str)]) -> Vec<(String, String)> {
        rows.iter()
            .map(|(source, target)| (source.to_string(), target.to_string()))
            .collect()
    }

    fn context_fixture<'a>(
        exclusions: &'a ExclusionIndex,
        positives: &PositiveCorpus,
    ) -> SamplingContext<'a> {
        let working = WorkingSet::seed(positives).unwrap();
        SamplingContext::from_working(&working, exclusions, None, 7)
    }

    #[test]
    fn per_source_draw_respects_exclusions() {
        let positives = PositiveCorpus::from_pairs(pairs(&[("A", "X"), ("B", "Y"), ("C", "X")]));
        let reference = ReferenceCorpus::from_pairs(pairs(&[("A", "X"), ("B", "Y"), ("C", "X")]));
        let exclusions = ExclusionIndex::build(&reference, &positives);
        let ctx = context_fixture(&exclusions, &positives);
        let strategy = PerSourceItemSampler;
        let request = strategy.initial_request(&ctx);
        assert_eq!(request.len(), 3);
        let mut report = SamplingReport::default();
        let drawn = strategy.draw(&ctx, &request, 0, &mut report);
        assert_eq!(drawn.len(), 3);
        for record in &drawn {
            assert!(!exclusions.is_forbidden(&record.source, &record.target));
        }
    }

    #[test]
    fn per_target_draw_is_without_replacement() {
        let positives = PositiveCorpus::from_pairs(pairs(&[
            ("A", "X"),
            ("B", "X"),
            ("C", "Y"),
            ("D", "Y"),
        ]));
        let reference = ReferenceCorpus::from_pairs(pairs(&[("A", "X"), ("B", "X")]));
        let exclusions = ExclusionIndex::build(&reference, &positives);
        let ctx = context_fixture(&exclusions, &positives);
        let strategy = PerTargetGroupSampler;
        let mut report = SamplingReport::default();
        let drawn = strategy.draw(&ctx, &strategy.initial_request(&ctx), 0, &mut report);
        // X needs 2 partners from {C, D}; Y needs 2 from {A, B}.
        let mut keys: Vec<_> = drawn.iter().map(PairRecord::key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), drawn.len());
        assert_eq!(drawn.len(), 4);
    }

    #[test]
    fn deterministic_rng_streams_are_stable() {
        use rand::RngCore;
        let mut a = DeterministicRng::new(99);
        let mut b = DeterministicRng::new(99);
        for _ in 0..8 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }
}
