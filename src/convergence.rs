use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RetryLimits;
use crate::constants::strategy::RESEED_LABEL;
use crate::data::{PairLabel, PairRecord};
use crate::errors::SamplerError;
use crate::hash::item_draw_seed;
use crate::sampler::{DeterministicRng, PairSamplingStrategy, SampleRequest, SamplingContext};
use crate::types::{SourceItem, TargetItem};
use crate::working_set::{AppendOutcome, WorkingSet};

/// Retry phase derived from the round counter and the configured thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryPhase {
    /// Resample exactly the items whose draws were rejected.
    Targeted,
    /// Resample an equivalently sized random subset of positive source items.
    Reseeded,
    /// Accept the remaining shortfall.
    Exhausted,
}

/// Per-invocation round counter bounded by the soft and hard thresholds.
#[derive(Clone, Copy, Debug)]
pub struct RetryState {
    round: u32,
    limits: RetryLimits,
}

impl RetryState {
    /// Fresh counter at round zero (the initial pass).
    pub fn new(limits: RetryLimits) -> Self {
        Self { round: 0, limits }
    }

    /// Current round; zero until the first retry.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Enter the next retry round.
    pub fn advance(&mut self) {
        self.round += 1;
    }

    /// Phase the current round falls in.
    pub fn phase(&self) -> RetryPhase {
        if self.round <= self.limits.soft {
            RetryPhase::Targeted
        } else if self.round <= self.limits.hard {
            RetryPhase::Reseeded
        } else {
            RetryPhase::Exhausted
        }
    }

    /// True exactly on the first round past the soft threshold.
    pub fn just_crossed_soft(&self) -> bool {
        self.round == self.limits.soft + 1
    }
}

/// Per-target clip entry: the per-target ratio could not be preserved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetClip {
    /// Target item whose pool ran out.
    pub target: TargetItem,
    /// Negatives the positive count asked for.
    pub requested: usize,
    /// Negatives actually granted.
    pub granted: usize,
}

/// Observability summary of one builder invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SamplingReport {
    /// Strategy label that produced this report.
    pub strategy: String,
    /// Negatives the initial request asked for.
    pub requested: usize,
    /// Negatives actually merged into the working set.
    pub generated: usize,
    /// Retry rounds consumed; zero means the first pass converged.
    pub rounds: u32,
    /// True once the reseeded phase was entered; exact 1:1 coverage is then no
    /// longer guaranteed.
    pub reseeded: bool,
    /// Source items with no valid negative partner, discarded with a warning.
    pub unsatisfiable_sources: Vec<SourceItem>,
    /// Targets skipped entirely because every source item was forbidden.
    pub skipped_targets: Vec<TargetItem>,
    /// Targets whose negative count was clipped by pool exhaustion.
    pub clipped_targets: Vec<TargetClip>,
    /// Items still unresolved when the hard threshold fired.
    pub unresolved: Vec<SourceItem>,
    /// True when background augmentation found nothing to draw from.
    pub empty_pool: bool,
}

impl SamplingReport {
    /// Difference between requested and achieved negative count.
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.generated)
    }

    pub(crate) fn record_unsatisfiable(&mut self, item: &str) {
        if !self.unsatisfiable_sources.iter().any(|seen| seen == item) {
            self.unsatisfiable_sources.push(item.to_string());
        }
    }

    pub(crate) fn record_skipped_target(&mut self, target: &str) {
        if !self.skipped_targets.iter().any(|seen| seen == target) {
            self.skipped_targets.push(target.to_string());
        }
    }

    pub(crate) fn record_clipped_target(&mut self, target: &str, requested: usize, granted: usize) {
        if !self.clipped_targets.iter().any(|clip| clip.target == target) {
            self.clipped_targets.push(TargetClip {
                target: target.to_string(),
                requested,
                granted,
            });
        }
    }

    pub(crate) fn record_empty_pool(&mut self) {
        self.empty_pool = true;
    }
}

/// Loop state: each pass flows Sampling → Merging → CheckingDuplicates, then
/// Converged, Retrying, or Exhausted.
enum LoopState {
    Sampling { request: SampleRequest },
    Merging { drawn: Vec<PairRecord> },
    CheckingDuplicates { rejected: Vec<PairRecord> },
    Retrying { request: SampleRequest },
    Converged,
    Exhausted { request: SampleRequest },
}

/// Drives a sampling strategy until the outstanding negatives are merged or
/// the retry budget is exhausted.
///
/// Termination is guaranteed by the hard threshold alone: every transition
/// out of `Retrying` either advances the round counter or ends the loop, so
/// even an input where every item is bound to every partner finishes.
pub struct ConvergenceLoop {
    limits: RetryLimits,
}

impl ConvergenceLoop {
    /// Loop with the given retry thresholds.
    pub fn new(limits: RetryLimits) -> Self {
        Self { limits }
    }

    /// Run `strategy` to completion against `working`.
    pub fn run(
        &self,
        working: &mut WorkingSet,
        strategy: &dyn PairSamplingStrategy,
        ctx: &SamplingContext<'_>,
    ) -> Result<SamplingReport, SamplerError> {
        let mut report = SamplingReport {
            strategy: strategy.label().to_string(),
            ..SamplingReport::default()
        };
        let mut retry = RetryState::new(self.limits);
        let initial = strategy.initial_request(ctx);
        report.requested = initial.len();
        let mut state = if initial.is_done() {
            LoopState::Converged
        } else {
            LoopState::Sampling { request: initial }
        };

        loop {
            state = match state {
                LoopState::Sampling { request } => {
                    let drawn = strategy.draw(ctx, &request, retry.round(), &mut report);
                    LoopState::Merging { drawn }
                }
                LoopState::Merging { drawn } => {
                    let mut rejected = Vec::new();
                    for record in drawn {
                        match working.append(record) {
                            AppendOutcome::Inserted => report.generated += 1,
                            AppendOutcome::Duplicate(record) => rejected.push(record),
                        }
                    }
                    LoopState::CheckingDuplicates { rejected }
                }
                LoopState::CheckingDuplicates { rejected } => {
                    // Every removed duplicate must be a negative: the first
                    // occurrence is kept, so a rejected label-1 row means two
                    // identical positives reached the merge, which is a
                    // modeling bug upstream.
                    if let Some(bad) = rejected
                        .iter()
                        .find(|record| record.label == PairLabel::Positive)
                    {
                        return Err(SamplerError::InvariantViolation(format!(
                            "label-1 duplicate ({}, {}) detected after merging",
                            bad.source, bad.target
                        )));
                    }
                    let outstanding = report.requested.saturating_sub(report.generated);
                    let request = strategy.retry_request(&rejected, outstanding);
                    if request.is_done() {
                        LoopState::Converged
                    } else {
                        LoopState::Retrying { request }
                    }
                }
                LoopState::Retrying { request } => {
                    retry.advance();
                    match retry.phase() {
                        RetryPhase::Targeted => {
                            debug!(
                                round = retry.round(),
                                outstanding = request.len(),
                                "resampling items whose draws collided"
                            );
                            LoopState::Sampling { request }
                        }
                        RetryPhase::Reseeded => {
                            if retry.just_crossed_soft()
                                && let SampleRequest::Items(items) = &request
                            {
                                warn!(
                                    round = retry.round(),
                                    items = ?items,
                                    "could not match every item exactly once; switching to random \
                                     subsets of positive source items, 1:1 coverage is no longer \
                                     guaranteed"
                                );
                            }
                            report.reseeded = true;
                            let request = reseed_request(ctx, request, retry.round());
                            LoopState::Sampling { request }
                        }
                        RetryPhase::Exhausted => LoopState::Exhausted { request },
                    }
                }
                LoopState::Converged => break,
                LoopState::Exhausted { request } => {
                    let mut unresolved: Vec<SourceItem> = Vec::new();
                    if let SampleRequest::Items(items) = &request {
                        for item in items {
                            if !unresolved.contains(item) {
                                unresolved.push(item.clone());
                            }
                        }
                    }
                    warn!(
                        shortfall = report.shortfall(),
                        unresolved = ?unresolved,
                        "retry budget exhausted; accepting the remaining shortfall"
                    );
                    report.unresolved = unresolved;
                    break;
                }
            };
        }
        report.rounds = retry.round();
        Ok(report)
    }
}

/// Replace a targeted item request with an equivalently sized random subset of
/// positive source items. Amount-based requests reseed through the round
/// counter alone.
fn reseed_request(ctx: &SamplingContext<'_>, request: SampleRequest, round: u32) -> SampleRequest {
    match request {
        SampleRequest::Items(items) => {
            let pool: Vec<&SourceItem> = ctx.unique_sources.iter().collect();
            let mut rng = DeterministicRng::new(item_draw_seed(ctx.seed, RESEED_LABEL, round));
            let subset = pool
                .choose_multiple(&mut rng, items.len())
                .map(|source| (*source).clone())
                .collect();
            SampleRequest::Items(subset)
        }
        other => other,
    }
}
