use tracing::{info, warn};

use crate::config::{SamplerConfig, SamplingMode};
use crate::convergence::{ConvergenceLoop, SamplingReport};
use crate::data::{BackgroundPool, PairLabel, PairRecord, PositiveCorpus, ReferenceCorpus};
use crate::errors::SamplerError;
use crate::exclusion::ExclusionIndex;
use crate::metrics::label_balance;
use crate::sampler::{SamplingContext, strategy_for_mode};
use crate::working_set::WorkingSet;

/// Augmented output: the seeded positives followed by the generated negatives.
#[derive(Clone, Debug)]
pub struct AugmentedSet {
    /// Labeled rows, positives-before-negatives order preserved.
    pub rows: Vec<PairRecord>,
    /// Observability summary for the invocation.
    pub report: SamplingReport,
}

/// Sole entry point of the engine.
///
/// Builds the exclusion index once from the reference corpus merged with the
/// working positives, seeds the working set, and drives the configured
/// strategy through the convergence loop. All state is per-invocation;
/// nothing is retained across calls.
pub struct NegativeSetBuilder {
    config: SamplerConfig,
}

impl NegativeSetBuilder {
    /// Validate the configuration and build.
    pub fn new(config: SamplerConfig) -> Result<Self, SamplerError> {
        config.retry.validate()?;
        Ok(Self { config })
    }

    /// Generate negatives for `positives`, using `reference` exclusively for
    /// exclusion. `background` is required by the background-pool mode and
    /// ignored otherwise.
    pub fn build_negatives(
        &self,
        positives: &PositiveCorpus,
        reference: &ReferenceCorpus,
        background: Option<&BackgroundPool>,
    ) -> Result<AugmentedSet, SamplerError> {
        if matches!(self.config.mode, SamplingMode::BackgroundPool { .. }) && background.is_none() {
            return Err(SamplerError::Configuration(
                "background-pool mode requires a background pool".to_string(),
            ));
        }

        let distinct_targets = positives.unique_targets().len();
        if distinct_targets < 2 {
            warn!(
                distinct_targets,
                "cannot generate negatives through recombination with fewer than 2 distinct \
                 targets; returning the corpus unchanged"
            );
            let working = WorkingSet::seed(positives)?;
            return Ok(AugmentedSet {
                rows: working.into_rows(),
                report: SamplingReport::default(),
            });
        }

        info!(
            positives = positives.len(),
            reference = reference.len(),
            mode = ?self.config.mode,
            "generating negatives by recombining the positive pairs"
        );

        let exclusions = ExclusionIndex::build(reference, positives);
        let mut working = WorkingSet::seed(positives)?;
        let ctx = SamplingContext::from_working(
            &working,
            &exclusions,
            background,
            self.config.seed,
        );
        let strategy = strategy_for_mode(&self.config.mode);
        let report = ConvergenceLoop::new(self.config.retry).run(
            &mut working,
            strategy.as_ref(),
            &ctx,
        )?;

        // Background pairs cannot be false negatives by definition of the
        // pool, and the strategy never consulted the index, so the sweep is
        // meaningful only for the recombination modes.
        if !matches!(self.config.mode, SamplingMode::BackgroundPool { .. }) {
            verify_no_false_negatives(&working, &exclusions)?;
        }

        if let Some(balance) = label_balance(working.rows()) {
            info!(
                positives = balance.positives,
                negatives = balance.negatives,
                shortfall = report.shortfall(),
                "generated negative pairs by recombining the positive pairs"
            );
        }

        Ok(AugmentedSet {
            rows: working.into_rows(),
            report,
        })
    }
}

/// Post-hoc sweep: a label-0 row the exclusion index knows as a true pairing
/// is a logic defect and aborts loudly rather than being silently repaired.
fn verify_no_false_negatives(
    working: &WorkingSet,
    exclusions: &ExclusionIndex,
) -> Result<(), SamplerError> {
    for record in working.rows() {
        if record.label == PairLabel::Negative
            && exclusions.is_forbidden(&record.source, &record.target)
        {
            return Err(SamplerError::InvariantViolation(format!(
                "false negative ({}, {}) survived sampling",
                record.source, record.target
            )));
        }
    }
    Ok(())
}
