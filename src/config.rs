use crate::constants::{corpus, retry};
use crate::errors::SamplerError;
use crate::types::ColumnName;

/// Column layout for tabular pair corpora.
///
/// Header names are configuration, not fixed strings; upstream datasets carry
/// domain-specific headers and are mapped through this layout at the
/// transport boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Header of the source-item column.
    pub source: ColumnName,
    /// Header of the target-item column.
    pub target: ColumnName,
    /// Header of the label column (rejected on reference corpora).
    pub label: ColumnName,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            source: corpus::DEFAULT_SOURCE_COLUMN.to_string(),
            target: corpus::DEFAULT_TARGET_COLUMN.to_string(),
            label: corpus::DEFAULT_LABEL_COLUMN.to_string(),
        }
    }
}

/// Retry thresholds for the convergence loop.
///
/// Rounds `1..=soft` resample exactly the items whose draws collided; rounds
/// `soft+1..=hard` resample random subsets of positive source items; past
/// `hard` the remaining shortfall is accepted and reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryLimits {
    /// Rounds of targeted resampling before switching to reseeded subsets.
    pub soft: u32,
    /// Rounds after which the remaining shortfall is accepted.
    pub hard: u32,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            soft: retry::DEFAULT_SOFT_LIMIT,
            hard: retry::DEFAULT_HARD_LIMIT,
        }
    }
}

impl RetryLimits {
    /// Reject threshold orderings the loop cannot honor.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.soft > self.hard {
            return Err(SamplerError::Configuration(format!(
                "soft retry limit {} exceeds hard limit {}",
                self.soft, self.hard
            )));
        }
        Ok(())
    }
}

/// Strategy used to manufacture negative pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SamplingMode {
    /// One negative partner per unique source item; the negative target
    /// marginal follows the positive target distribution.
    PerSourceItem,
    /// A batch of unique source items per target item, preserving the
    /// per-target positive/negative ratio at the expense of source reuse.
    PerTargetGroup,
    /// Pairs drawn from an external background pool of source items with no
    /// in-domain target association.
    BackgroundPool {
        /// Total number of background negatives to generate.
        amount: usize,
    },
}

/// Top-level sampler configuration.
#[derive(Clone, Debug)]
pub struct SamplerConfig {
    /// Invocation seed all deterministic draw seeds derive from.
    pub seed: u64,
    /// Negative generation strategy.
    pub mode: SamplingMode,
    /// Retry thresholds for the convergence loop.
    pub retry: RetryLimits,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            mode: SamplingMode::PerSourceItem,
            retry: RetryLimits::default(),
        }
    }
}
