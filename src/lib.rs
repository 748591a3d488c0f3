#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Negative-set orchestration and the crate's entry point.
pub mod builder;
/// Sampling configuration types.
pub mod config;
/// Centralized constants used across sampling, retries, and corpora.
pub mod constants;
/// Convergence loop, retry state, and sampling reports.
pub mod convergence;
/// Labeled pair, corpus, and table types.
pub mod data;
/// Forbidden-partner lookup used to prevent false negatives.
pub mod exclusion;
mod hash;
/// Aggregate metrics helpers.
pub mod metrics;
/// Sampling strategies and the shared sampling context.
pub mod sampler;
/// Delimited-file transport for corpora.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Cell normalization helpers.
pub mod utils;
/// Append-only working set with incremental duplicate tracking.
pub mod working_set;

mod errors;

pub use builder::{AugmentedSet, NegativeSetBuilder};
pub use config::{ColumnSpec, RetryLimits, SamplerConfig, SamplingMode};
pub use convergence::{ConvergenceLoop, RetryPhase, RetryState, SamplingReport, TargetClip};
pub use data::{
    BackgroundPool, PairLabel, PairRecord, PositiveCorpus, RawTable, ReferenceCorpus,
};
pub use errors::SamplerError;
pub use exclusion::ExclusionIndex;
pub use metrics::{LabelBalance, TargetShare, label_balance, target_shares};
pub use sampler::{
    BackgroundPoolSampler, DeterministicRng, PairSamplingStrategy, PerSourceItemSampler,
    PerTargetGroupSampler, SampleRequest, SamplingContext, strategy_for_mode,
};
pub use types::{PairKey, SourceItem, TargetItem};
pub use working_set::{AppendOutcome, WorkingSet};
