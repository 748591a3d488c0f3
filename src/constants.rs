/// Constants used by retry bookkeeping in the convergence loop.
pub mod retry {
    /// Default retry round after which targeted resampling gives way to
    /// reseeded-subset resampling.
    pub const DEFAULT_SOFT_LIMIT: u32 = 50;
    /// Default retry round after which the remaining shortfall is accepted.
    pub const DEFAULT_HARD_LIMIT: u32 = 100;
}

/// Constants used by tabular corpus parsing and labeling.
pub mod corpus {
    /// Default header for the source-item column.
    pub const DEFAULT_SOURCE_COLUMN: &str = "source_item";
    /// Default header for the target-item column.
    pub const DEFAULT_TARGET_COLUMN: &str = "target_item";
    /// Default header for the label column.
    pub const DEFAULT_LABEL_COLUMN: &str = "label";
    /// Default field delimiter for delimited corpus files.
    pub const DEFAULT_DELIMITER: char = ';';
    /// Wire value for positive labels.
    pub const POSITIVE_LABEL: &str = "1";
    /// Wire value for negative labels.
    pub const NEGATIVE_LABEL: &str = "0";
    /// Corpus name for the working positive set in errors and logs.
    pub const POSITIVE_CORPUS: &str = "positives";
    /// Corpus name for the full reference set in errors and logs.
    pub const REFERENCE_CORPUS: &str = "reference";
    /// Corpus name for the background item pool in errors and logs.
    pub const BACKGROUND_CORPUS: &str = "background";
}

/// Labels used by sampling strategies in logs, reports, and seed derivation.
pub mod strategy {
    /// Strategy label for per-source-item sampling.
    pub const PER_SOURCE_LABEL: &str = "per_source_item";
    /// Strategy label for per-target-group sampling.
    pub const PER_TARGET_LABEL: &str = "per_target_group";
    /// Strategy label for background-pool augmentation.
    pub const BACKGROUND_LABEL: &str = "background_pool";
    /// Seed label for background target draws, kept distinct from item draws
    /// so the two streams never share a sequence.
    pub const BACKGROUND_TARGET_LABEL: &str = "background_targets";
    /// Seed label for reseed-phase subset selection.
    pub const RESEED_LABEL: &str = "reseed_subset";
}
