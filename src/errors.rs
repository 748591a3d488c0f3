use std::io;

use thiserror::Error;

use crate::types::CorpusName;

/// Error type for corpus validation, configuration, and invariant failures.
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("invalid input in corpus '{corpus}': {reason}")]
    InvalidInput { corpus: CorpusName, reason: String },
    #[error("pairing invariant violated: {0}")]
    InvariantViolation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
