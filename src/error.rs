use std::path::PathBuf;
use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Fatal conversion errors. Everything recoverable is a [`ParseIssue`] instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Output file {path} would be written for both '{first}' and '{second}'")]
    EmissionTargetCollision {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A problem found in one rustc invocation. The unit is kept and
/// emitted as a commented error block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIssue {
    #[error("unknown {0}")]
    UnrecognizedFlag(String),

    #[error("missing value for {0}")]
    MissingFlagValue(String),

    #[error("missing --crate-name")]
    MissingCrateName,

    #[error("missing main source file")]
    MissingMainSource,

    #[error("missing --crate-type")]
    MissingCrateType,

    #[error("multiple --crate-type {first} {second}")]
    MultipleCrateTypes { first: String, second: String },

    #[error("found both --test and --crate-type {0}")]
    TestWithCrateType(String),
}
