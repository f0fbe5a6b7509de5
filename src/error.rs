//! Error types for the dataset, corpus and rewrite layers.
//!
//! The scoring path (normalisation, matching, aggregation, response parsing) never fails and does
//! not use this type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for fallible `vner_eval` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fallible `vner_eval` operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A dataset split file or raw split directory does not exist.
    #[error("Split file not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// Reading or writing a file failed.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be decoded or encoded.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A string could not be parsed into one of the crate's enums.
    #[error("Impossible to parse `{value}` into a {kind}")]
    Parse { kind: &'static str, value: String },

    /// A built-in pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),

    /// The text generator behind the rewrite pipeline failed.
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(kind: &'static str, value: impl Into<String>) -> Self {
        Error::Parse {
            kind,
            value: value.into(),
        }
    }

    /// Create a generation error.
    pub fn generation(msg: impl Into<String>) -> Self {
        Error::Generation(msg.into())
    }
}
