//! Error handling types and utilities.

use crate::record::Ordinal;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A specialized Result type for the binary and server glue.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods at I/O boundaries. Library operations return their
/// own typed errors below.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when a record set cannot be turned into an index.
///
/// The search core fails only at build time: either the documentation generator
/// emitted a broken record set, or the builder was configured with weights that
/// would break ranking. Queries never fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Two raw entries share the same `location`.
    #[error(
        "duplicate location '{location}' (entries {first} and {second}); every record must have a unique location"
    )]
    DuplicateLocation {
        location: String,
        first: Ordinal,
        second: Ordinal,
    },

    #[error(transparent)]
    InvalidWeights(#[from] InvalidWeights),

    /// More records than an [`Ordinal`] can address.
    #[error("{count} records exceed the per-index limit of {max}", max = Ordinal::MAX)]
    TooManyRecords { count: usize },
}

/// Field weights violating `title > page > text > 0` or `0 <= page_bonus < text`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid field weights: {0}")]
pub struct InvalidWeights(pub String);

/// Error returned when reading a persisted record artifact fails.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact contains no record array (expected a JSON array or an object with a `docs` array)")]
    MissingRecords,

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Error returned when loading search configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    InvalidWeights(#[from] InvalidWeights),

    #[error("min_token_length must be at least 1")]
    InvalidTokenLength,
}

/// Error returned when building or loading an index off-thread.
///
/// Cloneable so every caller awaiting the same in-flight load receives it.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error(transparent)]
    Artifact(Arc<ArtifactError>),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("index build task failed: {0}")]
    Worker(String),
}

impl From<ArtifactError> for LoadError {
    fn from(error: ArtifactError) -> Self {
        match error {
            ArtifactError::Build(build) => Self::Build(build),
            other => Self::Artifact(Arc::new(other)),
        }
    }
}
