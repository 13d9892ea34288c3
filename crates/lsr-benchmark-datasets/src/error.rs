//! Error types for dataset loading and iteration.
//!
//! Every failure in this crate is a data-integrity or configuration problem,
//! not a transient one. Errors propagate to the immediate caller and terminate
//! the requested iteration; there is no retry path and no partial-result mode.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Error type for dataset loading and iteration.
///
/// Each variant carries the offending value and enough context to locate the
/// problem (path, line number, identifier).
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The requested dataset id is not in the registry.
    #[error("dataset id '{dataset_id}' is not supported, supported ids: {supported:?}")]
    UnsupportedDataset {
        /// The id that was requested.
        dataset_id: String,
        /// All ids the registry knows about, sorted.
        supported: Vec<String>,
    },

    /// The requested (model, aggregation) combination has no precomputed sidecar.
    #[error(
        "embedding '{model}' with aggregation '{aggregation}' is not supported, \
         supported combinations: {supported:?}"
    )]
    UnsupportedEmbedding {
        /// The requested model name.
        model: String,
        /// The requested aggregation strategy.
        aggregation: String,
        /// All supported (model, aggregation) combinations.
        supported: Vec<(String, String)>,
    },

    /// The archive could not be opened or extracted as a zip.
    #[error("{path:?} is not a valid zip archive: {reason}")]
    InvalidArchive {
        /// Path of the offending archive.
        path: PathBuf,
        /// Underlying zip failure.
        reason: String,
    },

    /// A source file exceeds the configured size limit.
    #[error("{path:?} is {size_bytes} bytes, exceeding the limit of {max_bytes} bytes")]
    FileTooLarge {
        /// Path of the oversized file.
        path: PathBuf,
        /// Actual size on disk.
        size_bytes: u64,
        /// Configured maximum.
        max_bytes: u64,
    },

    /// A decoded record is missing a required field.
    #[error("missing required field '{field}' in {path:?} at line {line}")]
    MissingField {
        /// Path of the source file.
        path: PathBuf,
        /// 1-based line number of the record.
        line: usize,
        /// Name of the absent field.
        field: String,
    },

    /// A record decoded but its content is malformed (non-integral offset,
    /// wrong column count, wrong value type).
    #[error("invalid record in {context}: {reason}")]
    InvalidRecord {
        /// Where the record came from (path, line, or document id).
        context: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A line failed to decode as JSON.
    #[error("failed to decode {path:?} at line {line}: {source}")]
    Decode {
        /// Path of the source file.
        path: PathBuf,
        /// 1-based line number of the offending line.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The sidecar identifier list and embedding collection disagree on count.
    /// Checked explicitly before any positional pairing.
    #[error("sidecar mismatch in {dir:?}: {ids} identifiers but {embeddings} embeddings")]
    SidecarCountMismatch {
        /// Directory holding the sidecar pair.
        dir: PathBuf,
        /// Number of identifiers read.
        ids: usize,
        /// Number of embeddings read.
        embeddings: usize,
    },

    /// The embedding collection could not be read or has an unexpected shape.
    #[error("invalid embedding sidecar {path:?}: {reason}")]
    InvalidSidecar {
        /// Path of the tensor file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// An identifier from the corpus has no embedding in the sidecar.
    /// Indicates a corpus/sidecar mismatch and is never silently skipped.
    #[error("no embedding found for id '{id}'")]
    MissingEmbedding {
        /// The identifier without an embedding.
        id: String,
    },

    /// An underlying IO operation failed.
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

impl DatasetError {
    /// Get the error category name for logging.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedDataset { .. } | Self::UnsupportedEmbedding { .. } => "CONFIGURATION",
            Self::InvalidArchive { .. }
            | Self::FileTooLarge { .. }
            | Self::MissingField { .. }
            | Self::InvalidRecord { .. }
            | Self::Decode { .. } => "FORMAT",
            Self::SidecarCountMismatch { .. } | Self::InvalidSidecar { .. } => "CORRUPT_SIDECAR",
            Self::MissingEmbedding { .. } => "MISSING_EMBEDDING",
            Self::Io { .. } => "IO",
        }
    }
}
