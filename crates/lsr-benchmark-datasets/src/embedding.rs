//! Embedding-source selection.
//!
//! Precomputed embeddings ship as one zip archive per (model, aggregation)
//! combination, laid out with a queries subtree and a per-dataset docs
//! subtree. Exactly one combination is supported today; resolving it extracts
//! the archive (idempotently) and hands back the two sidecar directories.

use std::path::PathBuf;

use tracing::debug;

use crate::archive::extract_zip;
use crate::error::{DatasetError, DatasetResult};
use crate::registry::DatasetRegistry;

/// Model name of the supported precomputed embeddings.
pub const SPLADE_V3: &str = "naver/splade-v3";

/// Aggregation strategy of the supported precomputed embeddings.
pub const FIRST_PASSAGE: &str = "first-passage";

const SUPPORTED: &[(&str, &str)] = &[(SPLADE_V3, FIRST_PASSAGE)];

const SPLADE_V3_ARCHIVE: &str = "splade-v3-non-segmented.zip";
const SPLADE_V3_EXTRACTED: &str = "splade-v3-non-segmented-extracted";

/// Names a precomputed-embedding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSpec {
    /// Embedding model name, e.g. `naver/splade-v3`.
    pub model: String,
    /// Passage aggregation strategy, e.g. `first-passage`.
    pub aggregation: String,
}

impl EmbeddingSpec {
    /// Create a specifier from a model name and aggregation strategy.
    pub fn new(model: impl Into<String>, aggregation: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            aggregation: aggregation.into(),
        }
    }

    /// The single supported combination.
    pub fn splade_v3_first_passage() -> Self {
        Self::new(SPLADE_V3, FIRST_PASSAGE)
    }
}

/// Resolved sidecar directories for one embedding configuration.
#[derive(Debug, Clone)]
pub struct EmbeddingSource {
    /// Directory holding `query_ids.txt` and `query_embeddings.pt`.
    pub queries_dir: PathBuf,
    /// Directory holding `doc_ids.txt` and `index.pt`.
    pub docs_dir: PathBuf,
}

/// Resolve the sidecar directories for `spec`, extracting the archive if
/// needed.
///
/// Unsupported combinations fail with [`DatasetError::UnsupportedEmbedding`];
/// the caller never proceeds with an unresolved target.
pub fn resolve_embedding_source(
    registry: &DatasetRegistry,
    dataset_id: &str,
    spec: &EmbeddingSpec,
) -> DatasetResult<EmbeddingSource> {
    if !(spec.model == SPLADE_V3 && spec.aggregation == FIRST_PASSAGE) {
        return Err(DatasetError::UnsupportedEmbedding {
            model: spec.model.clone(),
            aggregation: spec.aggregation.clone(),
            supported: SUPPORTED
                .iter()
                .map(|(m, a)| (m.to_string(), a.to_string()))
                .collect(),
        });
    }

    let base = registry.base_dir(dataset_id)?;
    let archive = base.join(SPLADE_V3_ARCHIVE);
    let extracted = base.join(SPLADE_V3_EXTRACTED);
    extract_zip(&archive, &extracted)?;

    let source = EmbeddingSource {
        queries_dir: extracted.join("queries"),
        docs_dir: extracted.join("docs").join("lsr-benchmark").join(dataset_id),
    };
    debug!(
        dataset_id,
        model = spec.model,
        aggregation = spec.aggregation,
        queries_dir = %source.queries_dir.display(),
        docs_dir = %source.docs_dir.display(),
        "resolved embedding source"
    );
    Ok(source)
}
