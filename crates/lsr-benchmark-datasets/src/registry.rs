//! Dataset registry: maps canonical dataset ids to on-disk corpus roots.
//!
//! The registry is an explicit value passed to everything that needs path
//! resolution, so tests can run against alternate mappings and data roots.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{DatasetError, DatasetResult};

/// Canonical id of the single benchmark dataset shipped today.
pub const CLUEWEB09_TREC_WEB_2009: &str = "clueweb09/en/trec-web-2009";

/// Directory under the dataset base holding the extracted inputs archive.
const INPUTS_EXTRACTED: &str = "inputs-extracted";

/// Directory under the dataset base holding the extracted truths archive.
const TRUTHS_EXTRACTED: &str = "truths-extracted";

/// Lookup table from canonical dataset id to its corpus root.
///
/// Roots are stored relative to a data root supplied at construction. The
/// default table knows exactly one dataset; more can be added with
/// [`DatasetRegistry::with_dataset`].
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    data_root: PathBuf,
    mapping: BTreeMap<String, PathBuf>,
}

impl DatasetRegistry {
    /// Create a registry with the default dataset mapping rooted at `data_root`.
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        let mut mapping = BTreeMap::new();
        mapping.insert(
            CLUEWEB09_TREC_WEB_2009.to_string(),
            PathBuf::from("data/trec-18-web"),
        );
        Self {
            data_root: data_root.into(),
            mapping,
        }
    }

    /// Create a registry with an empty mapping rooted at `data_root`.
    pub fn empty(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            mapping: BTreeMap::new(),
        }
    }

    /// Register (or replace) a dataset id with its root relative to the data root.
    pub fn with_dataset(mut self, dataset_id: impl Into<String>, relative_root: impl Into<PathBuf>) -> Self {
        self.mapping.insert(dataset_id.into(), relative_root.into());
        self
    }

    /// All dataset ids this registry knows about, sorted.
    pub fn supported_ids(&self) -> Vec<String> {
        self.mapping.keys().cloned().collect()
    }

    /// The data root all relative corpus roots resolve against.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Resolve a dataset id to its corpus root directory.
    pub fn base_dir(&self, dataset_id: &str) -> DatasetResult<PathBuf> {
        let relative = self.mapping.get(dataset_id).ok_or_else(|| {
            DatasetError::UnsupportedDataset {
                dataset_id: dataset_id.to_string(),
                supported: self.supported_ids(),
            }
        })?;
        let base = self.data_root.join(relative);
        debug!(dataset_id, base = %base.display(), "resolved dataset root");
        Ok(base)
    }

    /// Conventional extraction target for the inputs archive
    /// (`corpus.jsonl.gz`, `queries.jsonl`).
    pub fn inputs_dir(&self, dataset_id: &str) -> DatasetResult<PathBuf> {
        Ok(self.base_dir(dataset_id)?.join(INPUTS_EXTRACTED))
    }

    /// Conventional extraction target for the truths archive (`qrels.txt`).
    pub fn truths_dir(&self, dataset_id: &str) -> DatasetResult<PathBuf> {
        Ok(self.base_dir(dataset_id)?.join(TRUTHS_EXTRACTED))
    }
}
