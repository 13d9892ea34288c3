//! Sidecar embedding loading and the id-to-embedding join.
//!
//! A sidecar directory pairs a newline-separated identifier file with a
//! serialized tensor collection of the same count and order. The two are
//! zipped positionally into a lookup table after an explicit count check;
//! lookups then re-key the corpus iteration order by identifier.

use std::collections::HashMap;
use std::path::Path;

use candle_core::Tensor;
use tracing::info;

use crate::error::{DatasetError, DatasetResult};

/// Identifier file paired with the document embedding collection.
pub const DOC_IDS_FILE: &str = "doc_ids.txt";

/// Serialized document embedding collection.
pub const DOC_EMBEDDINGS_FILE: &str = "index.pt";

/// Identifier file paired with the query embedding collection.
pub const QUERY_IDS_FILE: &str = "query_ids.txt";

/// Serialized query embedding collection.
pub const QUERY_EMBEDDINGS_FILE: &str = "query_embeddings.pt";

/// An id-to-embedding lookup table built from one sidecar pair.
///
/// Loading is eager and synchronous; the table is not cached across calls.
#[derive(Debug)]
pub struct SidecarEmbeddings {
    by_id: HashMap<String, Tensor>,
}

impl SidecarEmbeddings {
    /// Load the sidecar pair `ids_file` + `embeddings_file` from `dir`.
    ///
    /// The identifier file is newline-separated UTF-8, one id per line, in
    /// embedding order. The tensor file holds the same count of fixed-width
    /// vectors, either as one rank-2 tensor of rows or as an ordered sequence
    /// of rank-1 tensors.
    pub fn load(dir: &Path, ids_file: &str, embeddings_file: &str) -> DatasetResult<Self> {
        let ids_path = dir.join(ids_file);
        let text = std::fs::read_to_string(&ids_path).map_err(|e| DatasetError::Io {
            path: ids_path.clone(),
            source: e,
        })?;
        let trimmed = text.trim();
        let ids: Vec<String> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed
                .split('\n')
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect()
        };

        let embeddings = load_tensor_rows(&dir.join(embeddings_file))?;
        Self::from_parts(dir, ids, embeddings)
    }

    /// Build the table from already-loaded parts, validating the counts.
    ///
    /// A count mismatch is [`DatasetError::SidecarCountMismatch`]; the
    /// sequences are never paired positionally beyond the shorter one.
    pub fn from_parts(
        dir: &Path,
        ids: Vec<String>,
        embeddings: Vec<Tensor>,
    ) -> DatasetResult<Self> {
        if ids.len() != embeddings.len() {
            return Err(DatasetError::SidecarCountMismatch {
                dir: dir.to_path_buf(),
                ids: ids.len(),
                embeddings: embeddings.len(),
            });
        }
        info!(dir = %dir.display(), count = ids.len(), "loaded embedding sidecar");
        Ok(Self {
            by_id: ids.into_iter().zip(embeddings).collect(),
        })
    }

    /// Number of id-embedding bindings in the table.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Look up the embedding bound to `id`.
    ///
    /// An absent id is a corpus/sidecar mismatch and fails with
    /// [`DatasetError::MissingEmbedding`]; it is never silently skipped.
    pub fn lookup(&self, id: &str) -> DatasetResult<Tensor> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| DatasetError::MissingEmbedding { id: id.to_string() })
    }
}

/// Read the ordered embedding rows out of a serialized tensor collection.
///
/// A single rank-2 tensor is split into its rows; a sequence of entries is
/// taken one row per entry, restored to index order when the entries are
/// keyed by position.
fn load_tensor_rows(path: &Path) -> DatasetResult<Vec<Tensor>> {
    let entries =
        candle_core::pickle::read_all(path).map_err(|e| DatasetError::InvalidSidecar {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut entries = entries;
    match entries.len() {
        0 => Err(DatasetError::InvalidSidecar {
            path: path.to_path_buf(),
            reason: "no tensors found".to_string(),
        }),
        1 => {
            let (_, tensor) = entries.remove(0);
            if tensor.rank() < 2 {
                // A single vector saved on its own.
                return Ok(vec![tensor]);
            }
            let rows = tensor.dim(0).map_err(|e| DatasetError::InvalidSidecar {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            (0..rows)
                .map(|i| {
                    tensor.get(i).map_err(|e| DatasetError::InvalidSidecar {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })
                })
                .collect()
        }
        _ => {
            // One tensor per entry, e.g. a saved list. Entry names are list
            // indices; sort numerically when they all parse as such.
            if entries.iter().all(|(name, _)| name.parse::<usize>().is_ok()) {
                entries.sort_by_key(|(name, _)| name.parse::<usize>().unwrap_or(usize::MAX));
            }
            Ok(entries.into_iter().map(|(_, tensor)| tensor).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use std::path::PathBuf;

    fn vector(values: &[f32]) -> Tensor {
        Tensor::from_vec(values.to_vec(), values.len(), &Device::Cpu).expect("build tensor")
    }

    fn as_values(tensor: &Tensor) -> Vec<f32> {
        tensor.to_vec1::<f32>().expect("read tensor")
    }

    #[test]
    fn join_follows_the_base_order_not_the_sidecar_order() {
        let sidecar = SidecarEmbeddings::from_parts(
            &PathBuf::from("/sidecar"),
            vec!["d1".to_string(), "d2".to_string(), "d3".to_string()],
            vec![vector(&[1.0]), vector(&[2.0]), vector(&[3.0])],
        )
        .unwrap();

        let base_order = ["d2", "d1", "d3"];
        let joined: Vec<(String, Tensor)> = base_order
            .iter()
            .map(|id| sidecar.lookup(id).map(|e| (id.to_string(), e)))
            .collect::<DatasetResult<_>>()
            .unwrap();

        let values: Vec<(String, Vec<f32>)> = joined
            .iter()
            .map(|(id, e)| (id.clone(), as_values(e)))
            .collect();
        assert_eq!(
            values,
            vec![
                ("d2".to_string(), vec![2.0]),
                ("d1".to_string(), vec![1.0]),
                ("d3".to_string(), vec![3.0]),
            ]
        );
    }

    #[test]
    fn count_mismatch_is_rejected_not_truncated() {
        let err = SidecarEmbeddings::from_parts(
            &PathBuf::from("/sidecar"),
            vec!["d1".to_string(), "d2".to_string(), "d3".to_string()],
            vec![vector(&[1.0]), vector(&[2.0])],
        )
        .unwrap_err();
        match err {
            DatasetError::SidecarCountMismatch { ids, embeddings, .. } => {
                assert_eq!(ids, 3);
                assert_eq!(embeddings, 2);
            }
            other => panic!("expected SidecarCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_id_is_fatal() {
        let sidecar = SidecarEmbeddings::from_parts(
            &PathBuf::from("/sidecar"),
            vec!["d1".to_string()],
            vec![vector(&[1.0])],
        )
        .unwrap();

        let err = sidecar.lookup("d9").unwrap_err();
        match err {
            DatasetError::MissingEmbedding { id } => assert_eq!(id, "d9"),
            other => panic!("expected MissingEmbedding, got {other:?}"),
        }
    }

    #[test]
    fn empty_sidecar_is_valid() {
        let sidecar =
            SidecarEmbeddings::from_parts(&PathBuf::from("/sidecar"), Vec::new(), Vec::new())
                .unwrap();
        assert!(sidecar.is_empty());
        assert_eq!(sidecar.len(), 0);
    }
}
