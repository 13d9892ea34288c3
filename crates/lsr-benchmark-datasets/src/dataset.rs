//! Document, query, and qrels adapters plus the dataset composition.
//!
//! Each adapter offers pull-based, lazily produced iteration; re-iterating
//! re-opens the underlying file. Iteration mode is an explicit per-call
//! argument: raw mode reads through the line-format reader and the value
//! constructors, embedding mode resolves the sidecar source first and then
//! replays the same underlying order with embeddings instead of text.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::debug;

use crate::archive::extract_zip;
use crate::document::{
    Document, DocumentEmbedding, SegmentedDocument, flatten_segments,
};
use crate::embedding::{EmbeddingSpec, resolve_embedding_source};
use crate::error::{DatasetError, DatasetResult};
use crate::jsonl::JsonlReader;
use crate::qrels::{Qrel, QrelsLines, RELEVANCE_LEVELS, read_qrels};
use crate::query::{Query, QueryEmbedding};
use crate::registry::DatasetRegistry;
use crate::sidecar::{
    DOC_EMBEDDINGS_FILE, DOC_IDS_FILE, QUERY_EMBEDDINGS_FILE, QUERY_IDS_FILE, SidecarEmbeddings,
};

/// Corpus file inside the extracted inputs directory.
pub const CORPUS_FILE: &str = "corpus.jsonl.gz";

/// Queries file inside the extracted inputs directory.
pub const QUERIES_FILE: &str = "queries.jsonl";

/// Qrels file inside the extracted truths directory.
pub const QRELS_FILE: &str = "qrels.txt";

/// Inputs archive at the dataset base.
pub const INPUTS_ARCHIVE: &str = "inputs.zip";

/// Truths archive at the dataset base.
pub const TRUTHS_ARCHIVE: &str = "truths.zip";

const CORPUS_REQUIRED_FIELDS: &[&str] = &["doc_id", "segments"];
const CORPUS_MAX_SIZE_MB: u64 = 2500;
const QUERY_REQUIRED_FIELDS: &[&str] = &["qid", "query"];

/// Iteration mode, selected per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterMode {
    /// Yield raw text values read from the corpus/queries files.
    Raw,
    /// Yield precomputed embeddings from the named sidecar configuration.
    Embedding(EmbeddingSpec),
}

/// One item of a document iteration, tagged by mode.
#[derive(Debug, Clone)]
pub enum DocRecord {
    /// Raw-mode document.
    Raw(Document),
    /// Embedding-mode document.
    Embedding(DocumentEmbedding),
}

/// One item of a query iteration, tagged by mode.
#[derive(Debug, Clone)]
pub enum QueryRecord {
    /// Raw-mode query.
    Raw(Query),
    /// Embedding-mode query.
    Embedding(QueryEmbedding),
}

/// Document source over one corpus file.
#[derive(Debug, Clone)]
pub struct DocumentCollection {
    corpus_file: PathBuf,
    dataset_id: String,
    registry: DatasetRegistry,
}

impl DocumentCollection {
    /// Create a collection reading `corpus_file`, resolving embedding sidecars
    /// for `dataset_id` through `registry`.
    pub fn new(
        corpus_file: impl Into<PathBuf>,
        dataset_id: impl Into<String>,
        registry: DatasetRegistry,
    ) -> Self {
        Self {
            corpus_file: corpus_file.into(),
            dataset_id: dataset_id.into(),
            registry,
        }
    }

    pub(crate) fn raw_docs(
        &self,
    ) -> DatasetResult<impl Iterator<Item = DatasetResult<Document>> + use<>> {
        let lines = JsonlReader::new(CORPUS_REQUIRED_FIELDS)
            .with_max_size_mb(CORPUS_MAX_SIZE_MB)
            .lines(&self.corpus_file)?;
        Ok(lines.map(|record| record.and_then(|r| Document::from_record(&r))))
    }

    /// Iterate the corpus in the requested mode.
    ///
    /// Embedding mode resolves the sidecar source, loads the id-to-embedding
    /// table, and replays the raw document order with embeddings.
    pub fn docs_iter(
        &self,
        mode: &IterMode,
    ) -> DatasetResult<Box<dyn Iterator<Item = DatasetResult<DocRecord>>>> {
        match mode {
            IterMode::Raw => Ok(Box::new(
                self.raw_docs()?.map(|doc| doc.map(DocRecord::Raw)),
            )),
            IterMode::Embedding(spec) => {
                let source = resolve_embedding_source(&self.registry, &self.dataset_id, spec)?;
                let sidecar =
                    SidecarEmbeddings::load(&source.docs_dir, DOC_IDS_FILE, DOC_EMBEDDINGS_FILE)?;
                Ok(Box::new(self.raw_docs()?.map(move |doc| {
                    let doc = doc?;
                    let embedding = sidecar.lookup(&doc.doc_id)?;
                    Ok(DocRecord::Embedding(DocumentEmbedding {
                        doc_id: doc.doc_id,
                        embedding,
                    }))
                })))
            }
        }
    }

    /// Count documents by fully draining a fresh raw iterator.
    ///
    /// Linear in corpus size on every call; decode errors propagate.
    pub fn docs_count(&self) -> DatasetResult<usize> {
        let mut count = 0;
        for doc in self.raw_docs()? {
            doc?;
            count += 1;
        }
        Ok(count)
    }
}

/// Document source exposing one pseudo-document per segment.
///
/// The supported embedding sidecar is keyed by whole-document ids, so this
/// collection iterates raw segments only.
#[derive(Debug, Clone)]
pub struct SegmentedDocumentCollection {
    inner: DocumentCollection,
}

impl SegmentedDocumentCollection {
    /// Create a segmented view over `corpus_file`.
    pub fn new(
        corpus_file: impl Into<PathBuf>,
        dataset_id: impl Into<String>,
        registry: DatasetRegistry,
    ) -> Self {
        Self {
            inner: DocumentCollection::new(corpus_file, dataset_id, registry),
        }
    }

    /// Iterate pseudo-documents, one per segment in corpus order.
    pub fn docs_iter(
        &self,
    ) -> DatasetResult<impl Iterator<Item = DatasetResult<SegmentedDocument>> + use<>> {
        Ok(flatten_segments(self.inner.raw_docs()?))
    }

    /// Count pseudo-documents by fully draining a fresh iterator.
    pub fn docs_count(&self) -> DatasetResult<usize> {
        let mut count = 0;
        for doc in self.docs_iter()? {
            doc?;
            count += 1;
        }
        Ok(count)
    }
}

/// Query source over one queries file.
#[derive(Debug, Clone)]
pub struct QueryCollection {
    queries_file: PathBuf,
    dataset_id: String,
    registry: DatasetRegistry,
}

impl QueryCollection {
    /// Create a collection reading `queries_file`, resolving embedding
    /// sidecars for `dataset_id` through `registry`.
    pub fn new(
        queries_file: impl Into<PathBuf>,
        dataset_id: impl Into<String>,
        registry: DatasetRegistry,
    ) -> Self {
        Self {
            queries_file: queries_file.into(),
            dataset_id: dataset_id.into(),
            registry,
        }
    }

    fn raw_queries(
        &self,
    ) -> DatasetResult<impl Iterator<Item = DatasetResult<Query>> + use<>> {
        let lines = JsonlReader::new(QUERY_REQUIRED_FIELDS).lines(&self.queries_file)?;
        Ok(lines.map(|record| record.and_then(|r| Query::from_record(&r))))
    }

    /// Iterate the queries in the requested mode.
    pub fn queries_iter(
        &self,
        mode: &IterMode,
    ) -> DatasetResult<Box<dyn Iterator<Item = DatasetResult<QueryRecord>>>> {
        match mode {
            IterMode::Raw => Ok(Box::new(
                self.raw_queries()?.map(|query| query.map(QueryRecord::Raw)),
            )),
            IterMode::Embedding(spec) => {
                let source = resolve_embedding_source(&self.registry, &self.dataset_id, spec)?;
                let sidecar = SidecarEmbeddings::load(
                    &source.queries_dir,
                    QUERY_IDS_FILE,
                    QUERY_EMBEDDINGS_FILE,
                )?;
                Ok(Box::new(self.raw_queries()?.map(move |query| {
                    let query = query?;
                    let embedding = sidecar.lookup(&query.query_id)?;
                    Ok(QueryRecord::Embedding(QueryEmbedding {
                        query_id: query.query_id,
                        embedding,
                    }))
                })))
            }
        }
    }

    /// Count queries by fully draining a fresh raw iterator.
    pub fn queries_count(&self) -> DatasetResult<usize> {
        let mut count = 0;
        for query in self.raw_queries()? {
            query?;
            count += 1;
        }
        Ok(count)
    }
}

/// Qrels source over one qrels file.
#[derive(Debug, Clone)]
pub struct QrelsCollection {
    qrels_file: PathBuf,
}

impl QrelsCollection {
    /// Create a collection streaming `qrels_file`.
    pub fn new(qrels_file: impl Into<PathBuf>) -> Self {
        Self {
            qrels_file: qrels_file.into(),
        }
    }

    /// Stream the relevance judgments; each call re-opens the file.
    pub fn qrels_iter(&self) -> DatasetResult<QrelsLines<BufReader<File>>> {
        let file = File::open(&self.qrels_file).map_err(|e| DatasetError::Io {
            path: self.qrels_file.clone(),
            source: e,
        })?;
        Ok(read_qrels(BufReader::new(file)))
    }

    /// The fixed relevance-level mapping for this benchmark.
    pub fn definitions(&self) -> &'static [(i32, &'static str)] {
        RELEVANCE_LEVELS
    }
}

/// Document component of a dataset: whole documents or per-segment views.
#[derive(Debug, Clone)]
pub enum DocumentsComponent {
    /// One logical document per corpus record.
    Whole(DocumentCollection),
    /// One pseudo-document per segment.
    Segmented(SegmentedDocumentCollection),
}

impl DocumentsComponent {
    /// Count entries by fully draining the component's iterator.
    pub fn docs_count(&self) -> DatasetResult<usize> {
        match self {
            Self::Whole(docs) => docs.docs_count(),
            Self::Segmented(docs) => docs.docs_count(),
        }
    }
}

/// A benchmark dataset: at most one document, query, and qrels source.
///
/// Presence is independent per component; a dataset may expose only
/// documents, only queries, and so on.
#[derive(Debug)]
pub struct Dataset {
    docs: Option<DocumentsComponent>,
    queries: Option<QueryCollection>,
    qrels: Option<QrelsCollection>,
    documentation: Option<String>,
}

impl Dataset {
    /// Compose a dataset from its components.
    pub fn new(
        docs: Option<DocumentsComponent>,
        queries: Option<QueryCollection>,
        qrels: Option<QrelsCollection>,
    ) -> Self {
        Self {
            docs,
            queries,
            qrels,
            documentation: None,
        }
    }

    /// Attach a human-readable description.
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    /// The document component, if present.
    pub fn docs(&self) -> Option<&DocumentsComponent> {
        self.docs.as_ref()
    }

    /// The query component, if present.
    pub fn queries(&self) -> Option<&QueryCollection> {
        self.queries.as_ref()
    }

    /// The qrels component, if present.
    pub fn qrels(&self) -> Option<&QrelsCollection> {
        self.qrels.as_ref()
    }

    /// The attached description, if any.
    pub fn documentation(&self) -> Option<&str> {
        self.documentation.as_deref()
    }

    /// Build the dataset from an already-extracted local cache.
    ///
    /// Wires `corpus.jsonl.gz` and `queries.jsonl` from the inputs directory
    /// and `qrels.txt` from the truths directory. Extraction itself is
    /// [`ensure_corpus_extracted`]'s job.
    pub fn from_local_cache(
        registry: &DatasetRegistry,
        dataset_id: &str,
        segmented: bool,
    ) -> DatasetResult<Dataset> {
        let inputs = registry.inputs_dir(dataset_id)?;
        let truths = registry.truths_dir(dataset_id)?;
        let corpus_file = inputs.join(CORPUS_FILE);
        let queries_file = inputs.join(QUERIES_FILE);
        let qrels_file = truths.join(QRELS_FILE);
        debug!(
            dataset_id,
            corpus = %corpus_file.display(),
            segmented,
            "building dataset from local cache"
        );

        let docs = if segmented {
            DocumentsComponent::Segmented(SegmentedDocumentCollection::new(
                corpus_file,
                dataset_id,
                registry.clone(),
            ))
        } else {
            DocumentsComponent::Whole(DocumentCollection::new(
                corpus_file,
                dataset_id,
                registry.clone(),
            ))
        };
        let queries = QueryCollection::new(queries_file, dataset_id, registry.clone());
        let qrels = QrelsCollection::new(qrels_file);

        Ok(Dataset::new(Some(docs), Some(queries), Some(qrels)))
    }
}

/// Extract the inputs and truths archives into their conventional targets.
///
/// Idempotent per archive: already-extracted directories are left alone.
pub fn ensure_corpus_extracted(
    registry: &DatasetRegistry,
    dataset_id: &str,
) -> DatasetResult<()> {
    let base = registry.base_dir(dataset_id)?;
    let pairs: [(PathBuf, PathBuf); 2] = [
        (base.join(INPUTS_ARCHIVE), registry.inputs_dir(dataset_id)?),
        (base.join(TRUTHS_ARCHIVE), registry.truths_dir(dataset_id)?),
    ];
    for (archive, target) in &pairs {
        extract_zip(archive, target)?;
    }
    Ok(())
}

/// Convenience wrapper: extract if needed, then build from the local cache.
pub fn build_dataset_from_local_cache(
    registry: &DatasetRegistry,
    dataset_id: &str,
    segmented: bool,
) -> DatasetResult<Dataset> {
    ensure_corpus_extracted(registry, dataset_id)?;
    Dataset::from_local_cache(registry, dataset_id, segmented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::registry::CLUEWEB09_TREC_WEB_2009;

    fn write_corpus(dir: &Path, lines: &[&str]) -> PathBuf {
        let path = dir.join("corpus.jsonl");
        let mut file = File::create(&path).expect("create corpus");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        path
    }

    fn registry(dir: &Path) -> DatasetRegistry {
        DatasetRegistry::new(dir)
    }

    #[test]
    fn docs_count_drains_and_reproduces_every_document() {
        let dir = TempDir::new().unwrap();
        let corpus = write_corpus(
            dir.path(),
            &[
                r#"{"doc_id": "d1", "segments": [{"start": 0, "end": 1, "text": "a"}]}"#,
                r#"{"doc_id": "d2", "segments": []}"#,
                r#"{"doc_id": "d3", "segments": [{"start": 0, "end": 1, "text": "c"}]}"#,
            ],
        );
        let docs =
            DocumentCollection::new(corpus, CLUEWEB09_TREC_WEB_2009, registry(dir.path()));

        assert_eq!(docs.docs_count().unwrap(), 3);
        // Counting again re-reads the source.
        assert_eq!(docs.docs_count().unwrap(), 3);

        let ids: Vec<String> = docs
            .docs_iter(&IterMode::Raw)
            .unwrap()
            .map(|record| match record.unwrap() {
                DocRecord::Raw(doc) => doc.doc_id,
                other => panic!("expected raw record, got {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["d1", "d2", "d3"]);
    }

    #[test]
    fn segmented_collection_flattens_in_corpus_order() {
        let dir = TempDir::new().unwrap();
        let corpus = write_corpus(
            dir.path(),
            &[
                r#"{"doc_id": "d1", "segments": [{"start": 0, "end": 1, "text": "a"}, {"start": 1, "end": 2, "text": "b"}]}"#,
                r#"{"doc_id": "d2", "segments": []}"#,
                r#"{"doc_id": "d3", "segments": [{"start": 0, "end": 1, "text": "c"}]}"#,
            ],
        );
        let docs = SegmentedDocumentCollection::new(
            corpus,
            CLUEWEB09_TREC_WEB_2009,
            registry(dir.path()),
        );

        let ids: Vec<String> = docs
            .docs_iter()
            .unwrap()
            .map(|doc| doc.unwrap().doc_id)
            .collect();
        assert_eq!(ids, vec!["d1___0___", "d1___1___", "d3___0___"]);
        assert_eq!(docs.docs_count().unwrap(), 3);
    }

    #[test]
    fn decode_failures_propagate_through_counting() {
        let dir = TempDir::new().unwrap();
        let corpus = write_corpus(
            dir.path(),
            &[
                r#"{"doc_id": "d1", "segments": []}"#,
                r#"{"doc_id": "d2"}"#,
            ],
        );
        let docs =
            DocumentCollection::new(corpus, CLUEWEB09_TREC_WEB_2009, registry(dir.path()));
        assert!(matches!(
            docs.docs_count().unwrap_err(),
            DatasetError::MissingField { .. }
        ));
    }

    #[test]
    fn embedding_mode_rejects_unsupported_specs_up_front() {
        let dir = TempDir::new().unwrap();
        let corpus = write_corpus(dir.path(), &[r#"{"doc_id": "d1", "segments": []}"#]);
        let docs =
            DocumentCollection::new(corpus, CLUEWEB09_TREC_WEB_2009, registry(dir.path()));

        let mode = IterMode::Embedding(EmbeddingSpec::new("other/model", "first-passage"));
        match docs.docs_iter(&mode) {
            Err(DatasetError::UnsupportedEmbedding { model, .. }) => {
                assert_eq!(model, "other/model");
            }
            Err(other) => panic!("expected UnsupportedEmbedding, got {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn components_are_independently_optional() {
        let dataset = Dataset::new(None, None, None);
        assert!(dataset.docs().is_none());
        assert!(dataset.queries().is_none());
        assert!(dataset.qrels().is_none());

        let qrels_only =
            Dataset::new(None, None, Some(QrelsCollection::new("/tmp/qrels.txt")))
                .with_documentation("truths only");
        assert!(qrels_only.qrels().is_some());
        assert_eq!(qrels_only.documentation(), Some("truths only"));
    }
}
