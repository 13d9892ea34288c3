//! Dataset adapters for the LSR benchmark corpus.
//!
//! Exposes a fixed on-disk benchmark (documents, queries, relevance
//! judgments, and precomputed embeddings) through lazy, restartable
//! iteration: documents either as whole records or as one pseudo-document
//! per segment, and queries/documents either as raw text or as precomputed
//! dense vectors joined on by identifier.
//!
//! # Architecture
//!
//! - **DatasetRegistry**: canonical dataset id to on-disk corpus root
//! - **Document / SegmentedDocument**: segment-aware document model
//! - **JsonlReader**: restartable line-format reader (jsonl, jsonl.gz)
//! - **EmbeddingSpec / SidecarEmbeddings**: sidecar resolution and the
//!   positional id-to-embedding join
//! - **DocumentCollection / QueryCollection / QrelsCollection**: the
//!   iteration adapters composed into a [`Dataset`]
//!
//! # Example
//!
//! ```rust
//! use lsr_benchmark_datasets::{CLUEWEB09_TREC_WEB_2009, DatasetRegistry};
//!
//! let registry = DatasetRegistry::new("/data/lsr");
//! assert!(registry.base_dir(CLUEWEB09_TREC_WEB_2009).is_ok());
//! assert!(registry.base_dir("unknown/dataset").is_err());
//! ```

pub mod archive;
pub mod dataset;
pub mod document;
pub mod embedding;
pub mod error;
pub mod jsonl;
pub mod qrels;
pub mod query;
pub mod registry;
pub mod sidecar;

pub use archive::extract_zip;
pub use dataset::{
    CORPUS_FILE, Dataset, DocRecord, DocumentCollection, DocumentsComponent, INPUTS_ARCHIVE,
    IterMode, QRELS_FILE, QUERIES_FILE, QrelsCollection, QueryCollection, QueryRecord,
    SegmentedDocumentCollection, TRUTHS_ARCHIVE, build_dataset_from_local_cache,
    ensure_corpus_extracted,
};
pub use document::{
    Document, DocumentEmbedding, Segment, SegmentedDocument, flatten_segments,
};
pub use embedding::{
    EmbeddingSource, EmbeddingSpec, FIRST_PASSAGE, SPLADE_V3, resolve_embedding_source,
};
pub use error::{DatasetError, DatasetResult};
pub use jsonl::{JsonlLines, JsonlReader, Record};
pub use qrels::{Qrel, QrelsLines, RELEVANCE_LEVELS, read_qrels};
pub use query::{Query, QueryEmbedding};
pub use registry::{CLUEWEB09_TREC_WEB_2009, DatasetRegistry};
pub use sidecar::{
    DOC_EMBEDDINGS_FILE, DOC_IDS_FILE, QUERY_EMBEDDINGS_FILE, QUERY_IDS_FILE, SidecarEmbeddings,
};
