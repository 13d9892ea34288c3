//! Query model: plain text queries and their embedding-mode counterpart.

use serde::Serialize;
use serde_json::Value;

use crate::error::{DatasetError, DatasetResult};
use crate::jsonl::Record;

/// A benchmark query: an id and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    /// Unique query id within the benchmark.
    #[serde(rename = "qid")]
    pub query_id: String,
    /// The query text.
    #[serde(rename = "query")]
    pub text: String,
}

impl Query {
    /// Build a query from a decoded record with string `qid` and `query` fields.
    pub fn from_record(record: &Record) -> DatasetResult<Query> {
        Ok(Query {
            query_id: string_field(record, "qid")?,
            text: string_field(record, "query")?,
        })
    }
}

/// A query paired with its precomputed embedding.
#[derive(Debug, Clone)]
pub struct QueryEmbedding {
    /// The query id the embedding is bound to.
    pub query_id: String,
    /// Opaque fixed-width vector; never inspected by this crate.
    pub embedding: candle_core::Tensor,
}

fn string_field(record: &Record, field: &str) -> DatasetResult<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DatasetError::InvalidRecord {
            context: format!("query field '{field}'"),
            reason: "expected a string value".to_string(),
        })
}
