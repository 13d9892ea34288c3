//! Document model: segments, whole documents, and per-segment pseudo-documents.
//!
//! A corpus document is an ordered sequence of text segments with character
//! offsets into the original text. Consumers either see the whole document or,
//! through [`flatten_segments`], one pseudo-document per segment with a
//! synthesized id derived from the parent id and the segment position.

use serde::Serialize;
use serde_json::Value;

use crate::error::{DatasetError, DatasetResult};
use crate::jsonl::Record;

/// A contiguous text span within a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Half-open start position in the original document.
    #[serde(rename = "start")]
    pub offset_start: usize,
    /// Half-open end position in the original document.
    #[serde(rename = "end")]
    pub offset_end: usize,
    /// The segment text.
    pub text: String,
}

/// A corpus document: an id plus its segments in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Unique document id within the corpus.
    pub doc_id: String,
    /// Segments in the order defined by the corpus source. May be empty.
    pub segments: Vec<Segment>,
}

impl Document {
    /// Build a document from a decoded corpus record.
    ///
    /// Requires a string `doc_id` and a `segments` array whose entries carry
    /// `start`, `end`, and `text`. Offsets accept integer-valued JSON numbers
    /// and numeric strings; anything else is a format error naming the
    /// document and field.
    pub fn from_record(record: &Record) -> DatasetResult<Document> {
        let doc_id = string_field(record, "doc_id")?;
        let raw_segments = record
            .get("segments")
            .and_then(Value::as_array)
            .ok_or_else(|| DatasetError::InvalidRecord {
                context: format!("document '{doc_id}'"),
                reason: "'segments' must be an array".to_string(),
            })?;

        let mut segments = Vec::with_capacity(raw_segments.len());
        for raw in raw_segments {
            let segment = raw.as_object().ok_or_else(|| DatasetError::InvalidRecord {
                context: format!("document '{doc_id}'"),
                reason: "each segment must be an object".to_string(),
            })?;
            let text = segment
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| DatasetError::InvalidRecord {
                    context: format!("document '{doc_id}'"),
                    reason: "segment 'text' must be a string".to_string(),
                })?;
            segments.push(Segment {
                offset_start: offset_field(segment, "start", &doc_id)?,
                offset_end: offset_field(segment, "end", &doc_id)?,
                text: text.to_string(),
            });
        }

        Ok(Document { doc_id, segments })
    }

    /// The first segment's text, or the empty string for a segment-less
    /// document. Never fails.
    pub fn default_text(&self) -> &str {
        self.segments.first().map(|s| s.text.as_str()).unwrap_or("")
    }
}

/// A pseudo-document representing one segment of a parent document.
///
/// The id is synthesized as `"<parent_doc_id>___<segment_index>___"` with a
/// zero-based index, unique across the corpus as long as parent ids are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentedDocument {
    /// Synthesized pseudo-document id.
    pub doc_id: String,
    /// The segment this pseudo-document wraps.
    pub segment: Segment,
}

impl SegmentedDocument {
    /// The segment text. Mirrors [`Document::default_text`].
    pub fn default_text(&self) -> &str {
        &self.segment.text
    }
}

/// A document paired with its precomputed embedding.
#[derive(Debug, Clone)]
pub struct DocumentEmbedding {
    /// The document id the embedding is bound to.
    pub doc_id: String,
    /// Opaque fixed-width vector; never inspected by this crate.
    pub embedding: candle_core::Tensor,
}

/// Adapt a document iterator into one pseudo-document per segment.
///
/// Segments keep their original order and are enumerated from 0; documents
/// without segments contribute nothing. Errors from the underlying iterator
/// pass through. Lazy, and restartable iff the input is.
pub fn flatten_segments<I>(docs: I) -> SegmentFlattener<I>
where
    I: Iterator<Item = DatasetResult<Document>>,
{
    SegmentFlattener {
        docs,
        pending: Vec::new().into_iter(),
    }
}

/// Iterator adapter produced by [`flatten_segments`].
pub struct SegmentFlattener<I> {
    docs: I,
    pending: std::vec::IntoIter<SegmentedDocument>,
}

impl<I> Iterator for SegmentFlattener<I>
where
    I: Iterator<Item = DatasetResult<Document>>,
{
    type Item = DatasetResult<SegmentedDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(segmented) = self.pending.next() {
                return Some(Ok(segmented));
            }
            match self.docs.next()? {
                Err(e) => return Some(Err(e)),
                Ok(doc) => {
                    let parent_id = doc.doc_id;
                    self.pending = doc
                        .segments
                        .into_iter()
                        .enumerate()
                        .map(|(index, segment)| SegmentedDocument {
                            doc_id: format!("{parent_id}___{index}___"),
                            segment,
                        })
                        .collect::<Vec<_>>()
                        .into_iter();
                }
            }
        }
    }
}

fn string_field(record: &Record, field: &str) -> DatasetResult<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DatasetError::InvalidRecord {
            context: format!("field '{field}'"),
            reason: "expected a string value".to_string(),
        })
}

fn offset_field(segment: &Record, field: &str, doc_id: &str) -> DatasetResult<usize> {
    let value = segment.get(field).ok_or_else(|| DatasetError::InvalidRecord {
        context: format!("document '{doc_id}'"),
        reason: format!("segment is missing '{field}'"),
    })?;
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| DatasetError::InvalidRecord {
                context: format!("document '{doc_id}'"),
                reason: format!("segment '{field}' must be a non-negative integer, got {n}"),
            }),
        Value::String(s) => s.trim().parse::<usize>().map_err(|_| DatasetError::InvalidRecord {
            context: format!("document '{doc_id}'"),
            reason: format!("segment '{field}' must be numeric, got '{s}'"),
        }),
        other => Err(DatasetError::InvalidRecord {
            context: format!("document '{doc_id}'"),
            reason: format!("segment '{field}' must be numeric, got {other}"),
        }),
    }
}
