//! Restartable lazy reader for jsonl and gzip-compressed jsonl files.
//!
//! Every call to [`JsonlReader::lines`] opens the source fresh, so iteration
//! can be repeated safely over read-only files without any in-memory
//! materialization. Records are decoded one line at a time and validated
//! against a required-field schema before being handed to the consumer.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use serde_json::{Map, Value};

use crate::error::{DatasetError, DatasetResult};

/// A decoded jsonl record: field name to value.
pub type Record = Map<String, Value>;

/// Line-format reader with a required-field schema and an optional size cap.
#[derive(Debug, Clone)]
pub struct JsonlReader {
    required_fields: Vec<String>,
    max_size_bytes: Option<u64>,
}

impl JsonlReader {
    /// Create a reader that requires each record to carry the given fields.
    pub fn new(required_fields: &[&str]) -> Self {
        Self {
            required_fields: required_fields.iter().map(|f| f.to_string()).collect(),
            max_size_bytes: None,
        }
    }

    /// Reject source files larger than `mb` megabytes before reading a line.
    pub fn with_max_size_mb(mut self, mb: u64) -> Self {
        self.max_size_bytes = Some(mb * 1024 * 1024);
        self
    }

    /// Open `path` and return a lazy iterator over its decoded records.
    ///
    /// Paths ending in `.gz` are gzip-decoded transparently. The size cap, if
    /// configured, applies to the on-disk size.
    pub fn lines(&self, path: &Path) -> DatasetResult<JsonlLines> {
        if let Some(max_bytes) = self.max_size_bytes {
            let metadata = std::fs::metadata(path).map_err(|e| DatasetError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            if metadata.len() > max_bytes {
                return Err(DatasetError::FileTooLarge {
                    path: path.to_path_buf(),
                    size_bytes: metadata.len(),
                    max_bytes,
                });
            }
        }

        let file = File::open(path).map_err(|e| DatasetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        Ok(JsonlLines {
            path: path.to_path_buf(),
            required_fields: self.required_fields.clone(),
            lines: reader.lines(),
            line_no: 0,
        })
    }
}

/// Lazy iterator over the decoded records of one jsonl file.
///
/// Blank lines are skipped. Decode failures and schema violations are yielded
/// as errors carrying the path and 1-based line number.
pub struct JsonlLines {
    path: PathBuf,
    required_fields: Vec<String>,
    lines: std::io::Lines<Box<dyn BufRead>>,
    line_no: usize,
}

impl std::fmt::Debug for JsonlLines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlLines")
            .field("path", &self.path)
            .field("required_fields", &self.required_fields)
            .field("line_no", &self.line_no)
            .finish_non_exhaustive()
    }
}

impl Iterator for JsonlLines {
    type Item = DatasetResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(DatasetError::Io {
                        path: self.path.clone(),
                        source: e,
                    }));
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(e) => {
                    return Some(Err(DatasetError::Decode {
                        path: self.path.clone(),
                        line: self.line_no,
                        source: e,
                    }));
                }
            };
            let record = match value {
                Value::Object(record) => record,
                other => {
                    return Some(Err(DatasetError::InvalidRecord {
                        context: format!("{}:{}", self.path.display(), self.line_no),
                        reason: format!("expected a JSON object, got {other}"),
                    }));
                }
            };

            for field in &self.required_fields {
                if !record.contains_key(field) {
                    return Some(Err(DatasetError::MissingField {
                        path: self.path.clone(),
                        line: self.line_no,
                        field: field.clone(),
                    }));
                }
            }
            return Some(Ok(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_lines(path: &Path, lines: &[&str]) {
        let mut file = File::create(path).expect("create jsonl");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
    }

    fn write_gz_lines(path: &Path, lines: &[&str]) {
        let file = File::create(path).expect("create gz");
        let mut encoder = GzEncoder::new(file, Compression::default());
        for line in lines {
            writeln!(encoder, "{line}").expect("write line");
        }
        encoder.finish().expect("finish gz");
    }

    #[test]
    fn decodes_records_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[r#"{"qid": "1", "query": "first"}"#, r#"{"qid": "2", "query": "second"}"#]);

        let records: Vec<Record> = JsonlReader::new(&["qid", "query"])
            .lines(&path)
            .unwrap()
            .collect::<DatasetResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["qid"], "1");
        assert_eq!(records[1]["query"], "second");
    }

    #[test]
    fn skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[r#"{"qid": "1", "query": "a"}"#, "", "   ", r#"{"qid": "2", "query": "b"}"#]);

        let count = JsonlReader::new(&["qid"]).lines(&path).unwrap().count();
        assert_eq!(count, 2);
    }

    #[test]
    fn missing_field_names_the_field_and_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[r#"{"qid": "1", "query": "a"}"#, r#"{"qid": "2"}"#]);

        let results: Vec<_> = JsonlReader::new(&["qid", "query"]).lines(&path).unwrap().collect();
        assert!(results[0].is_ok());
        match results[1].as_ref().unwrap_err() {
            DatasetError::MissingField { line, field, .. } => {
                assert_eq!(*line, 2);
                assert_eq!(field, "query");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn gz_and_plain_sources_decode_identically() {
        let dir = TempDir::new().unwrap();
        let lines = [r#"{"doc_id": "d1", "segments": []}"#, r#"{"doc_id": "d2", "segments": []}"#];
        let plain = dir.path().join("corpus.jsonl");
        let gz = dir.path().join("corpus.jsonl.gz");
        write_lines(&plain, &lines);
        write_gz_lines(&gz, &lines);

        let reader = JsonlReader::new(&["doc_id"]);
        let from_plain: Vec<Record> =
            reader.lines(&plain).unwrap().collect::<DatasetResult<_>>().unwrap();
        let from_gz: Vec<Record> =
            reader.lines(&gz).unwrap().collect::<DatasetResult<_>>().unwrap();
        assert_eq!(from_plain, from_gz);
    }

    #[test]
    fn reiteration_reopens_the_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[r#"{"qid": "1", "query": "a"}"#]);

        let reader = JsonlReader::new(&["qid"]);
        assert_eq!(reader.lines(&path).unwrap().count(), 1);
        assert_eq!(reader.lines(&path).unwrap().count(), 1);
    }

    #[test]
    fn oversized_file_is_rejected_before_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.jsonl");
        write_lines(&path, &[r#"{"qid": "1", "query": "a"}"#]);

        let err = JsonlReader::new(&["qid"])
            .with_max_size_mb(0)
            .lines(&path)
            .unwrap_err();
        assert!(matches!(err, DatasetError::FileTooLarge { .. }));
    }
}
