//! TREC qrels parsing with the benchmark's fixed relevance-level mapping.
//!
//! Qrels lines are 4 whitespace-separated columns:
//! `query_id iteration doc_id relevance`. Records stream lazily from any
//! buffered reader; the relevance definitions ride along as metadata and are
//! not a validation gate.

use std::io::BufRead;

use crate::error::{DatasetError, DatasetResult};

/// The benchmark's relevance levels.
pub const RELEVANCE_LEVELS: &[(i32, &str)] = &[(0, "Not Relevant"), (1, "Relevant")];

/// One relevance judgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Qrel {
    /// The judged query.
    pub query_id: String,
    /// TREC iteration column, usually `0` or `Q0`.
    pub iteration: String,
    /// The judged document.
    pub doc_id: String,
    /// Relevance level, passed through numerically.
    pub relevance: i32,
}

/// Lazily parse qrels records from a buffered reader.
///
/// Blank lines are skipped; malformed lines are yielded as errors with their
/// 1-based line number.
pub fn read_qrels<R: BufRead>(reader: R) -> QrelsLines<R> {
    QrelsLines {
        lines: reader.lines(),
        line_no: 0,
    }
}

/// Iterator over the qrels records of one stream.
pub struct QrelsLines<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> Iterator for QrelsLines<R> {
    type Item = DatasetResult<Qrel>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(DatasetError::Io {
                        path: "<qrels stream>".into(),
                        source: e,
                    }));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(parse_line(&line, self.line_no));
        }
    }
}

fn parse_line(line: &str, line_no: usize) -> DatasetResult<Qrel> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    if columns.len() != 4 {
        return Err(DatasetError::InvalidRecord {
            context: format!("qrels line {line_no}"),
            reason: format!("expected 4 columns, got {}", columns.len()),
        });
    }
    let relevance = columns[3]
        .parse::<i32>()
        .map_err(|_| DatasetError::InvalidRecord {
            context: format!("qrels line {line_no}"),
            reason: format!("relevance must be an integer, got '{}'", columns[3]),
        })?;
    Ok(Qrel {
        query_id: columns[0].to_string(),
        iteration: columns[1].to_string(),
        doc_id: columns[2].to_string(),
        relevance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_four_column_lines() {
        let input = "q1 0 d1 1\nq1 0 d2 0\nq2 Q0 d1 1\n";
        let qrels: Vec<Qrel> = read_qrels(input.as_bytes())
            .collect::<DatasetResult<_>>()
            .unwrap();
        assert_eq!(qrels.len(), 3);
        assert_eq!(
            qrels[0],
            Qrel {
                query_id: "q1".to_string(),
                iteration: "0".to_string(),
                doc_id: "d1".to_string(),
                relevance: 1,
            }
        );
        assert_eq!(qrels[2].iteration, "Q0");
    }

    #[test]
    fn skips_blank_lines() {
        let input = "q1 0 d1 1\n\n   \nq2 0 d2 0\n";
        let count = read_qrels(input.as_bytes()).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn reports_malformed_lines_with_their_number() {
        let input = "q1 0 d1 1\nq2 d2 1\n";
        let results: Vec<_> = read_qrels(input.as_bytes()).collect();
        assert!(results[0].is_ok());
        match results[1].as_ref().unwrap_err() {
            DatasetError::InvalidRecord { context, .. } => assert!(context.contains("line 2")),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn non_integer_relevance_is_rejected() {
        let input = "q1 0 d1 high\n";
        let results: Vec<_> = read_qrels(input.as_bytes()).collect();
        assert!(results[0].is_err());
    }

    #[test]
    fn relevance_definitions_cover_the_fixed_mapping() {
        assert_eq!(RELEVANCE_LEVELS, &[(0, "Not Relevant"), (1, "Relevant")]);
    }
}
