//! Block parser.
//!
//! Splits raw text into a header, an ordered run of record blocks and a
//! footer, keeping every byte. Lines keep their terminators, so joining
//! header, blocks and footer reproduces the input exactly.
//!
//! Text between one record's closer and the next record's opener (blank
//! lines, ordinal comments) is carried as leading text of the following
//! block.

use crate::config::RecordLayout;
use crate::core_types::schema::FIELD_RECORD_COUNT;
use crate::errors::{DeltaError, Result};
use crate::{log_op_end, log_op_error, log_op_start};
use std::time::Instant;

/// Exactly one record, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    /// 1-based position of this record in its source
    pub seq: usize,
    /// 1-based line of the record's opening delimiter
    pub line: usize,
    pub text: String,
}

/// Result of splitting a whole file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedFile {
    pub header: Vec<String>,
    pub records: Vec<RecordBlock>,
    pub footer: Vec<String>,
}

/// Split text into lines that keep their terminators.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

struct Scan<'a> {
    prefix: Vec<&'a str>,
    records: Vec<RecordBlock>,
    suffix: Vec<&'a str>,
}

/// Single pass over `lines`, pairing record delimiters strictly.
fn scan<'a>(lines: &[&'a str], layout: &RecordLayout, first_line: usize) -> Result<Scan<'a>> {
    let mut prefix: Option<Vec<&'a str>> = None;
    let mut pending: Vec<&'a str> = Vec::new();
    let mut open: Option<(usize, Vec<&'a str>)> = None;
    let mut records = Vec::new();

    for (offset, line) in lines.iter().copied().enumerate() {
        let line_no = first_line + offset;
        match open.as_mut() {
            Some((opened_at, body)) => {
                if layout.opens_record(line) {
                    return Err(DeltaError::UnbalancedDelimiter {
                        line: line_no,
                        reason: format!(
                            "record opened at line {} is not closed before the next opener",
                            opened_at
                        ),
                    });
                }
                body.push(line);
                if layout.closes_record(line) {
                    let opened_at = *opened_at;
                    let mut text: String = pending.drain(..).collect();
                    text.extend(body.iter().copied());
                    records.push(RecordBlock {
                        seq: records.len() + 1,
                        line: opened_at,
                        text,
                    });
                    open = None;
                }
            }
            None => {
                if layout.opens_record(line) {
                    if prefix.is_none() {
                        prefix = Some(std::mem::take(&mut pending));
                    }
                    open = Some((line_no, vec![line]));
                } else if layout.closes_record(line) {
                    return Err(DeltaError::UnbalancedDelimiter {
                        line: line_no,
                        reason: "closing delimiter without an open record".to_string(),
                    });
                } else {
                    pending.push(line);
                }
            }
        }
    }

    if let Some((opened_at, _)) = open {
        return Err(DeltaError::UnbalancedDelimiter {
            line: opened_at,
            reason: "record is not closed before end of input".to_string(),
        });
    }

    Ok(match prefix {
        Some(prefix) => Scan {
            prefix,
            records,
            suffix: pending,
        },
        // No records: everything is header.
        None => Scan {
            prefix: pending,
            records,
            suffix: Vec::new(),
        },
    })
}

/// Split a whole file into header, record blocks and footer.
///
/// # Errors
///
/// Returns `DeltaError::UnbalancedDelimiter` with the offending line when a
/// record is left open, nested, or closed without being opened.
pub fn split_blocks(text: &str, layout: &RecordLayout) -> Result<ParsedFile> {
    let started = Instant::now();
    log_op_start!("parse");

    let lines = split_lines(text);
    match scan(&lines, layout, 1) {
        Ok(scan) => {
            let parsed = ParsedFile {
                header: scan.prefix.into_iter().map(str::to_string).collect(),
                records: scan.records,
                footer: scan.suffix.into_iter().map(str::to_string).collect(),
            };
            log_op_end!(
                "parse",
                duration_ms = started.elapsed().as_millis() as u64,
                { FIELD_RECORD_COUNT } = parsed.records.len()
            );
            Ok(parsed)
        }
        Err(err) => {
            log_op_error!(
                "parse",
                err.clone(),
                duration_ms = started.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}

/// Split one stored aggregate block back into its records.
///
/// Text before the first opener stays with the first record and text after
/// the last closer stays with the last one, so the blocks concatenate back
/// to `block`.
///
/// # Errors
///
/// Returns `DeltaError::UnbalancedDelimiter` if the block's delimiters do not
/// pair up.
pub fn split_records(
    block: &str,
    layout: &RecordLayout,
    first_line: usize,
) -> Result<Vec<RecordBlock>> {
    let lines = split_lines(block);
    let scan = scan(&lines, layout, first_line)?;
    let mut records = scan.records;

    if let Some(first) = records.first_mut() {
        let mut text: String = scan.prefix.concat();
        text.push_str(&first.text);
        first.text = text;
    }
    if let Some(last) = records.last_mut() {
        last.text.push_str(&scan.suffix.concat());
    }
    Ok(records)
}
