//! Row decoder: turns an uploaded CSV stream into numbered raw rows.
//!
//! The header is checked once, up front. After that every record yields
//! exactly one [`DecodedRow`], and a bad record never stops the ones after
//! it. The only exception is an unreadable stream, which ends decoding
//! after reporting the row it broke on.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::RecordSchema;

const UTF8_BOM: &str = "\u{feff}";

/// A problem with the file as a whole. No row can be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input has no header row.
    #[error("File is empty or has no header row")]
    MissingHeader,
    /// The header row could not be read.
    #[error("Header row is unreadable: {0}")]
    UnreadableHeader(String),
    /// A recognised column appears twice.
    #[error("Column '{0}' appears more than once in the header")]
    DuplicateColumn(String),
    /// Required columns are absent.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// A problem confined to one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    /// The record's cell count differs from the header's.
    #[error("Expected {expected} columns but found {found}")]
    WrongColumnCount {
        /// Header width.
        expected: usize,
        /// Record width.
        found: usize,
    },
    /// A cell is not valid UTF-8.
    #[error("Column '{column}' is not valid UTF-8")]
    MalformedEncoding {
        /// Header of the offending cell.
        column: String,
    },
    /// The stream failed mid-record.
    #[error("Row could not be read: {0}")]
    Unreadable(String),
}

/// A record whose shape matched the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based data line position, header excluded.
    pub row_number: u32,
    fields: BTreeMap<&'static str, String>,
    snapshot: Map<String, Value>,
}

impl RawRow {
    /// Trimmed value of a recognised column, `None` when blank.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Whether every recognised cell is blank.
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(|v| v.trim().is_empty())
    }

    /// Every cell of the record keyed by header, as read.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.snapshot.clone())
    }
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRow {
    /// A well-formed record.
    Record(RawRow),
    /// An empty line between records.
    Empty {
        /// 1-based data line position.
        row_number: u32,
    },
    /// A record that could not be decoded.
    Malformed {
        /// 1-based data line position.
        row_number: u32,
        /// What was wrong.
        error: RowError,
        /// Whatever cells could be recovered, lossily decoded.
        snapshot: Value,
    },
}

impl DecodedRow {
    /// 1-based data line position.
    pub fn row_number(&self) -> u32 {
        match self {
            Self::Record(row) => row.row_number,
            Self::Empty { row_number } | Self::Malformed { row_number, .. } => *row_number,
        }
    }
}

/// Source wrapper remembering the last byte handed to the CSV reader.
#[derive(Debug)]
struct TailTracker<R> {
    inner: R,
    last_byte: Option<u8>,
}

impl<R: Read> Read for TailTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.last_byte = Some(buf[n - 1]);
        }
        Ok(n)
    }
}

impl<R> TailTracker<R> {
    fn ends_with_terminator(&self) -> bool {
        matches!(self.last_byte, Some(b'\n' | b'\r'))
    }
}

/// One raw read from the CSV reader.
enum Fetched {
    /// A record and the number of source lines consumed to read it.
    Record(csv::ByteRecord, u64),
    Failed(csv::Error),
    End,
}

/// Lazy, single-pass decoder over a CSV source.
///
/// Rows are numbered by data line. The CSV reader drops empty lines, so the
/// decoder recovers them from the reader's line counter and reports each
/// one as [`DecodedRow::Empty`]. Empty lines after the last record are not
/// rows.
pub struct RowDecoder<R: Read> {
    reader: csv::Reader<TailTracker<R>>,
    headers: Vec<String>,
    recognised: Vec<(usize, &'static str)>,
    row_number: u32,
    line: u64,
    empty_lines: u64,
    ready: Option<csv::ByteRecord>,
    upcoming: Option<Fetched>,
    exhausted: bool,
}

impl<R: Read> std::fmt::Debug for RowDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowDecoder")
            .field("headers", &self.headers)
            .field("row_number", &self.row_number)
            .finish_non_exhaustive()
    }
}

impl<R: Read> RowDecoder<R> {
    /// Read and check the header row.
    ///
    /// Header matching is exact and case-sensitive. Unrecognised columns are
    /// kept in row snapshots but otherwise ignored.
    pub fn new(source: R, schema: &'static RecordSchema) -> Result<Self, DecodeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(TailTracker {
                inner: source,
                last_byte: None,
            });

        let raw_headers = reader
            .byte_headers()
            .map_err(|e| DecodeError::UnreadableHeader(e.to_string()))?
            .clone();
        if raw_headers.is_empty() {
            return Err(DecodeError::MissingHeader);
        }

        let mut headers = Vec::with_capacity(raw_headers.len());
        for (index, cell) in raw_headers.iter().enumerate() {
            let text = std::str::from_utf8(cell).map_err(|_| {
                DecodeError::UnreadableHeader(format!("column {} is not valid UTF-8", index + 1))
            })?;
            let text = if index == 0 {
                text.strip_prefix(UTF8_BOM).unwrap_or(text)
            } else {
                text
            };
            headers.push(text.to_string());
        }

        let mut recognised = Vec::new();
        let mut seen = HashSet::new();
        for (index, header) in headers.iter().enumerate() {
            if let Some(column) = schema.column(header) {
                if !seen.insert(column.name) {
                    return Err(DecodeError::DuplicateColumn(column.name.to_string()));
                }
                recognised.push((index, column.name));
            }
        }

        let missing: Vec<String> = schema
            .required()
            .filter(|name| !seen.contains(name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(DecodeError::MissingColumns(missing));
        }

        let line = reader.position().line();
        Ok(Self {
            reader,
            headers,
            recognised,
            row_number: 0,
            line,
            empty_lines: 0,
            ready: None,
            upcoming: None,
            exhausted: false,
        })
    }

    /// Header cells as read, BOM removed.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn fetch(&mut self) -> Fetched {
        let mut record = csv::ByteRecord::new();
        match self.reader.read_byte_record(&mut record) {
            Ok(true) => {
                let line = self.reader.position().line();
                let consumed = line.saturating_sub(self.line);
                self.line = line;
                Fetched::Record(record, consumed)
            }
            Ok(false) => Fetched::End,
            Err(e) => Fetched::Failed(e),
        }
    }

    /// Empty lines skipped by the reader just before `record`.
    ///
    /// `consumed` counts the skipped lines, newlines quoted inside the
    /// record, and the record's own terminator. Only the last record of the
    /// file can lack a terminator.
    fn empty_lines_before(&self, record: &csv::ByteRecord, consumed: u64, is_last: bool) -> u64 {
        let quoted_newlines: u64 = record
            .iter()
            .map(|cell| cell.iter().filter(|&&b| b == b'\n').count() as u64)
            .sum();
        let terminated = !is_last || self.reader.get_ref().ends_with_terminator();
        consumed.saturating_sub(quoted_newlines + u64::from(terminated))
    }

    fn lossy_snapshot(&self, record: &csv::ByteRecord) -> Value {
        let mut snapshot = Map::new();
        for (index, cell) in record.iter().enumerate() {
            let key = self
                .headers
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("column {}", index + 1));
            snapshot.insert(key, Value::String(String::from_utf8_lossy(cell).into_owned()));
        }
        Value::Object(snapshot)
    }

    fn decode_record(&self, record: &csv::ByteRecord) -> DecodedRow {
        let row_number = self.row_number;
        if record.len() != self.headers.len() {
            return DecodedRow::Malformed {
                row_number,
                error: RowError::WrongColumnCount {
                    expected: self.headers.len(),
                    found: record.len(),
                },
                snapshot: self.lossy_snapshot(record),
            };
        }

        let mut cells = Vec::with_capacity(record.len());
        for (index, cell) in record.iter().enumerate() {
            match std::str::from_utf8(cell) {
                Ok(text) => cells.push(text),
                Err(_) => {
                    return DecodedRow::Malformed {
                        row_number,
                        error: RowError::MalformedEncoding {
                            column: self.headers[index].clone(),
                        },
                        snapshot: self.lossy_snapshot(record),
                    };
                }
            }
        }

        let fields = self
            .recognised
            .iter()
            .map(|&(index, name)| (name, cells[index].to_string()))
            .collect();
        let snapshot = self
            .headers
            .iter()
            .zip(&cells)
            .map(|(header, cell)| (header.clone(), Value::String(cell.to_string())))
            .collect();

        DecodedRow::Record(RawRow {
            row_number,
            fields,
            snapshot,
        })
    }
}

impl<R: Read> Iterator for RowDecoder<R> {
    type Item = DecodedRow;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.empty_lines > 0 {
                self.empty_lines -= 1;
                self.row_number += 1;
                return Some(DecodedRow::Empty {
                    row_number: self.row_number,
                });
            }
            if let Some(record) = self.ready.take() {
                self.row_number += 1;
                return Some(self.decode_record(&record));
            }
            if self.exhausted {
                return None;
            }

            let fetched = match self.upcoming.take() {
                Some(fetched) => fetched,
                None => self.fetch(),
            };
            match fetched {
                Fetched::End => {
                    self.exhausted = true;
                    return None;
                }
                Fetched::Failed(e) => {
                    self.row_number += 1;
                    self.exhausted = true;
                    return Some(DecodedRow::Malformed {
                        row_number: self.row_number,
                        error: RowError::Unreadable(e.to_string()),
                        snapshot: Value::Object(Map::new()),
                    });
                }
                Fetched::Record(record, consumed) => {
                    // Look one read ahead to learn whether this record ends the file.
                    let after = self.fetch();
                    let is_last = matches!(after, Fetched::End);
                    self.empty_lines = self.empty_lines_before(&record, consumed, is_last);
                    self.upcoming = Some(after);
                    self.ready = Some(record);
                }
            }
        }
    }
}
