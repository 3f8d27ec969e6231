//! Text-family source over delimited files

use super::{clamp_range, Row, RowStream, RowVisitor, SourceKind, SourceOptions, TabularSource};
use crate::error::{InspectError, Result};
use crate::schema::{Column, ColumnType, Schema};
use crate::value::Value;
use csv::{ByteRecord, Reader, ReaderBuilder};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Delimited text file with byte offsets of every data record
#[derive(Debug)]
pub struct CsvSource {
    path: PathBuf,
    schema: Schema,
    delimiter: u8,
    /// Byte offset where each data record starts
    offsets: Vec<u64>,
    /// Byte offset just past the last record
    data_end: u64,
}

impl CsvSource {
    /// Open a delimited file, reading it once to find the header and record offsets
    pub fn open(path: &Path, options: &SourceOptions) -> Result<Self> {
        let delimiter = resolve_delimiter(path, options.delimiter);
        let mut reader = build_reader(open_file(path)?, delimiter);

        let mut record = ByteRecord::new();
        let mut header: Option<ByteRecord> = None;
        let mut first_width: Option<usize> = None;
        let mut offsets = Vec::new();

        while reader
            .read_byte_record(&mut record)
            .map_err(|e| InspectError::unreadable(path, e.to_string()))?
        {
            if options.has_header && header.is_none() {
                header = Some(record.clone());
                continue;
            }
            let start = record
                .position()
                .map(|p| p.byte())
                .ok_or_else(|| InspectError::unreadable(path, "Record without position"))?;
            first_width.get_or_insert(record.len());
            offsets.push(start);
        }
        let data_end = reader.position().byte();

        let schema = match header {
            Some(header) => schema_from_header(path, &header)?,
            None => Schema::positional(first_width.unwrap_or(0)),
        };

        debug!(
            "Opened text source {} ({} columns, {} rows)",
            path.display(),
            schema.width(),
            offsets.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            delimiter,
            offsets,
            data_end,
        })
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn end_offset(&self, index: usize) -> u64 {
        self.offsets.get(index).copied().unwrap_or(self.data_end)
    }

    fn decode_row(&self, number: usize, record: &ByteRecord) -> Result<Row> {
        let mut values = Vec::with_capacity(record.len());
        for (idx, field) in record.iter().enumerate() {
            let text = std::str::from_utf8(field).map_err(|e| {
                InspectError::row_parse_with_fields(
                    &self.path,
                    number,
                    record.len(),
                    format!("field {} is not valid UTF-8: {}", idx + 1, e),
                )
            })?;
            values.push(Value::infer(text));
        }
        Ok(Row::new(number, values))
    }
}

impl TabularSource for CsvSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Text
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn row_count(&self) -> usize {
        self.offsets.len()
    }

    fn scan(&self, start: usize, end: usize, visit: &mut RowVisitor<'_>) -> Result<()> {
        let (start, end) = clamp_range(start, end, self.row_count());
        if start == end {
            return Ok(());
        }

        let mut file = open_file(&self.path)?;
        file.seek(SeekFrom::Start(self.offsets[start]))?;
        let mut reader = build_reader(file, self.delimiter);
        let mut record = ByteRecord::new();

        for index in start..end {
            let number = index + 1;
            let more = reader
                .read_byte_record(&mut record)
                .map_err(|e| InspectError::unreadable(&self.path, e.to_string()))?;
            if !more {
                return Err(InspectError::unreadable(
                    &self.path,
                    format!("File ended before row {}", number),
                ));
            }
            visit(self.decode_row(number, &record))?;
        }
        Ok(())
    }

    fn stream(&self) -> Result<RowStream<'_>> {
        let mut file = open_file(&self.path)?;
        if let Some(&first) = self.offsets.first() {
            file.seek(SeekFrom::Start(first))?;
        }
        let records = build_reader(file, self.delimiter).into_byte_records();
        Ok(Box::new(
            records
                .take(self.row_count())
                .enumerate()
                .map(move |(index, record)| {
                    let record =
                        record.map_err(|e| InspectError::unreadable(&self.path, e.to_string()))?;
                    self.decode_row(index + 1, &record)
                }),
        ))
    }

    fn raw_lines(&self, start: usize, end: usize) -> Result<Option<Vec<String>>> {
        let (start, end) = clamp_range(start, end, self.row_count());
        if start == end {
            return Ok(Some(Vec::new()));
        }

        let first = self.offsets[start];
        let last = self.end_offset(end);
        let mut file = open_file(&self.path)?;
        file.seek(SeekFrom::Start(first))?;
        let mut buffer = Vec::with_capacity((last - first) as usize);
        file.take(last - first).read_to_end(&mut buffer)?;

        let lines = (start..end)
            .map(|index| {
                let from = (self.offsets[index] - first) as usize;
                let to = ((self.end_offset(index + 1) - first) as usize).min(buffer.len());
                // Record positions include any blank lines skipped before the record
                String::from_utf8_lossy(&buffer[from..to])
                    .trim_start_matches(['\r', '\n'])
                    .trim_end_matches(['\r', '\n'])
                    .to_string()
            })
            .collect();
        Ok(Some(lines))
    }

    fn has_raw_lines(&self) -> bool {
        true
    }
}

/// Extension-based delimiter: `.tsv` is tab separated, everything else comma
pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

fn open_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => InspectError::not_found(path),
        _ => InspectError::Io(e),
    })?;
    Ok(BufReader::new(file))
}

// Rows of differing width are data to audit, not parse failures
fn build_reader<R: Read>(reader: R, delimiter: u8) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(reader)
}

fn schema_from_header(path: &Path, header: &ByteRecord) -> Result<Schema> {
    let mut names = Vec::with_capacity(header.len());
    for (idx, field) in header.iter().enumerate() {
        let mut name = std::str::from_utf8(field)
            .map_err(|e| {
                InspectError::unreadable(path, format!("header field {} is not UTF-8: {}", idx + 1, e))
            })?
            .to_string();
        if idx == 0 {
            name = name.trim_start_matches('\u{feff}').to_string();
        }
        names.push(name);
    }

    // Repeated names get the next numeric suffix not already taken by any header field
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let unique = if seen.insert(name.clone()) {
            name
        } else {
            let next = suffixes.entry(name.clone()).or_insert(0);
            loop {
                *next += 1;
                let candidate = format!("{}.{}", name, next);
                if !taken.contains(&candidate) {
                    break candidate;
                }
            }
        };
        taken.insert(unique.clone());
        seen.insert(unique.clone());
        columns.push(Column::new(unique, ColumnType::Unknown));
    }
    Ok(Schema::new(columns))
}
