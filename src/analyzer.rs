//! Structural consistency analysis
//!
//! One streaming pass over a source producing field-count statistics,
//! malformed and sparse row numbers and, for typed sources, null percentages.
//! What counts as malformed depends on the source family:
//!
//! - text: a row whose parsed field count differs from the first audited row
//! - typed: a row whose non-null field count differs from the schema width

use crate::duplicates::{DuplicateAccumulator, DuplicateGroup};
use crate::error::Result;
use crate::progress::{ProgressObserver, ProgressTicker};
use crate::source::{Row, SourceKind, TabularSource};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rows with fewer than this share of populated fields are sparse
pub const SPARSE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Leave source row 1 out of the audit
    pub skip_header: bool,
    /// Keep the values of malformed rows in the report
    pub capture_malformed_data: bool,
    /// Also group duplicate keys over this many leading columns
    pub duplicate_key_width: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub source_kind: SourceKind,
    pub schema_width: usize,
    /// Rows visited, including undecodable ones
    pub rows_scanned: usize,
    /// Field count every text row is held to; `None` for typed sources
    pub expected_field_count: Option<usize>,
    /// Observed field count -> number of rows, ascending by field count
    pub field_count_histogram: BTreeMap<usize, usize>,
    pub malformed_row_numbers: Vec<usize>,
    pub sparse_row_numbers: Vec<usize>,
    /// Column -> fraction of null cells; typed sources only
    pub null_percentage_per_column: Option<IndexMap<String, f64>>,
    /// Rows that could not be decoded (also listed as malformed)
    pub unparseable_rows: usize,
    pub malformed_rows: Vec<Row>,
    pub duplicates: Option<Vec<DuplicateGroup>>,
}

impl AnalysisReport {
    pub fn is_consistent(&self) -> bool {
        self.malformed_row_numbers.is_empty()
    }
}

/// Per-row bookkeeping shared by both source families
struct StructureAccumulator {
    kind: SourceKind,
    schema_width: usize,
    capture_malformed_data: bool,
    rows_scanned: usize,
    expected_field_count: Option<usize>,
    histogram: BTreeMap<usize, usize>,
    malformed: Vec<usize>,
    sparse: Vec<usize>,
    null_counts: Vec<usize>,
    decoded_rows: usize,
    unparseable: usize,
    malformed_rows: Vec<Row>,
}

impl StructureAccumulator {
    fn new(kind: SourceKind, schema_width: usize, capture_malformed_data: bool) -> Self {
        Self {
            kind,
            schema_width,
            capture_malformed_data,
            rows_scanned: 0,
            expected_field_count: None,
            histogram: BTreeMap::new(),
            malformed: Vec::new(),
            sparse: Vec::new(),
            null_counts: vec![0; schema_width],
            decoded_rows: 0,
            unparseable: 0,
            malformed_rows: Vec::new(),
        }
    }

    fn ingest(&mut self, row: &Row) {
        self.rows_scanned += 1;
        self.decoded_rows += 1;

        let observed = match self.kind {
            SourceKind::Text => row.field_count(),
            SourceKind::Typed => row.non_null_count(),
        };
        *self.histogram.entry(observed).or_insert(0) += 1;

        let malformed = match self.kind {
            SourceKind::Text => {
                let expected = *self.expected_field_count.get_or_insert(observed);
                observed != expected
            }
            SourceKind::Typed => {
                for (idx, value) in row.values.iter().enumerate().take(self.schema_width) {
                    if value.is_null() {
                        self.null_counts[idx] += 1;
                    }
                }
                observed != self.schema_width
            }
        };
        if malformed {
            self.malformed.push(row.number);
            if self.capture_malformed_data {
                self.malformed_rows.push(row.clone());
            }
        }

        if (observed as f64) < self.schema_width as f64 * SPARSE_THRESHOLD {
            self.sparse.push(row.number);
        }
    }

    /// An undecodable row is always malformed. It still lands in the histogram,
    /// under its raw field count when the format split it, otherwise under zero.
    fn ingest_unparseable(&mut self, number: usize, field_count: Option<usize>) {
        self.rows_scanned += 1;
        self.unparseable += 1;
        let observed = field_count.unwrap_or(0);
        *self.histogram.entry(observed).or_insert(0) += 1;
        if let (SourceKind::Text, Some(fields)) = (self.kind, field_count) {
            self.expected_field_count.get_or_insert(fields);
        }
        self.malformed.push(number);
    }

    fn finish(self, column_names: &[&str], duplicates: Option<Vec<DuplicateGroup>>) -> AnalysisReport {
        let null_percentage_per_column = match self.kind {
            SourceKind::Text => None,
            SourceKind::Typed => Some(
                column_names
                    .iter()
                    .zip(&self.null_counts)
                    .map(|(name, nulls)| {
                        let fraction = if self.decoded_rows == 0 {
                            0.0
                        } else {
                            *nulls as f64 / self.decoded_rows as f64
                        };
                        (name.to_string(), fraction)
                    })
                    .collect(),
            ),
        };

        AnalysisReport {
            source_kind: self.kind,
            schema_width: self.schema_width,
            rows_scanned: self.rows_scanned,
            expected_field_count: self.expected_field_count,
            field_count_histogram: self.histogram,
            malformed_row_numbers: self.malformed,
            sparse_row_numbers: self.sparse,
            null_percentage_per_column,
            unparseable_rows: self.unparseable,
            malformed_rows: self.malformed_rows,
            duplicates,
        }
    }
}

/// Audit every row of `source` once
pub fn analyze(
    source: &dyn TabularSource,
    options: &AnalyzeOptions,
    progress: &mut dyn ProgressObserver,
) -> Result<AnalysisReport> {
    let schema = source.schema();
    let row_count = source.row_count();
    info!(
        "Analysing {} ({} source, {} columns, {} rows)",
        source.path().display(),
        source.kind(),
        schema.width(),
        row_count
    );

    let mut structure =
        StructureAccumulator::new(source.kind(), schema.width(), options.capture_malformed_data);
    let mut duplicates = options
        .duplicate_key_width
        .map(|width| DuplicateAccumulator::new(width, schema.width()))
        .transpose()?;

    let start = usize::from(options.skip_header);
    let mut ticker = ProgressTicker::new(progress, row_count);
    source.scan(start, row_count, &mut |row| {
        match row {
            Ok(row) => {
                structure.ingest(&row);
                if let Some(acc) = duplicates.as_mut() {
                    acc.ingest(&row);
                }
                ticker.tick(row.number);
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping malformed row: {}", e);
                if let Some(number) = e.row_number() {
                    structure.ingest_unparseable(number, e.field_count());
                    ticker.tick(number);
                }
            }
            Err(e) => return Err(e),
        }
        Ok(())
    })?;
    ticker.finish("Analysis complete");

    let report = structure.finish(&schema.column_names(), duplicates.map(|d| d.finish()));
    debug!(
        "Analysis of {} found {} malformed and {} sparse row(s)",
        source.path().display(),
        report.malformed_row_numbers.len(),
        report.sparse_row_numbers.len()
    );
    Ok(report)
}
