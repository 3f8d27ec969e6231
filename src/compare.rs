//! Schema, shape and data equality between two sources

use crate::error::Result;
use crate::schema::{Column, ColumnType, Schema};
use crate::source::{Row, RowStream, TabularSource};
use crate::value::{Tolerance, Value};
use crate::DEFAULT_BATCH_SIZE;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub check_schema: bool,
    pub check_data: bool,
    /// Numeric cells compare under `tolerance` instead of exactly
    pub fuzzy: bool,
    pub tolerance: Tolerance,
    /// Rows read from each side per slice
    pub batch_size: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            check_schema: true,
            check_data: true,
            fuzzy: true,
            tolerance: Tolerance::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// One position where the two schemas disagree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMismatch {
    /// 1-based column position
    pub index: usize,
    pub expected_name: Option<String>,
    pub expected_type: Option<ColumnType>,
    pub actual_name: Option<String>,
    pub actual_type: Option<ColumnType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub schema_checked: bool,
    pub schema_match: bool,
    pub field_mismatches: Vec<FieldMismatch>,
    pub shape_match: bool,
    pub expected_shape: Shape,
    pub actual_shape: Shape,
    /// False when data checking was disabled or skipped over a shape mismatch
    pub data_checked: bool,
    pub data_match: bool,
    /// Column -> number of differing rows, only for columns that differ
    pub column_diff_counts: IndexMap<String, usize>,
}

impl ComparisonResult {
    pub fn identical(&self) -> bool {
        (!self.schema_checked || self.schema_match)
            && self.shape_match
            && (!self.data_checked || self.data_match)
    }
}

/// Compare `expected` against `actual`
pub fn compare(
    expected: &dyn TabularSource,
    actual: &dyn TabularSource,
    options: &CompareOptions,
) -> Result<ComparisonResult> {
    info!(
        "Comparing '{}' and '{}'",
        expected.path().display(),
        actual.path().display()
    );

    let field_mismatches = if options.check_schema {
        compare_schemas(expected.schema(), actual.schema())
    } else {
        Vec::new()
    };

    let expected_shape = shape_of(expected);
    let actual_shape = shape_of(actual);
    let shape_match = expected_shape == actual_shape;

    let mut result = ComparisonResult {
        schema_checked: options.check_schema,
        schema_match: field_mismatches.is_empty(),
        field_mismatches,
        shape_match,
        expected_shape,
        actual_shape,
        data_checked: false,
        data_match: false,
        column_diff_counts: IndexMap::new(),
    };

    if !shape_match {
        debug!(
            "Shape mismatch: {:?} vs {:?}, skipping data comparison",
            expected_shape, actual_shape
        );
        return Ok(result);
    }

    if options.check_data {
        let diffs = compare_data(expected, actual, options)?;
        result.data_checked = true;
        result.data_match = diffs.is_empty();
        result.column_diff_counts = diffs;
    }
    Ok(result)
}

fn shape_of(source: &dyn TabularSource) -> Shape {
    Shape {
        rows: source.row_count(),
        columns: source.schema().width(),
    }
}

/// Every position where name or declared type differ, or only one side has a column
pub fn compare_schemas(expected: &Schema, actual: &Schema) -> Vec<FieldMismatch> {
    let width = expected.width().max(actual.width());
    (0..width)
        .filter_map(|i| {
            let left = expected.columns.get(i);
            let right = actual.columns.get(i);
            let same = matches!((left, right), (Some(l), Some(r)) if l == r);
            if same {
                return None;
            }
            Some(FieldMismatch {
                index: i + 1,
                expected_name: left.map(|c| c.name.clone()),
                expected_type: left.map(|c| c.declared_type),
                actual_name: right.map(|c| c.name.clone()),
                actual_type: right.map(|c| c.declared_type),
            })
        })
        .collect()
}

/// A column is compared with tolerance unless either side declares a non-numeric type
fn numeric_candidate(left: &Column, right: &Column) -> bool {
    let candidate = |t: ColumnType| t.is_numeric() || t == ColumnType::Unknown;
    candidate(left.declared_type) && candidate(right.declared_type)
}

/// Pull up to `limit` rows keeping row alignment; undecodable rows become `None`
fn read_batch(rows: &mut RowStream<'_>, limit: usize) -> Result<Vec<Option<Row>>> {
    let mut batch = Vec::with_capacity(limit);
    for item in rows.take(limit) {
        match item {
            Ok(row) => batch.push(Some(row)),
            Err(e) if e.is_recoverable() => {
                warn!("Row treated as different: {}", e);
                batch.push(None);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(batch)
}

fn compare_data(
    expected: &dyn TabularSource,
    actual: &dyn TabularSource,
    options: &CompareOptions,
) -> Result<IndexMap<String, usize>> {
    let schema = expected.schema();
    let width = schema.width();
    let fuzzy_columns: Vec<bool> = schema
        .columns
        .iter()
        .zip(&actual.schema().columns)
        .map(|(l, r)| options.fuzzy && numeric_candidate(l, r))
        .collect();

    // Grows past the schema width when text rows carry extra fields
    let mut counts = vec![0usize; width];
    let row_count = expected.row_count();
    let batch_size = options.batch_size.max(1);

    let mut left_rows = expected.stream()?;
    let mut right_rows = actual.stream()?;
    let mut compared = 0;
    while compared < row_count {
        let left = read_batch(&mut left_rows, batch_size)?;
        let right = read_batch(&mut right_rows, batch_size)?;
        if left.is_empty() && right.is_empty() {
            break;
        }

        for (l, r) in left.iter().zip(right.iter()) {
            match (l, r) {
                (Some(l), Some(r)) => {
                    let fields = width.max(l.field_count()).max(r.field_count());
                    if counts.len() < fields {
                        counts.resize(fields, 0);
                    }
                    for (col, count) in counts.iter_mut().enumerate().take(fields) {
                        let a = l.get(col).unwrap_or(&Value::Null);
                        let b = r.get(col).unwrap_or(&Value::Null);
                        let fuzzy = fuzzy_columns.get(col).copied().unwrap_or(options.fuzzy);
                        let equal = if fuzzy {
                            a.fuzzy_eq(b, options.tolerance)
                        } else {
                            a.exact_eq(b)
                        };
                        if !equal {
                            *count += 1;
                        }
                    }
                }
                _ => counts.iter_mut().take(width).for_each(|c| *c += 1),
            }
        }
        // A side that runs short counts as different in every column
        let unmatched = left.len().abs_diff(right.len());
        counts
            .iter_mut()
            .take(width)
            .for_each(|c| *c += unmatched);

        compared += left.len().max(right.len());
        debug!("Compared rows 1..{} of {}", compared, row_count);
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .filter(|(_, count)| *count > 0)
        .map(|(col, count)| (schema.field_name(col), count))
        .collect())
}
