//! Row retrieval: windowed views, context views and search
//!
//! Row numbers are 1-based and inclusive. Undecodable rows are skipped with a
//! notice, never aborting a search.

use crate::error::{InspectError, Result};
use crate::progress::{ProgressObserver, ProgressTicker};
use crate::schema::Schema;
use crate::source::{Row, TabularSource};
use crate::value::Value;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

/// Raw lines read per slice during substring search
const RAW_SEARCH_BATCH: usize = 10_000;

/// First or last `n` rows of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Head(usize),
    Tail(usize),
}

impl Window {
    /// 0-based half-open range covered by the window
    pub fn range(&self, row_count: usize) -> (usize, usize) {
        match *self {
            Window::Head(n) => (0, n.min(row_count)),
            Window::Tail(n) => (row_count - n.min(row_count), row_count),
        }
    }
}

pub fn head(source: &dyn TabularSource, n: usize) -> Result<Vec<Row>> {
    let (start, end) = Window::Head(n).range(source.row_count());
    source.rows(start, end)
}

pub fn tail(source: &dyn TabularSource, n: usize) -> Result<Vec<Row>> {
    let (start, end) = Window::Tail(n).range(source.row_count());
    source.rows(start, end)
}

/// Rows surrounding a target row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextView {
    /// Target row after clamping
    pub center: usize,
    pub first: usize,
    pub last: usize,
    pub rows: Vec<Row>,
}

impl ContextView {
    pub fn is_center(&self, row: &Row) -> bool {
        row.number == self.center
    }

    /// 0-based half-open range covered by the view
    pub fn range(&self) -> (usize, usize) {
        (self.first - 1, self.last)
    }
}

/// Inclusive `(center, first, last)` bounds for a context view, or `None` on an empty source
pub fn context_bounds(row_number: usize, radius: usize, row_count: usize) -> Option<(usize, usize, usize)> {
    if row_count == 0 {
        return None;
    }
    let center = row_number.clamp(1, row_count);
    let first = center.saturating_sub(radius).max(1);
    let last = center.saturating_add(radius).min(row_count);
    Some((center, first, last))
}

pub fn context(source: &dyn TabularSource, row_number: usize, radius: usize) -> Result<ContextView> {
    let (center, first, last) = context_bounds(row_number, radius, source.row_count())
        .ok_or_else(|| {
            InspectError::invalid_input(format!("'{}' has no rows", source.path().display()))
        })?;
    if center != row_number {
        debug!("Row {} clamped to {}", row_number, center);
    }
    Ok(ContextView {
        center,
        first,
        last,
        rows: source.rows(first - 1, last)?,
    })
}

/// Column -> value equality conditions, all of which must hold
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    conditions: IndexMap<String, Value>,
}

impl Predicate {
    pub fn new(conditions: IndexMap<String, Value>) -> Self {
        Self { conditions }
    }

    /// Parse a JSON object of scalar values, e.g. `{"id": 3, "name": "Apple"}`
    pub fn parse(input: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(input)
            .map_err(|e| InspectError::malformed_query(format!("Invalid JSON: {}", e)))?;
        let object = json.as_object().ok_or_else(|| {
            InspectError::malformed_query("Search query must be a JSON object")
        })?;

        let conditions = object
            .iter()
            .map(|(column, value)| {
                Value::from_json(value)
                    .map(|v| (column.clone(), v))
                    .map_err(|e| {
                        InspectError::malformed_query(format!("Column '{}': {}", column, e))
                    })
            })
            .collect::<Result<IndexMap<_, _>>>()?;
        Ok(Self { conditions })
    }

    pub fn conditions(&self) -> &IndexMap<String, Value> {
        &self.conditions
    }

    /// Resolve column names to positions; `None` if any column is absent
    fn resolve(&self, schema: &Schema) -> Option<Vec<(usize, &Value)>> {
        self.conditions
            .iter()
            .map(|(name, value)| schema.column_index(name).map(|idx| (idx, value)))
            .collect()
    }

    pub fn matches(&self, row: &Row, schema: &Schema) -> bool {
        match self.resolve(schema) {
            Some(resolved) => matches_resolved(row, &resolved),
            None => false,
        }
    }
}

fn matches_resolved(row: &Row, resolved: &[(usize, &Value)]) -> bool {
    resolved
        .iter()
        .all(|(idx, expected)| row.get(*idx).unwrap_or(&Value::Null).matches_query(expected))
}

/// Every row satisfying `predicate`, in row order
pub fn find(
    source: &dyn TabularSource,
    predicate: &Predicate,
    progress: &mut dyn ProgressObserver,
) -> Result<Vec<Row>> {
    let Some(resolved) = predicate.resolve(source.schema()) else {
        let missing: Vec<&str> = predicate
            .conditions
            .keys()
            .filter(|name| source.schema().column_index(name).is_none())
            .map(String::as_str)
            .collect();
        warn!("No such column(s) in '{}': {}", source.path().display(), missing.join(", "));
        return Ok(Vec::new());
    };

    let mut matches = Vec::new();
    let mut ticker = ProgressTicker::new(progress, source.row_count());
    source.scan_all(&mut |row| {
        match row {
            Ok(row) => {
                ticker.tick(row.number);
                if matches_resolved(&row, &resolved) {
                    matches.push(row);
                }
            }
            Err(e) if e.is_recoverable() => {
                warn!("Skipping row: {}", e);
                if let Some(number) = e.row_number() {
                    ticker.tick(number);
                }
            }
            Err(e) => return Err(e),
        }
        Ok(())
    })?;
    ticker.finish("Search complete");

    debug!("{} row(s) matched", matches.len());
    Ok(matches)
}

/// An unparsed source line with its 1-based row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLine {
    pub number: usize,
    pub line: String,
}

/// Unparsed lines of rows `[start, end)`, or `None` for formats without raw lines
pub fn raw_window(source: &dyn TabularSource, start: usize, end: usize) -> Result<Option<Vec<RawLine>>> {
    let lines = source.raw_lines(start, end)?;
    Ok(lines.map(|lines| {
        lines
            .into_iter()
            .enumerate()
            .map(|(offset, line)| RawLine {
                number: start + offset + 1,
                line,
            })
            .collect()
    }))
}

/// Every raw line containing `needle` literally
pub fn find_raw(
    source: &dyn TabularSource,
    needle: &str,
    progress: &mut dyn ProgressObserver,
) -> Result<Vec<RawLine>> {
    if !source.has_raw_lines() {
        return Err(InspectError::invalid_input(format!(
            "Raw search needs a text source; '{}' has no raw lines",
            source.path().display()
        )));
    }

    let row_count = source.row_count();
    let mut ticker = ProgressTicker::new(progress, row_count);
    let mut matches = Vec::new();
    let mut start = 0;
    while start < row_count {
        let end = (start + RAW_SEARCH_BATCH).min(row_count);
        let lines = source.raw_lines(start, end)?.unwrap_or_default();
        for (offset, line) in lines.into_iter().enumerate() {
            let number = start + offset + 1;
            ticker.tick(number);
            if line.contains(needle) {
                matches.push(RawLine { number, line });
            }
        }
        start = end;
    }
    ticker.finish("Search complete");
    Ok(matches)
}
