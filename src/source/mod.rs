//! Tabular sources: one read-only capability interface over both file families
//!
//! A source is opened once, computes its schema and row count eagerly and
//! materialises rows only on request. Row numbers are 1-based everywhere a row
//! is reported; range arguments (`start`, `end`) are 0-based and half-open.

pub mod csv_source;
pub mod parquet_source;

use crate::error::{InspectError, Result};
use crate::schema::Schema;
use crate::value::Value;
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use csv_source::CsvSource;
pub use parquet_source::ParquetSource;

/// Which family a source belongs to; structural anomalies are defined per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Row-oriented text with no enforced schema
    Text,
    /// Column-oriented file with an enforced, typed schema
    Typed,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Text => f.write_str("text"),
            SourceKind::Typed => f.write_str("typed"),
        }
    }
}

/// A materialised row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// 1-based position within the source
    pub number: usize,
    /// Parsed fields; text rows may be shorter or longer than the schema
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(number: usize, values: Vec<Value>) -> Self {
        Self { number, values }
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
    }

    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Ordered column -> value mapping; columns the row does not reach are null
    pub fn to_map(&self, schema: &Schema) -> IndexMap<String, Value> {
        let width = schema.width().max(self.values.len());
        (0..width)
            .map(|i| {
                (
                    schema.field_name(i),
                    self.values.get(i).cloned().unwrap_or(Value::Null),
                )
            })
            .collect()
    }

    /// `{name: value, ...}` rendering used when no raw line is available
    pub fn render(&self, schema: &Schema) -> String {
        let fields = self
            .to_map(schema)
            .into_iter()
            .map(|(name, value)| match value {
                Value::Text(s) => format!("'{}': '{}'", name, s),
                other => format!("'{}': {}", name, other),
            })
            .collect::<Vec<_>>();
        format!("{{{}}}", fields.join(", "))
    }
}

/// Callback receiving each row of a scan. `Err` values handed to the visitor are
/// recoverable row failures; an `Err` returned by the visitor aborts the scan.
pub type RowVisitor<'a> = dyn FnMut(Result<Row>) -> Result<()> + 'a;

/// Rows of a source in order, decoded on demand
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// Read-only adapter over one physical file
pub trait TabularSource {
    fn path(&self) -> &Path;

    fn kind(&self) -> SourceKind;

    fn schema(&self) -> &Schema;

    fn row_count(&self) -> usize;

    /// Visit rows `[start, end)` in order; `end` is clamped to the row count.
    fn scan(&self, start: usize, end: usize, visit: &mut RowVisitor<'_>) -> Result<()>;

    /// Unparsed text of rows `[start, end)`, or `None` for formats without raw lines
    fn raw_lines(&self, _start: usize, _end: usize) -> Result<Option<Vec<String>>> {
        Ok(None)
    }

    fn has_raw_lines(&self) -> bool {
        false
    }

    /// Unparsed text of the row at 0-based `index`
    fn raw_line(&self, index: usize) -> Result<Option<String>> {
        if index >= self.row_count() {
            return Err(InspectError::invalid_input(format!(
                "Row {} is out of range for '{}' ({} rows)",
                index + 1,
                self.path().display(),
                self.row_count()
            )));
        }
        Ok(self
            .raw_lines(index, index + 1)?
            .and_then(|lines| lines.into_iter().next()))
    }

    fn scan_all(&self, visit: &mut RowVisitor<'_>) -> Result<()> {
        self.scan(0, self.row_count(), visit)
    }

    /// Every row from the first on, pulled one at a time. Items follow the `scan`
    /// contract: an `Err` that `is_recoverable` stands for one undecodable row.
    ///
    /// The default materialises through `scan_all`; file-backed sources keep a
    /// single reader open instead.
    fn stream(&self) -> Result<RowStream<'_>> {
        let mut items = Vec::with_capacity(self.row_count());
        self.scan_all(&mut |row| {
            match row {
                Err(e) if !e.is_recoverable() => return Err(e),
                item => items.push(item),
            }
            Ok(())
        })?;
        Ok(Box::new(items.into_iter()))
    }

    /// Materialise rows `[start, end)`. Undecodable rows are skipped with a notice.
    fn rows(&self, start: usize, end: usize) -> Result<Vec<Row>> {
        let (start, end) = clamp_range(start, end, self.row_count());
        let mut rows = Vec::with_capacity(end - start);
        self.scan(start, end, &mut |row| {
            match row {
                Ok(row) => rows.push(row),
                Err(e) if e.is_recoverable() => warn!("Skipping row: {}", e),
                Err(e) => return Err(e),
            }
            Ok(())
        })?;
        Ok(rows)
    }
}

/// Clamp a half-open range into `[0, row_count]` with `start <= end`
pub fn clamp_range(start: usize, end: usize, row_count: usize) -> (usize, usize) {
    let end = end.min(row_count);
    (start.min(end), end)
}

/// Options applied when opening a source
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Field delimiter for text sources; defaults by extension
    pub delimiter: Option<u8>,
    /// Whether the first text record names the columns
    pub has_header: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
        }
    }
}

/// Check if a path names a column-oriented typed file
pub fn is_typed_format(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "parquet" | "pq"))
        .unwrap_or(false)
}

/// Open the adapter matching the file's extension
pub fn open_source(path: &Path, options: &SourceOptions) -> Result<Box<dyn TabularSource>> {
    if !path.exists() {
        return Err(InspectError::not_found(path));
    }
    if !path.is_file() {
        return Err(InspectError::invalid_input(format!(
            "Path is not a file: {}",
            path.display()
        )));
    }

    if is_typed_format(path) {
        Ok(Box::new(ParquetSource::open(path)?))
    } else {
        Ok(Box::new(CsvSource::open(path, options)?))
    }
}

/// Basic facts about an opened source
#[derive(Debug, Clone, Serialize)]
pub struct Description {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub schema: Schema,
    pub row_count: usize,
    pub column_count: usize,
}

/// Describe a source: schema, declared types and row count
pub fn describe(source: &dyn TabularSource) -> Description {
    Description {
        path: source.path().to_path_buf(),
        kind: source.kind(),
        schema: source.schema().clone(),
        row_count: source.row_count(),
        column_count: source.schema().width(),
    }
}
