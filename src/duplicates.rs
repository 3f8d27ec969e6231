//! Duplicate-key detection over a leading column prefix

use crate::error::{InspectError, Result};
use crate::progress::{ProgressObserver, ProgressTicker};
use crate::source::{Row, TabularSource};
use crate::value::Value;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

/// Rows sharing the same leading-column key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// Values of the first `key_width` columns, in schema order
    pub key: Vec<Value>,
    /// 1-based row numbers, ascending
    pub rows: Vec<usize>,
}

/// Groups rows by key as they stream past; memory grows with the number of distinct keys
#[derive(Debug)]
pub struct DuplicateAccumulator {
    key_width: usize,
    groups: IndexMap<Vec<Value>, Vec<usize>>,
}

impl DuplicateAccumulator {
    /// `requested` must be at least 1 and is clamped to the schema width
    pub fn new(requested: usize, schema_width: usize) -> Result<Self> {
        if requested == 0 {
            return Err(InspectError::invalid_input(
                "Duplicate key width must be at least 1",
            ));
        }
        Ok(Self {
            key_width: requested.min(schema_width),
            groups: IndexMap::new(),
        })
    }

    pub fn key_width(&self) -> usize {
        self.key_width
    }

    pub fn distinct_keys(&self) -> usize {
        self.groups.len()
    }

    pub fn ingest(&mut self, row: &Row) {
        if self.key_width == 0 {
            return;
        }
        let key: Vec<Value> = (0..self.key_width)
            .map(|i| row.get(i).cloned().unwrap_or(Value::Null))
            .collect();
        self.groups.entry(key).or_default().push(row.number);
    }

    /// Groups with more than one member, in first-seen key order
    pub fn finish(self) -> Vec<DuplicateGroup> {
        self.groups
            .into_iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(key, rows)| DuplicateGroup { key, rows })
            .collect()
    }
}

/// Find rows whose first `key_width` column values coincide
pub fn find_duplicates(
    source: &dyn TabularSource,
    key_width: usize,
    progress: &mut dyn ProgressObserver,
) -> Result<Vec<DuplicateGroup>> {
    let mut accumulator = DuplicateAccumulator::new(key_width, source.schema().width())?;
    debug!(
        "Grouping {} rows of {} on the first {} column(s)",
        source.row_count(),
        source.path().display(),
        accumulator.key_width()
    );

    let mut ticker = ProgressTicker::new(progress, source.row_count());
    source.scan_all(&mut |row| {
        match row {
            Ok(row) => {
                accumulator.ingest(&row);
                ticker.tick(row.number);
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
    ticker.finish("Duplicate scan complete");

    debug!("{} distinct key(s) seen", accumulator.distinct_keys());
    Ok(accumulator.finish())
}
