//! Column and schema descriptions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type tag of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
    Temporal,
    /// Untyped text sources never declare a type
    Unknown,
}

impl ColumnType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Boolean => "boolean",
            ColumnType::Temporal => "temporal",
            ColumnType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub declared_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, declared_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            declared_type,
        }
    }
}

/// Ordered columns of a source; order matters for comparison and duplicate keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Schema for a header-less text source: `column_1..column_n`
    pub fn positional(width: usize) -> Self {
        Self::new(
            (1..=width)
                .map(|i| Column::new(format!("column_{}", i), ColumnType::Unknown))
                .collect(),
        )
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Name used when presenting field `index` of a row, including fields past the schema
    pub fn field_name(&self, index: usize) -> String {
        match self.columns.get(index) {
            Some(column) => column.name.clone(),
            None => format!("_extra_{}", index + 1 - self.width()),
        }
    }
}
