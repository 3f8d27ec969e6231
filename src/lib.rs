//! # tabinspect
//!
//! Structural inspection of tabular files: row-level consistency analysis,
//! duplicate-key detection, schema/shape/data comparison and row lookup over
//! CSV-like text files and Parquet files behind one source interface.

pub mod analyzer;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod locate;
pub mod output;
pub mod progress;
pub mod schema;
pub mod source;
pub mod value;

pub use analyzer::{analyze, AnalysisReport, AnalyzeOptions};
pub use compare::{compare, CompareOptions, ComparisonResult};
pub use config::InspectConfig;
pub use duplicates::{find_duplicates, DuplicateGroup};
pub use error::{InspectError, Result};
pub use locate::{context, find, find_raw, head, tail, Predicate};
pub use schema::{Column, ColumnType, Schema};
pub use source::{describe, open_source, Row, SourceKind, SourceOptions, TabularSource};
pub use value::{Tolerance, Value};

/// Default number of rows per comparison slice
pub const DEFAULT_BATCH_SIZE: usize = 10000;
