//! Command-line interface for tabinspect

use crate::config::parse_delimiter;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabinspect")]
#[command(about = "Inspect, validate and compare CSV and Parquet files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: "pretty", "json"
    #[arg(long, global = true, default_value = "pretty", value_parser = OutputFormat::parse)]
    pub format: OutputFormat,
}

/// Flags shared by every command that opens a file
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Field delimiter for text files (a single character, or "tab")
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,

    /// Treat the first line of a text file as data, not column names
    #[arg(long)]
    pub no_header: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the schema and row count of a file
    Describe {
        file: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the first rows of a file
    Head {
        file: PathBuf,

        /// Number of rows
        #[arg(short = 'n', long = "rows", default_value = "10")]
        rows: usize,

        /// Print unparsed lines (text files only)
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show the last rows of a file
    Tail {
        file: PathBuf,

        /// Number of rows
        #[arg(short = 'n', long = "rows", default_value = "10")]
        rows: usize,

        /// Print unparsed lines (text files only)
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show a row together with its neighbours
    Row {
        file: PathBuf,

        /// 1-based row number; out-of-range values are clamped
        row: usize,

        /// Rows shown on each side (defaults to the configured radius)
        #[arg(long)]
        context: Option<usize>,

        /// Print unparsed lines (text files only)
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Find rows matching a JSON object of column values, or containing a text
    Find {
        file: PathBuf,

        /// JSON object such as '{"id": 3}'; anything else searches raw lines
        query: String,

        /// Search raw lines for the query text
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Check every row for structural consistency
    Analyze {
        file: PathBuf,

        /// Leave the first row out of the audit
        #[arg(long)]
        skip_header: bool,

        /// Show the values of malformed rows
        #[arg(long)]
        malformed_data: bool,

        /// Also report duplicate keys over the first N columns (0 disables the check)
        #[arg(long, value_name = "N")]
        check_duplicates: Option<usize>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Report rows sharing the same leading-column key
    Duplicates {
        file: PathBuf,

        /// Number of leading columns forming the key (must be > 0)
        #[arg(long, value_parser = validate_key_width)]
        key_width: usize,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Compare two files for schema, shape and data equality
    Compare {
        file: PathBuf,

        other: PathBuf,

        /// Skip the schema check
        #[arg(long)]
        no_schema: bool,

        /// Skip the data check
        #[arg(long)]
        no_data: bool,

        /// Require exact equality for numeric cells
        #[arg(long)]
        exact: bool,

        /// Relative tolerance for numeric cells
        #[arg(long)]
        rel_tol: Option<f64>,

        /// Absolute tolerance for numeric cells
        #[arg(long)]
        abs_tol: Option<f64>,

        /// Rows compared per slice (must be > 0)
        #[arg(long, value_parser = validate_batch_size)]
        batch_size: Option<usize>,

        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Validate that batch size is greater than 0
fn validate_batch_size(s: &str) -> Result<usize, String> {
    let batch_size: usize = s
        .parse()
        .map_err(|_| format!("Invalid batch size: '{}'. Must be a positive integer.", s))?;

    if batch_size == 0 {
        return Err("Batch size must be greater than 0".to_string());
    }

    Ok(batch_size)
}

fn validate_key_width(s: &str) -> Result<usize, String> {
    let width: usize = s
        .parse()
        .map_err(|_| format!("Invalid key width: '{}'. Must be a positive integer.", s))?;

    if width == 0 {
        return Err("Key width must be greater than 0".to_string());
    }

    Ok(width)
}
