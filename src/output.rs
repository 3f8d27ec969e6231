//! Output formatting utilities

use crate::analyzer::AnalysisReport;
use crate::compare::ComparisonResult;
use crate::duplicates::DuplicateGroup;
use crate::error::Result;
use crate::locate::{ContextView, RawLine};
use crate::schema::Schema;
use crate::source::{Description, Row};
use serde::Serialize;

/// Malformed/sparse row numbers listed before truncating
const MAX_LISTED_ROWS: usize = 20;

/// Pretty printer for tabinspect output
pub struct PrettyPrinter;

impl PrettyPrinter {
    pub fn print_description(description: &Description) {
        println!("📄 {}", description.path.display());
        println!("├─ Kind: {}", description.kind);
        println!("├─ Rows: {}", description.row_count);
        println!("├─ Columns: {}", description.column_count);
        let columns = &description.schema.columns;
        if columns.is_empty() {
            println!("└─ Schema: (empty)");
            return;
        }
        println!("└─ Schema:");
        for (i, column) in columns.iter().enumerate() {
            let prefix = if i == columns.len() - 1 { "   └─" } else { "   ├─" };
            println!("{} {}. {} ({})", prefix, i + 1, column.name, column.declared_type);
        }
    }

    /// Rows rendered as `{name: value}` mappings
    pub fn print_rows(rows: &[Row], schema: &Schema) {
        if rows.is_empty() {
            println!("No rows.");
            return;
        }
        for row in rows {
            println!("{}", format_row(row, schema));
        }
    }

    pub fn print_raw_lines(lines: &[RawLine]) {
        if lines.is_empty() {
            println!("No rows.");
            return;
        }
        for line in lines {
            println!("Row {}: {}", line.number, line.line);
        }
    }

    /// Context rows with the target row set apart by blank lines
    pub fn print_context(view: &ContextView, schema: &Schema, raw_lines: Option<&[RawLine]>) {
        println!(
            "🔎 Row {} (showing rows {}-{})",
            view.center, view.first, view.last
        );
        let lines: Vec<(usize, String)> = match raw_lines {
            Some(lines) => lines
                .iter()
                .map(|l| (l.number, format!("Row {}: {}", l.number, l.line)))
                .collect(),
            None => view
                .rows
                .iter()
                .map(|row| (row.number, format_row(row, schema)))
                .collect(),
        };
        for (number, line) in lines {
            if number == view.center {
                println!();
                println!("{}", line);
                println!();
            } else {
                println!("{}", line);
            }
        }
    }

    pub fn print_matches(rows: &[Row], schema: &Schema) {
        if rows.is_empty() {
            println!("No matching rows found.");
            return;
        }
        println!("🔎 {} matching row(s):", rows.len());
        Self::print_rows(rows, schema);
    }

    pub fn print_raw_matches(matches: &[RawLine]) {
        if matches.is_empty() {
            println!("No matching rows found.");
            return;
        }
        println!("🔎 {} matching row(s):", matches.len());
        Self::print_raw_lines(matches);
    }

    pub fn print_analysis(report: &AnalysisReport, schema: &Schema) {
        println!("📊 Structure analysis ({} source)", report.source_kind);
        println!("├─ Rows scanned: {}", report.rows_scanned);
        println!("├─ Schema width: {}", report.schema_width);
        if let Some(expected) = report.expected_field_count {
            println!("├─ Expected fields per row: {}", expected);
        }

        println!("├─ Field counts:");
        let histogram: Vec<_> = report.field_count_histogram.iter().collect();
        for (i, (fields, rows)) in histogram.iter().enumerate() {
            let prefix = if i == histogram.len() - 1 { "│  └─" } else { "│  ├─" };
            println!("{} {} field(s): {} row(s)", prefix, fields, rows);
        }

        if report.is_consistent() {
            println!("├─ ✅ Structure: consistent");
        } else {
            println!(
                "├─ ❌ Malformed rows: {}",
                report.malformed_row_numbers.len()
            );
            println!("│  └─ {}", summarize_numbers(&report.malformed_row_numbers));
        }
        if report.unparseable_rows > 0 {
            println!("├─ ⚠️  Unparseable rows: {}", report.unparseable_rows);
        }
        if !report.malformed_rows.is_empty() {
            println!("├─ Malformed row data:");
            for row in &report.malformed_rows {
                println!("│  └─ {}", format_row(row, schema));
            }
        }

        if let Some(nulls) = &report.null_percentage_per_column {
            println!("├─ Null percentage:");
            for (name, fraction) in nulls {
                println!("│  ├─ {}: {}", name, format_percentage(*fraction));
            }
        }
        if let Some(groups) = &report.duplicates {
            println!("├─ Duplicate groups: {}", groups.len());
        }

        if report.sparse_row_numbers.is_empty() {
            println!("└─ Sparse rows: none");
        } else {
            println!("└─ Sparse rows: {}", report.sparse_row_numbers.len());
            println!("   └─ {}", summarize_numbers(&report.sparse_row_numbers));
        }
    }

    pub fn print_duplicates(groups: &[DuplicateGroup]) {
        if groups.is_empty() {
            println!("✅ No duplicate keys found.");
            return;
        }
        println!("❌ {} duplicate key(s):", groups.len());
        for (i, group) in groups.iter().enumerate() {
            let prefix = if i == groups.len() - 1 { "└─" } else { "├─" };
            let key = group
                .key
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            println!("{} ({}) -> rows {}", prefix, key, summarize_numbers(&group.rows));
        }
    }

    pub fn print_comparison(result: &ComparisonResult) {
        println!("🔍 Comparison");
        if result.schema_checked {
            if result.schema_match {
                println!("├─ ✅ Schema: match");
            } else {
                println!("├─ ❌ Schema: {} mismatch(es)", result.field_mismatches.len());
                for m in &result.field_mismatches {
                    println!(
                        "│  └─ column {}: {} vs {}",
                        m.index,
                        describe_field(m.expected_name.as_deref(), m.expected_type.map(|t| t.as_str())),
                        describe_field(m.actual_name.as_deref(), m.actual_type.map(|t| t.as_str()))
                    );
                }
            }
        }

        let (a, b) = (result.expected_shape, result.actual_shape);
        if result.shape_match {
            println!("├─ ✅ Shape: {} rows x {} columns", a.rows, a.columns);
        } else {
            println!(
                "├─ ❌ Shape: {} x {} vs {} x {}",
                a.rows, a.columns, b.rows, b.columns
            );
        }

        if result.data_checked {
            if result.data_match {
                println!("├─ ✅ Data: match");
            } else {
                println!("├─ ❌ Data: differs");
                for (column, count) in &result.column_diff_counts {
                    println!("│  └─ {}: {} row(s)", column, count);
                }
            }
        } else {
            println!("├─ Data: not checked");
        }

        if result.identical() {
            println!("└─ ✅ Files are identical");
        } else {
            println!("└─ ❌ Files are NOT identical");
        }
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format<T: Serialize + ?Sized>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }
}

pub fn format_row(row: &Row, schema: &Schema) -> String {
    format!("Row {}: {}", row.number, row.render(schema))
}

/// Fraction in `[0, 1]` as a percentage with two decimals
pub fn format_percentage(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

fn describe_field(name: Option<&str>, type_name: Option<&str>) -> String {
    match (name, type_name) {
        (Some(name), Some(t)) => format!("{} ({})", name, t),
        _ => "(missing)".to_string(),
    }
}

/// Comma-separated row numbers, truncated after `MAX_LISTED_ROWS`
fn summarize_numbers(numbers: &[usize]) -> String {
    let listed = numbers
        .iter()
        .take(MAX_LISTED_ROWS)
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if numbers.len() > MAX_LISTED_ROWS {
        format!("{} ... ({} more)", listed, numbers.len() - MAX_LISTED_ROWS)
    } else {
        listed
    }
}
