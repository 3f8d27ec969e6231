//! Command implementations for tabinspect CLI

use crate::analyzer::{analyze, AnalyzeOptions};
use crate::cli::{Commands, OutputFormat, SourceArgs};
use crate::compare::{compare, CompareOptions, ComparisonResult};
use crate::config::InspectConfig;
use crate::duplicates::find_duplicates;
use crate::error::{InspectError, Result};
use crate::locate::{self, Predicate, RawLine, Window};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::source::{describe, open_source, TabularSource};
use log::{info, warn};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Execute a command
pub fn execute_command(
    command: Commands,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let base = InspectConfig::load(config_path)?;
    let started = Instant::now();

    let result = match command {
        Commands::Describe { file, source } => {
            describe_command(&file, &with_source_args(&base, &source)?, format)
        }
        Commands::Head {
            file,
            rows,
            raw,
            source,
        } => window_command(
            &file,
            Window::Head(rows),
            raw,
            &with_source_args(&base, &source)?,
            format,
        ),
        Commands::Tail {
            file,
            rows,
            raw,
            source,
        } => window_command(
            &file,
            Window::Tail(rows),
            raw,
            &with_source_args(&base, &source)?,
            format,
        ),
        Commands::Row {
            file,
            row,
            context,
            raw,
            source,
        } => {
            let config = with_source_args(&base, &source)?;
            let radius = context.unwrap_or(config.context_radius);
            row_command(&file, row, radius, raw, &config, format)
        }
        Commands::Find {
            file,
            query,
            raw,
            source,
        } => find_command(&file, &query, raw, &with_source_args(&base, &source)?, format),
        Commands::Analyze {
            file,
            skip_header,
            malformed_data,
            check_duplicates,
            source,
        } => {
            let options = AnalyzeOptions {
                skip_header,
                capture_malformed_data: malformed_data,
                // A width of zero switches the duplicate check off
                duplicate_key_width: check_duplicates.filter(|&width| width > 0),
            };
            analyze_command(&file, &options, &with_source_args(&base, &source)?, format)
        }
        Commands::Duplicates {
            file,
            key_width,
            source,
        } => duplicates_command(&file, key_width, &with_source_args(&base, &source)?, format),
        Commands::Compare {
            file,
            other,
            no_schema,
            no_data,
            exact,
            rel_tol,
            abs_tol,
            batch_size,
            source,
        } => {
            let mut config = with_source_args(&base, &source)?;
            if let Some(rel) = rel_tol {
                config.rel_tol = rel;
            }
            if let Some(abs) = abs_tol {
                config.abs_tol = abs;
            }
            if let Some(size) = batch_size {
                config.batch_size = size;
            }
            config.validate()?;

            let options = CompareOptions {
                check_schema: !no_schema,
                check_data: !no_data,
                fuzzy: !exact,
                tolerance: config.tolerance(),
                batch_size: config.batch_size,
            };
            compare_command(&file, &other, &options, &config, format)
        }
    };

    info!("Processing time: {:.2?}", started.elapsed());
    result
}

/// Layer per-command flags over the loaded configuration
fn with_source_args(base: &InspectConfig, args: &SourceArgs) -> Result<InspectConfig> {
    let mut config = base.clone();
    if args.delimiter.is_some() {
        config.delimiter = args.delimiter;
    }
    if args.no_header {
        config.has_header = false;
    }
    if args.no_progress {
        config.show_progress = false;
    }
    config.validate()?;
    Ok(config)
}

fn open(path: &Path, config: &InspectConfig) -> Result<Box<dyn TabularSource>> {
    info!("Opening {}", path.display());
    let source = open_source(path, &config.source_options())?;
    info!(
        "{} source with {} columns and {} rows",
        source.kind(),
        source.schema().width(),
        source.row_count()
    );
    Ok(source)
}

fn progress_for(config: &InspectConfig, message: &str) -> ProgressReporter {
    if config.show_progress {
        ProgressReporter::new(message)
    } else {
        ProgressReporter::new_minimal()
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    println!("{}", JsonFormatter::format(data)?);
    Ok(())
}

/// Raw lines for a range, with a notice when the format has none
fn raw_lines_or_warn(
    source: &dyn TabularSource,
    start: usize,
    end: usize,
) -> Result<Option<Vec<RawLine>>> {
    let lines = locate::raw_window(source, start, end)?;
    if lines.is_none() {
        warn!(
            "'{}' has no raw lines; showing parsed rows",
            source.path().display()
        );
    }
    Ok(lines)
}

fn describe_command(path: &Path, config: &InspectConfig, format: OutputFormat) -> Result<()> {
    let source = open(path, config)?;
    let description = describe(source.as_ref());
    match format {
        OutputFormat::Json => print_json(&description),
        OutputFormat::Pretty => {
            PrettyPrinter::print_description(&description);
            Ok(())
        }
    }
}

fn window_command(
    path: &Path,
    window: Window,
    raw: bool,
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<()> {
    let source = open(path, config)?;
    let (start, end) = window.range(source.row_count());

    if raw {
        if let Some(lines) = raw_lines_or_warn(source.as_ref(), start, end)? {
            return match format {
                OutputFormat::Json => print_json(&lines),
                OutputFormat::Pretty => {
                    PrettyPrinter::print_raw_lines(&lines);
                    Ok(())
                }
            };
        }
    }

    let rows = match window {
        Window::Head(n) => locate::head(source.as_ref(), n)?,
        Window::Tail(n) => locate::tail(source.as_ref(), n)?,
    };
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Pretty => {
            PrettyPrinter::print_rows(&rows, source.schema());
            Ok(())
        }
    }
}

fn row_command(
    path: &Path,
    row: usize,
    radius: usize,
    raw: bool,
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<()> {
    let source = open(path, config)?;
    let view = locate::context(source.as_ref(), row, radius)?;

    match format {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Pretty => {
            let raw_lines = if raw {
                let (start, end) = view.range();
                raw_lines_or_warn(source.as_ref(), start, end)?
            } else {
                None
            };
            PrettyPrinter::print_context(&view, source.schema(), raw_lines.as_deref());
            Ok(())
        }
    }
}

fn find_command(
    path: &Path,
    query: &str,
    raw: bool,
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<()> {
    let source = open(path, config)?;
    let mut progress = progress_for(config, "Searching");

    let predicate = if raw {
        None
    } else {
        match Predicate::parse(query) {
            Ok(predicate) => Some(predicate),
            Err(e @ InspectError::MalformedQuery { .. }) => {
                if !source.has_raw_lines() {
                    return Err(e);
                }
                warn!("{}; searching raw lines for the text instead", e);
                None
            }
            Err(e) => return Err(e),
        }
    };

    match predicate {
        Some(predicate) => {
            info!("Searching {} for {:?}", path.display(), predicate.conditions());
            let rows = locate::find(source.as_ref(), &predicate, &mut progress)?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Pretty => {
                    PrettyPrinter::print_matches(&rows, source.schema());
                    Ok(())
                }
            }
        }
        None => {
            info!("Searching {} for text '{}'", path.display(), query);
            let matches = locate::find_raw(source.as_ref(), query, &mut progress)?;
            match format {
                OutputFormat::Json => print_json(&matches),
                OutputFormat::Pretty => {
                    PrettyPrinter::print_raw_matches(&matches);
                    Ok(())
                }
            }
        }
    }
}

fn analyze_command(
    path: &Path,
    options: &AnalyzeOptions,
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<()> {
    let source = open(path, config)?;
    info!(
        "Analysis options: skip_header={}, malformed_data={}, check_duplicates={:?}",
        options.skip_header, options.capture_malformed_data, options.duplicate_key_width
    );
    let mut progress = progress_for(config, "Analysing");
    let report = analyze(source.as_ref(), options, &mut progress)?;
    drop(progress);

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Pretty => {
            PrettyPrinter::print_analysis(&report, source.schema());
            if let Some(groups) = &report.duplicates {
                PrettyPrinter::print_duplicates(groups);
            }
            Ok(())
        }
    }
}

fn duplicates_command(
    path: &Path,
    key_width: usize,
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<()> {
    let source = open(path, config)?;
    warn!("Duplicate detection keeps every distinct key in memory");
    let mut progress = progress_for(config, "Checking duplicates");
    let groups = find_duplicates(source.as_ref(), key_width, &mut progress)?;
    drop(progress);

    match format {
        OutputFormat::Json => print_json(&groups),
        OutputFormat::Pretty => {
            PrettyPrinter::print_duplicates(&groups);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ComparisonOutput<'a> {
    identical: bool,
    #[serde(flatten)]
    result: &'a ComparisonResult,
}

fn compare_command(
    path: &Path,
    other: &Path,
    options: &CompareOptions,
    config: &InspectConfig,
    format: OutputFormat,
) -> Result<()> {
    let expected = open(path, config)?;
    let actual = open(other, config)?;
    info!(
        "Compare options: schema={}, data={}, fuzzy={}, rel_tol={}, abs_tol={}",
        options.check_schema,
        options.check_data,
        options.fuzzy,
        options.tolerance.rel,
        options.tolerance.abs
    );
    let result = compare(expected.as_ref(), actual.as_ref(), options)?;

    match format {
        OutputFormat::Json => print_json(&ComparisonOutput {
            identical: result.identical(),
            result: &result,
        }),
        OutputFormat::Pretty => {
            PrettyPrinter::print_comparison(&result);
            Ok(())
        }
    }
}
