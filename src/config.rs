//! Run configuration: defaults, an optional JSON file and environment overrides

use crate::error::{InspectError, Result};
use crate::source::SourceOptions;
use crate::value::Tolerance;
use crate::DEFAULT_BATCH_SIZE;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

pub const ENV_DELIMITER: &str = "TABINSPECT_DELIMITER";
pub const ENV_REL_TOL: &str = "TABINSPECT_REL_TOL";
pub const ENV_ABS_TOL: &str = "TABINSPECT_ABS_TOL";
pub const ENV_BATCH_SIZE: &str = "TABINSPECT_BATCH_SIZE";

/// Rows shown on either side of a target row
pub const DEFAULT_CONTEXT_RADIUS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    /// Text field delimiter; unset means comma (tab for `.tsv`)
    pub delimiter: Option<char>,
    pub has_header: bool,
    pub batch_size: usize,
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub context_radius: usize,
    pub show_progress: bool,
}

impl Default for InspectConfig {
    fn default() -> Self {
        let tolerance = Tolerance::default();
        Self {
            delimiter: None,
            has_header: true,
            batch_size: DEFAULT_BATCH_SIZE,
            rel_tol: tolerance.rel,
            abs_tol: tolerance.abs,
            context_radius: DEFAULT_CONTEXT_RADIUS,
            show_progress: true,
        }
    }
}

impl InspectConfig {
    /// Defaults, then the config file if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InspectError::not_found(path));
        }
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            InspectError::config(format!("Invalid config file '{}': {}", path.display(), e))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply overrides read through `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DELIMITER) {
            self.delimiter = Some(parse_delimiter(&raw).map_err(InspectError::config)?);
        }
        if let Some(raw) = lookup(ENV_REL_TOL) {
            self.rel_tol = parse_tolerance(ENV_REL_TOL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ABS_TOL) {
            self.abs_tol = parse_tolerance(ENV_ABS_TOL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BATCH_SIZE) {
            self.batch_size = raw.trim().parse().map_err(|_| {
                InspectError::config(format!("{} must be a positive integer: '{}'", ENV_BATCH_SIZE, raw))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(InspectError::config("Batch size must be greater than 0"));
        }
        for (name, value) in [("rel_tol", self.rel_tol), ("abs_tol", self.abs_tol)] {
            if !value.is_finite() || value < 0.0 {
                return Err(InspectError::config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err(InspectError::config(format!(
                    "Delimiter must be a single ASCII character, got '{}'",
                    delimiter
                )));
            }
        }
        Ok(())
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance {
            rel: self.rel_tol,
            abs: self.abs_tol,
        }
    }

    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            delimiter: self.delimiter.map(|c| c as u8),
            has_header: self.has_header,
        }
    }
}

/// Accept a single ASCII character, or `\t` / `tab` for a tab
pub fn parse_delimiter(s: &str) -> std::result::Result<char, String> {
    match s {
        "\\t" | "tab" | "\t" => return Ok('\t'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(format!(
            "Invalid delimiter: '{}'. Use a single ASCII character",
            s
        )),
    }
}

fn parse_tolerance(name: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| InspectError::config(format!("{} must be a number: '{}'", name, raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(InspectError::config(format!(
            "{} must be a non-negative number: '{}'",
            name, raw
        )));
    }
    Ok(value)
}
