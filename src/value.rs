//! Tagged cell values shared by every source family
//!
//! Text sources produce values by lexical interpretation of each field, typed
//! sources convert their native cells. Both end up as a [`Value`], so equality,
//! fuzzy equality and duplicate keys behave the same regardless of the file
//! the value came from.

use crate::error::{InspectError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single cell
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Temporal(Temporal),
}

/// Date and time cells
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

/// Combined absolute/relative tolerance for numeric comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tolerance {
    pub rel: f64,
    pub abs: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { rel: 1e-9, abs: 0.0 }
    }
}

impl Value {
    /// Interpret a raw text field without any declared type
    pub fn infer(field: &str) -> Self {
        if field.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = field.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = field.parse::<f64>() {
            return Value::Float(f);
        }
        if field.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if field.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }
        Value::Text(field.to_string())
    }

    /// Convert a JSON scalar from a search predicate
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(InspectError::malformed_query(format!(
                        "Number out of range: {}",
                        n
                    )))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            other => Err(InspectError::malformed_query(format!(
                "Expected a scalar value, found {}",
                other
            ))),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Temporal(_) => "temporal",
        }
    }

    /// Exact equality including the variant; two nulls or two NaNs are equal
    pub fn exact_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => (a.is_nan() && b.is_nan()) || a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Temporal(a), Value::Temporal(b)) => a == b,
            _ => false,
        }
    }

    /// `|a - b| <= abs + rel * |b|` for numeric pairs, exact equality otherwise
    pub fn fuzzy_eq(&self, other: &Value, tolerance: Tolerance) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => {
                if a.is_nan() || b.is_nan() {
                    return a.is_nan() && b.is_nan();
                }
                if a.is_infinite() || b.is_infinite() {
                    return a == b;
                }
                (a - b).abs() <= tolerance.abs + tolerance.rel * b.abs()
            }
            _ => self.exact_eq(other),
        }
    }

    /// Equality used by predicate search: numbers compare by magnitude and a
    /// text query matches a temporal cell through its rendered form.
    pub fn matches_query(&self, query: &Value) -> bool {
        match (self, query) {
            (Value::Temporal(t), Value::Text(s)) => t.to_string() == *s,
            _ if self.is_numeric() && query.is_numeric() => match (self, query) {
                (Value::Integer(a), Value::Integer(b)) => a == b,
                _ => self.as_f64() == query.as_f64(),
            },
            _ => self.exact_eq(query),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.exact_eq(other)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => canonical_bits(*f).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Temporal(t) => t.hash(state),
        }
    }
}

// Keeps Hash consistent with exact_eq: every NaN collapses to one key, -0.0 to 0.0
fn canonical_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Temporal(t) => write!(f, "{}", t),
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Temporal::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Temporal::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
        }
    }
}
