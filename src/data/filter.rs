use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{Error, Result};

use super::model::Value;

// ---------------------------------------------------------------------------
// Filter: tagged predicate variants, constructed at the query boundary
// ---------------------------------------------------------------------------

/// Trailing marker that turns a scalar string into a prefix match.
pub const WILDCARD: char = '%';

/// One filter entry. The variant fixes the matching semantics up front, so
/// the executor never has to sniff value shapes at apply time.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Row kept iff `column == value`.
    Equals(Value),
    /// Row kept iff the column's string form starts with the literal prefix.
    /// Case-sensitive; no escaping of a literal `%` inside the prefix.
    Prefix(String),
    /// Row kept iff `low <= column <= high`, inclusive both ends.
    Range(Value, Value),
    /// Range over dates; the column is cast to a date before comparing.
    DateRange(NaiveDate, NaiveDate),
}

/// A filter specification: frontend field name → filter entry.
pub type FilterMap = BTreeMap<String, Filter>;

impl Filter {
    /// Build a filter from a plain scalar. A string ending in the wildcard
    /// marker becomes a prefix match with the marker stripped; anything else
    /// is exact equality.
    pub fn scalar(value: impl Into<Value>) -> Filter {
        let value = value.into();
        if let Value::Str(s) = &value {
            if let Some(prefix) = s.strip_suffix(WILDCARD) {
                return Filter::Prefix(prefix.to_string());
            }
        }
        Filter::Equals(value)
    }

    /// Untyped inclusive range, `(low, high)`.
    pub fn range(low: impl Into<Value>, high: impl Into<Value>) -> Filter {
        Filter::Range(low.into(), high.into())
    }

    /// Inclusive date range from ISO-8601 bounds.
    pub fn date_range(low: &str, high: &str) -> Result<Filter> {
        Ok(Filter::DateRange(parse_date(low)?, parse_date(high)?))
    }

    /// Wire-shape constructor for the 3-tuple `(low, high, kind)` form.
    /// `kind` is matched case-insensitively against `RANGE` and `DATE`; any
    /// other kind fails with [`Error::UnsupportedFilterKind`].
    pub fn bounded(low: impl Into<Value>, high: impl Into<Value>, kind: &str) -> Result<Filter> {
        match kind.to_ascii_uppercase().as_str() {
            "RANGE" => Ok(Filter::Range(low.into(), high.into())),
            "DATE" => {
                let low = low.into();
                let high = high.into();
                Ok(Filter::DateRange(
                    value_as_date(&low)?,
                    value_as_date(&high)?,
                ))
            }
            other => Err(Error::UnsupportedFilterKind(other.to_string())),
        }
    }

    /// Evaluate the predicate against one cell. `field` is the frontend name,
    /// used only in error messages. Null cells never match.
    pub fn matches(&self, field: &str, cell: &Value) -> Result<bool> {
        if cell.is_null() {
            return Ok(matches!(self, Filter::Equals(Value::Null)));
        }
        match self {
            Filter::Equals(want) => Ok(values_equal(want, cell)),
            Filter::Prefix(prefix) => Ok(cell.to_string().starts_with(prefix.as_str())),
            Filter::Range(low, high) => {
                // Numeric bounds compare numerically; otherwise both sides
                // must be in the same comparable class.
                if let (Some(lo), Some(hi)) = (low.as_f64(), high.as_f64()) {
                    let v = cell.as_f64().ok_or_else(|| Error::TypeMismatch {
                        field: field.to_string(),
                    })?;
                    return Ok(lo <= v && v <= hi);
                }
                if !same_class(low, cell) || !same_class(high, cell) {
                    return Err(Error::TypeMismatch {
                        field: field.to_string(),
                    });
                }
                Ok(low <= cell && cell <= high)
            }
            Filter::DateRange(low, high) => {
                let d = cell.as_date().ok_or_else(|| Error::TypeMismatch {
                    field: field.to_string(),
                })?;
                Ok(*low <= d && d <= *high)
            }
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

fn value_as_date(v: &Value) -> Result<NaiveDate> {
    v.as_date().ok_or_else(|| Error::InvalidDate(v.to_string()))
}

/// Equality with numeric coercion, so an integer bound matches a float cell.
fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

/// Whether two non-null values fall in the same comparable class.
fn same_class(a: &Value, b: &Value) -> bool {
    use Value::*;
    matches!(
        (a, b),
        (Str(_), Str(_))
            | (Date(_), Date(_))
            | (Bool(_), Bool(_))
            | (Integer(_) | Float(_), Integer(_) | Float(_))
    )
}
