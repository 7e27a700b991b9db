//! Scalar values stored in row fields

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATETIME_FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Values that can be stored in a row field.
///
/// Null is not a variant: an empty field is `None` in the owning
/// [`Row`](crate::Row), so it can never leak out as a sentinel string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// String value
    String(String),

    /// Integer value
    Integer(i64),

    /// Decimal value
    Decimal(f64),

    /// Boolean value
    Boolean(bool),

    /// Calendar date
    Date(NaiveDate),

    /// Date and time without zone
    DateTime(NaiveDateTime),
}

/// Discriminant of a [`Value`], used where a textual type tag is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    DateTime,
}

impl ValueKind {
    /// Lowercase tag used in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(ValueKind::String),
            "integer" => Ok(ValueKind::Integer),
            "decimal" => Ok(ValueKind::Decimal),
            "boolean" => Ok(ValueKind::Boolean),
            "date" => Ok(ValueKind::Date),
            "datetime" => Ok(ValueKind::DateTime),
            other => Err(crate::Error::conversion(
                "value kind",
                format!("unknown kind '{other}'"),
            )),
        }
    }
}

impl Value {
    /// Infer a scalar from its text form.
    ///
    /// Tried in order: integer, decimal, boolean, ISO date, ISO datetime.
    /// Anything else stays a string, untrimmed.
    pub fn coerce(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return Value::String(raw.to_string());
        }
        if let Ok(i) = text.parse::<i64>() {
            return Value::Integer(i);
        }
        if looks_numeric(text) {
            if let Ok(d) = text.parse::<f64>() {
                return Value::Decimal(d);
            }
        }
        match text {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            _ => {}
        }
        if let Some(date) = parse_date(text) {
            return Value::Date(date);
        }
        if let Some(datetime) = parse_datetime(text) {
            return Value::DateTime(datetime);
        }
        Value::String(raw.to_string())
    }

    /// Parse text as a specific kind, without inference.
    pub fn parse_as(kind: ValueKind, raw: &str) -> crate::Result<Self> {
        let text = raw.trim();
        let failed = || crate::Error::conversion(kind.as_str(), format!("cannot parse '{raw}'"));
        match kind {
            ValueKind::String => Ok(Value::String(raw.to_string())),
            ValueKind::Integer => text.parse().map(Value::Integer).map_err(|_| failed()),
            ValueKind::Decimal => text.parse().map(Value::Decimal).map_err(|_| failed()),
            ValueKind::Boolean => text.parse().map(Value::Boolean).map_err(|_| failed()),
            ValueKind::Date => parse_date(text).map(Value::Date).ok_or_else(failed),
            ValueKind::DateTime => parse_datetime(text).map(Value::DateTime).ok_or_else(failed),
        }
    }

    /// Kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Integer(_) => ValueKind::Integer,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Whether the value is an integer or decimal
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_))
    }

    /// Borrow the inner string, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether [`Value::coerce`] of the canonical text yields this value again.
    ///
    /// Text formats without type tags only round-trip such values exactly.
    pub fn survives_coercion(&self) -> bool {
        Value::coerce(&self.to_string()) == *self
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            // Debug keeps a fractional part ("1.0"), so decimals read back as decimals
            Value::Decimal(d) => write!(f, "{d:?}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

fn looks_numeric(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATETIME_FORMAT_SPACED))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integers_and_decimals() {
        assert_eq!(Value::coerce("34"), Value::Integer(34));
        assert_eq!(Value::coerce("007"), Value::Integer(7));
        assert_eq!(Value::coerce("-12"), Value::Integer(-12));
        assert_eq!(Value::coerce("2.5"), Value::Decimal(2.5));
        assert_eq!(Value::coerce("1e3"), Value::Decimal(1000.0));
    }

    #[test]
    fn test_coerce_keeps_words_as_strings() {
        assert_eq!(Value::coerce("Ann"), Value::String("Ann".to_string()));
        assert_eq!(Value::coerce("nan"), Value::String("nan".to_string()));
        assert_eq!(Value::coerce("inf"), Value::String("inf".to_string()));
        assert_eq!(Value::coerce(" x "), Value::String(" x ".to_string()));
    }

    #[test]
    fn test_coerce_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(Value::coerce("2024-01-15"), Value::Date(date));

        let dt = date.and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(Value::coerce("2024-01-15T10:30:00"), Value::DateTime(dt));
        assert_eq!(Value::coerce("2024-01-15 10:30:00"), Value::DateTime(dt));
    }

    #[test]
    fn test_coerce_booleans() {
        assert_eq!(Value::coerce("true"), Value::Boolean(true));
        assert_eq!(Value::coerce("false"), Value::Boolean(false));
        assert_eq!(Value::coerce("True"), Value::String("True".to_string()));
    }

    #[test]
    fn test_decimal_display_keeps_fraction() {
        assert_eq!(Value::Decimal(1.0).to_string(), "1.0");
        assert_eq!(Value::Decimal(99.99).to_string(), "99.99");
        assert!(Value::Decimal(1.0).survives_coercion());
    }

    #[test]
    fn test_datetime_display_round_trips() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 1)
            .unwrap();
        let value = Value::DateTime(dt);
        assert_eq!(value.to_string(), "2023-12-31T23:59:01");
        assert!(value.survives_coercion());
    }

    #[test]
    fn test_survives_coercion_flags_numeric_strings() {
        assert!(Value::String("Ann".into()).survives_coercion());
        assert!(!Value::String("12".into()).survives_coercion());
        assert!(!Value::String("true".into()).survives_coercion());
    }

    #[test]
    fn test_parse_as_kind() {
        assert_eq!(
            Value::parse_as(ValueKind::String, "12").unwrap(),
            Value::String("12".into())
        );
        assert_eq!(
            Value::parse_as(ValueKind::Decimal, "3").unwrap(),
            Value::Decimal(3.0)
        );
        assert!(Value::parse_as(ValueKind::Integer, "abc").is_err());
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!("datetime".parse::<ValueKind>().unwrap(), ValueKind::DateTime);
        assert_eq!(Value::Integer(1).kind().to_string(), "integer");
        assert!("blob".parse::<ValueKind>().is_err());
    }
}
