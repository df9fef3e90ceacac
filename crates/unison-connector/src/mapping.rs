//! Declarative field rules shared by the provider mappers.
//!
//! Most provider shapes are a renaming of canonical fields plus a handful
//! of value conversions. A mapper describes that renaming as a table of
//! [`FieldRule`]s and applies it in both directions; anything the table
//! cannot express is handled in the mapper itself.
//!
//! ```text
//!   canonical            rule                      provider
//!   ---------            ----                      --------
//!   content      <-> properties.hs_call_body   (Plain)
//!   start_at     <-> properties.hs_timestamp   (EpochMillis)
//!   company_id   <-> associations.companies    (Singleton)
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::types::FieldMap;

/// A value conversion applied when a field crosses the mapping boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Copy the value unchanged.
    Plain,
    /// Scalar id; numbers coming back from the provider become strings.
    Text,
    /// List of scalar ids, stringified on the way in.
    TextList,
    /// Integer that some providers return as a numeric string.
    Integer,
    /// RFC 3339 timestamp on the canonical side, epoch milliseconds remotely.
    EpochMillis,
    /// Single id wrapped in an object, e.g. `{"id": "42"}`.
    Wrapped(&'static str),
    /// List of ids, each wrapped in an object.
    WrappedList(&'static str),
    /// Single id on the canonical side, one-element list remotely.
    Singleton,
    /// Two-valued canonical enum stored as a boolean remotely.
    Flag {
        when_true: &'static str,
        when_false: &'static str,
    },
    /// Uppercase canonical enum stored title-cased remotely (`INBOUND` / `Inbound`).
    TitleCase,
}

/// Maps one canonical field onto a dotted path in the provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub canonical: &'static str,
    pub remote: &'static str,
    pub conversion: Conversion,
}

impl FieldRule {
    /// Rule that copies the value unchanged.
    #[must_use]
    pub const fn plain(canonical: &'static str, remote: &'static str) -> Self {
        Self {
            canonical,
            remote,
            conversion: Conversion::Plain,
        }
    }

    /// Rule with an explicit conversion.
    #[must_use]
    pub const fn new(canonical: &'static str, remote: &'static str, conversion: Conversion) -> Self {
        Self {
            canonical,
            remote,
            conversion,
        }
    }
}

/// A field that could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFault {
    pub field: String,
    pub message: String,
}

impl MappingFault {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for MappingFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for MappingFault {}

impl Conversion {
    /// Canonical value to provider value.
    fn outbound(&self, value: &Value) -> Result<Value, String> {
        match self {
            Conversion::Plain | Conversion::Text | Conversion::TextList | Conversion::Integer => {
                Ok(value.clone())
            }
            Conversion::EpochMillis => {
                let raw = value.as_str().ok_or("expected an RFC 3339 timestamp string")?;
                let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| e.to_string())?;
                Ok(Value::from(parsed.timestamp_millis()))
            }
            Conversion::Wrapped(key) => Ok(wrap(key, value.clone())),
            Conversion::WrappedList(key) => {
                let items = value.as_array().ok_or("expected a list of ids")?;
                Ok(Value::Array(
                    items.iter().map(|item| wrap(key, item.clone())).collect(),
                ))
            }
            Conversion::Singleton => Ok(Value::Array(vec![value.clone()])),
            Conversion::Flag {
                when_true,
                when_false,
            } => {
                let raw = value.as_str().ok_or("expected a string")?;
                if raw.eq_ignore_ascii_case(when_true) {
                    Ok(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case(when_false) {
                    Ok(Value::Bool(false))
                } else {
                    Err(format!("expected {when_true} or {when_false}, got '{raw}'"))
                }
            }
            Conversion::TitleCase => {
                let raw = value.as_str().ok_or("expected a string")?;
                Ok(Value::String(title_case(raw)))
            }
        }
    }

    /// Provider value to canonical value.
    fn inbound(&self, value: &Value) -> Result<Value, String> {
        match self {
            Conversion::Plain => Ok(value.clone()),
            Conversion::Text => id_text(value)
                .map(Value::String)
                .ok_or_else(|| format!("expected a scalar id, got {value}")),
            Conversion::TextList => {
                let items = value.as_array().ok_or("expected a list of ids")?;
                items
                    .iter()
                    .map(|item| {
                        id_text(item)
                            .map(Value::String)
                            .ok_or_else(|| format!("expected a scalar id, got {item}"))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Conversion::Integer => match value {
                Value::Number(n) if n.is_i64() => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|e| format!("expected an integer, got '{s}': {e}")),
                other => Err(format!("expected an integer, got {other}")),
            },
            Conversion::EpochMillis => {
                let parsed = match value {
                    Value::Number(n) => n
                        .as_i64()
                        .and_then(DateTime::<Utc>::from_timestamp_millis)
                        .ok_or("timestamp out of range")?,
                    Value::String(s) => match s.parse::<i64>() {
                        Ok(ms) => DateTime::<Utc>::from_timestamp_millis(ms)
                            .ok_or("timestamp out of range")?,
                        Err(_) => DateTime::parse_from_rfc3339(s)
                            .map_err(|e| e.to_string())?
                            .with_timezone(&Utc),
                    },
                    other => return Err(format!("expected a timestamp, got {other}")),
                };
                Ok(Value::String(
                    parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                ))
            }
            Conversion::Wrapped(key) => value
                .get(key)
                .and_then(id_text)
                .map(Value::String)
                .ok_or_else(|| format!("expected an object with '{key}'")),
            Conversion::WrappedList(key) => {
                let items = value.as_array().ok_or("expected a list")?;
                items
                    .iter()
                    .map(|item| {
                        item.get(key)
                            .and_then(id_text)
                            .map(Value::String)
                            .ok_or_else(|| format!("list entry without '{key}'"))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            Conversion::Singleton => match value {
                Value::Array(items) => Ok(items
                    .first()
                    .and_then(id_text)
                    .map_or(Value::Null, Value::String)),
                other => id_text(other)
                    .map(Value::String)
                    .ok_or_else(|| format!("expected an id or list of ids, got {other}")),
            },
            Conversion::Flag {
                when_true,
                when_false,
            } => match value {
                Value::Bool(true) => Ok(Value::from(*when_true)),
                Value::Bool(false) => Ok(Value::from(*when_false)),
                other => Err(format!("expected a boolean, got {other}")),
            },
            Conversion::TitleCase => value
                .as_str()
                .map(|s| Value::String(s.to_uppercase()))
                .ok_or_else(|| "expected a string".to_string()),
        }
    }
}

fn wrap(key: &str, value: Value) -> Value {
    let mut map = FieldMap::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn title_case(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply rules to a canonical field map, producing a provider payload.
///
/// Absent and null canonical fields are skipped.
pub fn apply_to_remote(rules: &[FieldRule], canonical: &FieldMap) -> Result<Value, MappingFault> {
    let mut remote = Value::Object(FieldMap::new());
    for rule in rules {
        let Some(value) = canonical.get(rule.canonical).filter(|v| !v.is_null()) else {
            continue;
        };
        let converted = rule
            .conversion
            .outbound(value)
            .map_err(|message| MappingFault::new(rule.canonical, message))?;
        set_path(&mut remote, rule.remote, converted);
    }
    Ok(remote)
}

/// Apply rules to a provider payload, producing canonical fields.
///
/// Paths that are absent or null in the payload leave the canonical field
/// unset.
pub fn apply_from_remote(rules: &[FieldRule], remote: &Value) -> Result<FieldMap, MappingFault> {
    let mut canonical = FieldMap::new();
    for rule in rules {
        let Some(value) = get_path(remote, rule.remote).filter(|v| !v.is_null()) else {
            continue;
        };
        let converted = rule
            .conversion
            .inbound(value)
            .map_err(|message| MappingFault::new(rule.remote, message))?;
        if !converted.is_null() {
            canonical.insert(rule.canonical.to_string(), converted);
        }
    }
    Ok(canonical)
}

/// Look up a dotted path (`properties.hs_call_body`).
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

/// Write a value at a dotted path, creating intermediate objects.
pub fn set_path(target: &mut Value, path: &str, value: Value) {
    let mut current = target;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(FieldMap::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(FieldMap::new()));
    }
}

/// Render a string or numeric id as text.
#[must_use]
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Drop every null-valued entry.
#[must_use]
pub fn strip_nulls(map: FieldMap) -> FieldMap {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// Unwrap a provider response envelope such as `{"data": {...}}` or
/// `{"data": [{...}]}`; returns the value itself when there is none.
#[must_use]
pub fn unwrap_envelope<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value.get(key) {
        Some(Value::Array(items)) => items.first().unwrap_or(value),
        Some(inner @ Value::Object(_)) => inner,
        _ => value,
    }
}
