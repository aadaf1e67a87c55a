//! Field definitions and date coercion.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type descriptor of one model attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub ty: String,
}

impl FieldDefinition {
    pub fn new(ty: impl Into<String>) -> Self {
        Self { ty: ty.into() }
    }

    /// `date`, `datetime`, `Date`... anything naming a date.
    pub fn is_date(&self) -> bool {
        self.ty.to_ascii_lowercase().contains("date")
    }
}

/// Attribute name → type descriptor.
pub type FieldDefinitions = BTreeMap<String, FieldDefinition>;

/// Rewrite every date-typed field of `record` into an RFC 3339 UTC string.
///
/// Non-object records are left alone.
pub fn coerce_dates(record: &mut Value, definitions: &FieldDefinitions) {
    let Some(obj) = record.as_object_mut() else {
        return;
    };
    for (field, def) in definitions.iter().filter(|(_, d)| d.is_date()) {
        let raw = obj.get(field).cloned().unwrap_or(Value::Null);
        let coerced = match to_datetime(&raw) {
            Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => {
                tracing::warn!(field = %field, value = %raw, "unparsable date, storing null");
                Value::Null
            }
        };
        obj.insert(field.clone(), coerced);
    }
}

/// Falsy values map to the epoch, numbers are epoch milliseconds.
fn to_datetime(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Null | Value::Bool(false) => epoch(),
        Value::Bool(true) => Utc.timestamp_millis_opt(1).single(),
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(ms).single()
        }
        Value::String(s) if s.is_empty() => epoch(),
        Value::String(s) => parse_date_str(s),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn epoch() -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(0).single()
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
