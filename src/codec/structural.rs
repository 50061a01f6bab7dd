//! Text format for composite values.
//!
//! Composites are written as JSON. JSON has no date type, so a date is
//! written as a one-key object tagged with [`DATE_TAG`]:
//!
//! ```text
//! {"from":{"$date":"2024-03-01T00:00:00Z"},"tags":["a","b"]}
//! ```
//!
//! Object keys starting with `$` are reserved for tags. A user key that
//! starts with `$` is written with one more leading `$` (`$date` becomes
//! `$$date`) and read back without it.
//!
//! Integral numbers are written without a fractional part so that arrays of
//! ids stay compact (`[1,2,3]`).

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

use crate::value::{StateValue, format_date};

/// Key of the object that stands in for a date.
pub const DATE_TAG: &str = "$date";

/// Substring that marks text as structurally encoded even when it does not
/// open with a bracket.
pub const MARKER: &str = "\"$date\"";

/// Writes `value` in the structural text format.
///
/// Every `StateValue` has a JSON form, so writing cannot fail.
pub fn to_text(value: &StateValue) -> String {
    to_json(value).to_string()
}

/// Reads text written by [`to_text`].
pub fn from_text(text: &str) -> serde_json::Result<StateValue> {
    serde_json::from_str::<Value>(text).map(from_json)
}

/// Whether `text` should be handed to [`from_text`] at all.
///
/// Plain strings skip the JSON parser entirely.
pub fn looks_structural(text: &str) -> bool {
    text.starts_with(['[', '{']) || text.contains(MARKER)
}

fn to_json(value: &StateValue) -> Value {
    match value {
        StateValue::Null => Value::Null,
        StateValue::Bool(b) => Value::Bool(*b),
        StateValue::Number(n) => match value.as_i64() {
            Some(i) => Value::Number(i.into()),
            // NaN and infinities have no JSON form and become `null`
            None => Number::from_f64(*n).map_or(Value::Null, Value::Number),
        },
        StateValue::String(s) => Value::String(s.clone()),
        StateValue::Date(d) => {
            let mut tagged = Map::with_capacity(1);
            tagged.insert(DATE_TAG.to_owned(), Value::String(format_date(d)));
            Value::Object(tagged)
        }
        StateValue::Array(items) => Value::Array(items.iter().map(to_json).collect()),
        StateValue::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (escape_key(k), to_json(v)))
                .collect(),
        ),
    }
}

fn from_json(value: Value) -> StateValue {
    match value {
        Value::Array(items) => StateValue::array(items.into_iter().map(from_json)),
        Value::Object(map) => match tagged_date(&map) {
            Some(date) => StateValue::Date(date),
            None => StateValue::object(
                map.into_iter()
                    .map(|(k, v)| (unescape_key(k), from_json(v))),
            ),
        },
        other => StateValue::from(other),
    }
}

fn escape_key(key: &str) -> String {
    if key.starts_with('$') {
        format!("${key}")
    } else {
        key.to_owned()
    }
}

fn unescape_key(mut key: String) -> String {
    if key.starts_with("$$") {
        key.remove(0);
    }
    key
}

fn tagged_date(map: &Map<String, Value>) -> Option<DateTime<Utc>> {
    if map.len() != 1 {
        return None;
    }
    let text = map.get(DATE_TAG)?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
