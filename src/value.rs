//! The values carried in query state.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

/// An insertion-ordered mapping from parameter name to value.
pub type StateMap = IndexMap<String, StateValue>;

/// Largest integer an `f64` represents exactly, `2^53 - 1`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A value that can be stored in a query parameter.
///
/// "Absent" is not a variant: wherever a value may be missing (a decoded
/// `undefined`, a key to delete) the API uses `Option<StateValue>`.
///
/// Arrays and objects are reference counted. Cloning them is cheap and the
/// clone shares the allocation, which is what the codec's encode cache
/// keys on. Equality is structural.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Arc<Vec<StateValue>>),
    Object(Arc<StateMap>),
}

impl StateValue {
    /// Builds an array value.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<StateValue>,
    {
        StateValue::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Builds an object value, keeping the order of `entries`.
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<StateValue>,
    {
        StateValue::Object(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Converts any serializable value, going through `serde_json`.
    ///
    /// Dates serialized by `chrono` arrive as RFC 3339 strings and stay
    /// strings; use [`StateValue::Date`] directly to keep them typed.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(StateValue::from)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    /// Arrays, objects and dates take the structural encoding path.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            StateValue::Array(_) | StateValue::Object(_) | StateValue::Date(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number as an `i64`, if it is integral and exactly representable.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().and_then(exact_integer)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            StateValue::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[StateValue]> {
        match self {
            StateValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&StateMap> {
        match self {
            StateValue::Object(map) => Some(map),
            _ => None,
        }
    }
}

fn exact_integer(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Some(n as i64)
    } else {
        None
    }
}

/// Renders a number the way ECMAScript's `Number::toString` does.
///
/// Output uses the shortest digits that round-trip, decimal notation for
/// magnitudes in `[1e-6, 1e21)` and exponent notation (`1e+21`, `1e-7`)
/// outside of it. `-0` renders as `0`.
///
/// ```
/// use query_state::format_number;
///
/// assert_eq!(format_number(7.0), "7");
/// assert_eq!(format_number(0.1), "0.1");
/// assert_eq!(format_number(1e21), "1e+21");
/// assert_eq!(format_number(-0.0), "0");
/// ```
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if value == 0.0 {
        return "0".to_owned();
    }
    if let Some(integer) = exact_integer(value) {
        let mut buffer = itoa::Buffer::new();
        return buffer.format(integer).to_owned();
    }

    let mut buffer = ryu::Buffer::new();
    layout_shortest(buffer.format_finite(value))
}

/// Re-lays out `ryu`'s shortest representation of a non-zero finite number.
fn layout_shortest(shortest: &str) -> String {
    let (negative, unsigned) = match shortest.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, shortest),
    };
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    // `digits` with the decimal point `point` places from its start
    let all_digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let significant = all_digits.trim_start_matches('0');
    let point = int_part.len() as i32 + exponent - (all_digits.len() - significant.len()) as i32;
    let digits = significant.trim_end_matches('0');
    let k = digits.len() as i32;

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }
    if k <= point && point <= 21 {
        out.push_str(digits);
        out.extend(std::iter::repeat_n('0', (point - k) as usize));
    } else if 0 < point && point <= 21 {
        let (head, tail) = digits.split_at(point as usize);
        out.push_str(head);
        out.push('.');
        out.push_str(tail);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-point) as usize));
        out.push_str(digits);
    } else {
        let (head, tail) = digits.split_at(1);
        out.push_str(head);
        if !tail.is_empty() {
            out.push('.');
            out.push_str(tail);
        }
        let exp = point - 1;
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(exp.unsigned_abs()));
    }
    out
}

pub(crate) fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Plain-text rendering: primitives as their literal text, arrays as
/// comma-joined items (null items render empty), dates as RFC 3339.
impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Null => f.write_str("null"),
            StateValue::Bool(b) => write!(f, "{b}"),
            StateValue::Number(n) => f.write_str(&format_number(*n)),
            StateValue::String(s) => f.write_str(s),
            StateValue::Date(d) => f.write_str(&format_date(d)),
            StateValue::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_null() {
                        write!(f, "{item}")?;
                    }
                }
                Ok(())
            }
            StateValue::Object(_) => f.write_str("[object Object]"),
        }
    }
}

/// Serializes as plain data: integral numbers as integers, dates as RFC
/// 3339 strings. This is the shape typed query structs deserialize from;
/// the URL wire format lives in `codec::structural`.
impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StateValue::Null => serializer.serialize_unit(),
            StateValue::Bool(b) => serializer.serialize_bool(*b),
            StateValue::Number(n) => match exact_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            StateValue::String(s) => serializer.serialize_str(s),
            StateValue::Date(d) => d.serialize(serializer),
            StateValue::Array(items) => serializer.collect_seq(items.iter()),
            StateValue::Object(map) => serializer.collect_map(map.iter()),
        }
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => StateValue::Null,
            Value::Bool(b) => StateValue::Bool(b),
            Value::Number(n) => StateValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => StateValue::String(s),
            Value::Array(items) => StateValue::array(items),
            Value::Object(map) => StateValue::object(map),
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StateValue {
                fn from(n: $ty) -> Self {
                    StateValue::Number(n as f64)
                }
            }
        )*
    };
}

from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::String(s.to_owned())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::String(s)
    }
}

impl From<DateTime<Utc>> for StateValue {
    fn from(d: DateTime<Utc>) -> Self {
        StateValue::Date(d)
    }
}

impl<T: Into<StateValue>> From<Vec<T>> for StateValue {
    fn from(items: Vec<T>) -> Self {
        StateValue::array(items)
    }
}

impl From<StateMap> for StateValue {
    fn from(map: StateMap) -> Self {
        StateValue::Object(Arc::new(map))
    }
}

impl<T: Into<StateValue>> From<Option<T>> for StateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(StateValue::Null, Into::into)
    }
}
