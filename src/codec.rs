//! Encoding of single values to URL-safe text and back.
//!
//! ### Wire format
//!
//! Every value becomes one opaque, percent-encoded token that can be used
//! as a query parameter value:
//!
//! * strings are escaped as they are (`john doe` → `john%20doe`)
//! * numbers and booleans are written as their literal text (`3`, `0.5`,
//!   `true`)
//! * `null` is written as the empty string
//! * arrays, objects and dates are written in the structural format (see
//!   `codec::structural`) and then escaped
//!   (`[1,2]` → `%5B1%2C2%5D`)
//!
//! Decoding recognises `true`, `false`, `null`, `undefined` and canonical
//! numbers before anything else, so the *string* `"true"` comes back as the
//! boolean `true`. Text that does not look structural is returned as a
//! string without running the JSON parser.
//!
//! ### Failure
//!
//! Neither direction fails. Malformed escapes or broken structural text in
//! a (possibly hand-edited) URL decode to their literal text, and a
//! `tracing` warning is emitted.

mod escape;
pub(crate) mod structural;

use crate::cache;
use crate::value::{StateValue, format_number};

pub use escape::{escape, unescape};

/// Encodes a value as a URL-safe token.
///
/// ```
/// use query_state::{StateValue, encode};
///
/// assert_eq!(encode(&StateValue::from("john doe")), "john%20doe");
/// assert_eq!(encode(&StateValue::from(3)), "3");
/// assert_eq!(encode(&StateValue::Null), "");
/// assert_eq!(encode(&StateValue::array([1, 2])), "%5B1%2C2%5D");
/// ```
pub fn encode(value: &StateValue) -> String {
    match value {
        StateValue::Null => String::new(),
        StateValue::String(s) => escape(s).into_owned(),
        StateValue::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
        StateValue::Number(n) => escape(&format_number(*n)).into_owned(),
        StateValue::Date(_) | StateValue::Array(_) | StateValue::Object(_) => {
            encode_composite(value)
        }
    }
}

/// Encodes a possibly absent value; absent encodes like `null`.
pub fn encode_opt(value: Option<&StateValue>) -> String {
    value.map(encode).unwrap_or_default()
}

fn encode_composite(value: &StateValue) -> String {
    if let Some(hit) = cache::encoded(value) {
        return hit;
    }

    let encoded = escape(&structural::to_text(value)).into_owned();
    cache::store_encoded(value, &encoded);
    encoded
}

/// Decodes a token produced by [`encode`].
///
/// Returns `None` for the literal `undefined`, which marks an absent value.
/// The empty string is returned unchanged, as the empty string.
///
/// ```
/// use query_state::{StateValue, decode};
///
/// assert_eq!(decode("john%20doe"), Some(StateValue::from("john doe")));
/// assert_eq!(decode("3"), Some(StateValue::from(3)));
/// assert_eq!(decode("007"), Some(StateValue::from("007")));
/// assert_eq!(decode("%5B1%2C2%5D"), Some(StateValue::array([1, 2])));
/// assert_eq!(decode("undefined"), None);
/// assert_eq!(decode(""), Some(StateValue::from("")));
/// ```
pub fn decode(input: &str) -> Option<StateValue> {
    if input.is_empty() {
        return Some(StateValue::String(String::new()));
    }
    if let Some(hit) = cache::decoded(input) {
        return hit;
    }

    let value = decode_uncached(input);
    cache::store_decoded(input, &value);
    value
}

fn decode_uncached(input: &str) -> Option<StateValue> {
    let text = match unescape(input) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(error = %err, input, "failed to unescape query value, using it verbatim");
            return Some(StateValue::String(input.to_owned()));
        }
    };

    match text.as_ref() {
        "true" => return Some(StateValue::Bool(true)),
        "false" => return Some(StateValue::Bool(false)),
        "null" => return Some(StateValue::Null),
        "undefined" => return None,
        _ => {}
    }
    if let Some(n) = parse_canonical_number(&text) {
        return Some(StateValue::Number(n));
    }
    if !structural::looks_structural(&text) {
        return Some(StateValue::String(text.into_owned()));
    }

    match structural::from_text(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = %err, "failed to parse structured query value, using its text");
            Some(StateValue::String(text.into_owned()))
        }
    }
}

/// Accepts `text` as a number only if writing the number back produces
/// exactly `text`. This rejects `007`, `1.0`, `+1`, `1e3`, surrounding
/// whitespace and the non-finite values.
fn parse_canonical_number(text: &str) -> Option<f64> {
    let first = text.as_bytes().first()?;
    if !(first.is_ascii_digit() || *first == b'-') {
        return None;
    }
    let n = text.parse::<f64>().ok().filter(|n| n.is_finite())?;
    (format_number(n) == text).then_some(n)
}
