use std::borrow::Cow;
use std::str::Utf8Error;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// The set escaped when a value is written as a single URI component.
///
/// Everything except the ASCII alphanumerics and `-_.!~*'()` is
/// percent-encoded, so the result is safe anywhere in a query string
/// (`&`, `=`, `+`, `#` and brackets are all escaped).
const COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `input` as a URI component.
///
/// Borrows when nothing needs escaping, which is the common case for
/// numbers, booleans and simple search terms.
pub fn escape(input: &str) -> Cow<'_, str> {
    percent_encoding::utf8_percent_encode(input, COMPONENT_SET).into()
}

/// Reverses [`escape`].
///
/// `+` is left alone: values reach the codec after the query string has
/// already been form-decoded, so a `+` here is a literal plus sign.
/// Fails when an escape sequence produces invalid UTF-8.
pub fn unescape(input: &str) -> Result<Cow<'_, str>, Utf8Error> {
    if !input.contains('%') {
        return Ok(Cow::Borrowed(input));
    }
    percent_encoding::percent_decode_str(input).decode_utf8()
}
