use std::borrow::Cow;

use percent_encoding::AsciiSet;

/// As defined in https://url.spec.whatwg.org/#application-x-www-form-urlencoded-percent-encode-set
///
/// The application/x-www-form-urlencoded percent-encode set contains all code points, except the ASCII alphanumeric,
/// U+002A (*), U+002D (-), U+002E (.), and U+005F (_).
///
/// Spaces are left out of the set and written as `+` afterwards.
const FORM_URLENCODED_SET: &AsciiSet = &percent_encoding::NON_ALPHANUMERIC
    .remove(b' ')
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

#[inline(always)]
fn char_to_digit(c: u8) -> Option<u32> {
    char::from(c).to_digit(16)
}

/// Appends the form encoding of `input` to `out`.
pub fn encode_into(input: &str, out: &mut String) {
    for chunk in percent_encoding::utf8_percent_encode(input, FORM_URLENCODED_SET) {
        if chunk.contains(' ') {
            out.extend(chunk.chars().map(|c| if c == ' ' { '+' } else { c }));
        } else {
            out.push_str(chunk);
        }
    }
}

/// Decodes a form-encoded name or value:
/// - Replaces `+` with a space
/// - Decodes percent-encoded characters
/// - Converts the result to a UTF-8 string, replacing invalid sequences
///
/// Percent signs not followed by two hex digits are kept as they are.
pub fn decode(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if !bytes.iter().any(|&b| b == b'+' || b == b'%') {
        return Cow::Borrowed(input);
    }

    let mut decoded = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'+' => {
                decoded.push(b' ');
                idx += 1;
            }
            b'%' => {
                let hex = bytes
                    .get(idx + 1)
                    .and_then(|&h| char_to_digit(h))
                    .zip(bytes.get(idx + 2).and_then(|&l| char_to_digit(l)));
                match hex {
                    Some((h, l)) => {
                        decoded.push((h * 0x10 + l) as u8);
                        idx += 3;
                    }
                    None => {
                        decoded.push(b'%');
                        idx += 1;
                    }
                }
            }
            b => {
                decoded.push(b);
                idx += 1;
            }
        }
    }

    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}
