//! Turning a parameter source into a map of decoded values.

use crate::cache;
use crate::codec;
use crate::params::ParamSource;
use crate::value::{StateMap, StateValue};

/// Decodes a single parameter value.
///
/// Same as [`decode`](crate::decode); provided next to [`extract_params`]
/// so that callers holding one value and callers holding a whole source
/// each have an explicit entry point.
pub fn decode_value(input: &str) -> Option<StateValue> {
    codec::decode(input)
}

/// Decodes every parameter of `source` whose name starts with `prefix`.
///
/// The prefix is stripped from the names in the result, which lets several
/// independent query states share one URL (`u_search=john&i_search=bug`).
/// An empty prefix keeps every parameter.
///
/// When two parameters end up with the same name (a repeated name in a
/// `SearchParams`, or a prefixed and an unprefixed name colliding) the last
/// one in enumeration order wins. A value decoding to `undefined` removes
/// the name from the result.
///
/// Extraction of an `Arc<SearchParams>` without a prefix is memoized by
/// identity: extracting the same `Arc` again returns the stored map.
///
/// ```
/// use query_state::{SearchParams, StateValue, extract_params};
///
/// let params = SearchParams::parse("u_search=john&i_search=bug&u_page=2");
/// let users = extract_params(&params, "u_");
/// assert_eq!(users.get("search"), Some(&StateValue::from("john")));
/// assert_eq!(users.get("page"), Some(&StateValue::from(2)));
/// assert_eq!(users.len(), 2);
/// ```
pub fn extract_params<S: ParamSource + ?Sized>(source: &S, prefix: &str) -> StateMap {
    let memo = source.shared().filter(|_| prefix.is_empty());
    if let Some(hit) = memo.and_then(cache::extracted) {
        return hit;
    }

    let mut map = StateMap::new();
    for (name, value) in source.param_pairs() {
        let Some(name) = name.strip_prefix(prefix) else {
            continue;
        };
        match codec::decode(&value) {
            // an overwritten name keeps the position of its first write
            Some(decoded) => {
                map.insert(name.to_owned(), decoded);
            }
            None => {
                map.shift_remove(name);
            }
        }
    }

    if let Some(shared) = memo {
        cache::store_extracted(shared, &map);
    }
    map
}
