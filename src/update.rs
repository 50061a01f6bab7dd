//! Computing the next location after a state change.
//!
//! Nothing here touches a real navigation object. The functions take the
//! current parameters and return new ones; a navigation layer pushes the
//! result.

use crate::codec::encode;
use crate::params::SearchParams;
use crate::value::StateValue;

/// Whether setting a parameter to `value` should remove it from the URL.
///
/// Absent values, `null`, `""`, `[]`, `{}` and `false` all remove the
/// parameter, so default-looking state never clutters the query string.
pub fn is_removable(value: Option<&StateValue>) -> bool {
    match value {
        None | Some(StateValue::Null) | Some(StateValue::Bool(false)) => true,
        Some(StateValue::String(s)) => s.is_empty(),
        Some(StateValue::Array(items)) => items.is_empty(),
        Some(StateValue::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Applies `updates` to a copy of `current`.
///
/// Every update name is prefixed with `prefix`. A removable value (see
/// [`is_removable`]) deletes the parameter, anything else replaces it with
/// its encoded form. Parameters not named in `updates` are kept as they
/// are, and updated parameters keep their position.
///
/// ```
/// use query_state::{SearchParams, StateValue, apply_updates};
///
/// let current = SearchParams::parse("u_page=2&u_search=john&tab=a");
/// let next = apply_updates(
///     &current,
///     "u_",
///     [
///         ("page", Some(StateValue::from(3))),
///         ("search", Some(StateValue::from(""))),
///         ("tags", Some(StateValue::array(["x", "y"]))),
///     ],
/// );
/// assert_eq!(
///     next.to_string(),
///     "u_page=3&tab=a&u_tags=%255B%2522x%2522%252C%2522y%2522%255D"
/// );
/// ```
pub fn apply_updates<I, K>(current: &SearchParams, prefix: &str, updates: I) -> SearchParams
where
    I: IntoIterator<Item = (K, Option<StateValue>)>,
    K: AsRef<str>,
{
    let mut next = current.clone();
    for (name, value) in updates {
        let name = format!("{prefix}{}", name.as_ref());
        match value {
            Some(value) if !is_removable(Some(&value)) => next.set(name, encode(&value)),
            _ => next.delete(&name),
        }
    }
    next
}

/// Joins a path and parameters into a location string.
///
/// The `?` is left out when there are no parameters.
pub fn location(path: &str, params: &SearchParams) -> String {
    if params.is_empty() {
        path.to_owned()
    } else {
        format!("{path}?{params}")
    }
}
