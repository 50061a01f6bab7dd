//! Parameter sources: where raw query parameters come from.
//!
//! A parameter source is anything that can list `(name, value)` string
//! pairs. Two shapes are supported:
//!
//! * [`SearchParams`], an ordered, multi-valued collection parsed from (or
//!   written to) a query string. Every pair is listed in order.
//! * plain mappings (`HashMap`, `BTreeMap`, `IndexMap`) from a name to a
//!   single string, a list of strings ([`ParamValue`]), or an `Option` of
//!   those. Only the first string of a list is used and absent values are
//!   skipped.

mod form;

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;

/// An ordered, possibly multi-valued collection of query parameters.
///
/// Mirrors the behaviour of a browser's `URLSearchParams`: names may repeat,
/// order is kept, and [`SearchParams::set`] rewrites a parameter in place so
/// that an unchanged query keeps its layout.
///
/// ```
/// use query_state::SearchParams;
///
/// let mut params = SearchParams::parse("?page=2&tag=a&tag=b");
/// assert_eq!(params.get("page"), Some("2"));
/// assert_eq!(params.get_all("tag").collect::<Vec<_>>(), ["a", "b"]);
///
/// params.set("page", "3");
/// params.delete("tag");
/// assert_eq!(params.to_string(), "page=3");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored, as are empty segments (`a=1&&b=2`). A
    /// segment without `=` is a parameter with an empty value. Invalid
    /// UTF-8 is replaced rather than rejected.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        query
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
                (form::decode(name).into_owned(), form::decode(value).into_owned())
            })
            .collect()
    }

    /// Writes the parameters as an `application/x-www-form-urlencoded`
    /// query string, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let estimated_capacity = self.pairs.iter().map(|(n, v)| n.len() + v.len() + 2).sum::<usize>();
        let mut out = String::with_capacity(estimated_capacity);
        for (idx, (name, value)) in self.pairs.iter().enumerate() {
            if idx > 0 {
                out.push('&');
            }
            form::encode_into(name, &mut out);
            out.push('=');
            form::encode_into(value, &mut out);
        }
        out
    }

    /// The first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }

    /// Adds a pair at the end, keeping any existing values of `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Sets `name` to a single value.
    ///
    /// The first existing pair for `name` is overwritten in place and any
    /// later ones are removed. If `name` is absent the pair is appended.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter().position(|(n, _)| *n == name) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut idx = 0;
                self.pairs.retain(|(n, _)| {
                    let keep = idx <= first || *n != name;
                    idx += 1;
                    keep
                });
            }
            None => self.pairs.push((name, value)),
        }
    }

    /// Removes every value of `name`.
    pub fn delete(&mut self, name: &str) {
        self.pairs.retain(|(n, _)| n != name);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of pairs, counting repeated names separately.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromStr for SearchParams {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect(),
        }
    }
}

impl<N: Into<String>, V: Into<String>> Extend<(N, V)> for SearchParams {
    fn extend<I: IntoIterator<Item = (N, V)>>(&mut self, iter: I) {
        self.pairs
            .extend(iter.into_iter().map(|(n, v)| (n.into(), v.into())));
    }
}

/// A value in a plain parameter mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Single(s.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Single(s)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

/// The text a plain-mapping value contributes to extraction, if any.
pub trait ParamText {
    fn first_text(&self) -> Option<&str>;
}

impl ParamText for ParamValue {
    fn first_text(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s.as_str()),
            ParamValue::Multi(values) => values.first().map(String::as_str),
        }
    }
}

impl ParamText for String {
    fn first_text(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl ParamText for &str {
    fn first_text(&self) -> Option<&str> {
        Some(*self)
    }
}

impl ParamText for Vec<String> {
    fn first_text(&self) -> Option<&str> {
        self.first().map(String::as_str)
    }
}

impl<T: ParamText> ParamText for Option<T> {
    fn first_text(&self) -> Option<&str> {
        self.as_ref().and_then(ParamText::first_text)
    }
}

/// A read-only collection of query parameters.
pub trait ParamSource {
    /// The `(name, value)` pairs to extract, in enumeration order.
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)>;

    /// The shared handle extraction results are memoized against.
    ///
    /// Only `Arc<SearchParams>` has one: a new `Arc` is a new location, the
    /// same `Arc` is the same location.
    fn shared(&self) -> Option<&Arc<SearchParams>> {
        None
    }
}

impl ParamSource for SearchParams {
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        self.iter()
            .map(|(n, v)| (Cow::Borrowed(n), Cow::Borrowed(v)))
            .collect()
    }
}

impl ParamSource for Arc<SearchParams> {
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        self.as_ref().param_pairs()
    }

    fn shared(&self) -> Option<&Arc<SearchParams>> {
        Some(self)
    }
}

fn mapping_pairs<'a, K, V>(
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Vec<(Cow<'a, str>, Cow<'a, str>)>
where
    K: AsRef<str> + 'a,
    V: ParamText + 'a,
{
    entries
        .filter_map(|(k, v)| {
            v.first_text()
                .map(|text| (Cow::Borrowed(k.as_ref()), Cow::Borrowed(text)))
        })
        .collect()
}

impl<K: AsRef<str>, V: ParamText, S: BuildHasher> ParamSource for HashMap<K, V, S> {
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        mapping_pairs(self.iter())
    }
}

impl<K: AsRef<str>, V: ParamText> ParamSource for BTreeMap<K, V> {
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        mapping_pairs(self.iter())
    }
}

impl<K: AsRef<str>, V: ParamText, S: BuildHasher> ParamSource for IndexMap<K, V, S> {
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        mapping_pairs(self.iter())
    }
}

impl<T: ParamSource + ?Sized> ParamSource for &T {
    fn param_pairs(&self) -> Vec<(Cow<'_, str>, Cow<'_, str>)> {
        (**self).param_pairs()
    }

    fn shared(&self) -> Option<&Arc<SearchParams>> {
        (**self).shared()
    }
}
