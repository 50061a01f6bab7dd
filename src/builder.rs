//! Building query objects from extracted parameters.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::de::DeserializeOwned;

use crate::error::{BoxError, Error, Result};
use crate::extract::extract_params;
use crate::params::ParamSource;
use crate::value::{StateMap, StateValue};

/// Per-key transform applied to an incoming value.
pub type Mapping = Arc<dyn Fn(StateValue) -> Result<StateValue, BoxError> + Send + Sync>;

/// Transform applied to the whole query once every key has been processed.
pub type PostProcess = Arc<dyn Fn(StateMap) -> Result<StateMap, BoxError> + Send + Sync>;

/// Configuration turning a map of decoded parameters into a query object.
///
/// The pipeline is:
///
/// 1. start from a copy of the defaults (`{page: 1, pageSize: 10}` unless
///    changed with [`defaults`](Self::defaults))
/// 2. for each incoming parameter, in order: drop it if its name is
///    ignored, otherwise store it, passed through its mapping if one is
///    registered
/// 3. run the post-process function, if any, on the result
///
/// Setters consume and return the builder, and `build` takes `&self`, so a
/// configured builder can be shared (it is `Clone + Send + Sync`) and reused
/// for any number of builds. Nothing carries over between builds.
///
/// Errors from mappings and the post-process function are not caught: they
/// are returned from `build` with the original error as their source.
///
/// ```
/// use query_state::{QueryBuilder, SearchParams, StateValue};
///
/// let builder = QueryBuilder::new()
///     .defaults([("orderDir", "+")])
///     .ignore(["debug"])
///     .mapping("search", |v| StateValue::from(v.to_string().to_lowercase()))
///     .post_process(|mut query| {
///         let order_by = query.get("orderBy").map(ToString::to_string);
///         let sort = format!("{}{}", query["orderDir"], order_by.unwrap_or_default());
///         query.insert("sort".to_owned(), sort.into());
///         query
///     });
///
/// let params = SearchParams::parse("search=John&orderBy=name&debug=1&page=3");
/// let query = builder.from_url(&params, "").unwrap();
/// assert_eq!(query["page"], StateValue::from(3));
/// assert_eq!(query["pageSize"], StateValue::from(10));
/// assert_eq!(query["search"], StateValue::from("john"));
/// assert_eq!(query["sort"], StateValue::from("+name"));
/// assert!(!query.contains_key("debug"));
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    defaults: StateMap,
    ignored: IndexSet<String>,
    mappings: IndexMap<String, Mapping>,
    post_process: Option<PostProcess>,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("defaults", &self.defaults)
            .field("ignored", &self.ignored)
            .field("mappings", &self.mappings.keys().collect::<Vec<_>>())
            .field("post_process", &self.post_process.is_some())
            .finish()
    }
}

impl QueryBuilder {
    /// A builder with the pagination defaults `{page: 1, pageSize: 10}`.
    pub fn new() -> Self {
        Self {
            defaults: StateMap::from_iter([
                ("page".to_owned(), StateValue::from(1)),
                ("pageSize".to_owned(), StateValue::from(10)),
            ]),
            ignored: IndexSet::new(),
            mappings: IndexMap::new(),
            post_process: None,
        }
    }

    /// Merges `defaults` over the current defaults. Later values win per key.
    pub fn defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<StateValue>,
    {
        self.defaults
            .extend(defaults.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds names whose incoming values are always dropped.
    ///
    /// An ignored name can still appear in the result through its default
    /// or the post-process function, never through the URL.
    pub fn ignore<I, K>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    /// Registers the transform for `name`, replacing any previous one.
    pub fn mapping<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(StateValue) -> StateValue + Send + Sync + 'static,
    {
        self.try_mapping(name, move |value| Ok::<_, BoxError>(f(value)))
    }

    /// Registers a fallible transform for `name`, replacing any previous
    /// one. An error aborts the build.
    pub fn try_mapping<F, E>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(StateValue) -> Result<StateValue, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let mapping: Mapping =
            Arc::new(move |value: StateValue| -> Result<StateValue, BoxError> {
                f(value).map_err(Into::into)
            });
        self.mappings.insert(name.into(), mapping);
        self
    }

    /// Sets the function run on the finished query, replacing any previous
    /// one. It sees the defaulted and mapped result.
    pub fn post_process<F>(self, f: F) -> Self
    where
        F: Fn(StateMap) -> StateMap + Send + Sync + 'static,
    {
        self.try_post_process(move |query| Ok::<_, BoxError>(f(query)))
    }

    /// Fallible version of [`post_process`](Self::post_process).
    pub fn try_post_process<F, E>(mut self, f: F) -> Self
    where
        F: Fn(StateMap) -> Result<StateMap, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let post_process: PostProcess =
            Arc::new(move |query: StateMap| -> Result<StateMap, BoxError> {
                f(query).map_err(Into::into)
            });
        self.post_process = Some(post_process);
        self
    }

    /// The current defaults.
    pub fn default_values(&self) -> &StateMap {
        &self.defaults
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Builds a query object from decoded parameters.
    ///
    /// `params` is not modified; the result is always a fresh map.
    pub fn build(&self, params: &StateMap) -> Result<StateMap> {
        let mut query = self.defaults.clone();
        for (name, value) in params {
            if self.ignored.contains(name) {
                continue;
            }
            let value = match self.mappings.get(name) {
                Some(mapping) => mapping(value.clone()).map_err(|source| Error::Mapping {
                    key: name.clone(),
                    source,
                })?,
                None => value.clone(),
            };
            query.insert(name.clone(), value);
        }

        match &self.post_process {
            Some(post_process) => post_process(query).map_err(Error::PostProcess),
            None => Ok(query),
        }
    }

    /// Builds a query object and deserializes it into `T`.
    ///
    /// Numbers that are whole arrive as integers and dates as RFC 3339
    /// strings, so integer fields and `chrono` types deserialize directly.
    pub fn build_as<T: DeserializeOwned>(&self, params: &StateMap) -> Result<T> {
        let query = self.build(params)?;
        let value = serde_json::to_value(&query)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Extracts the parameters under `prefix` from `source` and builds a
    /// query object from them.
    pub fn from_url<S: ParamSource + ?Sized>(&self, source: &S, prefix: &str) -> Result<StateMap> {
        self.build(&extract_params(source, prefix))
    }

    /// [`from_url`](Self::from_url) followed by deserialization into `T`.
    pub fn from_url_as<T, S>(&self, source: &S, prefix: &str) -> Result<T>
    where
        T: DeserializeOwned,
        S: ParamSource + ?Sized,
    {
        self.build_as(&extract_params(source, prefix))
    }
}
