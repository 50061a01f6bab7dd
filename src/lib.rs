//! Typed query state carried in URL query strings.
//!
//! Applications often keep list and filter state (pagination, search
//! terms, selected tags, date ranges) in the URL so that it survives
//! reloads and can be shared. This crate converts that state between typed
//! values and query parameters, and normalizes it into a query object with
//! defaults applied.
//!
//! ## Pieces
//!
//! * [`encode`] / [`decode`]: one value to a URL-safe token and back.
//!   Primitives are written as plain text, arrays, objects and dates as
//!   escaped JSON. Decoding never fails; malformed input degrades to text.
//! * [`extract_params`]: decode every parameter of a [`ParamSource`],
//!   optionally only those under a name prefix.
//! * [`QueryBuilder`]: defaults, ignored names, per-key mappings and a
//!   post-process step, producing a [`StateMap`] or any
//!   `serde::Deserialize` type.
//! * [`apply_updates`]: compute the next [`SearchParams`] after a state
//!   change.
//!
//! Encoding of composites, decoding, and extraction of shared
//! `Arc<SearchParams>` are cached process-wide; see [`clear_caches`] and
//! [`cache_stats`].
//!
//! ## Usage
//!
//! ```
//! use query_state::{QueryBuilder, SearchParams, StateValue, apply_updates};
//! use serde::Deserialize;
//!
//! #[derive(Debug, PartialEq, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct UserQuery {
//!     page: u32,
//!     page_size: u32,
//!     search: Option<String>,
//!     roles: Vec<String>,
//! }
//!
//! let builder = QueryBuilder::new().defaults([("roles", StateValue::array(Vec::<String>::new()))]);
//!
//! // the UI stores its state in the URL
//! let params = apply_updates(
//!     &SearchParams::new(),
//!     "u_",
//!     [
//!         ("search", Some(StateValue::from("john"))),
//!         ("roles", Some(StateValue::array(["admin", "dev"]))),
//!         ("page", Some(StateValue::from(2))),
//!     ],
//! );
//! let url = params.to_string();
//!
//! // the server reads it back with its original types
//! let query: UserQuery = builder
//!     .from_url_as(&SearchParams::parse(&url), "u_")
//!     .unwrap();
//! assert_eq!(
//!     query,
//!     UserQuery {
//!         page: 2,
//!         page_size: 10,
//!         search: Some("john".to_owned()),
//!         roles: vec!["admin".to_owned(), "dev".to_owned()],
//!     }
//! );
//! ```

mod builder;
mod cache;
mod codec;
mod error;
mod extract;
mod params;
mod update;
mod value;

#[doc(inline)]
pub use builder::{Mapping, PostProcess, QueryBuilder};
#[doc(inline)]
pub use cache::{CACHE_CAPACITY, CacheStats, cache_stats, clear_caches};
#[doc(inline)]
pub use codec::{decode, encode, encode_opt, escape, unescape};
#[doc(inline)]
pub use error::{BoxError, Error, Result};
#[doc(inline)]
pub use extract::{decode_value, extract_params};
#[doc(inline)]
pub use params::{ParamSource, ParamText, ParamValue, SearchParams};
#[doc(inline)]
pub use update::{apply_updates, is_removable, location};
#[doc(inline)]
pub use value::{StateMap, StateValue, format_number};
