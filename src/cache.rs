//! Process-wide caches in front of the codec and the extractor.
//!
//! Three caches exist:
//!
//! * **encode**: composite value (by allocation identity) to encoded text
//! * **decode**: encoded text to decoded value
//! * **extract**: `Arc<SearchParams>` (by identity) to extracted map
//!
//! Each holds at most [`CACHE_CAPACITY`] entries. Nothing is evicted one
//! at a time; once a cache is full new results are simply not stored.
//! Identity-keyed caches hold `Weak` references, so they never keep a value
//! alive, and entries whose value has been dropped are pruned when the
//! cache fills up.
//!
//! The capacity check and the insert are not atomic with the lookup. Two
//! threads missing on the same key both compute and both insert the same
//! result, and a cache may overshoot its capacity by a few entries. Neither
//! is observable in the output.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::RwLock;

use crate::params::SearchParams;
use crate::value::{StateMap, StateValue};

/// Maximum number of entries held by each cache.
pub const CACHE_CAPACITY: usize = 1000;

/// Entry counts of the three caches, see [`cache_stats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub encode: usize,
    pub decode: usize,
    pub extract: usize,
}

/// Empties every cache.
///
/// Results never depend on cache contents, so this is only useful to
/// reclaim memory or to start a test from a known state.
pub fn clear_caches() {
    ENCODE.clear();
    DECODE.clear();
    EXTRACT.clear();
}

/// Current number of entries in each cache.
pub fn cache_stats() -> CacheStats {
    CacheStats {
        encode: ENCODE.len(),
        decode: DECODE.len(),
        extract: EXTRACT.len(),
    }
}

static ENCODE: LazyLock<IdentityCache<Composite, String>> = LazyLock::new(IdentityCache::new);
static DECODE: LazyLock<BoundedCache<String, Option<StateValue>>> =
    LazyLock::new(BoundedCache::new);
static EXTRACT: LazyLock<IdentityCache<Weak<SearchParams>, StateMap>> =
    LazyLock::new(IdentityCache::new);

pub(crate) fn encoded(value: &StateValue) -> Option<String> {
    Composite::of(value).and_then(|handle| ENCODE.get(&handle))
}

pub(crate) fn store_encoded(value: &StateValue, encoded: &str) {
    if let Some(handle) = Composite::of(value) {
        ENCODE.insert(handle, encoded.to_owned());
    }
}

pub(crate) fn decoded(input: &str) -> Option<Option<StateValue>> {
    DECODE.get(input)
}

pub(crate) fn store_decoded(input: &str, value: &Option<StateValue>) {
    DECODE.insert(input.to_owned(), value.clone());
}

pub(crate) fn extracted(source: &Arc<SearchParams>) -> Option<StateMap> {
    EXTRACT.get(&Arc::downgrade(source))
}

pub(crate) fn store_extracted(source: &Arc<SearchParams>, map: &StateMap) {
    EXTRACT.insert(Arc::downgrade(source), map.clone());
}

/// A `HashMap` that stops accepting new keys once it is full.
struct BoundedCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> BoundedCache<K, V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.read().get(key).cloned()
    }

    fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write();
        if entries.len() < CACHE_CAPACITY || entries.contains_key(&key) {
            entries.insert(key, value);
        } else {
            tracing::debug!(capacity = CACHE_CAPACITY, "cache full, not caching");
        }
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// A weak reference whose allocation address serves as a cache key.
trait Handle {
    fn addr(&self) -> usize;
    fn is_live(&self) -> bool;
}

impl<T> Handle for Weak<T> {
    fn addr(&self) -> usize {
        self.as_ptr() as *const () as usize
    }

    fn is_live(&self) -> bool {
        self.strong_count() > 0
    }
}

/// Identity of an array or object value.
enum Composite {
    Array(Weak<Vec<StateValue>>),
    Object(Weak<StateMap>),
}

impl Composite {
    /// Dates and primitives have no identity and are never cached by it.
    fn of(value: &StateValue) -> Option<Self> {
        match value {
            StateValue::Array(items) => Some(Composite::Array(Arc::downgrade(items))),
            StateValue::Object(map) => Some(Composite::Object(Arc::downgrade(map))),
            _ => None,
        }
    }
}

impl Handle for Composite {
    fn addr(&self) -> usize {
        match self {
            Composite::Array(weak) => weak.addr(),
            Composite::Object(weak) => weak.addr(),
        }
    }

    fn is_live(&self) -> bool {
        match self {
            Composite::Array(weak) => weak.is_live(),
            Composite::Object(weak) => weak.is_live(),
        }
    }
}

/// Cache keyed by allocation identity.
///
/// A live allocation owns its address, so a live entry found under the
/// address of a live value belongs to that value. An entry whose referent
/// died is treated as a miss; its address may since have been reused.
///
/// Values behind these handles are never mutated while shared: an
/// `Arc::make_mut` on a value with outstanding `Weak`s moves it to a new
/// allocation and leaves the old entry dead.
struct IdentityCache<H, V> {
    entries: RwLock<HashMap<usize, (H, V)>>,
}

impl<H: Handle, V: Clone> IdentityCache<H, V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, handle: &H) -> Option<V> {
        let entries = self.entries.read();
        match entries.get(&handle.addr()) {
            Some((held, value)) if held.is_live() => Some(value.clone()),
            _ => None,
        }
    }

    fn insert(&self, handle: H, value: V) {
        let addr = handle.addr();
        let mut entries = self.entries.write();
        if entries.len() >= CACHE_CAPACITY && !entries.contains_key(&addr) {
            entries.retain(|_, (held, _)| held.is_live());
            if entries.len() >= CACHE_CAPACITY {
                tracing::debug!(capacity = CACHE_CAPACITY, "identity cache full, not caching");
                return;
            }
        }
        entries.insert(addr, (handle, value));
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}
