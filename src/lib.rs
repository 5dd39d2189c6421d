//! A [ComputingMap] presents a fixed set of keys as a read-only map whose values are
//! computed on demand by a closure.
//!
//! The key set is frozen when the map is built and the closure is the only source of values.
//! With the default policy each value is cached on first access, so the closure runs at most
//! once per key even if its output is not stable. The [uncached](ComputingMap::uncached)
//! policy keeps no cache and calls the closure again on every lookup.
//!
//! ```
//! use computingmap::ComputingMap;
//!
//! // Suppose that we have an expensive function returning predictable results (without side effects)
//! fn compute_value(seed: &usize) -> String // content skipped
//! # {   format!("Computed for seed {}", *seed) }
//! # let (comp1, comp2) = (compute_value(&1), compute_value(&2));
//!
//! // Create a map over a fixed key set and use a closure to compute the values on demand
//! let map = ComputingMap::new(vec![1, 2], |k| compute_value(k));
//! let ref1 = map.get(&1).unwrap();
//!
//! // If we ask for the same key again, the closure is NOT executed
//! // and we obtain a reference to the previously cached object
//! let ref1b = map.get(&1).unwrap();
//! assert!(std::ptr::eq(&*ref1, &*ref1b));
//! # assert_eq!(*ref1, comp1);
//!
//! // Keys outside the fixed set are absent, asking for them is a miss rather than an error
//! assert!(map.get(&10).is_none());
//! assert_eq!(map.len(), 2);
//! # assert_eq!(*map.get(&2).unwrap(), comp2);
//! ```
use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use indexmap::{Equivalent, IndexSet};

mod computed;

pub use crate::computed::Computed;

/// Read-only map over a fixed key set, with values computed lazily by a closure.
///
/// The key set is deduplicated and owned by the map, so later changes to the collection the
/// keys came from cannot affect it. Built with [new](Self::new), the map memoizes: each value
/// is computed once and stored in an internal cache. Built with [uncached](Self::uncached),
/// the map keeps no cache and recomputes on every lookup. Both policies share the same type,
/// and lookups report their origin through [Computed].
///
/// Uses unsafe code for interior mutability as we need to expose references inside an UnsafeCell.
/// Safety is maintained as cache entries are only ever added, never removed or replaced: all
/// previously returned references remain valid, and boxed values keep a stable address when
/// the underlying hashmap reallocates.
///
/// This type is **NOT thread safe**: concurrent lookups must be synchronized externally.
pub struct ComputingMap<K, V, F> {
    keys: IndexSet<K>,
    provider: F,
    cache: Option<UnsafeCell<HashMap<K, Box<V>>>>,
}

impl<K: Eq + Hash + Clone, V, F: Fn(&K) -> V> ComputingMap<K, V, F> {
    /// Create a memoizing map over the given keys.
    ///
    /// Duplicate keys collapse into one. The closure is called at most once per key, on the
    /// first lookup that reaches it.
    pub fn new(keys: impl IntoIterator<Item = K>, provider: F) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            provider,
            cache: Some(UnsafeCell::new(HashMap::new())),
        }
    }

    /// Create a map over the given keys that recomputes on every lookup.
    ///
    /// No cache is kept: the closure runs once per call for any key in the set.
    pub fn uncached(keys: impl IntoIterator<Item = K>, provider: F) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            provider,
            cache: None,
        }
    }

    /// Number of keys in the domain. Never triggers a computation.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check if a key belongs to the domain, without computing anything.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.keys.contains(key)
    }

    /// The exact key set given at construction. Never triggers a computation.
    pub fn keys(&self) -> &IndexSet<K> {
        &self.keys
    }

    /// Look up the value associated to `key`.
    ///
    /// Keys outside the domain yield `None`. For a key in the domain, the memoizing policy
    /// returns [Computed::Cached], running the closure only if the value is not cached yet;
    /// the uncached policy returns a freshly computed [Computed::Fresh] on every call.
    ///
    /// The lookup accepts any borrowed form of the key type. The membership test resolves
    /// the canonical key stored in the set, which is the only key ever passed to the closure
    /// or inserted in the cache.
    pub fn get<Q>(&self, key: &Q) -> Option<Computed<'_, V>>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let key = self.keys.get(key)?;
        Some(self.compute(key))
    }

    /// All (key, value) pairs, one per key in the domain.
    ///
    /// Computes every value not cached yet. The result is an independent snapshot: it does
    /// not change when further values are computed. Under the memoizing policy a later
    /// [get](Self::get) agrees with the pair listed here.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        self.keys
            .iter()
            .map(|key| (key.clone(), self.compute(key).into_owned()))
            .collect()
    }

    /// All values, one per key in the domain, duplicates included.
    ///
    /// Computes every value not cached yet and returns an independent snapshot.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.keys
            .iter()
            .map(|key| self.compute(key).into_owned())
            .collect()
    }

    /// Iterate over the domain, computing each value when it is reached.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a K, Computed<'a, V>)> + 'a {
        self.keys.iter().map(move |key| (key, self.compute(key)))
    }

    /// Whether derived views track later changes to the internal state.
    ///
    /// Always false: [keys](Self::keys) borrows a set that never changes, and
    /// [entries](Self::entries) and [values](Self::values) are materialized snapshots.
    pub fn is_partial_view(&self) -> bool {
        false
    }

    /// Compute or recall the value for a key known to be in the domain.
    fn compute(&self, key: &K) -> Computed<'_, V> {
        let cache = match &self.cache {
            Some(cache) => cache,
            None => return Computed::Fresh((self.provider)(key)),
        };
        // Immutable access to the inner map is safe while self is borrowed
        if let Some(value) = unsafe { cache.get().as_ref().unwrap() }.get(key) {
            return Computed::Cached(value);
        }
        let value = (self.provider)(key);
        // Adding a new entry is safe: old references remain valid, and the mutable
        // access starts only after the closure has returned
        let map = unsafe { cache.get().as_mut().unwrap() };
        Computed::Cached(map.entry(key.clone()).or_insert_with(|| Box::new(value)))
    }
}

impl<K: Eq + Hash + Clone, V: Clone, F: Clone> Clone for ComputingMap<K, V, F> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            provider: self.provider.clone(),
            cache: self.cache.as_ref().map(|cache| {
                // Immutable access to the inner map is safe while self is borrowed
                UnsafeCell::new(unsafe { cache.get().as_ref().unwrap() }.clone())
            }),
        }
    }
}

impl<K: fmt::Debug, V, F> fmt::Debug for ComputingMap<K, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let computed = self
            .cache
            .as_ref()
            .map(|cache| unsafe { cache.get().as_ref().unwrap() }.len());
        f.debug_struct("ComputingMap")
            .field("keys", &self.keys)
            .field("computed", &computed)
            .finish()
    }
}
