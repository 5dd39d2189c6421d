use std::ops::Deref;

/// Result of a successful lookup in a [ComputingMap](crate::ComputingMap).
///
/// The memoizing policy hands out references into its cache, the uncached policy hands out
/// owned values it just computed. Both variants give access to the value through [Deref].
#[derive(Debug)]
pub enum Computed<'a, V> {
    /// A value stored in the cache, by this lookup or an earlier one.
    Cached(&'a V),
    /// A value computed for this call only, never stored.
    Fresh(V),
}

impl<'a, V> Computed<'a, V> {
    /// The value is borrowed from the memoizing cache.
    pub fn is_cached(&self) -> bool {
        matches!(self, Computed::Cached(_))
    }

    /// The value was computed for this call and is owned.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Computed::Fresh(_))
    }

    /// Extract an owned value, cloning only when it is borrowed from the cache.
    pub fn into_owned(self) -> V
    where
        V: Clone,
    {
        match self {
            Computed::Cached(value) => value.clone(),
            Computed::Fresh(value) => value,
        }
    }
}

impl<'a, V> Deref for Computed<'a, V> {
    type Target = V;

    fn deref(&self) -> &V {
        match self {
            Computed::Cached(value) => value,
            Computed::Fresh(value) => value,
        }
    }
}
