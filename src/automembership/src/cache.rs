//! Verified-principal cache
//!
//! Maps an IDP name to the verified group principals derived from its static
//! mapping. Entries are written once per IDP and never invalidated for the
//! lifetime of the cache.
//!
//! Reads and writes go through `DashMap` and are individually atomic. No lock
//! spans compute-then-insert: two callers missing the same key may both
//! compute and both insert. This is only sound while the cached value is a
//! pure function of the immutable static mapping, so both writes are equal.

use crate::types::{GroupPrincipal, IdpName};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Shared set of verified group principals for one IDP
pub type PrincipalSet = Arc<HashSet<GroupPrincipal>>;

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: usize,
    /// Number of cache misses
    pub misses: usize,
    /// Total number of entries in cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Lock-free cache of verified group principals per IDP
#[derive(Debug, Clone, Default)]
pub struct PrincipalCache {
    /// IDP name → verified principals
    entries: Arc<DashMap<IdpName, PrincipalSet>>,
    /// Cache statistics
    stats: Arc<DashMap<&'static str, usize>>,
}

impl PrincipalCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached principals for an IDP
    pub fn get(&self, idp_name: &str) -> Option<PrincipalSet> {
        match self.entries.get(idp_name) {
            Some(entry) => {
                self.increment_stat("hits");
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.increment_stat("misses");
                None
            }
        }
    }

    /// Store the principals for an IDP
    ///
    /// Overwrites a concurrently inserted value, which is equal by construction.
    pub fn insert(&self, idp_name: impl Into<IdpName>, principals: PrincipalSet) {
        self.entries.insert(idp_name.into(), principals);
    }

    /// Whether the IDP has an entry
    pub fn contains(&self, idp_name: &str) -> bool {
        self.entries.contains_key(idp_name)
    }

    /// Number of populated IDPs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no IDP has been populated yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            entries: self.entries.len(),
        }
    }

    /// Increments a statistic counter
    fn increment_stat(&self, key: &'static str) {
        self.stats
            .entry(key)
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    /// Gets a statistic value
    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}
