//! Run-scoped memoised sequence cache
//!
//! Guarantees at most one external lookup per [`CacheKey`] for the life of
//! the cache. Failed lookups are remembered too, so a bad identifier shared
//! by many rows costs one call, not one per row.

use crate::identifier::{CacheKey, Identifier};
use crate::sources::SequenceLookup;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of the one lookup made for a key
///
/// A key with no entry has not been attempted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Resolved(String),
    Failed,
}

impl CacheEntry {
    pub fn sequence(&self) -> Option<&str> {
        match self {
            CacheEntry::Resolved(sequence) => Some(sequence),
            CacheEntry::Failed => None,
        }
    }
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// External calls actually made
    pub lookups: usize,
    /// Resolutions served from the cache
    pub hits: usize,
    /// External calls that produced no sequence
    pub failures: usize,
}

pub struct SequenceCache {
    entries: HashMap<CacheKey, CacheEntry>,
    pacing: Duration,
    stats: CacheStats,
}

impl SequenceCache {
    /// Empty cache that sleeps `pacing` after every external call
    pub fn new(pacing: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            pacing,
            stats: CacheStats::default(),
        }
    }

    /// Sequence for `identifier`, calling `lookup` only on first sight
    ///
    /// Lookup failures are logged and remembered; they come back as `None`.
    pub async fn resolve<L>(&mut self, identifier: &Identifier, lookup: &L) -> Option<String>
    where
        L: SequenceLookup + ?Sized,
    {
        let key = identifier.cache_key();

        let entry = match self.entries.entry(key) {
            Entry::Occupied(occupied) => {
                self.stats.hits += 1;
                debug!(key = %occupied.key(), "Sequence cache hit");
                occupied.into_mut()
            },
            Entry::Vacant(vacant) => {
                let outcome = match lookup.lookup(identifier).await {
                    Ok(sequence) => CacheEntry::Resolved(sequence),
                    Err(err) => {
                        self.stats.failures += 1;
                        warn!(identifier = %identifier, error = %err, "Sequence lookup failed");
                        CacheEntry::Failed
                    },
                };
                self.stats.lookups += 1;

                let entry = vacant.insert(outcome);
                if !self.pacing.is_zero() {
                    tokio::time::sleep(self.pacing).await;
                }
                entry
            },
        };

        entry.sequence().map(str::to_string)
    }

    /// Stored outcome for `key`, `None` if never attempted
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
