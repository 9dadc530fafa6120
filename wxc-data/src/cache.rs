//! Comparison cache keyed by location pair and metric visibility.

use crate::aggregate::ComparisonResult;
use crate::engine::ComparisonWindow;
use crate::visibility::ComparisonConfig;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use wxc_core::location::Location;

/// Cache key: the unordered location pair, the non-scored metrics and the
/// window of months compared.
///
/// Only the set of non-scored metrics changes what gets voted on, so two
/// configurations that agree on it share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    scope: String,
    window: ComparisonWindow,
}

impl CacheKey {
    pub fn new(config: &ComparisonConfig, window: ComparisonWindow) -> CacheKey {
        CacheKey {
            scope: scope_of(config),
            window,
        }
    }
}

/// `"{pair_key}#{sorted non-scored keys}"`, shared by every window.
fn scope_of(config: &ComparisonConfig) -> String {
    let mut excluded: Vec<&str> = config
        .metrics
        .non_scored()
        .into_iter()
        .map(|m| m.key())
        .collect();
    excluded.sort_unstable();
    format!(
        "{}#{}",
        Location::pair_key(&config.loc1, &config.loc2),
        excluded.join(",")
    )
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.scope, self.window.start, self.window.end)
    }
}

/// Thread-safe store of finished comparisons.
///
/// Entries are kept with the locations in key order; lookups for the
/// swapped pair get the mirrored result.
#[derive(Debug, Default)]
pub struct ComparisonCache {
    entries: RwLock<HashMap<CacheKey, Arc<ComparisonResult>>>,
}

impl ComparisonCache {
    pub fn new() -> ComparisonCache {
        ComparisonCache::default()
    }

    /// Stored entry for `key`. An entry that fails its consistency check is
    /// evicted and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<ComparisonResult>> {
        let hit = self.entries.read().get(key).cloned()?;
        if hit.is_consistent() {
            return Some(hit);
        }
        log::warn!("Evicting inconsistent cache entry {key}");
        self.entries.write().remove(key);
        None
    }

    pub fn insert(&self, key: CacheKey, result: ComparisonResult) -> Arc<ComparisonResult> {
        let result = Arc::new(result);
        self.entries.write().insert(key, Arc::clone(&result));
        result
    }

    /// Cached result for `config` over `window`, computing and storing it on
    /// a miss.
    ///
    /// `compute` is always handed the configuration with its locations in
    /// key order, and must return the result for that orientation over
    /// `window`. The lock is not held while computing.
    pub fn get_or_compute<F, E>(
        &self,
        config: &ComparisonConfig,
        window: ComparisonWindow,
        compute: F,
    ) -> Result<ComparisonResult, E>
    where
        F: FnOnce(&ComparisonConfig) -> Result<ComparisonResult, E>,
    {
        let key = CacheKey::new(config, window);
        let canonical = match self.get(&key) {
            Some(hit) => {
                log::debug!("Comparison cache hit for {key}");
                hit
            }
            None => {
                log::debug!("Comparison cache miss for {key}");
                let result = if config.is_canonical() {
                    compute(config)?
                } else {
                    compute(&config.swapped())?
                };
                self.insert(key, result)
            }
        };
        Ok(if config.is_canonical() {
            canonical.as_ref().clone()
        } else {
            canonical.mirrored()
        })
    }

    /// Drop the entries for `config`, whatever their window. Returns true
    /// when any were present.
    pub fn invalidate(&self, config: &ComparisonConfig) -> bool {
        let scope = scope_of(config);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| key.scope != scope);
        let removed = before - entries.len();
        if removed > 0 {
            log::info!("Invalidated {removed} cached comparison(s) for {scope}");
        }
        removed > 0
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
