//! Cache for parsed filter expressions.
//!
//! Least-recently-used cache keyed by the raw query string. Only the syntax
//! tree is cached: binding runs on every call, so `${NOW_TS}` style values are
//! always expanded against the current clock.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::ast::FilterExpression;
use super::error::ParseError;
use super::Parser;

/// Statistics for the expression cache.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of evictions.
    pub evictions: u64,
}

impl CacheStats {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = (self.hits as f64 / total as f64) * 100.0;
            rate
        }
    }
}

struct Slot {
    expr: Arc<FilterExpression>,
    last_used: u64,
}

/// Entries plus a recency index: `recency` maps the tick of each entry's last
/// use to its query, so the first key is always the eviction candidate.
#[derive(Default)]
struct State {
    slots: FxHashMap<Arc<str>, Slot>,
    recency: BTreeMap<u64, Arc<str>>,
    tick: u64,
    stats: CacheStats,
}

impl State {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn lookup(&mut self, query: &str) -> Option<Arc<FilterExpression>> {
        let tick = self.next_tick();
        let (key, slot) = self.slots.get_key_value(query)?;
        let key = Arc::clone(key);
        let previous = slot.last_used;
        let expr = Arc::clone(&slot.expr);

        self.recency.remove(&previous);
        self.recency.insert(tick, Arc::clone(&key));
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.last_used = tick;
        }
        Some(expr)
    }

    fn store(&mut self, query: &str, expr: Arc<FilterExpression>, capacity: usize) {
        while self.slots.len() >= capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.slots.remove(&oldest);
            self.stats.evictions += 1;
        }

        let tick = self.next_tick();
        let key: Arc<str> = Arc::from(query);
        self.recency.insert(tick, Arc::clone(&key));
        self.slots.insert(
            key,
            Slot {
                expr,
                last_used: tick,
            },
        );
    }
}

/// LRU cache for parsed RSQL expressions.
///
/// A hit refreshes the entry; when full, the entry unused for the longest
/// time is evicted. Thread-safe behind one `parking_lot::Mutex`.
pub struct FilterCache {
    state: Mutex<State>,
    max_size: usize,
}

impl FilterCache {
    /// Creates a new cache holding at most `max_size` expressions (minimum 1).
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            max_size: max_size.max(1),
        }
    }

    /// Parses a query, returning the cached tree if available.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the query is invalid. Failures are not cached.
    pub fn parse(&self, query: &str) -> Result<Arc<FilterExpression>, ParseError> {
        {
            let mut state = self.state.lock();
            if let Some(expr) = state.lookup(query) {
                state.stats.hits += 1;
                return Ok(expr);
            }
        }

        // Parsing runs unlocked; a concurrent miss on the same text stores an
        // equal tree.
        let parsed = Arc::new(Parser::parse(query)?);

        let mut state = self.state.lock();
        state.stats.misses += 1;
        if state.lookup(query).is_none() {
            state.store(query, Arc::clone(&parsed), self.max_size);
        }
        Ok(parsed)
    }

    /// Returns true if `query` is cached. Does not refresh the entry.
    #[must_use]
    pub fn contains(&self, query: &str) -> bool {
        self.state.lock().slots.contains_key(query)
    }

    /// Returns current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    /// Returns the current number of cached expressions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().slots.is_empty()
    }

    /// Clears all cached expressions and resets statistics.
    pub fn clear(&self) {
        *self.state.lock() = State::default();
    }
}

impl std::fmt::Debug for FilterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCache")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

impl Default for FilterCache {
    fn default() -> Self {
        Self::new(1000)
    }
}
