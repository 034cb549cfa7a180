//! Storage facade consumed by paging and batch operations.
//!
//! The engine never talks to a database directly. It hands an
//! [`EntityStore`] a lowered [`Predicate`] plus sort and window, and receives
//! JSON documents back. [`MemoryStore`] is the reference implementation.

mod memory;

#[cfg(test)]
mod memory_tests;

pub use memory::{MemoryStore, MemoryView};

use serde_json::Value;

use crate::error::Result;
use crate::paging::{PageResult, SortKey};
use crate::predicate::Predicate;
use crate::schema::EntityKind;

/// Read access to entity documents.
pub trait EntityStore: Send + Sync {
    /// Counts documents of `kind` matching `predicate`, ignoring paging.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the backend fails.
    fn count(&self, kind: EntityKind, predicate: &Predicate) -> Result<u64>;

    /// Fetches one window of matching documents in `sort` order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the backend fails.
    fn fetch(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[SortKey],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>>;

    /// Fetches one document by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Storage`] if the backend fails.
    fn get(&self, kind: EntityKind, id: i64) -> Result<Option<Value>>;

    /// Counts, then fetches.
    ///
    /// The two reads are separate calls; a backend that can serve both from
    /// one snapshot should override this.
    ///
    /// # Errors
    ///
    /// Passes through errors from [`count`](Self::count) and
    /// [`fetch`](Self::fetch).
    fn page(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[SortKey],
        offset: usize,
        limit: usize,
    ) -> Result<PageResult<Value>> {
        let total = self.count(kind, predicate)?;
        if u64::try_from(offset).unwrap_or(u64::MAX) >= total {
            return Ok(PageResult::new(Vec::new(), total));
        }
        let content = self.fetch(kind, predicate, sort, offset, limit)?;
        Ok(PageResult::new(content, total))
    }
}
