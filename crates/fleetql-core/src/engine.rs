//! High-level entry point tying parsing, lowering, paging and storage together.
//!
//! ```ignore
//! use fleetql_core::{FilterEngine, FleetQlConfig, MemoryStore, EntityKind};
//!
//! let engine = FilterEngine::new(FleetQlConfig::default());
//! let store = MemoryStore::new();
//! let page = engine.page_request::<&str>(EntityKind::Target, Some(0), Some(20), &["name:ASC"])?;
//! let result = engine.find(&store, EntityKind::Target, Some("updateStatus==error"), &page)?;
//! ```

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::FleetQlConfig;
use crate::error::{Error, Result};
use crate::paging::{apply_paging, PageRequest, PageResult};
use crate::predicate::{to_predicate, LoweringOptions, Predicate, SqlQuery, SqlRenderer};
use crate::ql::{
    bind, BoundExpression, CacheStats, FilterCache, FilterExpression, ParseError, ParseErrorKind,
    VirtualPropertyResolver,
};
use crate::schema::EntityKind;
use crate::store::EntityStore;

/// Property holding the RSQL text of a stored target filter query.
const FILTER_QUERY: &str = "query";

/// Compiles RSQL filters and runs them against a store.
///
/// Cheap to share behind an `Arc`; the parse cache is internally locked.
#[derive(Debug)]
pub struct FilterEngine {
    config: FleetQlConfig,
    cache: FilterCache,
    resolver: VirtualPropertyResolver,
}

impl FilterEngine {
    /// Creates an engine from configuration.
    #[must_use]
    pub fn new(config: FleetQlConfig) -> Self {
        let cache = FilterCache::new(config.query.cache_size);
        let resolver = VirtualPropertyResolver::new(&config.overdue);
        Self {
            config,
            cache,
            resolver,
        }
    }

    /// Replaces the virtual property resolver, e.g. with a pinned clock.
    #[must_use]
    pub fn with_resolver(mut self, resolver: VirtualPropertyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &FleetQlConfig {
        &self.config
    }

    /// Parses `query`, using the cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] for syntax errors and for queries
    /// longer than `query.max_query_length`.
    pub fn parse(&self, query: &str) -> Result<Arc<FilterExpression>> {
        let max = self.config.query.max_query_length;
        if query.len() > max {
            warn!(length = query.len(), max, "rejected oversized query");
            return Err(Error::MalformedQuery(ParseError::new(
                ParseErrorKind::TooLong,
                max,
                "",
                format!("Query is {} bytes long, the limit is {max}", query.len()),
            )));
        }
        Ok(self.cache.parse(query)?)
    }

    /// Parses and binds `query` to the schema of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] for syntax, field and coercion errors.
    pub fn bind(&self, kind: EntityKind, query: &str) -> Result<BoundExpression> {
        let expr = self.parse(query)?;
        Ok(bind(&expr, kind, &self.resolver)?)
    }

    /// Compiles an optional filter. A missing or blank filter matches all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuery`] or [`Error::UnknownField`].
    pub fn compile(&self, kind: EntityKind, query: Option<&str>) -> Result<Predicate> {
        let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
            return Ok(Predicate::Always);
        };
        let bound = self.bind(kind, query)?;
        let predicate = to_predicate(&bound, self.lowering_options())?;
        debug!(entity = %kind, query, "compiled filter");
        Ok(predicate)
    }

    /// Lowering options derived from configuration.
    #[must_use]
    pub fn lowering_options(&self) -> LoweringOptions {
        LoweringOptions {
            ignore_case: self.config.query.ignore_case,
        }
    }

    /// Builds a page request with the configured defaults and limits.
    ///
    /// # Errors
    ///
    /// Propagates sort parse errors.
    pub fn page_request<S: AsRef<str>>(
        &self,
        kind: EntityKind,
        offset: Option<i64>,
        limit: Option<i64>,
        sort: &[S],
    ) -> Result<PageRequest> {
        PageRequest::from_params(kind, offset, limit, sort, &self.config.paging)
    }

    /// Filters and pages entities of `kind`.
    ///
    /// # Errors
    ///
    /// Compilation errors, or storage errors passed through unchanged.
    pub fn find(
        &self,
        store: &dyn EntityStore,
        kind: EntityKind,
        query: Option<&str>,
        page: &PageRequest,
    ) -> Result<PageResult<Value>> {
        let predicate = self.compile(kind, query)?;
        apply_paging(store, kind, &predicate, page)
    }

    /// Pages the targets matched by the stored target filter query `filter_id`.
    ///
    /// # Errors
    ///
    /// - [`Error::EntityNotFound`] if the filter query does not exist.
    /// - [`Error::Validation`] if it has no query text.
    /// - Compilation errors of the stored query.
    pub fn targets_for_filter_query(
        &self,
        store: &dyn EntityStore,
        filter_id: i64,
        page: &PageRequest,
    ) -> Result<PageResult<Value>> {
        let filter = store
            .get(EntityKind::TargetFilterQuery, filter_id)?
            .ok_or_else(|| {
                Error::not_found(EntityKind::TargetFilterQuery.display_name(), [filter_id])
            })?;
        let query = filter
            .get(FILTER_QUERY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::Validation(format!("Target filter query {filter_id} has no query"))
            })?;
        self.find(store, EntityKind::Target, Some(query), page)
    }

    /// Renders the `SELECT` for a filtered page as parameterized SQL.
    ///
    /// # Errors
    ///
    /// Compilation errors.
    pub fn render_sql(
        &self,
        kind: EntityKind,
        query: Option<&str>,
        page: &PageRequest,
    ) -> Result<SqlQuery> {
        let predicate = self.compile(kind, query)?;
        let renderer = SqlRenderer::new(kind, &predicate);
        Ok(renderer.select(&page.effective_sort(kind), page.offset, page.limit))
    }

    /// Parse cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(FleetQlConfig::default())
    }
}
