//! Offset/limit paging with stable multi-key sorting.
//!
//! A page is requested with `offset`, `limit` and a list of sort keys written
//! as `FIELD:ASC|DESC`. Every effective sort ends with `id ASC` so that two
//! requests for consecutive pages of the same filter never overlap.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use tracing::warn;

use crate::config::PagingConfig;
use crate::error::{Error, Result};
use crate::predicate::{sort_order, Predicate};
use crate::ql::ParseError;
use crate::schema::{EntityKind, FieldKind};
use crate::store::EntityStore;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

/// One sort key resolved against an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortKey {
    /// Field name as declared.
    pub field: &'static str,
    /// Document property.
    pub property: &'static str,
    /// Direction.
    pub direction: Direction,
}

impl SortKey {
    /// Parses a comma separated list such as `name:ASC,createdAt:desc`.
    ///
    /// Empty items are skipped, so a trailing comma is accepted.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedQuery`] for a missing `:` or an unknown direction.
    /// - [`Error::UnknownField`] for fields that are not sortable on `kind`.
    pub fn parse_list(raw: &str, kind: EntityKind) -> Result<Vec<Self>> {
        let schema = kind.schema();
        let mut keys = Vec::new();
        let mut position = 0;

        for item in raw.split(',') {
            let start = position;
            position += item.len() + 1;
            let item = item.trim();
            if item.is_empty() {
                continue;
            }

            let (name, direction) = item.split_once(':').ok_or_else(|| {
                Error::MalformedQuery(ParseError::unexpected_token(
                    start,
                    item,
                    "FIELD:ASC or FIELD:DESC",
                ))
            })?;

            let direction = match direction.trim().to_ascii_uppercase().as_str() {
                "ASC" => Direction::Asc,
                "DESC" => Direction::Desc,
                _ => {
                    return Err(Error::MalformedQuery(ParseError::unexpected_token(
                        start + name.len() + 1,
                        direction.trim(),
                        "ASC or DESC",
                    )))
                }
            };

            let field = schema
                .field(name.trim())
                .filter(|f| f.sortable && f.queryable && is_sortable_kind(f.kind))
                .ok_or_else(|| {
                    warn!(entity = %kind, field = name.trim(), "rejected sort field");
                    Error::unknown_field(kind.display_name(), name.trim())
                })?;

            keys.push(Self {
                field: field.name,
                property: field.property,
                direction,
            });
        }

        Ok(keys)
    }
}

const fn is_sortable_kind(kind: FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::Text
            | FieldKind::Integer
            | FieldKind::Boolean
            | FieldKind::Timestamp
            | FieldKind::Enum(_)
    )
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction)
    }
}

/// Requested page, with limits already clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return, at least one.
    pub limit: usize,
    /// Caller supplied sort keys, without the tiebreaker.
    pub sort: Vec<SortKey>,
}

impl PageRequest {
    /// Builds a request, clamping `offset` to `>= 0` and `limit` into
    /// `[1, config.max_limit]`.
    #[must_use]
    pub fn new(offset: i64, limit: i64, sort: Vec<SortKey>, config: &PagingConfig) -> Self {
        let max = config.max_limit.max(1);
        let limit = usize::try_from(limit.max(1)).unwrap_or(max).min(max);
        Self {
            offset: usize::try_from(offset).unwrap_or(0),
            limit,
            sort,
        }
    }

    /// Builds a request from raw query parameters.
    ///
    /// Each `sort` entry may itself hold several comma separated keys.
    ///
    /// # Errors
    ///
    /// Propagates sort parse errors.
    pub fn from_params<S: AsRef<str>>(
        kind: EntityKind,
        offset: Option<i64>,
        limit: Option<i64>,
        sort: &[S],
        config: &PagingConfig,
    ) -> Result<Self> {
        let mut keys = Vec::new();
        for raw in sort {
            keys.extend(SortKey::parse_list(raw.as_ref(), kind)?);
        }
        let limit = limit.unwrap_or(i64::try_from(config.default_limit).unwrap_or(i64::MAX));
        Ok(Self::new(offset.unwrap_or(0), limit, keys, config))
    }

    /// Caller sort keys followed by `id ASC`, unless `id` is already a key.
    #[must_use]
    pub fn effective_sort(&self, kind: EntityKind) -> Vec<SortKey> {
        let id = kind.schema().id_field();
        let mut sort = self.sort.clone();
        if !sort.iter().any(|key| key.field == id.name) {
            sort.push(SortKey {
                field: id.name,
                property: id.property,
                direction: Direction::Asc,
            });
        }
        sort
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        let config = PagingConfig::default();
        Self {
            offset: 0,
            limit: config.default_limit,
            sort: Vec::new(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    /// Rows of this page.
    pub content: Vec<T>,
    /// Rows matching the filter, ignoring paging.
    pub total: u64,
    /// Number of rows in `content`.
    pub size: usize,
}

impl<T> PageResult<T> {
    /// Wraps `content` with the unpaged `total`.
    #[must_use]
    pub fn new(content: Vec<T>, total: u64) -> Self {
        let size = content.len();
        Self {
            content,
            total,
            size,
        }
    }

    /// Maps every row, keeping `total`.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult::new(self.content.into_iter().map(f).collect(), self.total)
    }
}

/// Runs `predicate` against `store` and returns the requested page.
///
/// `offset >= total` yields empty content with the real `total`.
///
/// # Errors
///
/// Storage errors are passed through unchanged.
pub fn apply_paging(
    store: &dyn EntityStore,
    kind: EntityKind,
    predicate: &Predicate,
    page: &PageRequest,
) -> Result<PageResult<Value>> {
    store.page(
        kind,
        predicate,
        &page.effective_sort(kind),
        page.offset,
        page.limit,
    )
}

/// Compares two documents by `sort`. Nulls sort last in both directions.
#[must_use]
pub(crate) fn compare_documents(a: &Value, b: &Value, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let left = a.get(key.property).filter(|v| !v.is_null());
        let right = b.get(key.property).filter(|v| !v.is_null());
        let ordering = match (left, right, key.direction) {
            (Some(_), Some(_), Direction::Desc) => sort_order(right, left),
            _ => sort_order(left, right),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
