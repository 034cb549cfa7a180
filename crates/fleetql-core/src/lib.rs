//! # `FleetQL` Core
//!
//! RSQL filter expression engine for device fleet management.
//!
//! `FleetQL` turns query-string filters such as
//! `distributionSet.name==DS1*;updateStatus=in=(pending,error)` into typed,
//! schema-checked predicates, and pages the matching entities of a storage
//! backend with stable sorting.
//!
//! ## Features
//!
//! - **RSQL**: `==` `!=` `=lt=` `=le=` `=gt=` `=ge=` `=in=` `=out=` `=is=` `=not=`,
//!   `*` wildcards, quoting, `;`/`and`, `,`/`or` and parentheses
//! - **Static schemas**: every entity kind declares its queryable and
//!   sortable fields, including one-hop relations and attribute maps
//! - **Virtual properties**: `${NOW_TS}` and `${OVERDUE_TS}`
//! - **Two backends for one predicate**: in-memory evaluation and
//!   parameterized SQL rendering
//! - **Batch policies**: fail, apply-then-fail or apply-and-succeed when a
//!   batch references missing identifiers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fleetql_core::{EntityKind, FilterEngine, FleetQlConfig, MemoryStore};
//!
//! let engine = FilterEngine::new(FleetQlConfig::load()?);
//! let store = MemoryStore::new();
//! store.load_seed_file("seed.json")?;
//!
//! let page = engine.page_request(EntityKind::Target, Some(0), Some(20), &["name:ASC"])?;
//! let result = engine.find(&store, EntityKind::Target, Some("tag==beta"), &page)?;
//! println!("{} of {}", result.size, result.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::single_match_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::len_without_is_empty)]

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod paging;
#[cfg(test)]
mod paging_tests;
pub mod predicate;
pub mod ql;
pub mod schema;
pub mod store;

pub use batch::{
    apply_with_policy, partition, BatchOutcome, Decision, EntityKey, NotFoundPolicy, Resolution,
};
pub use config::{ConfigError, FleetQlConfig};
pub use engine::FilterEngine;
pub use error::{Error, Result};
pub use model::{NewEntityType, NewTag, NewTargetFilterQuery};
pub use paging::{apply_paging, Direction, PageRequest, PageResult, SortKey};
pub use predicate::{to_predicate, LoweringOptions, Predicate, SqlQuery, SqlRenderer};
pub use ql::{bind, FilterExpression, ParseError, ParseErrorKind, Parser};
pub use schema::{EntityKind, EntitySchema, FieldDef, FieldKind};
pub use store::{EntityStore, MemoryStore};
