//! RSQL filter language.
//!
//! ```text
//! name==DS1*;version=ge=2              AND   (';' or 'and')
//! tag==alpha,tag==beta                 OR    (',' or 'or')
//! (status==error,status==warning);active==true
//! updateStatus=in=(pending,error)
//! metadata.region=="eu-west 1"
//! lastControllerRequestAt=lt=${OVERDUE_TS}
//! ```
//!
//! Parsing happens in two steps: [`Parser::parse`] builds a schema-agnostic
//! [`FilterExpression`], and [`bind`] resolves it against an entity schema.
//!
//! ```ignore
//! use fleetql_core::ql::{bind, Parser, VirtualPropertyResolver};
//! use fleetql_core::schema::EntityKind;
//!
//! let expr = Parser::parse("distributionSet.name==DS1*")?;
//! let bound = bind(&expr, EntityKind::Action, &VirtualPropertyResolver::default())?;
//! ```

mod ast;
mod binder;
mod cache;
mod error;
mod parser;
mod virtual_props;

#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod virtual_props_tests;

pub use ast::{Argument, Comparison, FieldPath, FilterExpression, Literal, Operator};
pub use binder::{bind, BoundComparison, BoundExpression, BoundNode, ResolvedPath, Value};
pub use cache::{CacheStats, FilterCache};
pub use error::{ParseError, ParseErrorKind};
pub use parser::Parser;
pub use virtual_props::VirtualPropertyResolver;
