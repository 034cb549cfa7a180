//! Parameterized SQL rendering of predicates.
//!
//! Layout conventions:
//!
//! - root table aliased `t0`, columns are snake_case document properties
//! - to-one relations: `LEFT JOIN <table> jN ON jN.id = t0.<relation>_id`
//! - to-many relations: `EXISTS` over link table `<root>_<relation>(owner_id, related_id)`
//! - maps: `EXISTS` over `<root>_<property>(owner_id, entry_key, entry_value)`
//! - `ORDER BY` puts nulls last in both directions, like the in-memory sort

use serde::Serialize;
use std::fmt::Write as _;

use super::{Criterion, Predicate, Scalar, Target, Test};
use crate::paging::{Direction, SortKey};
use crate::schema::EntityKind;

/// Rendered statement with positional `?` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlQuery {
    /// SQL text.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Scalar>,
}

/// Renders predicates for one root entity.
#[derive(Debug)]
pub struct SqlRenderer {
    entity: EntityKind,
    joins: Vec<(&'static str, String)>,
    params: Vec<Scalar>,
    next_alias: usize,
    condition: String,
}

impl SqlRenderer {
    /// Renders `predicate` as the filter of a query on `entity`.
    #[must_use]
    pub fn new(entity: EntityKind, predicate: &Predicate) -> Self {
        let mut renderer = Self {
            entity,
            joins: Vec::new(),
            params: Vec::new(),
            next_alias: 1,
            condition: String::new(),
        };
        renderer.condition = renderer.render(predicate);
        renderer
    }

    /// The `WHERE` condition alone.
    #[must_use]
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// `SELECT` of the requested page.
    #[must_use]
    pub fn select(&self, sort: &[SortKey], offset: usize, limit: usize) -> SqlQuery {
        let mut sql = format!("SELECT t0.* FROM {}", self.from_clause());
        if !sort.is_empty() {
            let order: Vec<String> = sort
                .iter()
                .map(|key| {
                    let direction = match key.direction {
                        Direction::Asc => "ASC",
                        Direction::Desc => "DESC",
                    };
                    // Primary keys are never null.
                    if key.property == "id" {
                        format!("t0.id {direction}")
                    } else {
                        format!("t0.{} {direction} NULLS LAST", snake_case(key.property))
                    }
                })
                .collect();
            let _ = write!(sql, " ORDER BY {}", order.join(", "));
        }
        let _ = write!(sql, " LIMIT {limit} OFFSET {offset}");
        SqlQuery {
            sql,
            params: self.params.clone(),
        }
    }

    /// `COUNT` ignoring paging.
    #[must_use]
    pub fn count(&self) -> SqlQuery {
        SqlQuery {
            sql: format!("SELECT COUNT(t0.id) FROM {}", self.from_clause()),
            params: self.params.clone(),
        }
    }

    fn from_clause(&self) -> String {
        let mut out = format!("{} t0", self.entity.table());
        for (_, join) in &self.joins {
            out.push(' ');
            out.push_str(join);
        }
        let _ = write!(out, " WHERE {}", self.condition);
        out
    }

    fn alias(&mut self, prefix: &str) -> String {
        let alias = format!("{prefix}{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    fn render(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Always => "1 = 1".to_string(),
            Predicate::Compare(criterion) => self.render_criterion(criterion),
            Predicate::Not(inner) => format!("NOT ({})", self.render(inner)),
            Predicate::All(children) => self.render_list(children, " AND ", "1 = 1"),
            Predicate::Any(children) => self.render_list(children, " OR ", "1 = 0"),
        }
    }

    fn render_list(&mut self, children: &[Predicate], separator: &str, empty: &str) -> String {
        match children {
            [] => empty.to_string(),
            [only] => self.render(only),
            _ => {
                let parts: Vec<String> = children.iter().map(|c| self.render(c)).collect();
                format!("({})", parts.join(separator))
            }
        }
    }

    fn render_criterion(&mut self, criterion: &Criterion) -> String {
        match &criterion.target {
            Target::Column { property } => {
                let column = format!("t0.{}", snake_case(property));
                self.render_test(&column, criterion)
            }
            Target::Joined {
                relation,
                entity,
                property,
            } => {
                let alias = self.join_alias(relation, *entity);
                let column = format!("{alias}.{}", snake_case(property));
                self.render_test(&column, criterion)
            }
            Target::Each {
                relation,
                entity,
                property,
            } => {
                let link = self.alias("l");
                let element = self.alias("e");
                let column = format!("{element}.{}", snake_case(property));
                let test = self.render_test(&column, criterion);
                format!(
                    "EXISTS (SELECT 1 FROM {}_{} {link} JOIN {} {element} ON {element}.id = {link}.related_id WHERE {link}.owner_id = t0.id AND {test})",
                    self.entity.table(),
                    snake_case(relation),
                    entity.table(),
                )
            }
            Target::MapEntry { property, key } => {
                let alias = self.alias("m");
                self.params.push(Scalar::Text(key.clone()));
                let column = format!("{alias}.entry_value");
                let (quantifier, test) = match criterion.test {
                    Test::IsNull => ("NOT EXISTS", format!("{column} IS NOT NULL")),
                    Test::IsNotNull => ("EXISTS", format!("{column} IS NOT NULL")),
                    _ => ("EXISTS", self.render_test(&column, criterion)),
                };
                format!(
                    "{quantifier} (SELECT 1 FROM {}_{} {alias} WHERE {alias}.owner_id = t0.id AND {alias}.entry_key = ? AND {test})",
                    self.entity.table(),
                    snake_case(property),
                )
            }
        }
    }

    fn join_alias(&mut self, relation: &'static str, entity: EntityKind) -> String {
        if let Some(index) = self.joins.iter().position(|(r, _)| *r == relation) {
            return format!("j{}", index + 1);
        }
        let alias = format!("j{}", self.joins.len() + 1);
        let join = format!(
            "LEFT JOIN {} {alias} ON {alias}.id = t0.{}_id",
            entity.table(),
            snake_case(relation)
        );
        self.joins.push((relation, join));
        alias
    }

    fn render_test(&mut self, column: &str, criterion: &Criterion) -> String {
        let ci = criterion.case_insensitive;
        let c = if ci {
            format!("LOWER({column})")
        } else {
            column.to_string()
        };

        match &criterion.test {
            Test::IsNull => format!("{column} IS NULL"),
            Test::IsNotNull => format!("{column} IS NOT NULL"),
            Test::NullOrEmpty => format!("({column} IS NULL OR {column} = '')"),
            Test::NotNullNorEmpty => format!("({column} IS NOT NULL AND {column} <> '')"),
            Test::Equals(v) => self.binary(&c, "=", v, ci),
            Test::NotEquals(v) => {
                let cmp = self.binary(&c, "<>", v, ci);
                format!("({column} IS NULL OR {cmp})")
            }
            Test::Less(v) => self.binary(&c, "<", v, ci),
            Test::LessOrEqual(v) => self.binary(&c, "<=", v, ci),
            Test::Greater(v) => self.binary(&c, ">", v, ci),
            Test::GreaterOrEqual(v) => self.binary(&c, ">=", v, ci),
            Test::In(values) => {
                let list = self.placeholders(values, ci);
                format!("{c} IN ({list})")
            }
            Test::NotIn(values) => {
                let list = self.placeholders(values, ci);
                format!("({column} IS NULL OR {c} NOT IN ({list}))")
            }
            Test::Like(pattern) => {
                let pattern = if ci { pattern.to_lowercase() } else { pattern.clone() };
                self.params.push(Scalar::Text(pattern.to_sql()));
                format!("{c} LIKE ? ESCAPE '\\'")
            }
            Test::NotLike(pattern) => {
                let pattern = if ci { pattern.to_lowercase() } else { pattern.clone() };
                self.params.push(Scalar::Text(pattern.to_sql()));
                format!("({column} IS NULL OR {c} NOT LIKE ? ESCAPE '\\')")
            }
        }
    }

    fn binary(&mut self, column: &str, op: &str, value: &Scalar, ci: bool) -> String {
        self.push_param(value, ci);
        format!("{column} {op} ?")
    }

    fn placeholders(&mut self, values: &[Scalar], ci: bool) -> String {
        for value in values {
            self.push_param(value, ci);
        }
        vec!["?"; values.len()].join(", ")
    }

    fn push_param(&mut self, value: &Scalar, ci: bool) {
        self.params.push(if ci {
            value.to_lowercase()
        } else {
            value.clone()
        });
    }
}

/// `controllerId` -> `controller_id`.
#[must_use]
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
