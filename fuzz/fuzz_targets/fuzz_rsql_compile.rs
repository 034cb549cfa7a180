//! Fuzz target for binding, lowering and evaluation.
//!
//! Builds queries from fuzzer-chosen fields, operators and values so that
//! most inputs get past the grammar and exercise the binder.

#![no_main]

use arbitrary::Arbitrary;
use fleetql_core::predicate::NoRelations;
use fleetql_core::{EntityKind, FilterEngine};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

const FIELDS: &[&str] = &[
    "id",
    "name",
    "controllerId",
    "updateStatus",
    "lastControllerRequestAt",
    "attribute.region",
    "tag",
    "assignedDs.name",
];
const OPERATORS: &[&str] = &["==", "!=", "=lt=", "=ge=", "=in=", "=out=", "=is=", "=not="];

#[derive(Debug, Arbitrary)]
struct Term {
    field: u8,
    operator: u8,
    value: String,
}

#[derive(Debug, Arbitrary)]
struct Input {
    terms: Vec<Term>,
    or: Vec<bool>,
}

fuzz_target!(|input: Input| {
    let mut query = String::new();
    for (i, term) in input.terms.iter().take(8).enumerate() {
        if i > 0 {
            query.push(if input.or.get(i).copied().unwrap_or(false) { ',' } else { ';' });
        }
        query.push_str(FIELDS[term.field as usize % FIELDS.len()]);
        query.push_str(OPERATORS[term.operator as usize % OPERATORS.len()]);
        query.push_str(&term.value);
    }

    let engine = FilterEngine::default();
    if let Ok(predicate) = engine.compile(EntityKind::Target, Some(&query)) {
        let doc = json!({ "id": 1, "name": "edge", "controllerAttributes": { "region": "eu" } });
        let _ = predicate.matches(&doc, &NoRelations);
    }
});
