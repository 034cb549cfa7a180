//! Tests for the in-memory store.

use super::*;
use crate::batch::{EntityKey, NotFoundPolicy};
use crate::predicate::{to_predicate, LoweringOptions, RelationLookup};
use crate::ql::{bind, Parser, VirtualPropertyResolver};
use crate::Error;
use serde_json::json;

fn compile(query: &str, kind: EntityKind) -> Predicate {
    let expr = Parser::parse(query).expect("parse");
    let bound = bind(&expr, kind, &VirtualPropertyResolver::default()).expect("bind");
    to_predicate(&bound, LoweringOptions::default()).expect("lower")
}

fn targets_with_tag() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .load_seed(&json!({
            "targettags": [{ "id": 1, "name": "alpha" }],
            "targets": [
                { "id": 1, "controllerId": "dev-1" },
                { "id": 2, "controllerId": "dev-2" },
                { "id": 3, "controllerId": "dev-3" }
            ]
        }))
        .expect("seed");
    store
}

fn tagged_ids(store: &MemoryStore) -> Vec<i64> {
    let predicate = compile("tag==alpha", EntityKind::Target);
    store
        .fetch(EntityKind::Target, &predicate, &[], 0, 100)
        .expect("fetch")
        .iter()
        .filter_map(|doc| doc["id"].as_i64())
        .collect()
}

fn keys(ids: &[i64]) -> Vec<EntityKey> {
    ids.iter().copied().map(EntityKey::Id).collect()
}

// =========================================================================
// Documents
// =========================================================================

#[test]
fn test_insert_assigns_sequential_ids() {
    // Arrange
    let store = MemoryStore::new();

    // Act
    let first = store.insert(EntityKind::Target, json!({ "name": "a" })).expect("insert");
    let second = store.insert(EntityKind::Target, json!({ "name": "b" })).expect("insert");
    let explicit = store
        .insert(EntityKind::Target, json!({ "id": 10, "name": "c" }))
        .expect("insert");
    let after = store.insert(EntityKind::Target, json!({ "name": "d" })).expect("insert");

    // Assert
    assert_eq!((first, second, explicit, after), (1, 2, 10, 11));
    assert_eq!(store.len(EntityKind::Target), 4);
    assert_eq!(
        store.get(EntityKind::Target, 2).expect("get"),
        Some(json!({ "id": 2, "name": "b" }))
    );
}

#[test]
fn test_insert_rejects_non_objects() {
    let store = MemoryStore::new();

    assert!(matches!(
        store.insert(EntityKind::Target, json!([1, 2])),
        Err(Error::Validation(_))
    ));
    assert!(matches!(
        store.insert(EntityKind::Target, json!({ "id": "x" })),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_seed_with_unknown_collection_inserts_nothing() {
    // Arrange
    let store = MemoryStore::new();

    // Act
    let result = store.load_seed(&json!({
        "targets": [{ "controllerId": "a" }],
        "gadgets": []
    }));

    // Assert
    assert!(result.is_err());
    assert!(store.is_empty());
}

#[test]
fn test_relations_resolve_by_id() {
    // Arrange
    let store = MemoryStore::new();
    store
        .load_seed(&json!({
            "distributionsets": [
                { "id": 1, "name": "DS1-a" },
                { "id": 2, "name": "DS1-b" },
                { "id": 3, "name": "DS2" },
                { "id": 4, "name": "DS3" }
            ],
            "actions": [
                { "id": 1, "distributionSet": 1 },
                { "id": 2, "distributionSet": 2 },
                { "id": 3, "distributionSet": 3 },
                { "id": 4, "distributionSet": 4 },
                { "id": 5, "distributionSet": 4 }
            ]
        }))
        .expect("seed");

    // Act
    let predicate = compile(
        "distributionSet.name==DS1*,distributionSet.name==DS2*",
        EntityKind::Action,
    );
    let total = store.count(EntityKind::Action, &predicate).expect("count");

    // Assert
    assert_eq!(total, 3);
    let view = store.read();
    assert_eq!(
        view.related(EntityKind::DistributionSet, 3).map(|d| d["name"].clone()),
        Some(json!("DS2"))
    );
    assert_eq!(view.documents(EntityKind::Action).count(), 5);
}

#[test]
fn test_page_offset_past_total_is_empty() {
    let store = targets_with_tag();

    let page = store
        .page(EntityKind::Target, &Predicate::Always, &[], 3, 10)
        .expect("page");

    assert!(page.content.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.size, 0);
}

// =========================================================================
// Tag assignment
// =========================================================================

#[test]
fn test_assign_fail_policy_changes_nothing() {
    // Arrange
    let store = targets_with_tag();

    // Act
    let err = store
        .assign_tag(
            EntityKind::TargetTag,
            1,
            &keys(&[1, 2, 3, 4, 5]),
            NotFoundPolicy::FailOnAnyMissing,
        )
        .unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "[FQL-003] Target not found: [4, 5]");
    assert!(tagged_ids(&store).is_empty());
}

#[test]
fn test_assign_apply_then_fail_tags_found() {
    let store = targets_with_tag();

    let err = store
        .assign_tag(
            EntityKind::TargetTag,
            1,
            &keys(&[1, 2, 3, 4, 5]),
            NotFoundPolicy::ApplyToFoundAndFail,
        )
        .unwrap_err();

    assert!(matches!(err, Error::EntityNotFound { ref ids, .. } if ids == &["4", "5"]));
    assert_eq!(tagged_ids(&store), vec![1, 2, 3]);
}

#[test]
fn test_assign_apply_and_succeed_tags_found() {
    // Act
    let store = targets_with_tag();
    let outcome = store
        .assign_tag(
            EntityKind::TargetTag,
            1,
            &keys(&[1, 2, 3, 4, 5]),
            NotFoundPolicy::ApplyToFoundAndSucceed,
        )
        .expect("succeeds");

    // Assert
    assert_eq!(outcome.applied, vec![1, 2, 3]);
    assert_eq!(outcome.value, 3);
    let reported = serde_json::to_string(&outcome).expect("serialize");
    assert!(!reported.contains('4') && !reported.contains('5'));
    assert_eq!(tagged_ids(&store), vec![1, 2, 3]);
}

#[test]
fn test_assign_by_business_key_is_idempotent() {
    let store = targets_with_tag();
    let by_key = vec![EntityKey::from("dev-2"), EntityKey::Id(2)];

    let first = store
        .assign_tag(EntityKind::TargetTag, 1, &by_key, NotFoundPolicy::FailOnAnyMissing)
        .expect("assign");
    let second = store
        .assign_tag(EntityKind::TargetTag, 1, &by_key, NotFoundPolicy::FailOnAnyMissing)
        .expect("assign");

    assert_eq!(first.applied, vec![2]);
    assert_eq!(first.value, 1);
    assert_eq!(second.value, 0);
    assert_eq!(tagged_ids(&store), vec![2]);
}

#[test]
fn test_unassign_removes_tag() {
    let store = targets_with_tag();
    store
        .assign_tag(EntityKind::TargetTag, 1, &keys(&[1, 2]), NotFoundPolicy::default())
        .expect("assign");

    let outcome = store
        .unassign_tag(EntityKind::TargetTag, 1, &keys(&[1, 3]), NotFoundPolicy::default())
        .expect("unassign");

    assert_eq!(outcome.value, 1);
    assert_eq!(tagged_ids(&store), vec![2]);
}

#[test]
fn test_assign_missing_tag_is_not_found() {
    let store = targets_with_tag();

    let err = store
        .assign_tag(EntityKind::TargetTag, 99, &keys(&[1]), NotFoundPolicy::default())
        .unwrap_err();

    assert_eq!(err.to_string(), "[FQL-003] TargetTag not found: [99]");
}

#[test]
fn test_assign_requires_tag_kind() {
    let store = targets_with_tag();

    let err = store
        .assign_tag(EntityKind::Rollout, 1, &keys(&[1]), NotFoundPolicy::default())
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
}
