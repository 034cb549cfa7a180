//! Tests for paging and sorting.

use crate::config::PagingConfig;
use crate::error::Error;
use crate::paging::*;
use crate::predicate::Predicate;
use crate::schema::EntityKind;
use crate::store::MemoryStore;
use serde_json::{json, Value};

fn config() -> PagingConfig {
    PagingConfig::default()
}

fn store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .load_seed(&json!({
            "targets": [
                { "id": 1, "controllerId": "c", "name": "beta", "lastControllerRequestAt": 300 },
                { "id": 2, "controllerId": "a", "name": "alpha", "lastControllerRequestAt": null },
                { "id": 3, "controllerId": "b", "name": "beta", "lastControllerRequestAt": 100 },
                { "id": 4, "controllerId": "d", "name": "gamma" },
                { "id": 5, "controllerId": "e", "name": "alpha", "lastControllerRequestAt": 200 }
            ]
        }))
        .expect("seed");
    store
}

fn ids(page: &PageResult<Value>) -> Vec<i64> {
    page.content.iter().filter_map(|d| d["id"].as_i64()).collect()
}

// =========================================================================
// Request parameters
// =========================================================================

#[test]
fn test_page_request_defaults() {
    // Act
    let page = PageRequest::from_params::<&str>(EntityKind::Target, None, None, &[], &config())
        .expect("valid");

    // Assert
    assert_eq!(page.offset, 0);
    assert_eq!(page.limit, 50);
    assert!(page.sort.is_empty());
    assert_eq!(page, PageRequest::default());
}

#[test]
fn test_page_request_clamps() {
    let cfg = config();

    assert_eq!(PageRequest::new(-5, 10, Vec::new(), &cfg).offset, 0);
    assert_eq!(PageRequest::new(0, 0, Vec::new(), &cfg).limit, 1);
    assert_eq!(PageRequest::new(0, -3, Vec::new(), &cfg).limit, 1);
    assert_eq!(PageRequest::new(0, 10_000, Vec::new(), &cfg).limit, 500);
}

#[test]
fn test_sort_parse_multiple_keys_and_case() {
    // Act
    let keys = SortKey::parse_list("NAME:asc, createdAt:DESC,", EntityKind::Target).expect("valid");

    // Assert
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].field, "name");
    assert_eq!(keys[0].direction, Direction::Asc);
    assert_eq!(keys[1].field, "createdAt");
    assert_eq!(keys[1].direction, Direction::Desc);
    assert_eq!(keys[1].to_string(), "createdAt:DESC");
}

#[test]
fn test_sort_repeated_parameters_concatenate() {
    let page = PageRequest::from_params(
        EntityKind::Target,
        Some(0),
        Some(10),
        &["name:ASC", "controllerId:DESC"],
        &config(),
    )
    .expect("valid");

    let fields: Vec<&str> = page.sort.iter().map(|k| k.field).collect();
    assert_eq!(fields, vec!["name", "controllerId"]);
}

#[test]
fn test_sort_missing_direction_is_malformed() {
    let err = SortKey::parse_list("name", EntityKind::Target).unwrap_err();

    assert!(matches!(err, Error::MalformedQuery(_)));
}

#[test]
fn test_sort_bad_direction_is_malformed() {
    let err = SortKey::parse_list("name:UP", EntityKind::Target).unwrap_err();

    match err {
        Error::MalformedQuery(e) => assert_eq!(e.fragment, "UP"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_sort_unknown_or_unsortable_field() {
    for raw in ["colour:ASC", "tag:ASC", "metadata:ASC", "securityToken:ASC"] {
        let err = SortKey::parse_list(raw, EntityKind::Target).unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }), "{raw}");
    }
}

#[test]
fn test_effective_sort_appends_id_tiebreaker_once() {
    // Arrange
    let by_name = SortKey::parse_list("name:DESC", EntityKind::Target).expect("valid");
    let by_id = SortKey::parse_list("id:DESC", EntityKind::Target).expect("valid");

    // Act
    let with_tiebreak = PageRequest::new(0, 10, by_name, &config()).effective_sort(EntityKind::Target);
    let explicit = PageRequest::new(0, 10, by_id, &config()).effective_sort(EntityKind::Target);

    // Assert
    assert_eq!(with_tiebreak.len(), 2);
    assert_eq!(with_tiebreak[1].field, "id");
    assert_eq!(with_tiebreak[1].direction, Direction::Asc);
    assert_eq!(explicit.len(), 1);
    assert_eq!(explicit[0].direction, Direction::Desc);
}

// =========================================================================
// apply_paging
// =========================================================================

#[test]
fn test_apply_paging_default_order_is_id() {
    let page = apply_paging(&store(), EntityKind::Target, &Predicate::Always, &PageRequest::default())
        .expect("page");

    assert_eq!(ids(&page), vec![1, 2, 3, 4, 5]);
    assert_eq!(page.total, 5);
    assert_eq!(page.size, 5);
}

#[test]
fn test_apply_paging_sorts_with_tiebreaker() {
    // Arrange
    let sort = SortKey::parse_list("name:ASC", EntityKind::Target).expect("valid");
    let request = PageRequest::new(0, 10, sort, &config());

    // Act
    let page = apply_paging(&store(), EntityKind::Target, &Predicate::Always, &request).expect("page");

    // Assert - ties on name are broken by id
    assert_eq!(ids(&page), vec![2, 5, 1, 3, 4]);
}

#[test]
fn test_apply_paging_nulls_last_in_both_directions() {
    let store = store();
    for (raw, expected) in [
        ("lastControllerRequestAt:ASC", vec![3, 5, 1, 2, 4]),
        ("lastControllerRequestAt:DESC", vec![1, 5, 3, 2, 4]),
    ] {
        let sort = SortKey::parse_list(raw, EntityKind::Target).expect("valid");
        let request = PageRequest::new(0, 10, sort, &config());

        let page = apply_paging(&store, EntityKind::Target, &Predicate::Always, &request)
            .expect("page");

        assert_eq!(ids(&page), expected, "{raw}");
    }
}

#[test]
fn test_apply_paging_windows() {
    // Arrange
    let store = store();
    let request = PageRequest::new(2, 2, Vec::new(), &config());

    // Act
    let page = apply_paging(&store, EntityKind::Target, &Predicate::Always, &request).expect("page");
    let last = apply_paging(
        &store,
        EntityKind::Target,
        &Predicate::Always,
        &PageRequest::new(4, 2, Vec::new(), &config()),
    )
    .expect("page");
    let beyond = apply_paging(
        &store,
        EntityKind::Target,
        &Predicate::Always,
        &PageRequest::new(7, 2, Vec::new(), &config()),
    )
    .expect("page");

    // Assert
    assert_eq!(ids(&page), vec![3, 4]);
    assert_eq!(ids(&last), vec![5]);
    assert!(beyond.content.is_empty());
    assert_eq!(beyond.total, 5);
}

#[test]
fn test_page_result_map_keeps_total() {
    let page = PageResult::new(vec![1, 2], 10).map(|n| n * 2);

    assert_eq!(page.content, vec![2, 4]);
    assert_eq!(page.total, 10);
    assert_eq!(page.size, 2);
}
