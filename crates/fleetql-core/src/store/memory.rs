//! In-memory document store.

use parking_lot::{RwLock, RwLockReadGuard};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use super::EntityStore;
use crate::batch::{apply_with_policy, BatchOutcome, EntityKey, NotFoundPolicy};
use crate::error::{Error, Result};
use crate::paging::{compare_documents, PageResult, SortKey};
use crate::predicate::{Predicate, RelationLookup};
use crate::schema::EntityKind;

type Collections = FxHashMap<EntityKind, BTreeMap<i64, Value>>;

/// Property holding tag references on taggable documents.
const TAGS: &str = "tags";

/// Thread-safe in-memory store of JSON documents, one collection per kind.
///
/// Relation properties hold either embedded objects or numeric ids of
/// documents in the related collection; to-many relations hold arrays.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document.
    ///
    /// A numeric `id` in the document is kept; otherwise the next free id of
    /// the collection is assigned and written back into the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `doc` is not a JSON object or its id is
    /// not an integer.
    pub fn insert(&self, kind: EntityKind, doc: Value) -> Result<i64> {
        let mut guard = self.collections.write();
        Self::insert_locked(&mut guard, kind, doc)
    }

    fn insert_locked(collections: &mut Collections, kind: EntityKind, doc: Value) -> Result<i64> {
        let Value::Object(mut fields) = doc else {
            return Err(Error::Validation(format!(
                "{} documents must be JSON objects",
                kind.display_name()
            )));
        };

        let collection = collections.entry(kind).or_default();
        let id = match fields.get("id") {
            None | Some(Value::Null) => collection.keys().next_back().map_or(1, |last| last + 1),
            Some(value) => value.as_i64().ok_or_else(|| {
                Error::Validation(format!("{} id must be an integer", kind.display_name()))
            })?,
        };
        fields.insert("id".to_string(), Value::from(id));
        collection.insert(id, Value::Object(fields));
        Ok(id)
    }

    /// Number of documents of `kind`.
    #[must_use]
    pub fn len(&self, kind: EntityKind) -> usize {
        self.collections.read().get(&kind).map_or(0, BTreeMap::len)
    }

    /// Returns true if no collection holds documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.read().values().all(BTreeMap::is_empty)
    }

    /// Loads a seed document of the form `{ "targets": [ {...}, ... ], ... }`.
    ///
    /// Keys are collection names as used in REST paths. Returns the number of
    /// documents inserted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unknown collections or malformed
    /// documents. Nothing is inserted in that case.
    pub fn load_seed(&self, seed: &Value) -> Result<usize> {
        let sections = seed
            .as_object()
            .ok_or_else(|| Error::Validation("seed must be a JSON object".to_string()))?;

        let mut staged = self.collections.read().clone();
        let mut inserted = 0;
        for (name, docs) in sections {
            let kind = EntityKind::from_collection(name)
                .ok_or_else(|| Error::Validation(format!("unknown collection '{name}' in seed")))?;
            let docs = docs.as_array().ok_or_else(|| {
                Error::Validation(format!("seed collection '{name}' must be an array"))
            })?;
            for doc in docs {
                Self::insert_locked(&mut staged, kind, doc.clone())?;
                inserted += 1;
            }
        }

        *self.collections.write() = staged;
        info!(documents = inserted, "loaded seed data");
        Ok(inserted)
    }

    /// Reads and loads a JSON seed file.
    ///
    /// # Errors
    ///
    /// Returns IO, serialization or validation errors.
    pub fn load_seed_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let seed: Value = serde_json::from_str(&content)?;
        self.load_seed(&seed)
    }

    /// Read view implementing [`RelationLookup`].
    #[must_use]
    pub fn read(&self) -> MemoryView<'_> {
        MemoryView {
            guard: self.collections.read(),
        }
    }

    /// Assigns a tag to the given targets or distribution sets.
    ///
    /// Runs under a single write lock: either the whole batch is applied
    /// according to `policy` or nothing is. The outcome's `value` is the number
    /// of documents that did not carry the tag yet.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `tag_kind` is not a tag kind.
    /// - [`Error::EntityNotFound`] if the tag does not exist, or as dictated by
    ///   `policy` for missing owners.
    pub fn assign_tag(
        &self,
        tag_kind: EntityKind,
        tag_id: i64,
        keys: &[EntityKey],
        policy: NotFoundPolicy,
    ) -> Result<BatchOutcome<i64, usize>> {
        self.update_tags(tag_kind, tag_id, keys, policy, true)
    }

    /// Removes a tag from the given targets or distribution sets.
    ///
    /// Same locking and policy handling as [`assign_tag`](Self::assign_tag);
    /// `value` counts documents that carried the tag.
    ///
    /// # Errors
    ///
    /// Same as [`assign_tag`](Self::assign_tag).
    pub fn unassign_tag(
        &self,
        tag_kind: EntityKind,
        tag_id: i64,
        keys: &[EntityKey],
        policy: NotFoundPolicy,
    ) -> Result<BatchOutcome<i64, usize>> {
        self.update_tags(tag_kind, tag_id, keys, policy, false)
    }

    fn update_tags(
        &self,
        tag_kind: EntityKind,
        tag_id: i64,
        keys: &[EntityKey],
        policy: NotFoundPolicy,
        assign: bool,
    ) -> Result<BatchOutcome<i64, usize>> {
        let owner = tagged_kind(tag_kind)?;
        let mut guard = self.collections.write();

        if !guard.get(&tag_kind).is_some_and(|tags| tags.contains_key(&tag_id)) {
            return Err(Error::not_found(tag_kind.display_name(), [tag_id]));
        }

        let index = KeyIndex::build(owner, guard.get(&owner));
        let outcome = apply_with_policy(
            owner.display_name(),
            keys,
            |key| index.resolve(key),
            policy,
            |found: &[i64]| {
                let docs = guard.entry(owner).or_default();
                let mut changed = 0;
                for id in found {
                    if let Some(doc) = docs.get_mut(id) {
                        if set_tag(doc, tag_id, assign) {
                            changed += 1;
                        }
                    }
                }
                Ok(changed)
            },
        )?;

        debug!(
            tag = %tag_kind,
            tag_id,
            assign,
            applied = outcome.applied.len(),
            changed = outcome.value,
            "updated tag assignment"
        );
        Ok(outcome)
    }
}

/// Owner collection of a tag kind.
fn tagged_kind(tag_kind: EntityKind) -> Result<EntityKind> {
    match tag_kind {
        EntityKind::TargetTag => Ok(EntityKind::Target),
        EntityKind::DistributionSetTag => Ok(EntityKind::DistributionSet),
        other => Err(Error::Validation(format!(
            "{} is not a tag type",
            other.display_name()
        ))),
    }
}

/// Adds or removes `tag_id` in the document's tag list. Returns true on change.
fn set_tag(doc: &mut Value, tag_id: i64, assign: bool) -> bool {
    let Value::Object(fields) = doc else {
        return false;
    };
    let tags = fields
        .entry(TAGS)
        .or_insert_with(|| Value::Array(Vec::new()));
    if !tags.is_array() {
        *tags = Value::Array(Vec::new());
    }
    let Value::Array(tags) = tags else {
        return false;
    };

    let refers = |v: &Value| reference_id(v) == Some(tag_id);
    let present = tags.iter().any(refers);
    match (assign, present) {
        (true, false) => {
            tags.push(Value::from(tag_id));
            true
        }
        (false, true) => {
            tags.retain(|v| !refers(v));
            true
        }
        _ => false,
    }
}

/// Id of a relation value, embedded or by reference.
fn reference_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::Object(fields) => fields.get("id").and_then(Value::as_i64),
        _ => None,
    }
}

/// Maps batch identifiers to primary keys of one collection.
struct KeyIndex {
    ids: Vec<i64>,
    business: FxHashMap<String, i64>,
}

impl KeyIndex {
    fn build(kind: EntityKind, docs: Option<&BTreeMap<i64, Value>>) -> Self {
        let property = kind
            .schema()
            .business_key
            .and_then(|name| kind.schema().field(name))
            .map(|field| field.property);

        let mut ids = Vec::new();
        let mut business = FxHashMap::default();
        for (id, doc) in docs.into_iter().flatten() {
            ids.push(*id);
            if let Some(key) = property.and_then(|p| doc.get(p)).and_then(Value::as_str) {
                business.insert(key.to_string(), *id);
            }
        }
        Self { ids, business }
    }

    fn resolve(&self, key: &EntityKey) -> Option<i64> {
        match key {
            EntityKey::Id(id) => self.ids.binary_search(id).ok().map(|_| *id),
            EntityKey::Key(key) => self
                .business
                .get(key)
                .copied()
                .or_else(|| key.parse().ok().filter(|id| self.ids.binary_search(id).is_ok())),
        }
    }
}

struct Lookup<'a>(&'a Collections);

impl RelationLookup for Lookup<'_> {
    fn related(&self, kind: EntityKind, id: i64) -> Option<&Value> {
        self.0.get(&kind)?.get(&id)
    }
}

fn matching<'a>(
    collections: &'a Collections,
    kind: EntityKind,
    predicate: &Predicate,
) -> Vec<&'a Value> {
    let lookup = Lookup(collections);
    collections
        .get(&kind)
        .map(|docs| {
            docs.values()
                .filter(|doc| predicate.matches(doc, &lookup))
                .collect()
        })
        .unwrap_or_default()
}

fn window(
    mut docs: Vec<&Value>,
    sort: &[SortKey],
    offset: usize,
    limit: usize,
) -> Vec<Value> {
    docs.sort_by(|a, b| compare_documents(a, b, sort));
    docs.into_iter().skip(offset).take(limit).cloned().collect()
}

impl EntityStore for MemoryStore {
    fn count(&self, kind: EntityKind, predicate: &Predicate) -> Result<u64> {
        let guard = self.collections.read();
        Ok(matching(&guard, kind, predicate).len() as u64)
    }

    fn fetch(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[SortKey],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let guard = self.collections.read();
        Ok(window(matching(&guard, kind, predicate), sort, offset, limit))
    }

    fn get(&self, kind: EntityKind, id: i64) -> Result<Option<Value>> {
        Ok(self
            .collections
            .read()
            .get(&kind)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    /// Count and window come from the same read lock.
    fn page(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[SortKey],
        offset: usize,
        limit: usize,
    ) -> Result<PageResult<Value>> {
        let guard = self.collections.read();
        let docs = matching(&guard, kind, predicate);
        let total = docs.len() as u64;
        Ok(PageResult::new(window(docs, sort, offset, limit), total))
    }
}

/// Read-locked view of a [`MemoryStore`].
pub struct MemoryView<'a> {
    guard: RwLockReadGuard<'a, Collections>,
}

impl MemoryView<'_> {
    /// Documents of `kind` in id order.
    pub fn documents(&self, kind: EntityKind) -> impl Iterator<Item = &Value> {
        self.guard.get(&kind).into_iter().flat_map(BTreeMap::values)
    }
}

impl RelationLookup for MemoryView<'_> {
    fn related(&self, kind: EntityKind, id: i64) -> Option<&Value> {
        self.guard.get(&kind)?.get(&id)
    }
}

impl std::fmt::Debug for MemoryView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryView")
            .field("collections", &self.guard.len())
            .finish()
    }
}
