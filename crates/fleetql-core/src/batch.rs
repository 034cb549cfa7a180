//! Batch identifier resolution and not-found policies.
//!
//! Batch operations (assign a tag to many targets, unassign it again, ...)
//! receive a list of identifiers of which some may not exist. The caller picks
//! a [`NotFoundPolicy`]; [`apply_with_policy`] partitions the identifiers and
//! runs the mutation according to the policy's decision table:
//!
//! | policy                   | nothing missing | some missing              |
//! |--------------------------|-----------------|---------------------------|
//! | `FAIL` (default)         | apply           | reject, no mutation       |
//! | `ON_WHAT_FOUND_AND_FAIL` | apply           | apply found, then fail    |
//! | `ON_WHAT_FOUND_AND_SUCCESS` | apply        | apply found, succeed      |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// What to do when a batch references identifiers that do not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotFoundPolicy {
    /// Fail without mutating anything.
    #[default]
    #[serde(rename = "FAIL", alias = "FAIL_ON_ANY_MISSING")]
    FailOnAnyMissing,
    /// Mutate what was found, then fail listing what was missing.
    #[serde(rename = "ON_WHAT_FOUND_AND_FAIL", alias = "APPLY_TO_FOUND_AND_FAIL")]
    ApplyToFoundAndFail,
    /// Mutate what was found and succeed.
    #[serde(
        rename = "ON_WHAT_FOUND_AND_SUCCESS",
        alias = "APPLY_TO_FOUND_AND_SUCCEED"
    )]
    ApplyToFoundAndSucceed,
}

impl NotFoundPolicy {
    /// Wire name used in query parameters and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailOnAnyMissing => "FAIL",
            Self::ApplyToFoundAndFail => "ON_WHAT_FOUND_AND_FAIL",
            Self::ApplyToFoundAndSucceed => "ON_WHAT_FOUND_AND_SUCCESS",
        }
    }

    /// Decision for a batch with or without missing identifiers.
    #[must_use]
    pub const fn decide(self, has_missing: bool) -> Decision {
        match (self, has_missing) {
            (_, false) | (Self::ApplyToFoundAndSucceed, true) => Decision::Apply,
            (Self::FailOnAnyMissing, true) => Decision::Reject,
            (Self::ApplyToFoundAndFail, true) => Decision::ApplyThenFail,
        }
    }
}

impl fmt::Display for NotFoundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotFoundPolicy {
    type Err = Error;

    /// Accepts wire names and their long aliases, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FAIL" | "FAIL_ON_ANY_MISSING" => Ok(Self::FailOnAnyMissing),
            "ON_WHAT_FOUND_AND_FAIL" | "APPLY_TO_FOUND_AND_FAIL" => Ok(Self::ApplyToFoundAndFail),
            "ON_WHAT_FOUND_AND_SUCCESS" | "APPLY_TO_FOUND_AND_SUCCEED" => {
                Ok(Self::ApplyToFoundAndSucceed)
            }
            _ => Err(Error::Validation(format!(
                "Unknown not-found policy '{s}', expected FAIL, ON_WHAT_FOUND_AND_FAIL or ON_WHAT_FOUND_AND_SUCCESS"
            ))),
        }
    }
}

/// Outcome of [`NotFoundPolicy::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Mutate the found identifiers and succeed.
    Apply,
    /// Mutate nothing and fail.
    Reject,
    /// Mutate the found identifiers, then fail.
    ApplyThenFail,
}

/// Identifier of an entity in a batch request: a numeric id or a business key
/// such as a controller id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// Primary key.
    Id(i64),
    /// Business key.
    Key(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<i64> for EntityKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for EntityKey {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

/// Requested identifiers split into what exists and what does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution<T, K = EntityKey> {
    /// Resolved entities, deduplicated, in request order.
    pub found: Vec<T>,
    /// Unresolvable identifiers, deduplicated and sorted.
    pub missing: Vec<K>,
}

impl<T, K> Resolution<T, K> {
    /// Returns true if any identifier could not be resolved.
    #[must_use]
    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Partitions `requested` with `resolve`, which maps an identifier to the
/// entity it names.
///
/// Two identifiers resolving to the same entity count once.
pub fn partition<K, T, F>(requested: &[K], mut resolve: F) -> Resolution<T, K>
where
    K: Ord + Clone,
    T: Ord + Clone,
    F: FnMut(&K) -> Option<T>,
{
    let mut seen = BTreeSet::new();
    let mut found = Vec::new();
    let mut missing = BTreeSet::new();

    for key in requested {
        match resolve(key) {
            Some(entity) => {
                if seen.insert(entity.clone()) {
                    found.push(entity);
                }
            }
            None => {
                missing.insert(key.clone());
            }
        }
    }

    Resolution {
        found,
        missing: missing.into_iter().collect(),
    }
}

/// Successful batch result.
///
/// Identifiers that could not be resolved are not reported here; under
/// [`NotFoundPolicy::ApplyToFoundAndSucceed`] they are silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome<T, R> {
    /// Entities the mutation was applied to.
    pub applied: Vec<T>,
    /// Value returned by the mutation.
    pub value: R,
}

/// Resolves `requested`, then runs `apply` on the found entities as `policy`
/// dictates.
///
/// # Errors
///
/// - [`Error::EntityNotFound`] with the sorted missing identifiers when the
///   policy fails; under [`NotFoundPolicy::ApplyToFoundAndFail`] the mutation
///   has already run.
/// - Any error returned by `apply`.
pub fn apply_with_policy<K, T, R, F, A>(
    entity_type: &str,
    requested: &[K],
    resolve: F,
    policy: NotFoundPolicy,
    apply: A,
) -> Result<BatchOutcome<T, R>>
where
    K: Ord + Clone + fmt::Display,
    T: Ord + Clone,
    F: FnMut(&K) -> Option<T>,
    A: FnOnce(&[T]) -> Result<R>,
{
    let resolution = partition(requested, resolve);
    let decision = policy.decide(resolution.has_missing());
    debug!(
        entity_type,
        %policy,
        found = resolution.found.len(),
        missing = resolution.missing.len(),
        ?decision,
        "resolved batch identifiers"
    );

    match decision {
        Decision::Reject => {
            warn!(entity_type, missing = resolution.missing.len(), "batch rejected");
            Err(Error::not_found(entity_type, &resolution.missing))
        }
        Decision::ApplyThenFail => {
            apply(&resolution.found)?;
            Err(Error::not_found(entity_type, &resolution.missing))
        }
        Decision::Apply => {
            let value = apply(&resolution.found)?;
            Ok(BatchOutcome {
                applied: resolution.found,
                value,
            })
        }
    }
}
