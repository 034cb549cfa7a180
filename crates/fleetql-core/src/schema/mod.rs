//! Static entity schemas.
//!
//! Every queryable entity kind declares its fields once, at compile time.
//! The binder resolves field paths against these declarations; nothing is
//! looked up reflectively at query time.
//!
//! ```ignore
//! use fleetql_core::schema::EntityKind;
//!
//! let schema = EntityKind::Target.schema();
//! let field = schema.field("CONTROLLERID").expect("declared");
//! assert_eq!(field.name, "controllerId");
//! ```

mod catalog;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub use catalog::{ACTION_STATUS, ROLLOUT_STATUS, UPDATE_STATUS};

/// Kinds of entity that can be filtered, paged and assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A device that polls for updates.
    Target,
    /// Tag attachable to targets.
    TargetTag,
    /// Type classification for targets.
    TargetType,
    /// Stored RSQL query selecting targets.
    TargetFilterQuery,
    /// Set of software modules deployed together.
    DistributionSet,
    /// Tag attachable to distribution sets.
    DistributionSetTag,
    /// Type classification for distribution sets.
    DistributionSetType,
    /// Versioned software artifact bundle.
    SoftwareModule,
    /// Type classification for software modules.
    SoftwareModuleType,
    /// Deployment of a distribution set to one target.
    Action,
    /// Staged deployment across many targets.
    Rollout,
}

impl EntityKind {
    /// Every entity kind, in declaration order.
    pub const ALL: [EntityKind; 11] = [
        Self::Target,
        Self::TargetTag,
        Self::TargetType,
        Self::TargetFilterQuery,
        Self::DistributionSet,
        Self::DistributionSetTag,
        Self::DistributionSetType,
        Self::SoftwareModule,
        Self::SoftwareModuleType,
        Self::Action,
        Self::Rollout,
    ];

    /// Human readable entity name used in error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Target => "Target",
            Self::TargetTag => "TargetTag",
            Self::TargetType => "TargetType",
            Self::TargetFilterQuery => "TargetFilterQuery",
            Self::DistributionSet => "DistributionSet",
            Self::DistributionSetTag => "DistributionSetTag",
            Self::DistributionSetType => "DistributionSetType",
            Self::SoftwareModule => "SoftwareModule",
            Self::SoftwareModuleType => "SoftwareModuleType",
            Self::Action => "Action",
            Self::Rollout => "Rollout",
        }
    }

    /// REST collection segment (`/rest/v1/{collection}`) and seed file key.
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Target => "targets",
            Self::TargetTag => "targettags",
            Self::TargetType => "targettypes",
            Self::TargetFilterQuery => "targetfilters",
            Self::DistributionSet => "distributionsets",
            Self::DistributionSetTag => "distributionsettags",
            Self::DistributionSetType => "distributionsettypes",
            Self::SoftwareModule => "softwaremodules",
            Self::SoftwareModuleType => "softwaremoduletypes",
            Self::Action => "actions",
            Self::Rollout => "rollouts",
        }
    }

    /// Relational table name used by the SQL renderer.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Target => "sp_target",
            Self::TargetTag => "sp_target_tag",
            Self::TargetType => "sp_target_type",
            Self::TargetFilterQuery => "sp_target_filter_query",
            Self::DistributionSet => "sp_distribution_set",
            Self::DistributionSetTag => "sp_distribution_set_tag",
            Self::DistributionSetType => "sp_distribution_set_type",
            Self::SoftwareModule => "sp_software_module",
            Self::SoftwareModuleType => "sp_software_module_type",
            Self::Action => "sp_action",
            Self::Rollout => "sp_rollout",
        }
    }

    /// Looks up an entity kind by its REST collection segment.
    #[must_use]
    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection().eq_ignore_ascii_case(segment))
    }

    /// Returns the static schema for this entity kind.
    #[must_use]
    pub fn schema(self) -> &'static EntitySchema {
        catalog::schema_for(self)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| {
                kind.display_name().eq_ignore_ascii_case(&normalized)
                    || kind.collection() == normalized
            })
            .ok_or_else(|| Error::Validation(format!("unknown entity kind '{s}'")))
    }
}

/// Declared type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// Epoch milliseconds.
    Timestamp,
    /// Closed set of lowercase literals, matched case-insensitively.
    Enum(&'static [&'static str]),
    /// String-to-string map; the path remainder selects the key.
    Map,
    /// To-one relation.
    Relation {
        /// Related entity kind.
        target: EntityKind,
        /// Attribute used when the path stops at the relation.
        default_attribute: Option<&'static str>,
    },
    /// To-many relation.
    RelationSet {
        /// Related entity kind.
        target: EntityKind,
        /// Attribute used when the path stops at the relation.
        default_attribute: Option<&'static str>,
    },
}

impl FieldKind {
    /// Returns true for plain value kinds (no map, no relation).
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Self::Map | Self::Relation { .. } | Self::RelationSet { .. }
        )
    }

    /// Short type name for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Enum(_) => "enum",
            Self::Map => "map",
            Self::Relation { .. } => "relation",
            Self::RelationSet { .. } => "relation set",
        }
    }
}

/// A single declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Name as written in filter and sort parameters.
    pub name: &'static str,
    /// Property name in stored documents.
    pub property: &'static str,
    /// Declared type.
    pub kind: FieldKind,
    /// Allowed in filter expressions.
    pub queryable: bool,
    /// Allowed in sort parameters.
    pub sortable: bool,
}

impl FieldDef {
    const fn scalar(name: &'static str, property: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            property,
            kind,
            queryable: true,
            sortable: true,
        }
    }

    pub(crate) const fn text(name: &'static str, property: &'static str) -> Self {
        Self::scalar(name, property, FieldKind::Text)
    }

    pub(crate) const fn integer(name: &'static str, property: &'static str) -> Self {
        Self::scalar(name, property, FieldKind::Integer)
    }

    pub(crate) const fn boolean(name: &'static str, property: &'static str) -> Self {
        Self::scalar(name, property, FieldKind::Boolean)
    }

    pub(crate) const fn timestamp(name: &'static str, property: &'static str) -> Self {
        Self::scalar(name, property, FieldKind::Timestamp)
    }

    pub(crate) const fn enumeration(
        name: &'static str,
        property: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::scalar(name, property, FieldKind::Enum(values))
    }

    pub(crate) const fn map(name: &'static str, property: &'static str) -> Self {
        Self {
            name,
            property,
            kind: FieldKind::Map,
            queryable: true,
            sortable: false,
        }
    }

    pub(crate) const fn relation(
        name: &'static str,
        property: &'static str,
        target: EntityKind,
        default_attribute: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            property,
            kind: FieldKind::Relation {
                target,
                default_attribute,
            },
            queryable: true,
            sortable: false,
        }
    }

    pub(crate) const fn relation_set(
        name: &'static str,
        property: &'static str,
        target: EntityKind,
        default_attribute: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            property,
            kind: FieldKind::RelationSet {
                target,
                default_attribute,
            },
            queryable: true,
            sortable: false,
        }
    }

    /// Declares the field but keeps it out of filters and sorts.
    pub(crate) const fn hidden(self) -> Self {
        Self {
            queryable: false,
            sortable: false,
            ..self
        }
    }

    /// Keeps the field filterable but not sortable.
    pub(crate) const fn unsortable(self) -> Self {
        Self {
            sortable: false,
            ..self
        }
    }
}

/// Declared fields of one entity kind.
#[derive(Debug)]
pub struct EntitySchema {
    /// Entity kind described by this schema.
    pub kind: EntityKind,
    /// Text attribute that identifies an entity besides its numeric id, if any.
    pub business_key: Option<&'static str>,
    /// All declared fields; `id` is always present.
    pub fields: &'static [FieldDef],
}

impl EntitySchema {
    /// Resolves a field by name, ignoring ASCII case.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }

    /// Returns the primary key field.
    #[must_use]
    pub fn id_field(&self) -> &'static FieldDef {
        self.field("id").unwrap_or(&catalog::ID_FIELD)
    }

    /// Names of queryable fields, for error hints.
    #[must_use]
    pub fn queryable_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|field| field.queryable)
            .map(|field| field.name)
            .collect()
    }

    /// Names of fields that can be used as a relation sub-attribute.
    #[must_use]
    pub fn scalar_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|field| field.kind.is_scalar() && field.queryable)
            .map(|field| field.name)
            .collect()
    }
}
