//! Field declarations for every entity kind.

use super::{EntityKind, EntitySchema, FieldDef};

pub(crate) static ID_FIELD: FieldDef = FieldDef::integer("id", "id");

const ID: FieldDef = FieldDef::integer("id", "id");
const NAME: FieldDef = FieldDef::text("name", "name");
const DESCRIPTION: FieldDef = FieldDef::text("description", "description");
const COLOUR: FieldDef = FieldDef::text("colour", "colour");
const CREATED_AT: FieldDef = FieldDef::timestamp("createdAt", "createdAt");
const LAST_MODIFIED_AT: FieldDef = FieldDef::timestamp("lastModifiedAt", "lastModifiedAt");

/// Target update status literals.
pub const UPDATE_STATUS: &[&str] = &["unknown", "in_sync", "pending", "error", "registered"];

/// Action status literals, shared by `status` and `detailStatus`.
pub const ACTION_STATUS: &[&str] = &[
    "finished",
    "error",
    "warning",
    "running",
    "canceled",
    "canceling",
    "retrieved",
    "download",
    "scheduled",
    "cancel_rejected",
    "downloaded",
    "wait_for_confirmation",
];

/// Rollout status literals.
pub const ROLLOUT_STATUS: &[&str] = &[
    "creating",
    "ready",
    "paused",
    "starting",
    "stopped",
    "running",
    "finished",
    "deleting",
    "deleted",
    "waiting_for_approval",
    "approval_denied",
];

static TARGET_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::text("controllerId", "controllerId"),
    NAME,
    DESCRIPTION,
    CREATED_AT,
    LAST_MODIFIED_AT,
    FieldDef::timestamp("lastControllerRequestAt", "lastControllerRequestAt"),
    FieldDef::enumeration("updateStatus", "updateStatus", UPDATE_STATUS),
    FieldDef::text("address", "address"),
    FieldDef::text("group", "group"),
    FieldDef::map("attribute", "controllerAttributes"),
    FieldDef::map("metadata", "metadata"),
    FieldDef::relation(
        "assignedDs",
        "assignedDistributionSet",
        EntityKind::DistributionSet,
        None,
    ),
    FieldDef::relation(
        "installedDs",
        "installedDistributionSet",
        EntityKind::DistributionSet,
        None,
    ),
    FieldDef::relation_set("tag", "tags", EntityKind::TargetTag, Some("name")),
    FieldDef::relation("targetType", "targetType", EntityKind::TargetType, Some("key")),
    FieldDef::text("securityToken", "securityToken").hidden(),
];

static TARGET_TAG_FIELDS: &[FieldDef] = &[ID, NAME, DESCRIPTION, COLOUR];

static DISTRIBUTION_SET_TAG_FIELDS: &[FieldDef] = &[ID, NAME, DESCRIPTION, COLOUR];

static TYPE_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::text("key", "key"),
    NAME,
    DESCRIPTION,
    COLOUR,
];

static SOFTWARE_MODULE_TYPE_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::text("key", "key"),
    NAME,
    DESCRIPTION,
    COLOUR,
    FieldDef::integer("maxAssignments", "maxAssignments"),
];

static TARGET_FILTER_QUERY_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    FieldDef::text("query", "query").unsortable(),
    FieldDef::relation(
        "autoAssignDistributionSet",
        "autoAssignDistributionSet",
        EntityKind::DistributionSet,
        Some("name"),
    ),
    FieldDef::integer("autoAssignWeight", "autoAssignWeight"),
    CREATED_AT,
];

static DISTRIBUTION_SET_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    FieldDef::text("version", "version"),
    DESCRIPTION,
    FieldDef::boolean("complete", "complete"),
    FieldDef::boolean("valid", "valid"),
    FieldDef::boolean("locked", "locked"),
    FieldDef::boolean("requiredMigrationStep", "requiredMigrationStep"),
    CREATED_AT,
    LAST_MODIFIED_AT,
    FieldDef::relation("type", "type", EntityKind::DistributionSetType, Some("key")),
    FieldDef::relation_set("tag", "tags", EntityKind::DistributionSetTag, Some("name")),
    FieldDef::relation_set("module", "modules", EntityKind::SoftwareModule, None),
    FieldDef::map("metadata", "metadata"),
];

static SOFTWARE_MODULE_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    FieldDef::text("version", "version"),
    DESCRIPTION,
    FieldDef::text("vendor", "vendor"),
    CREATED_AT,
    LAST_MODIFIED_AT,
    FieldDef::relation("type", "type", EntityKind::SoftwareModuleType, Some("key")),
    FieldDef::map("metadata", "metadata"),
];

static ACTION_FIELDS: &[FieldDef] = &[
    ID,
    FieldDef::enumeration("status", "status", ACTION_STATUS),
    FieldDef::enumeration("detailStatus", "detailStatus", ACTION_STATUS),
    FieldDef::integer("lastStatusCode", "lastStatusCode"),
    FieldDef::text("externalRef", "externalRef"),
    FieldDef::boolean("active", "active"),
    FieldDef::integer("weight", "weight"),
    CREATED_AT,
    LAST_MODIFIED_AT,
    FieldDef::relation("target", "target", EntityKind::Target, Some("controllerId")),
    FieldDef::relation(
        "distributionSet",
        "distributionSet",
        EntityKind::DistributionSet,
        None,
    ),
    FieldDef::relation("rollout", "rollout", EntityKind::Rollout, Some("name")),
];

static ROLLOUT_FIELDS: &[FieldDef] = &[
    ID,
    NAME,
    DESCRIPTION,
    FieldDef::enumeration("status", "status", ROLLOUT_STATUS),
    CREATED_AT,
    LAST_MODIFIED_AT,
    FieldDef::relation(
        "distributionSet",
        "distributionSet",
        EntityKind::DistributionSet,
        None,
    ),
];

static TARGET: EntitySchema = EntitySchema {
    kind: EntityKind::Target,
    business_key: Some("controllerId"),
    fields: TARGET_FIELDS,
};

static TARGET_TAG: EntitySchema = EntitySchema {
    kind: EntityKind::TargetTag,
    business_key: None,
    fields: TARGET_TAG_FIELDS,
};

static TARGET_TYPE: EntitySchema = EntitySchema {
    kind: EntityKind::TargetType,
    business_key: None,
    fields: TYPE_FIELDS,
};

static TARGET_FILTER_QUERY: EntitySchema = EntitySchema {
    kind: EntityKind::TargetFilterQuery,
    business_key: None,
    fields: TARGET_FILTER_QUERY_FIELDS,
};

static DISTRIBUTION_SET: EntitySchema = EntitySchema {
    kind: EntityKind::DistributionSet,
    business_key: None,
    fields: DISTRIBUTION_SET_FIELDS,
};

static DISTRIBUTION_SET_TAG: EntitySchema = EntitySchema {
    kind: EntityKind::DistributionSetTag,
    business_key: None,
    fields: DISTRIBUTION_SET_TAG_FIELDS,
};

static DISTRIBUTION_SET_TYPE: EntitySchema = EntitySchema {
    kind: EntityKind::DistributionSetType,
    business_key: None,
    fields: TYPE_FIELDS,
};

static SOFTWARE_MODULE: EntitySchema = EntitySchema {
    kind: EntityKind::SoftwareModule,
    business_key: None,
    fields: SOFTWARE_MODULE_FIELDS,
};

static SOFTWARE_MODULE_TYPE: EntitySchema = EntitySchema {
    kind: EntityKind::SoftwareModuleType,
    business_key: None,
    fields: SOFTWARE_MODULE_TYPE_FIELDS,
};

static ACTION: EntitySchema = EntitySchema {
    kind: EntityKind::Action,
    business_key: None,
    fields: ACTION_FIELDS,
};

static ROLLOUT: EntitySchema = EntitySchema {
    kind: EntityKind::Rollout,
    business_key: None,
    fields: ROLLOUT_FIELDS,
};

pub(crate) fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Target => &TARGET,
        EntityKind::TargetTag => &TARGET_TAG,
        EntityKind::TargetType => &TARGET_TYPE,
        EntityKind::TargetFilterQuery => &TARGET_FILTER_QUERY,
        EntityKind::DistributionSet => &DISTRIBUTION_SET,
        EntityKind::DistributionSetTag => &DISTRIBUTION_SET_TAG,
        EntityKind::DistributionSetType => &DISTRIBUTION_SET_TYPE,
        EntityKind::SoftwareModule => &SOFTWARE_MODULE,
        EntityKind::SoftwareModuleType => &SOFTWARE_MODULE_TYPE,
        EntityKind::Action => &ACTION,
        EntityKind::Rollout => &ROLLOUT,
    }
}
