//! Read access to domain reference data.
//!
//! The engine never owns statuses, types, projects or categories. It asks a
//! [`Catalog`] for them. The storage layer implements the trait against its
//! own tables; [`StaticCatalog`] is a plain in-memory implementation used by
//! snapshots and tests.
//!
//! Required methods are point lookups. Everything the reconciliation rules
//! need on top of that (enabled types in position order, allowed statuses
//! for a type, same-named category lookup) is a provided method, so every
//! implementation applies the same ordering and defaulting rules.

#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};

use crate::model::ids::{
    CategoryId, CustomFieldId, PriorityId, ProjectId, StatusId, TypeId, VersionId,
};
use crate::model::item::CustomValue;

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: StatusId,
    pub name: String,
    /// The system-wide default for new items. At most one status should
    /// carry the flag; the first one wins otherwise.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Priority {
    pub id: PriorityId,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A work package type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkType {
    pub id: TypeId,
    pub name: String,
    /// Display position; enabled types are offered in ascending order.
    #[serde(default)]
    pub position: u32,
    #[serde(default)]
    pub is_milestone: bool,
    /// Description template applied to new items of this type.
    #[serde(default)]
    pub description: Option<String>,
    /// Statuses reachable through the type's workflows.
    #[serde(default)]
    pub status_ids: Vec<StatusId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub type_ids: Vec<TypeId>,
    /// Versions usable in this project, own and shared from elsewhere.
    #[serde(default)]
    pub shared_version_ids: Vec<VersionId>,
    #[serde(default)]
    pub custom_field_ids: Vec<CustomFieldId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub project_id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: CustomFieldId,
    pub name: String,
    #[serde(default)]
    pub default_value: Option<CustomValue>,
    /// Types the field is enabled for.
    #[serde(default)]
    pub type_ids: Vec<TypeId>,
    /// Enabled in every project regardless of the project's own list.
    #[serde(default)]
    pub is_for_all: bool,
}

const fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Read accessor for reference data.
pub trait Catalog {
    fn status(&self, id: StatusId) -> Option<&Status>;

    /// The status new items receive when none is given.
    fn default_status(&self) -> Option<&Status>;

    /// The active default priority.
    fn default_priority(&self) -> Option<&Priority>;

    fn work_type(&self, id: TypeId) -> Option<&WorkType>;

    /// Every type, in no particular order.
    fn work_types(&self) -> Vec<&WorkType>;

    fn project(&self, id: ProjectId) -> Option<&Project>;

    fn category(&self, id: CategoryId) -> Option<&Category>;

    fn project_categories(&self, project: ProjectId) -> Vec<&Category>;

    fn custom_field(&self, id: CustomFieldId) -> Option<&CustomField>;

    /// Every custom field flagged `is_for_all`.
    fn global_custom_fields(&self) -> Vec<&CustomField>;

    // -- provided -----------------------------------------------------------

    /// `true` if `type_id` names a milestone type. Unknown or absent types
    /// are not milestones.
    fn is_milestone(&self, type_id: Option<TypeId>) -> bool {
        type_id
            .and_then(|id| self.work_type(id))
            .is_some_and(|t| t.is_milestone)
    }

    /// Types enabled in `project`, ordered by position (ties by id).
    fn enabled_types(&self, project: ProjectId) -> Vec<&WorkType> {
        let Some(project) = self.project(project) else {
            return Vec::new();
        };
        let mut types: Vec<&WorkType> = project
            .type_ids
            .iter()
            .filter_map(|id| self.work_type(*id))
            .collect();
        types.sort_by_key(|t| (t.position, t.id));
        types
    }

    /// Statuses an item of `type_id` may have: the type's workflow statuses
    /// plus the system default status.
    fn allowed_statuses(&self, type_id: TypeId) -> Vec<&Status> {
        let Some(work_type) = self.work_type(type_id) else {
            return Vec::new();
        };
        let mut statuses: Vec<&Status> = work_type
            .status_ids
            .iter()
            .filter_map(|id| self.status(*id))
            .collect();
        if let Some(default) = self.default_status() {
            if !statuses.iter().any(|s| s.id == default.id) {
                statuses.push(default);
            }
        }
        statuses
    }

    /// `true` if `version` may be used inside `project`.
    fn shares_version(&self, project: ProjectId, version: VersionId) -> bool {
        self.project(project)
            .is_some_and(|p| p.shared_version_ids.contains(&version))
    }

    /// The category of `project` named like `category`, if any.
    fn category_named(&self, project: ProjectId, name: &str) -> Option<&Category> {
        self.project_categories(project)
            .into_iter()
            .find(|c| c.name == name)
    }

    /// Custom fields enabled for items of `type_id` in `project`.
    fn custom_fields_for(&self, project: ProjectId, type_id: TypeId) -> Vec<&CustomField> {
        let mut fields: Vec<&CustomField> = self
            .project(project)
            .map(|p| {
                p.custom_field_ids
                    .iter()
                    .filter_map(|id| self.custom_field(*id))
                    .collect()
            })
            .unwrap_or_default();
        for field in self.global_custom_fields() {
            if !fields.iter().any(|f| f.id == field.id) {
                fields.push(field);
            }
        }
        fields.retain(|f| f.type_ids.contains(&type_id));
        fields.sort_by_key(|f| f.id);
        fields
    }
}

// ---------------------------------------------------------------------------
// StaticCatalog
// ---------------------------------------------------------------------------

/// A [`Catalog`] backed by plain vectors, loadable from JSON or TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticCatalog {
    pub statuses: Vec<Status>,
    pub priorities: Vec<Priority>,
    pub types: Vec<WorkType>,
    pub projects: Vec<Project>,
    pub categories: Vec<Category>,
    pub custom_fields: Vec<CustomField>,
}

impl Catalog for StaticCatalog {
    fn status(&self, id: StatusId) -> Option<&Status> {
        self.statuses.iter().find(|s| s.id == id)
    }

    fn default_status(&self) -> Option<&Status> {
        self.statuses.iter().find(|s| s.is_default)
    }

    fn default_priority(&self) -> Option<&Priority> {
        self.priorities.iter().find(|p| p.active && p.is_default)
    }

    fn work_type(&self, id: TypeId) -> Option<&WorkType> {
        self.types.iter().find(|t| t.id == id)
    }

    fn work_types(&self) -> Vec<&WorkType> {
        self.types.iter().collect()
    }

    fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    fn project_categories(&self, project: ProjectId) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|c| c.project_id == project)
            .collect()
    }

    fn custom_field(&self, id: CustomFieldId) -> Option<&CustomField> {
        self.custom_fields.iter().find(|f| f.id == id)
    }

    fn global_custom_fields(&self) -> Vec<&CustomField> {
        self.custom_fields.iter().filter(|f| f.is_for_all).collect()
    }
}
