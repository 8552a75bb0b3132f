use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::ids::{
    CategoryId, CustomFieldId, ItemId, PriorityId, ProjectId, StatusId, TypeId, UserId, VersionId,
};
use crate::dates;

/// Raw value of a custom field, stored as text like every other custom value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomValue(pub String);

impl CustomValue {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

/// All scalar attributes of a work item that the engine reads or writes.
///
/// `id` is `None` until the storage layer persists the item. Whether the
/// item is a milestone is not stored here: it follows from the type and is
/// looked up through the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    pub id: Option<ItemId>,
    pub subject: String,
    pub description: Option<String>,
    pub project_id: Option<ProjectId>,
    pub type_id: Option<TypeId>,
    pub status_id: Option<StatusId>,
    pub priority_id: Option<PriorityId>,
    pub author_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
    pub version_id: Option<VersionId>,
    pub parent_id: Option<ItemId>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub schedule_manually: bool,
    pub custom_values: BTreeMap<CustomFieldId, CustomValue>,
}

impl WorkItem {
    /// A persisted item with the given id and nothing else set.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(ItemId::new(id)),
            ..Self::default()
        }
    }

    /// `true` until the storage layer assigns an id.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.id.is_none()
    }

    #[must_use]
    pub const fn schedule_automatically(&self) -> bool {
        !self.schedule_manually
    }

    /// Duration in days.
    ///
    /// Derived from the dates when both are set, otherwise one day. Inverted
    /// dates coming from upstream data are clamped to one day as well.
    #[must_use]
    pub fn duration(&self) -> i64 {
        match (self.start_date, self.due_date) {
            (Some(start), Some(due)) => dates::clamp_duration(dates::duration_of(start, due)),
            _ => 1,
        }
    }

    /// The date scheduling measures this item from: start, else due.
    #[must_use]
    pub fn current_start(&self) -> Option<NaiveDate> {
        self.start_date.or(self.due_date)
    }

    /// Fields whose value differs between `self` and `other`.
    #[must_use]
    pub fn changed_fields(&self, other: &Self) -> BTreeSet<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| !self.same_value(other, *field))
            .collect()
    }

    /// `true` if `field` holds the same value in both items.
    #[must_use]
    pub fn same_value(&self, other: &Self, field: Field) -> bool {
        match field {
            Field::Subject => self.subject == other.subject,
            Field::Description => self.description == other.description,
            Field::Project => self.project_id == other.project_id,
            Field::Type => self.type_id == other.type_id,
            Field::Status => self.status_id == other.status_id,
            Field::Priority => self.priority_id == other.priority_id,
            Field::Author => self.author_id == other.author_id,
            Field::Category => self.category_id == other.category_id,
            Field::Version => self.version_id == other.version_id,
            Field::Parent => self.parent_id == other.parent_id,
            Field::StartDate => self.start_date == other.start_date,
            Field::DueDate => self.due_date == other.due_date,
            Field::ScheduleManually => self.schedule_manually == other.schedule_manually,
            Field::CustomValues => self.custom_values == other.custom_values,
        }
    }
}

/// The closed set of attributes the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Subject,
    Description,
    Project,
    Type,
    Status,
    Priority,
    Author,
    Category,
    Version,
    Parent,
    StartDate,
    DueDate,
    ScheduleManually,
    CustomValues,
}

impl Field {
    pub const ALL: [Self; 14] = [
        Self::Subject,
        Self::Description,
        Self::Project,
        Self::Type,
        Self::Status,
        Self::Priority,
        Self::Author,
        Self::Category,
        Self::Version,
        Self::Parent,
        Self::StartDate,
        Self::DueDate,
        Self::ScheduleManually,
        Self::CustomValues,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Description => "description",
            Self::Project => "project",
            Self::Type => "type",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Author => "author",
            Self::Category => "category",
            Self::Version => "version",
            Self::Parent => "parent",
            Self::StartDate => "start_date",
            Self::DueDate => "due_date",
            Self::ScheduleManually => "schedule_manually",
            Self::CustomValues => "custom_values",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
