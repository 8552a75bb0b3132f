//! Requested attribute changes.
//!
//! A request only names the attributes the caller wants to touch. For
//! nullable attributes the request must distinguish "not mentioned" from
//! "explicitly cleared", so those fields are `Option<Option<T>>`:
//!
//! | JSON                     | Rust               | meaning              |
//! |--------------------------|--------------------|----------------------|
//! | key absent               | `None`             | leave as is          |
//! | `"start_date": null`     | `Some(None)`       | clear the attribute  |
//! | `"start_date": "2024-…"` | `Some(Some(date))` | set the attribute    |

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::ids::{
    CategoryId, CustomFieldId, ItemId, PriorityId, ProjectId, StatusId, TypeId, UserId, VersionId,
};
use super::item::{CustomValue, Field, WorkItem};

/// A partial update of a [`WorkItem`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Option<ProjectId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub type_id: Option<Option<TypeId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub status_id: Option<Option<StatusId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<Option<PriorityId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<Option<UserId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<CategoryId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<Option<VersionId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<ItemId>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_manually: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_values: BTreeMap<CustomFieldId, CustomValue>,
}

/// Present-but-null deserializes to `Some(None)`; `#[serde(default)]`
/// covers the absent case.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl AttributeChanges {
    /// `true` if the request names nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `true` if the request names `field`, whatever the value.
    #[must_use]
    pub fn mentions(&self, field: Field) -> bool {
        match field {
            Field::Subject => self.subject.is_some(),
            Field::Description => self.description.is_some(),
            Field::Project => self.project_id.is_some(),
            Field::Type => self.type_id.is_some(),
            Field::Status => self.status_id.is_some(),
            Field::Priority => self.priority_id.is_some(),
            Field::Author => self.author_id.is_some(),
            Field::Category => self.category_id.is_some(),
            Field::Version => self.version_id.is_some(),
            Field::Parent => self.parent_id.is_some(),
            Field::StartDate => self.start_date.is_some(),
            Field::DueDate => self.due_date.is_some(),
            Field::ScheduleManually => self.schedule_manually.is_some(),
            Field::CustomValues => !self.custom_values.is_empty(),
        }
    }

    /// Write the requested values onto `item`.
    ///
    /// Custom values are merged key by key; every other field is replaced
    /// when mentioned.
    pub fn apply_to(&self, item: &mut WorkItem) {
        if let Some(subject) = &self.subject {
            item.subject.clone_from(subject);
        }
        assign(&mut item.description, self.description.as_ref());
        assign(&mut item.project_id, self.project_id.as_ref());
        assign(&mut item.type_id, self.type_id.as_ref());
        assign(&mut item.status_id, self.status_id.as_ref());
        assign(&mut item.priority_id, self.priority_id.as_ref());
        assign(&mut item.author_id, self.author_id.as_ref());
        assign(&mut item.category_id, self.category_id.as_ref());
        assign(&mut item.version_id, self.version_id.as_ref());
        assign(&mut item.parent_id, self.parent_id.as_ref());
        assign(&mut item.start_date, self.start_date.as_ref());
        assign(&mut item.due_date, self.due_date.as_ref());
        if let Some(manual) = self.schedule_manually {
            item.schedule_manually = manual;
        }
        for (field, value) in &self.custom_values {
            item.custom_values.insert(*field, value.clone());
        }
    }
}

fn assign<T: Clone>(slot: &mut Option<T>, requested: Option<&Option<T>>) {
    if let Some(value) = requested {
        slot.clone_from(value);
    }
}
