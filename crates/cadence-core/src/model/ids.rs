//! Identifier newtypes.
//!
//! Work items are keyed by an opaque string id assigned by the storage
//! layer. Catalog entries (projects, types, statuses, ...) use numeric ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a persisted work item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Wrap a storage-assigned identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

macro_rules! numeric_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<u64> for $name {
                fn from(raw: u64) -> Self {
                    Self(raw)
                }
            }
        )+
    };
}

numeric_id! {
    /// Identifier of a project.
    ProjectId,
    /// Identifier of a work package type (task, milestone, phase, ...).
    TypeId,
    /// Identifier of a status.
    StatusId,
    /// Identifier of a priority.
    PriorityId,
    /// Identifier of a user; only used for author defaulting.
    UserId,
    /// Identifier of a project category.
    CategoryId,
    /// Identifier of a version (release).
    VersionId,
    /// Identifier of a custom field.
    CustomFieldId,
}
