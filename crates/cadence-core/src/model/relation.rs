use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::ids::ItemId;

/// The kinds of relation two work items can have.
///
/// Only [`RelationKind::Precedes`] and its inverse [`RelationKind::Follows`]
/// influence scheduling; everything else is informational as far as this
/// crate is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Relates,
    Duplicates,
    Duplicated,
    Blocks,
    Blocked,
    Precedes,
    Follows,
    Includes,
    PartOf,
    Requires,
    Required,
}

impl RelationKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Relates => "relates",
            Self::Duplicates => "duplicates",
            Self::Duplicated => "duplicated",
            Self::Blocks => "blocks",
            Self::Blocked => "blocked",
            Self::Precedes => "precedes",
            Self::Follows => "follows",
            Self::Includes => "includes",
            Self::PartOf => "part_of",
            Self::Requires => "requires",
            Self::Required => "required",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a relation kind from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid relation kind: '{got}'")]
pub struct ParseRelationKindError {
    pub got: String,
}

impl FromStr for RelationKind {
    type Err = ParseRelationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "relates" => Ok(Self::Relates),
            "duplicates" => Ok(Self::Duplicates),
            "duplicated" => Ok(Self::Duplicated),
            "blocks" => Ok(Self::Blocks),
            "blocked" => Ok(Self::Blocked),
            "precedes" => Ok(Self::Precedes),
            "follows" => Ok(Self::Follows),
            "includes" => Ok(Self::Includes),
            "part_of" => Ok(Self::PartOf),
            "requires" => Ok(Self::Requires),
            "required" => Ok(Self::Required),
            _ => Err(ParseRelationKindError { got: s.to_string() }),
        }
    }
}

/// A directed relation `from -> to` of a given kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub from: ItemId,
    pub to: ItemId,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(from: impl Into<ItemId>, to: impl Into<ItemId>, kind: RelationKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }

    /// `from` precedes `to`.
    pub fn precedes(from: impl Into<ItemId>, to: impl Into<ItemId>) -> Self {
        Self::new(from, to, RelationKind::Precedes)
    }

    /// The `(predecessor, successor)` pair if this relation constrains dates.
    ///
    /// A `follows` relation from A to B means B precedes A.
    #[must_use]
    pub const fn precedence(&self) -> Option<(&ItemId, &ItemId)> {
        match self.kind {
            RelationKind::Precedes => Some((&self.from, &self.to)),
            RelationKind::Follows => Some((&self.to, &self.from)),
            _ => None,
        }
    }

    /// `true` if `id` is either endpoint.
    #[must_use]
    pub fn involves(&self, id: &ItemId) -> bool {
        &self.from == id || &self.to == id
    }
}
