//! In-memory graph and catalog.
//!
//! A [`Snapshot`] holds a consistent set of items, relations and reference
//! data, indexed for the lookups [`WorkGraph`] and [`Catalog`] need. It is
//! what tests build by hand and what the CLI loads from a JSON file:
//!
//! ```json
//! {
//!   "items": [{ "id": "wp-1", "start_date": "2024-01-01" }],
//!   "relations": [{ "from": "wp-1", "to": "wp-2", "kind": "precedes" }],
//!   "catalog": { "statuses": [], "types": [] }
//! }
//! ```
//!
//! Relations may point at ids the snapshot does not contain; traversals
//! skip such dangling ends.

#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::{
    Catalog, Category, CustomField, Priority, Project, StaticCatalog, Status, WorkType,
};
use crate::error::ErrorCode;
use crate::graph::WorkGraph;
use crate::model::ids::{CategoryId, CustomFieldId, ItemId, ProjectId, StatusId, TypeId};
use crate::model::item::WorkItem;
use crate::model::relation::Relation;

/// Errors building or loading a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("item #{index} has no id")]
    MissingId { index: usize },

    #[error("duplicate item id '{0}'")]
    DuplicateId(ItemId),

    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::SnapshotMissing,
            Self::MissingId { .. } | Self::DuplicateId(_) | Self::Parse(_) => {
                ErrorCode::SnapshotInvalid
            }
        }
    }
}

/// On-disk layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SnapshotFile {
    items: Vec<WorkItem>,
    relations: Vec<Relation>,
    catalog: StaticCatalog,
}

/// Items, relations and catalog with lookup indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFile", into = "SnapshotFile")]
pub struct Snapshot {
    items: Vec<WorkItem>,
    relations: Vec<Relation>,
    catalog: StaticCatalog,
    by_id: HashMap<ItemId, usize>,
    children: HashMap<ItemId, Vec<usize>>,
    relations_of: HashMap<ItemId, Vec<usize>>,
}

impl Snapshot {
    /// Index `items` and `relations` with an empty catalog.
    ///
    /// # Errors
    ///
    /// Every item must carry an id, and ids must be unique.
    pub fn new(items: Vec<WorkItem>, relations: Vec<Relation>) -> Result<Self, SnapshotError> {
        Self::with_catalog(items, relations, StaticCatalog::default())
    }

    /// Index `items` and `relations` together with `catalog`.
    ///
    /// # Errors
    ///
    /// See [`Snapshot::new`].
    pub fn with_catalog(
        items: Vec<WorkItem>,
        relations: Vec<Relation>,
        catalog: StaticCatalog,
    ) -> Result<Self, SnapshotError> {
        let mut by_id = HashMap::with_capacity(items.len());
        let mut children: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for (index, item) in items.iter().enumerate() {
            let id = item.id.clone().ok_or(SnapshotError::MissingId { index })?;
            if by_id.insert(id.clone(), index).is_some() {
                return Err(SnapshotError::DuplicateId(id));
            }
            if let Some(parent) = &item.parent_id {
                children.entry(parent.clone()).or_default().push(index);
            }
        }

        let mut relations_of: HashMap<ItemId, Vec<usize>> = HashMap::new();
        for (index, rel) in relations.iter().enumerate() {
            relations_of.entry(rel.from.clone()).or_default().push(index);
            if rel.to != rel.from {
                relations_of.entry(rel.to.clone()).or_default().push(index);
            }
        }

        Ok(Self {
            items,
            relations,
            catalog,
            by_id,
            children,
            relations_of,
        })
    }

    /// Parse a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Parse`] for malformed JSON or an invalid item set.
    pub fn from_json_str(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a snapshot file.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Io`] if the file can't be read, otherwise as
    /// [`Snapshot::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn all_items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn all_relations(&self) -> &[Relation] {
        &self.relations
    }

    pub const fn catalog(&self) -> &StaticCatalog {
        &self.catalog
    }
}

impl TryFrom<SnapshotFile> for Snapshot {
    type Error = SnapshotError;

    fn try_from(file: SnapshotFile) -> Result<Self, Self::Error> {
        Self::with_catalog(file.items, file.relations, file.catalog)
    }
}

impl From<Snapshot> for SnapshotFile {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            items: snapshot.items,
            relations: snapshot.relations,
            catalog: snapshot.catalog,
        }
    }
}

impl WorkGraph for Snapshot {
    fn item(&self, id: &ItemId) -> Option<&WorkItem> {
        self.by_id.get(id).map(|index| &self.items[*index])
    }

    fn children(&self, id: &ItemId) -> Vec<&WorkItem> {
        self.children
            .get(id)
            .map(|indexes| indexes.iter().map(|i| &self.items[*i]).collect())
            .unwrap_or_default()
    }

    fn relations(&self, id: &ItemId) -> Vec<&Relation> {
        self.relations_of
            .get(id)
            .map(|indexes| indexes.iter().map(|i| &self.relations[*i]).collect())
            .unwrap_or_default()
    }
}

impl Catalog for Snapshot {
    fn status(&self, id: StatusId) -> Option<&Status> {
        self.catalog.status(id)
    }

    fn default_status(&self) -> Option<&Status> {
        self.catalog.default_status()
    }

    fn default_priority(&self) -> Option<&Priority> {
        self.catalog.default_priority()
    }

    fn work_type(&self, id: TypeId) -> Option<&WorkType> {
        self.catalog.work_type(id)
    }

    fn work_types(&self) -> Vec<&WorkType> {
        self.catalog.work_types()
    }

    fn project(&self, id: ProjectId) -> Option<&Project> {
        self.catalog.project(id)
    }

    fn category(&self, id: CategoryId) -> Option<&Category> {
        self.catalog.category(id)
    }

    fn project_categories(&self, project: ProjectId) -> Vec<&Category> {
        self.catalog.project_categories(project)
    }

    fn custom_field(&self, id: CustomFieldId) -> Option<&CustomField> {
        self.catalog.custom_field(id)
    }

    fn global_custom_fields(&self) -> Vec<&CustomField> {
        self.catalog.global_custom_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::relation::RelationKind;

    const SAMPLE: &str = r#"{
        "items": [
            { "id": "p", "subject": "parent" },
            { "id": "c", "parent_id": "p", "due_date": "2024-01-09" }
        ],
        "relations": [
            { "from": "c", "to": "x", "kind": "precedes" }
        ],
        "catalog": {
            "statuses": [{ "id": 1, "name": "new", "is_default": true }]
        }
    }"#;

    #[test]
    fn loads_json_and_indexes_items() {
        let snapshot = Snapshot::from_json_str(SAMPLE).unwrap();
        let parent = ItemId::new("p");
        assert_eq!(snapshot.item(&parent).unwrap().subject, "parent");
        assert_eq!(snapshot.children(&parent).len(), 1);
        assert_eq!(snapshot.relations(&ItemId::new("x")).len(), 1);
        assert_eq!(snapshot.relations(&parent).len(), 0);
        assert_eq!(snapshot.default_status().unwrap().id, StatusId(1));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Snapshot::new(vec![WorkItem::with_id("a"), WorkItem::with_id("a")], vec![])
            .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateId(ref id) if id.as_str() == "a"));
    }

    #[test]
    fn items_without_id_are_rejected() {
        let err = Snapshot::new(vec![WorkItem::with_id("a"), WorkItem::default()], vec![])
            .unwrap_err();
        assert!(matches!(err, SnapshotError::MissingId { index: 1 }));
    }

    #[test]
    fn invalid_json_item_set_surfaces_as_parse_error() {
        let err = Snapshot::from_json_str(r#"{"items":[{"subject":"no id"}]}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
        assert!(err.to_string().contains("has no id"));
        assert_eq!(err.error_code(), ErrorCode::SnapshotInvalid);
    }

    #[test]
    fn self_relation_is_indexed_once() {
        let snapshot = Snapshot::new(
            vec![WorkItem::with_id("a")],
            vec![Relation::new("a", "a", RelationKind::Precedes)],
        )
        .unwrap();
        assert_eq!(snapshot.relations(&ItemId::new("a")).len(), 1);
    }

    #[test]
    fn serializes_back_to_file_layout() {
        let snapshot = Snapshot::from_json_str(SAMPLE).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
        assert_eq!(json["relations"][0]["kind"], "precedes");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Snapshot::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
        assert_eq!(err.error_code(), ErrorCode::SnapshotMissing);
    }
}
