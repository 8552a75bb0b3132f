//! Post-resolution validation.
//!
//! Resolution never fails; it may still produce an item the caller must
//! not persist (no default status was available, the user asked for
//! inverted dates, ...). [`validate`] lists every such problem so the
//! caller can reject the request with all reasons at once.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::ErrorCode;
use crate::graph::WorkGraph;
use crate::graph::hierarchy::subtree_ids;
use crate::model::ids::{ItemId, StatusId, TypeId};
use crate::model::item::{Field, WorkItem};

/// One reason an item may not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractViolation {
    #[error("{field} can't be blank")]
    Blank { field: Field },

    #[error("due date {due} is before start date {start}")]
    DueBeforeStart { start: NaiveDate, due: NaiveDate },

    #[error("milestone start date {start} differs from due date {due}")]
    MilestoneDatesDiffer { start: NaiveDate, due: NaiveDate },

    #[error("status {status} is not allowed for type {type_id}")]
    StatusNotAllowed { status: StatusId, type_id: TypeId },

    #[error("parent '{parent}' does not exist")]
    UnknownParent { parent: ItemId },

    #[error("item can't be its own parent")]
    OwnParent,

    #[error("parent '{parent}' is a descendant of the item")]
    ParentInSubtree { parent: ItemId },
}

impl ContractViolation {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownParent { .. } => ErrorCode::ItemNotFound,
            Self::OwnParent | Self::ParentInSubtree { .. } => ErrorCode::CycleDetected,
            Self::Blank { .. }
            | Self::DueBeforeStart { .. }
            | Self::MilestoneDatesDiffer { .. }
            | Self::StatusNotAllowed { .. } => ErrorCode::ContractViolation,
        }
    }
}

const REQUIRED: [Field; 6] = [
    Field::Subject,
    Field::Project,
    Field::Type,
    Field::Status,
    Field::Priority,
    Field::Author,
];

/// Every contract violation of `item`, in a stable order. Empty means the
/// item may be persisted.
pub fn validate<G, C>(graph: &G, catalog: &C, item: &WorkItem) -> Vec<ContractViolation>
where
    G: WorkGraph + ?Sized,
    C: Catalog + ?Sized,
{
    let mut violations: Vec<ContractViolation> = REQUIRED
        .into_iter()
        .filter(|field| is_blank(item, *field))
        .map(|field| ContractViolation::Blank { field })
        .collect();

    if let (Some(start), Some(due)) = (item.start_date, item.due_date) {
        if due < start {
            violations.push(ContractViolation::DueBeforeStart { start, due });
        }
        if start != due && catalog.is_milestone(item.type_id) {
            violations.push(ContractViolation::MilestoneDatesDiffer { start, due });
        }
    }

    if let (Some(status), Some(type_id)) = (item.status_id, item.type_id) {
        // Unknown statuses and types are reported by the storage layer.
        if catalog.status(status).is_some()
            && catalog.work_type(type_id).is_some()
            && !catalog
                .allowed_statuses(type_id)
                .iter()
                .any(|s| s.id == status)
        {
            violations.push(ContractViolation::StatusNotAllowed { status, type_id });
        }
    }

    if let Some(parent) = &item.parent_id {
        if item.id.as_ref() == Some(parent) {
            violations.push(ContractViolation::OwnParent);
        } else if graph.item(parent).is_none() {
            violations.push(ContractViolation::UnknownParent {
                parent: parent.clone(),
            });
        } else if item
            .id
            .as_ref()
            .is_some_and(|id| subtree_ids(graph, id).contains(parent))
        {
            violations.push(ContractViolation::ParentInSubtree {
                parent: parent.clone(),
            });
        }
    }

    violations
}

fn is_blank(item: &WorkItem, field: Field) -> bool {
    match field {
        Field::Subject => item.subject.trim().is_empty(),
        Field::Project => item.project_id.is_none(),
        Field::Type => item.type_id.is_none(),
        Field::Status => item.status_id.is_none(),
        Field::Priority => item.priority_id.is_none(),
        Field::Author => item.author_id.is_none(),
        _ => false,
    }
}
