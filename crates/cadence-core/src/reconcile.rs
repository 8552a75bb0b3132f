//! Context reconciliation after a project or type change.
//!
//! # Overview
//!
//! Moving an item to another project or giving it another type can leave
//! attributes pointing at values that are not valid in the new context. The
//! pipeline below repairs them, one pure step at a time, each step taking
//! the previous step's output:
//!
//! | step                   | runs when                          |
//! |------------------------|------------------------------------|
//! | `ClearForeignVersion`  | project changed                    |
//! | `ReassignCategory`     | project changed                    |
//! | `FallbackType`         | project changed, type did not      |
//! | `ReassignStatus`       | type changed, status did not       |
//!
//! "Changed" always means: differs from the baseline the request started
//! from. `FallbackType` changes the type itself, so a later
//! `ReassignStatus` sees that change as well.
//!
//! Date consequences of a type change (a milestone flip) are left to date
//! propagation, which runs after the pipeline.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::catalog::{Catalog, Status};
use crate::model::ids::StatusId;
use crate::model::item::WorkItem;

/// One repair applied during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStep {
    /// Drop a version the new project does not share.
    ClearForeignVersion,
    /// Swap the category for the same-named one in the new project.
    ReassignCategory,
    /// Replace a type the new project does not enable.
    FallbackType,
    /// Replace a status the type does not allow.
    ReassignStatus,
}

/// Steps in the order they run.
pub const PIPELINE: [ReconcileStep; 4] = [
    ReconcileStep::ClearForeignVersion,
    ReconcileStep::ReassignCategory,
    ReconcileStep::FallbackType,
    ReconcileStep::ReassignStatus,
];

impl ReconcileStep {
    const fn as_str(self) -> &'static str {
        match self {
            Self::ClearForeignVersion => "clear_foreign_version",
            Self::ReassignCategory => "reassign_category",
            Self::FallbackType => "fallback_type",
            Self::ReassignStatus => "reassign_status",
        }
    }

    /// `true` if the step applies to the transition `baseline → item`.
    pub fn triggered(self, baseline: &WorkItem, item: &WorkItem) -> bool {
        let project_changed = item.project_id.is_some() && baseline.project_id != item.project_id;
        let type_changed = baseline.type_id != item.type_id;
        let status_changed = baseline.status_id != item.status_id;
        match self {
            Self::ClearForeignVersion | Self::ReassignCategory => project_changed,
            Self::FallbackType => project_changed && !type_changed,
            Self::ReassignStatus => type_changed && !status_changed,
        }
    }

    /// Run the step on `item`. The result equals the input when nothing
    /// needed repair.
    pub fn apply<C: Catalog + ?Sized>(self, catalog: &C, mut item: WorkItem) -> WorkItem {
        match self {
            Self::ClearForeignVersion => {
                if let (Some(project), Some(version)) = (item.project_id, item.version_id) {
                    if !catalog.shares_version(project, version) {
                        item.version_id = None;
                    }
                }
            }
            Self::ReassignCategory => {
                if let (Some(project), Some(current)) =
                    (item.project_id, item.category_id.and_then(|id| catalog.category(id)))
                {
                    item.category_id = catalog
                        .category_named(project, &current.name)
                        .map(|category| category.id);
                }
            }
            Self::FallbackType => {
                if let Some(project) = item.project_id {
                    let enabled = catalog.enabled_types(project);
                    let keeps_type = item
                        .type_id
                        .is_some_and(|current| enabled.iter().any(|t| t.id == current));
                    if !keeps_type {
                        item.type_id = enabled.first().map(|t| t.id);
                        item.status_id = reassigned_status(catalog, &item);
                    }
                }
            }
            Self::ReassignStatus => {
                item.status_id = reassigned_status(catalog, &item);
            }
        }
        item
    }
}

impl fmt::Display for ReconcileStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status valid for the item's type.
///
/// Keeps the current status when allowed. A status the catalog does not
/// know at all is kept too: it points at a data problem elsewhere that a
/// silent reassignment would hide.
fn reassigned_status<C: Catalog + ?Sized>(catalog: &C, item: &WorkItem) -> Option<StatusId> {
    if let Some(current) = item.status_id {
        if catalog.status(current).is_none() {
            return Some(current);
        }
    }
    let allowed: Vec<&Status> = item
        .type_id
        .map(|t| catalog.allowed_statuses(t))
        .unwrap_or_default();
    if item
        .status_id
        .is_some_and(|current| allowed.iter().any(|s| s.id == current))
    {
        return item.status_id;
    }
    allowed
        .iter()
        .find(|s| s.is_default)
        .or_else(|| allowed.first())
        .map(|s| s.id)
        .or(item.status_id)
}

/// Outcome of running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub item: WorkItem,
    /// Steps that changed something, in pipeline order.
    pub applied: Vec<ReconcileStep>,
}

/// Run every triggered step of [`PIPELINE`] on `item`.
///
/// `baseline` is the state the current request started from.
pub fn reconcile<C: Catalog + ?Sized>(
    catalog: &C,
    baseline: &WorkItem,
    item: WorkItem,
) -> Reconciled {
    let mut applied = Vec::new();
    let mut current = item;
    for step in PIPELINE {
        if !step.triggered(baseline, &current) {
            continue;
        }
        let next = step.apply(catalog, current.clone());
        if next != current {
            debug!(%step, "reconciled attribute");
            applied.push(step);
        }
        current = next;
    }
    Reconciled {
        item: current,
        applied,
    }
}
