//! Checks for the "destroy work packages" flow.
//!
//! Destroying items leaves dependent records (time entries, for example)
//! behind. The caller either destroys them too, detaches them, or
//! reassigns them to a surviving item. Only the last option needs a check:
//! the target must exist and must survive the destruction, which also rules
//! out every descendant of a destroyed item.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ErrorCode;
use crate::graph::WorkGraph;
use crate::graph::hierarchy::subtree_ids;
use crate::model::ids::ItemId;

/// Why a reassignment target was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReassignError {
    #[error("reassignment target '{0}' does not exist")]
    TargetNotFound(ItemId),

    #[error("reassignment target '{0}' is being destroyed")]
    TargetDestroyed(ItemId),
}

impl ReassignError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::TargetNotFound(_) => ErrorCode::ItemNotFound,
            Self::TargetDestroyed(_) => ErrorCode::InvalidReassignTarget,
        }
    }
}

/// What happens to records that depend on destroyed items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "to", rename_all = "snake_case")]
pub enum DestroyAction {
    Destroy,
    Nullify,
    Reassign(ItemId),
}

/// Every id destroyed along with `doomed`: the items and all descendants.
pub fn destroyed_ids<G: WorkGraph + ?Sized>(graph: &G, doomed: &[ItemId]) -> BTreeSet<ItemId> {
    doomed
        .iter()
        .flat_map(|id| subtree_ids(graph, id))
        .collect()
}

/// Check that `target` may receive the dependents of `doomed`.
///
/// # Errors
///
/// [`ReassignError::TargetNotFound`] if the graph does not know `target`;
/// [`ReassignError::TargetDestroyed`] if it is one of `doomed` or below
/// one of them.
pub fn validate_reassign_target<G: WorkGraph + ?Sized>(
    graph: &G,
    doomed: &[ItemId],
    target: &ItemId,
) -> Result<(), ReassignError> {
    if graph.item(target).is_none() {
        return Err(ReassignError::TargetNotFound(target.clone()));
    }
    if destroyed_ids(graph, doomed).contains(target) {
        return Err(ReassignError::TargetDestroyed(target.clone()));
    }
    Ok(())
}

/// Check a complete destroy action.
///
/// # Errors
///
/// See [`validate_reassign_target`]; the other actions always pass.
pub fn validate_destroy_action<G: WorkGraph + ?Sized>(
    graph: &G,
    doomed: &[ItemId],
    action: &DestroyAction,
) -> Result<(), ReassignError> {
    match action {
        DestroyAction::Destroy | DestroyAction::Nullify => Ok(()),
        DestroyAction::Reassign(target) => validate_reassign_target(graph, doomed, target),
    }
}
