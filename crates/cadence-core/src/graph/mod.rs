//! Read-only traversal over the two graphs work items live in.
//!
//! Items form a parent/child hierarchy and, independently, a
//! predecessor/successor graph through `precedes`/`follows` relations. The
//! storage for both belongs to the caller and is reached through
//! [`WorkGraph`].
//!
//! ## Submodules
//!
//! - [`hierarchy`]: ancestor chains, children date spans, subtrees.
//! - [`relations`]: predecessors and successors of an item.
//! - [`cycles`]: cycle warnings, on-the-fly detection and whole-graph
//!   diagnostics.
//!
//! Every traversal keeps an explicit visited set, so malformed input with
//! loops terminates and yields a [`cycles::CycleWarning`] instead.

use crate::model::ids::ItemId;
use crate::model::item::WorkItem;
use crate::model::relation::Relation;

pub mod cycles;
pub mod hierarchy;
pub mod relations;

/// Read accessor for persisted items and the edges between them.
pub trait WorkGraph {
    /// The persisted state of `id`.
    fn item(&self, id: &ItemId) -> Option<&WorkItem>;

    /// Items whose `parent_id` is `id`.
    fn children(&self, id: &ItemId) -> Vec<&WorkItem>;

    /// Relations with `id` at either end.
    fn relations(&self, id: &ItemId) -> Vec<&Relation>;
}

impl<G: WorkGraph + ?Sized> WorkGraph for &G {
    fn item(&self, id: &ItemId) -> Option<&WorkItem> {
        (**self).item(id)
    }

    fn children(&self, id: &ItemId) -> Vec<&WorkItem> {
        (**self).children(id)
    }

    fn relations(&self, id: &ItemId) -> Vec<&Relation> {
        (**self).relations(id)
    }
}
