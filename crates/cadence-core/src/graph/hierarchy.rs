//! Parent/child traversal.
//!
//! # Overview
//!
//! Every item has at most one parent. The engine walks the hierarchy in
//! three ways:
//!
//! - upward, to collect the ancestor chain whose predecessors constrain an
//!   item ([`automatic_ancestors`]);
//! - one level down, to measure the date span of an item's children
//!   ([`children_span`]);
//! - fully down, to collect a subtree for cleanup checks ([`subtree_ids`]).
//!
//! The walk upward starts from a working copy, not from the persisted item,
//! because the parent may have just changed in the current request.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDate;

use super::WorkGraph;
use super::cycles::{CycleKind, CycleWarning};
use crate::dates;
use crate::model::ids::ItemId;
use crate::model::item::WorkItem;

// ---------------------------------------------------------------------------
// Ancestry
// ---------------------------------------------------------------------------

/// The ancestor chain of an item, nearest first.
#[derive(Debug, Clone, Default)]
pub struct Ancestry<'g> {
    pub items: Vec<&'g WorkItem>,
    /// Set when the chain looped back on an item already visited. The chain
    /// is truncated before the repeat.
    pub cycle: Option<CycleWarning>,
    /// Set when a `parent_id` on the chain names an item the graph does not
    /// know. The chain stops there.
    pub dangling: Option<ItemId>,
}

/// Walk `parent_id` links upward from `start`, nearest ancestor first,
/// stopping before the first manually scheduled ancestor.
///
/// A manually scheduled item is an opaque boundary: neither it nor anything
/// above it constrains the items below.
pub fn automatic_ancestors<'g, G: WorkGraph + ?Sized>(
    graph: &'g G,
    start: &WorkItem,
) -> Ancestry<'g> {
    let mut chain = Ancestry::default();
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut path: Vec<ItemId> = Vec::new();
    if let Some(id) = &start.id {
        visited.insert(id.clone());
        path.push(id.clone());
    }

    let mut next = start.parent_id.clone();
    while let Some(parent_id) = next {
        if !visited.insert(parent_id.clone()) {
            // Close the loop at the first occurrence of the repeated id.
            let from = path.iter().position(|id| *id == parent_id).unwrap_or(0);
            let mut cycle: Vec<ItemId> = path.split_off(from);
            cycle.push(parent_id);
            chain.cycle = Some(CycleWarning {
                kind: CycleKind::Hierarchy,
                path: cycle,
            });
            break;
        }
        let Some(parent) = graph.item(&parent_id) else {
            chain.dangling = Some(parent_id);
            break;
        };
        if !parent.schedule_automatically() {
            break;
        }
        path.push(parent_id);
        chain.items.push(parent);
        next = parent.parent_id.clone();
    }

    chain
}

// ---------------------------------------------------------------------------
// Children
// ---------------------------------------------------------------------------

/// Earliest and latest date over all start and due dates of `id`'s direct
/// children, or `None` when no child carries a date.
pub fn children_span<G: WorkGraph + ?Sized>(graph: &G, id: &ItemId) -> Option<(NaiveDate, NaiveDate)> {
    dates::span_of(
        graph
            .children(id)
            .into_iter()
            .flat_map(|child| [child.start_date, child.due_date]),
    )
}

/// Duration spanned by the children of `id`: `max - min + 1`.
pub fn children_duration<G: WorkGraph + ?Sized>(graph: &G, id: &ItemId) -> Option<i64> {
    children_span(graph, id).map(|(min, max)| dates::duration_of(min, max))
}

/// Ids of `root` and every descendant, breadth first.
///
/// Loops are skipped through the visited set.
pub fn subtree_ids<G: WorkGraph + ?Sized>(graph: &G, root: &ItemId) -> Vec<ItemId> {
    let mut visited: HashSet<ItemId> = HashSet::new();
    let mut queue: VecDeque<ItemId> = VecDeque::from([root.clone()]);
    let mut result: Vec<ItemId> = Vec::new();

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        result.push(current.clone());
        for child in graph.children(&current) {
            if let Some(child_id) = &child.id {
                if !visited.contains(child_id) {
                    queue.push_back(child_id.clone());
                }
            }
        }
    }

    result
}
