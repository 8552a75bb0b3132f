//! Cycle detection for the hierarchy and precedence graphs.
//!
//! # Overview
//!
//! Both graphs are acyclic by contract, but the contract is enforced by the
//! storage layer, not here. The scheduler therefore treats a cycle as bad
//! input: the offending path is dropped and a [`CycleWarning`] is handed
//! back to the caller.
//!
//! # Design
//!
//! - **On the fly**: [`detect_precedence_cycle`] answers "does the edge
//!   `pred → succ` sit on a loop?" with a BFS from `succ` looking for
//!   `pred`. It is what the resolver calls for every predecessor it uses.
//! - **Whole graph**: [`find_precedence_cycles`] and
//!   [`find_hierarchy_cycles`] report every strongly connected component of
//!   a full item set using petgraph's Tarjan implementation. They back the
//!   `check` diagnostics.
//! - **Warn, don't fail**: nothing here returns an error.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::WorkGraph;
use super::relations::successor_ids;
use crate::model::ids::ItemId;
use crate::model::item::WorkItem;
use crate::model::relation::Relation;

// ---------------------------------------------------------------------------
// CycleWarning
// ---------------------------------------------------------------------------

/// Which graph a cycle was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    /// A parent chain that loops back on itself.
    Hierarchy,
    /// `precedes`/`follows` relations forming a loop.
    Precedence,
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hierarchy => f.write_str("hierarchy"),
            Self::Precedence => f.write_str("precedence"),
        }
    }
}

/// A loop found in one of the graphs.
///
/// For loops found on the fly, `path` starts and ends at the same item
/// (`["A", "B", "A"]`). Whole-graph diagnostics report each strongly
/// connected component as its sorted member list instead, closed the same
/// way so both shapes print alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleWarning {
    pub kind: CycleKind,
    pub path: Vec<ItemId>,
}

impl CycleWarning {
    /// Number of distinct items in the loop.
    pub fn cycle_len(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn is_self_loop(&self) -> bool {
        self.cycle_len() == 1
    }

    /// `true` if `id` is part of the loop.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.path.contains(id)
    }

    fn closed(kind: CycleKind, mut members: Vec<ItemId>) -> Self {
        if let Some(first) = members.first().cloned() {
            members.push(first);
        }
        Self {
            kind,
            path: members,
        }
    }
}

impl fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.cycle_len(), self.path.first(), self.path.get(1)) {
            (1, Some(only), _) => write!(
                f,
                "{} cycle detected: self-loop on '{only}'",
                self.kind
            ),
            (2, Some(a), Some(b)) => write!(
                f,
                "{} cycle detected: mutual loop between '{a}' and '{b}'",
                self.kind
            ),
            (len, _, _) => {
                let path = self
                    .path
                    .iter()
                    .map(ItemId::as_str)
                    .collect::<Vec<_>>()
                    .join(" → ");
                write!(f, "{} cycle detected ({len} items): {path}", self.kind)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// On-the-fly detection
// ---------------------------------------------------------------------------

/// Check whether the precedence edge `pred → succ` lies on a cycle.
///
/// The edge closes a loop when `pred` is reachable from `succ` by following
/// successor edges. The returned path is `pred → succ → … → pred`.
pub fn detect_precedence_cycle<G: WorkGraph + ?Sized>(
    graph: &G,
    pred: &ItemId,
    succ: &ItemId,
) -> Option<CycleWarning> {
    if pred == succ {
        return Some(CycleWarning {
            kind: CycleKind::Precedence,
            path: vec![pred.clone(), pred.clone()],
        });
    }

    let mut queue: VecDeque<ItemId> = VecDeque::from([succ.clone()]);
    let mut visited: HashSet<ItemId> = HashSet::from([succ.clone()]);
    let mut parent: HashMap<ItemId, ItemId> = HashMap::new();

    while let Some(current) = queue.pop_front() {
        if &current == pred {
            return Some(CycleWarning {
                kind: CycleKind::Precedence,
                path: reconstruct_path(&parent, pred, succ),
            });
        }
        for next in successor_ids(graph, &current) {
            if visited.insert(next.clone()) {
                parent.insert(next.clone(), current.clone());
                queue.push_back(next);
            }
        }
    }

    None
}

/// Rebuild `pred → succ → … → pred` from BFS parent links that lead from
/// `succ` to `pred`.
fn reconstruct_path(
    parent: &HashMap<ItemId, ItemId>,
    pred: &ItemId,
    succ: &ItemId,
) -> Vec<ItemId> {
    let mut succ_to_pred = vec![pred.clone()];
    let mut cursor = pred;
    while cursor != succ {
        match parent.get(cursor) {
            Some(prev) => {
                succ_to_pred.push(prev.clone());
                cursor = prev;
            }
            None => break,
        }
    }
    succ_to_pred.reverse();

    let mut path = Vec::with_capacity(succ_to_pred.len() + 1);
    path.push(pred.clone());
    path.extend(succ_to_pred);
    path
}

// ---------------------------------------------------------------------------
// Whole-graph diagnostics
// ---------------------------------------------------------------------------

/// Every precedence cycle among `relations`.
///
/// Each warning lists one strongly connected component. Self-loops are
/// reported as one-item cycles. Output is sorted for stable diffs.
pub fn find_precedence_cycles(relations: &[Relation]) -> Vec<CycleWarning> {
    let edges = relations
        .iter()
        .filter_map(Relation::precedence)
        .map(|(pred, succ)| (pred.clone(), succ.clone()));
    strongly_connected(CycleKind::Precedence, edges)
}

/// Every loop in the parent chains of `items`.
///
/// Edges run child → parent. Items whose parent is not among `items` are
/// ignored.
pub fn find_hierarchy_cycles(items: &[WorkItem]) -> Vec<CycleWarning> {
    let edges = items.iter().filter_map(|item| {
        Some((item.id.clone()?, item.parent_id.clone()?))
    });
    strongly_connected(CycleKind::Hierarchy, edges)
}

fn strongly_connected(
    kind: CycleKind,
    edges: impl Iterator<Item = (ItemId, ItemId)>,
) -> Vec<CycleWarning> {
    let mut graph: DiGraph<ItemId, ()> = DiGraph::new();
    let mut nodes: BTreeMap<ItemId, NodeIndex> = BTreeMap::new();

    let mut node_for = |graph: &mut DiGraph<ItemId, ()>, id: ItemId| {
        *nodes
            .entry(id.clone())
            .or_insert_with(|| graph.add_node(id))
    };

    for (from, to) in edges {
        let a = node_for(&mut graph, from);
        let b = node_for(&mut graph, to);
        graph.update_edge(a, b, ());
    }

    let mut cycles: Vec<CycleWarning> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut ids: Vec<ItemId> = component
                .into_iter()
                .map(|idx| graph[idx].clone())
                .collect();
            ids.sort_unstable();
            CycleWarning::closed(kind, ids)
        })
        .collect();

    cycles.sort_unstable_by(|a, b| a.path.cmp(&b.path));
    cycles
}
