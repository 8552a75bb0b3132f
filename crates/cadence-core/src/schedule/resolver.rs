//! Earliest permissible start dates.
//!
//! # Overview
//!
//! An item may not start before the day after its latest predecessor ends.
//! Constraints also flow down the hierarchy: the predecessors of an
//! automatically scheduled ancestor bind its descendants too. The first
//! manually scheduled ancestor ends that flow, and its own predecessors do
//! not count.
//!
//! [`soonest_start`] evaluates that rule for one item. [`resolve_soonest`]
//! is the request-level variant that also knows what changed in the
//! current update:
//!
//! 1. candidate₁ is the bound from the item's own predecessors;
//! 2. if the parent changed and the new parent is automatic, candidate₂ is
//!    the parent's soonest start;
//! 3. otherwise, if the item was just switched to automatic, candidate₂ is
//!    the later of its children's earliest date and its own soonest start;
//! 4. the result is the later of the two.
//!
//! The parent-driven candidate takes precedence over the self-driven one;
//! the latter is only consulted when the former yields nothing.
//!
//! # Cycles
//!
//! Every predecessor edge is checked with
//! [`detect_precedence_cycle`] before its date is used. An edge on a loop
//! contributes nothing and produces a [`CycleWarning`]. A new parent inside
//! the item's own subtree closes a hierarchy loop through the item; the
//! parent candidate is then dropped.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dates;
use crate::graph::WorkGraph;
use crate::graph::cycles::{CycleWarning, detect_precedence_cycle};
use crate::graph::hierarchy::{automatic_ancestors, children_span};
use crate::graph::relations::predecessor_ids;
use crate::model::ids::ItemId;
use crate::model::item::WorkItem;

/// What the current request did to the scheduling-relevant attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleChange {
    /// `parent_id` differs from the persisted value.
    pub parent_changed: bool,
    /// `schedule_manually` went from `true` to `false`.
    pub switched_to_automatic: bool,
}

impl ScheduleChange {
    /// Compare the persisted item with its working copy.
    pub fn between(before: &WorkItem, after: &WorkItem) -> Self {
        Self {
            parent_changed: before.parent_id != after.parent_id,
            switched_to_automatic: before.schedule_manually && !after.schedule_manually,
        }
    }
}

/// A soonest-start result plus the loops met while computing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoonestStart {
    pub date: Option<NaiveDate>,
    pub warnings: Vec<CycleWarning>,
    /// A `parent_id` on the walked chain that names no known item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_parent: Option<ItemId>,
}

impl SoonestStart {
    fn absorb(&mut self, other: Self) -> Option<NaiveDate> {
        for warning in other.warnings {
            push_unique(&mut self.warnings, warning);
        }
        if self.unknown_parent.is_none() {
            self.unknown_parent = other.unknown_parent;
        }
        other.date
    }
}

/// Earliest start `item` may have given its own predecessors and those of
/// its automatically scheduled ancestors.
///
/// `item` is taken as a working copy: its `parent_id` is followed even if
/// it differs from what the graph has persisted.
pub fn soonest_start<G: WorkGraph + ?Sized>(graph: &G, item: &WorkItem) -> SoonestStart {
    let mut result = SoonestStart::default();

    if let Some(id) = &item.id {
        result.date = predecessor_bound(graph, id, &mut result.warnings);
    }

    let (chain, _) = ancestor_bound(graph, item, &mut result);
    result.date = dates::latest(result.date, chain);
    result
}

/// Request-level soonest start for `item`.
pub fn resolve_soonest<G: WorkGraph + ?Sized>(
    graph: &G,
    item: &WorkItem,
    change: ScheduleChange,
) -> SoonestStart {
    let mut result = SoonestStart::default();

    let own = item
        .id
        .as_ref()
        .and_then(|id| predecessor_bound(graph, id, &mut result.warnings));

    // Walked from the working copy so a parent inside the item's own
    // subtree closes a loop instead of reaching the old ancestors.
    let from_parent = if change.parent_changed {
        let (bound, looped) = ancestor_bound(graph, item, &mut result);
        bound.filter(|_| !looped)
    } else {
        None
    };

    let inherited = from_parent.or_else(|| {
        if !change.switched_to_automatic {
            return None;
        }
        let children_min = item
            .id
            .as_ref()
            .and_then(|id| children_span(graph, id))
            .map(|(min, _)| min);
        let chain = result.absorb(soonest_start(graph, item));
        dates::latest(children_min, chain)
    });

    result.date = dates::latest(own, inherited);
    debug!(
        item = item.id.as_ref().map_or("<new>", ItemId::as_str),
        ?own,
        ?inherited,
        soonest = ?result.date,
        "resolved soonest start"
    );
    result
}

/// Latest predecessor bound over the automatic ancestors of `item`.
///
/// Loops and unknown parents met on the way are recorded in `result`. The
/// flag is `true` when the chain looped back on an item already walked.
fn ancestor_bound<G: WorkGraph + ?Sized>(
    graph: &G,
    item: &WorkItem,
    result: &mut SoonestStart,
) -> (Option<NaiveDate>, bool) {
    let chain = automatic_ancestors(graph, item);
    if result.unknown_parent.is_none() {
        result.unknown_parent = chain.dangling;
    }
    let looped = chain.cycle.is_some();
    if let Some(cycle) = chain.cycle {
        warn!(%cycle, "parent chain loops; ignoring the repeated ancestors");
        push_unique(&mut result.warnings, cycle);
    }

    let mut bound = None;
    for ancestor in chain.items {
        if let Some(id) = &ancestor.id {
            bound = dates::latest(bound, predecessor_bound(graph, id, &mut result.warnings));
        }
    }
    (bound, looped)
}

/// The day after the latest due date among `id`'s predecessors, skipping
/// predecessors that sit on a precedence loop through `id`.
fn predecessor_bound<G: WorkGraph + ?Sized>(
    graph: &G,
    id: &ItemId,
    warnings: &mut Vec<CycleWarning>,
) -> Option<NaiveDate> {
    let mut latest_due: Option<NaiveDate> = None;
    for pred_id in predecessor_ids(graph, id) {
        if let Some(cycle) = detect_precedence_cycle(graph, &pred_id, id) {
            warn!(%cycle, item = %id, predecessor = %pred_id, "skipping cyclic predecessor");
            push_unique(warnings, cycle);
            continue;
        }
        let due = graph.item(&pred_id).and_then(|pred| pred.due_date);
        latest_due = dates::latest(latest_due, due);
    }
    latest_due.map(dates::next_day)
}

fn push_unique(warnings: &mut Vec<CycleWarning>, warning: CycleWarning) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::cycles::CycleKind;
    use crate::model::relation::Relation;
    use crate::snapshot::Snapshot;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn due(id: &str, date: NaiveDate) -> WorkItem {
        WorkItem {
            start_date: Some(date),
            due_date: Some(date),
            ..WorkItem::with_id(id)
        }
    }

    fn child_of(id: &str, parent: &str) -> WorkItem {
        WorkItem {
            parent_id: Some(ItemId::new(parent)),
            ..WorkItem::with_id(id)
        }
    }

    fn lookup<'a>(graph: &'a Snapshot, id: &str) -> &'a WorkItem {
        graph.item(&ItemId::new(id)).unwrap()
    }

    #[test]
    fn no_constraints_yield_none() {
        let graph = Snapshot::new(vec![WorkItem::with_id("x")], vec![]).unwrap();
        let result = soonest_start(&graph, lookup(&graph, "x"));
        assert_eq!(result, SoonestStart::default());
    }

    #[test]
    fn latest_predecessor_wins() {
        let graph = Snapshot::new(
            vec![
                due("p1", d(2024, 1, 10)),
                due("p2", d(2024, 1, 14)),
                WorkItem::with_id("p3"),
                WorkItem::with_id("s"),
            ],
            vec![
                Relation::precedes("p1", "s"),
                Relation::precedes("p2", "s"),
                Relation::precedes("p3", "s"),
            ],
        )
        .unwrap();
        assert_eq!(
            soonest_start(&graph, lookup(&graph, "s")).date,
            Some(d(2024, 1, 15))
        );
    }

    #[test]
    fn ancestor_predecessors_flow_down_through_automatic_parents() {
        let graph = Snapshot::new(
            vec![
                due("pred", d(2024, 5, 1)),
                WorkItem::with_id("top"),
                child_of("mid", "top"),
                child_of("leaf", "mid"),
            ],
            vec![Relation::precedes("pred", "top")],
        )
        .unwrap();
        assert_eq!(
            soonest_start(&graph, lookup(&graph, "leaf")).date,
            Some(d(2024, 5, 2))
        );
    }

    #[test]
    fn manual_ancestor_blocks_its_own_and_higher_predecessors() {
        let graph = Snapshot::new(
            vec![
                due("pred-top", d(2024, 5, 1)),
                due("pred-mid", d(2024, 6, 1)),
                WorkItem::with_id("top"),
                WorkItem {
                    schedule_manually: true,
                    ..child_of("mid", "top")
                },
                child_of("leaf", "mid"),
            ],
            vec![
                Relation::precedes("pred-top", "top"),
                Relation::precedes("pred-mid", "mid"),
            ],
        )
        .unwrap();
        assert_eq!(soonest_start(&graph, lookup(&graph, "leaf")).date, None);
    }

    #[test]
    fn manual_item_still_reports_its_own_bound() {
        let graph = Snapshot::new(
            vec![
                due("pred", d(2024, 2, 1)),
                WorkItem {
                    schedule_manually: true,
                    ..WorkItem::with_id("x")
                },
            ],
            vec![Relation::precedes("pred", "x")],
        )
        .unwrap();
        assert_eq!(
            soonest_start(&graph, lookup(&graph, "x")).date,
            Some(d(2024, 2, 2))
        );
    }

    #[test]
    fn cyclic_predecessors_are_skipped_with_warning() {
        let graph = Snapshot::new(
            vec![due("a", d(2024, 1, 5)), due("b", d(2024, 1, 9))],
            vec![Relation::precedes("a", "b"), Relation::precedes("b", "a")],
        )
        .unwrap();
        let result = soonest_start(&graph, lookup(&graph, "a"));
        assert_eq!(result.date, None);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains(&ItemId::new("b")));
    }

    #[test]
    fn parent_change_pulls_in_new_parent_constraint() {
        let graph = Snapshot::new(
            vec![
                due("pred", d(2024, 4, 10)),
                WorkItem::with_id("parent"),
                due("x", d(2024, 4, 1)),
            ],
            vec![Relation::precedes("pred", "parent")],
        )
        .unwrap();
        let mut working = lookup(&graph, "x").clone();
        working.parent_id = Some(ItemId::new("parent"));
        let change = ScheduleChange::between(lookup(&graph, "x"), &working);
        assert!(change.parent_changed);

        let result = resolve_soonest(&graph, &working, change);
        assert_eq!(result.date, Some(d(2024, 4, 11)));

        // Without the change flag the parent's predecessor does not count.
        let unchanged = resolve_soonest(&graph, &working, ScheduleChange::default());
        assert_eq!(unchanged.date, None);
    }

    #[test]
    fn manual_new_parent_contributes_nothing() {
        let graph = Snapshot::new(
            vec![
                due("pred", d(2024, 4, 10)),
                WorkItem {
                    schedule_manually: true,
                    ..WorkItem::with_id("parent")
                },
                WorkItem::with_id("x"),
            ],
            vec![Relation::precedes("pred", "parent")],
        )
        .unwrap();
        let working = WorkItem {
            parent_id: Some(ItemId::new("parent")),
            ..lookup(&graph, "x").clone()
        };
        let change = ScheduleChange {
            parent_changed: true,
            switched_to_automatic: false,
        };
        assert_eq!(resolve_soonest(&graph, &working, change).date, None);
    }

    #[test]
    fn switch_to_automatic_uses_children_and_ancestry() {
        let graph = Snapshot::new(
            vec![
                WorkItem {
                    schedule_manually: true,
                    ..WorkItem::with_id("p")
                },
                WorkItem {
                    start_date: Some(d(2024, 3, 1)),
                    due_date: Some(d(2024, 3, 5)),
                    ..child_of("c1", "p")
                },
                WorkItem {
                    start_date: Some(d(2024, 3, 3)),
                    due_date: Some(d(2024, 3, 10)),
                    ..child_of("c2", "p")
                },
            ],
            vec![],
        )
        .unwrap();
        let before = lookup(&graph, "p");
        let working = WorkItem {
            schedule_manually: false,
            ..before.clone()
        };
        let change = ScheduleChange::between(before, &working);
        assert!(change.switched_to_automatic);
        assert_eq!(
            resolve_soonest(&graph, &working, change).date,
            Some(d(2024, 3, 1))
        );
    }

    #[test]
    fn own_predecessor_beats_earlier_parent_bound() {
        let graph = Snapshot::new(
            vec![
                due("early", d(2024, 1, 1)),
                due("late", d(2024, 1, 20)),
                WorkItem::with_id("parent"),
                WorkItem::with_id("x"),
            ],
            vec![
                Relation::precedes("early", "parent"),
                Relation::precedes("late", "x"),
            ],
        )
        .unwrap();
        let working = WorkItem {
            parent_id: Some(ItemId::new("parent")),
            ..lookup(&graph, "x").clone()
        };
        let change = ScheduleChange {
            parent_changed: true,
            switched_to_automatic: false,
        };
        assert_eq!(
            resolve_soonest(&graph, &working, change).date,
            Some(d(2024, 1, 21))
        );
    }

    #[test]
    fn parent_inside_own_subtree_closes_a_loop() {
        let graph = Snapshot::new(
            vec![
                due("pred", d(2024, 5, 1)),
                WorkItem::with_id("root"),
                child_of("x", "root"),
                child_of("c", "x"),
            ],
            vec![Relation::precedes("pred", "root")],
        )
        .unwrap();
        let before = lookup(&graph, "x");
        let working = WorkItem {
            parent_id: Some(ItemId::new("c")),
            ..before.clone()
        };
        let result = resolve_soonest(&graph, &working, ScheduleChange::between(before, &working));

        assert_eq!(result.date, None);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, CycleKind::Hierarchy);
        assert_eq!(
            result.warnings[0].path,
            vec![ItemId::new("x"), ItemId::new("c"), ItemId::new("x")]
        );
    }

    fn manual_parent_with_late_children(new_parent_pred: Option<NaiveDate>) -> Snapshot {
        let mut items = vec![
            WorkItem::with_id("np"),
            WorkItem {
                schedule_manually: true,
                ..WorkItem::with_id("p")
            },
            WorkItem {
                start_date: Some(d(2024, 3, 1)),
                due_date: Some(d(2024, 3, 5)),
                ..child_of("c", "p")
            },
        ];
        let mut relations = vec![];
        if let Some(date) = new_parent_pred {
            items.push(due("pred", date));
            relations.push(Relation::precedes("pred", "np"));
        }
        Snapshot::new(items, relations).unwrap()
    }

    #[test]
    fn new_parent_bound_wins_over_children_when_both_change() {
        let graph = manual_parent_with_late_children(Some(d(2024, 2, 1)));
        let before = lookup(&graph, "p");
        let working = WorkItem {
            parent_id: Some(ItemId::new("np")),
            schedule_manually: false,
            ..before.clone()
        };
        let change = ScheduleChange::between(before, &working);
        assert_eq!(
            change,
            ScheduleChange {
                parent_changed: true,
                switched_to_automatic: true,
            }
        );
        assert_eq!(
            resolve_soonest(&graph, &working, change).date,
            Some(d(2024, 2, 2))
        );
    }

    #[test]
    fn unbound_new_parent_falls_back_to_children() {
        let graph = manual_parent_with_late_children(None);
        let before = lookup(&graph, "p");
        let working = WorkItem {
            parent_id: Some(ItemId::new("np")),
            schedule_manually: false,
            ..before.clone()
        };
        let change = ScheduleChange::between(before, &working);
        assert!(change.parent_changed && change.switched_to_automatic);
        assert_eq!(
            resolve_soonest(&graph, &working, change).date,
            Some(d(2024, 3, 1))
        );
    }

    #[test]
    fn unknown_grandparent_is_recorded() {
        let graph = Snapshot::new(
            vec![child_of("p", "gone"), child_of("x", "p")],
            vec![],
        )
        .unwrap();
        let result = soonest_start(&graph, lookup(&graph, "x"));
        assert_eq!(result.date, None);
        assert_eq!(result.unknown_parent, Some(ItemId::new("gone")));
    }
}
