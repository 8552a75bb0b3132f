//! Applying a soonest start to an item's dates.
//!
//! Propagation only pushes dates later. The one exception is an item that
//! was switched from manual to automatic scheduling in the current request:
//! it snaps to whatever the constraints now dictate, earlier or later.
//!
//! Manually scheduled items keep their dates. Their soonest start is still
//! computed and handed back so the caller can show it.

#![allow(clippy::must_use_candidate)]

use tracing::debug;

use super::resolver::{ScheduleChange, SoonestStart, resolve_soonest};
use crate::catalog::Catalog;
use crate::dates;
use crate::graph::WorkGraph;
use crate::graph::hierarchy::children_duration;
use crate::model::item::WorkItem;

/// Unify milestone dates, then move `item` to its soonest start if the
/// rules allow it.
///
/// Returns the soonest start that was computed, applied or not.
pub fn propagate<G, C>(
    graph: &G,
    catalog: &C,
    item: &mut WorkItem,
    change: ScheduleChange,
) -> SoonestStart
where
    G: WorkGraph + ?Sized,
    C: Catalog + ?Sized,
{
    let milestone = catalog.is_milestone(item.type_id);
    if milestone {
        unify_milestone(item);
    }

    let soonest = resolve_soonest(graph, item, change);

    if item.schedule_manually {
        return soonest;
    }

    let current = item.current_start();
    if current.is_none() && !change.switched_to_automatic {
        return soonest;
    }

    let Some(min_start) = soonest.date else {
        return soonest;
    };

    let later = current.is_none_or(|current| min_start > current);
    if !(later || change.switched_to_automatic) {
        return soonest;
    }

    let duration = if milestone {
        1
    } else {
        item.id
            .as_ref()
            .and_then(|id| children_duration(graph, id))
            .unwrap_or_else(|| item.duration())
    };

    let due = dates::due_from_start(min_start, duration);
    debug!(
        from = ?item.start_date,
        to = %min_start,
        %due,
        duration,
        "moving item to its soonest start"
    );
    item.start_date = Some(min_start);
    item.due_date = Some(due);

    soonest
}

/// Milestones have one date. The due date wins when both are set.
pub fn unify_milestone(item: &mut WorkItem) {
    let effective = item.due_date.or(item.start_date);
    item.start_date = effective;
    item.due_date = effective;
}
