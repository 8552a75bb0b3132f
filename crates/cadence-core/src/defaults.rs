//! Defaults for items that have not been persisted yet.
//!
//! Only unset attributes are filled. Start and due date are inherited from
//! the parent when that keeps them in order, and an explicit `null` in the
//! request suppresses the date default altogether.

use chrono::NaiveDate;
use tracing::debug;

use crate::catalog::Catalog;
use crate::graph::WorkGraph;
use crate::model::changes::AttributeChanges;
use crate::model::item::{Field, WorkItem};
use crate::resolve::ResolveContext;

/// Fill unset attributes of a new item.
///
/// Returns the fields that received a default, in the order they were
/// assigned. Persisted items are left untouched.
pub fn apply_defaults<G, C>(
    graph: &G,
    catalog: &C,
    ctx: &ResolveContext,
    changes: &AttributeChanges,
    item: &mut WorkItem,
) -> Vec<Field>
where
    G: WorkGraph + ?Sized,
    C: Catalog + ?Sized,
{
    if !item.is_new() {
        return Vec::new();
    }

    let mut filled = Vec::new();

    if item.priority_id.is_none() {
        if let Some(priority) = catalog.default_priority() {
            item.priority_id = Some(priority.id);
            filled.push(Field::Priority);
        }
    }

    if item.author_id.is_none() {
        if let Some(user) = ctx.acting_user {
            item.author_id = Some(user);
            filled.push(Field::Author);
        }
    }

    if item.status_id.is_none() {
        if let Some(status) = catalog.default_status() {
            item.status_id = Some(status.id);
            filled.push(Field::Status);
        }
    }

    let parent = item.parent_id.as_ref().and_then(|id| graph.item(id));
    let parent_start = parent.and_then(|p| p.start_date);
    let parent_due = parent.and_then(|p| p.due_date);

    if item.start_date.is_none() && !changes.mentions(Field::StartDate) {
        let comparison_due = item.due_date.or(parent_due);
        item.start_date = if precedes_or_open(parent_start, comparison_due) {
            parent_start
        } else if ctx.settings.work_packages.start_date_is_creation_date {
            Some(ctx.today)
        } else {
            None
        };
        if item.start_date.is_some() {
            filled.push(Field::StartDate);
        }
    }

    if item.due_date.is_none() && !changes.mentions(Field::DueDate) {
        let comparison_start = item.start_date.or(parent_start);
        if follows_or_open(parent_due, comparison_start) {
            item.due_date = parent_due;
            filled.push(Field::DueDate);
        }
    }

    if !filled.is_empty() {
        debug!(?filled, "applied defaults to new item");
    }
    filled
}

/// `start` is set and either nothing bounds it or it lies before `due`.
fn precedes_or_open(start: Option<NaiveDate>, due: Option<NaiveDate>) -> bool {
    match (start, due) {
        (Some(_), None) => true,
        (Some(start), Some(due)) => start < due,
        (None, _) => false,
    }
}

/// `due` is set and either nothing bounds it or it lies after `start`.
fn follows_or_open(due: Option<NaiveDate>, start: Option<NaiveDate>) -> bool {
    match (due, start) {
        (Some(_), None) => true,
        (Some(due), Some(start)) => due > start,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Priority, StaticCatalog, Status};
    use crate::config::{Settings, WorkPackageSettings};
    use crate::model::ids::{ItemId, PriorityId, StatusId, UserId};
    use crate::snapshot::Snapshot;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog {
            statuses: vec![Status {
                id: StatusId(1),
                name: "new".into(),
                is_default: true,
                is_closed: false,
            }],
            priorities: vec![Priority {
                id: PriorityId(3),
                name: "normal".into(),
                is_default: true,
                active: true,
            }],
            ..StaticCatalog::default()
        }
    }

    fn ctx(creation_date: bool) -> ResolveContext {
        ResolveContext {
            acting_user: Some(UserId(7)),
            settings: Settings {
                work_packages: WorkPackageSettings {
                    start_date_is_creation_date: creation_date,
                },
            },
            today: d(2024, 6, 15),
        }
    }

    fn parent(start: Option<NaiveDate>, due: Option<NaiveDate>) -> Snapshot {
        Snapshot::new(
            vec![WorkItem {
                start_date: start,
                due_date: due,
                ..WorkItem::with_id("parent")
            }],
            vec![],
        )
        .unwrap()
    }

    fn new_child() -> WorkItem {
        WorkItem {
            parent_id: Some(ItemId::new("parent")),
            ..WorkItem::default()
        }
    }

    #[test]
    fn fills_status_priority_and_author() {
        let graph = parent(None, None);
        let mut item = WorkItem::default();
        let filled = apply_defaults(
            &graph,
            &catalog(),
            &ctx(false),
            &AttributeChanges::default(),
            &mut item,
        );
        assert_eq!(filled, vec![Field::Priority, Field::Author, Field::Status]);
        assert_eq!(item.status_id, Some(StatusId(1)));
        assert_eq!(item.priority_id, Some(PriorityId(3)));
        assert_eq!(item.author_id, Some(UserId(7)));
        assert_eq!(item.start_date, None);
    }

    #[test]
    fn persisted_items_are_untouched() {
        let graph = parent(None, None);
        let mut item = WorkItem::with_id("x");
        let before = item.clone();
        let filled = apply_defaults(
            &graph,
            &catalog(),
            &ctx(true),
            &AttributeChanges::default(),
            &mut item,
        );
        assert!(filled.is_empty());
        assert_eq!(item, before);
    }

    #[test]
    fn explicit_values_are_kept() {
        let graph = parent(None, None);
        let mut item = WorkItem {
            status_id: Some(StatusId(9)),
            author_id: Some(UserId(1)),
            ..WorkItem::default()
        };
        apply_defaults(
            &graph,
            &catalog(),
            &ctx(false),
            &AttributeChanges::default(),
            &mut item,
        );
        assert_eq!(item.status_id, Some(StatusId(9)));
        assert_eq!(item.author_id, Some(UserId(1)));
    }

    #[test]
    fn dates_are_inherited_from_parent() {
        let graph = parent(Some(d(2024, 3, 1)), Some(d(2024, 3, 20)));
        let mut item = new_child();
        apply_defaults(
            &graph,
            &catalog(),
            &ctx(true),
            &AttributeChanges::default(),
            &mut item,
        );
        assert_eq!(item.start_date, Some(d(2024, 3, 1)));
        assert_eq!(item.due_date, Some(d(2024, 3, 20)));
    }

    #[test]
    fn parent_start_after_own_due_is_not_inherited() {
        let graph = parent(Some(d(2024, 3, 10)), Some(d(2024, 3, 20)));
        let mut item = WorkItem {
            due_date: Some(d(2024, 3, 5)),
            ..new_child()
        };
        apply_defaults(
            &graph,
            &catalog(),
            &ctx(false),
            &AttributeChanges::default(),
            &mut item,
        );
        assert_eq!(item.start_date, None);
        assert_eq!(item.due_date, Some(d(2024, 3, 5)));
    }

    #[test]
    fn parent_with_only_start_passes_start_down() {
        let graph = parent(Some(d(2024, 3, 10)), None);
        let mut item = new_child();
        apply_defaults(
            &graph,
            &catalog(),
            &ctx(false),
            &AttributeChanges::default(),
            &mut item,
        );
        assert_eq!(item.start_date, Some(d(2024, 3, 10)));
        assert_eq!(item.due_date, None);
    }

    #[test]
    fn creation_date_setting_applies_without_parent_start() {
        let graph = parent(None, None);
        let mut item = WorkItem::default();
        apply_defaults(
            &graph,
            &catalog(),
            &ctx(true),
            &AttributeChanges::default(),
            &mut item,
        );
        assert_eq!(item.start_date, Some(d(2024, 6, 15)));
        assert_eq!(item.due_date, None);
    }

    #[test]
    fn explicit_null_suppresses_date_defaults() {
        let graph = parent(Some(d(2024, 3, 1)), Some(d(2024, 3, 20)));
        let mut item = new_child();
        let changes = AttributeChanges {
            start_date: Some(None),
            due_date: Some(None),
            ..AttributeChanges::default()
        };
        apply_defaults(&graph, &catalog(), &ctx(true), &changes, &mut item);
        assert_eq!(item.start_date, None);
        assert_eq!(item.due_date, None);
    }

    #[test]
    fn missing_catalog_defaults_leave_fields_unset() {
        let graph = parent(None, None);
        let mut item = WorkItem::default();
        let ctx = ResolveContext {
            acting_user: None,
            ..ctx(false)
        };
        let filled = apply_defaults(
            &graph,
            &StaticCatalog::default(),
            &ctx,
            &AttributeChanges::default(),
            &mut item,
        );
        assert!(filled.is_empty());
        assert_eq!(item.status_id, None);
        assert_eq!(item.author_id, None);
    }
}
