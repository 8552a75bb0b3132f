//! Resolving one attribute-change request.
//!
//! # Overview
//!
//! [`resolve_attributes`] is the engine's only entry point. Given the item
//! as currently persisted (or a draft for a new item), the requested
//! changes, and read access to the surrounding graph and catalog, it
//! returns the attributes the caller should persist:
//!
//! 1. apply the requested changes to a working copy;
//! 2. fill defaults (new items only);
//! 3. run the reconciliation pipeline (project/type changes);
//! 4. take over custom-field defaults for the new context;
//! 5. propagate dates;
//! 6. apply the type's description template (new items only).
//!
//! # Baseline
//!
//! "Changed in this request" compares the working copy to a baseline. For
//! persisted items that is the item as passed in. For new items it is an
//! empty item, so every attribute the draft carries counts as changed.
//!
//! The function never fails. Problems in the surrounding data come back as
//! [`ResolveWarning`]s; missing required attributes are left for
//! [`crate::contract::validate`] to report.

#![allow(clippy::module_name_repetitions)]

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{instrument, warn};

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::defaults::apply_defaults;
use crate::graph::WorkGraph;
use crate::graph::cycles::CycleWarning;
use crate::model::changes::AttributeChanges;
use crate::model::ids::{ItemId, UserId};
use crate::model::item::{Field, WorkItem};
use crate::reconcile::{ReconcileStep, reconcile};
use crate::schedule::{ScheduleChange, propagate};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Everything a resolution needs besides the graph and catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveContext {
    /// Becomes the author of new items that have none.
    pub acting_user: Option<UserId>,
    pub settings: Settings,
    /// Creation date for new items when the settings ask for it.
    pub today: NaiveDate,
}

impl ResolveContext {
    pub fn new(acting_user: Option<UserId>, settings: Settings, today: NaiveDate) -> Self {
        Self {
            acting_user,
            settings,
            today,
        }
    }
}

/// A data-integrity problem met during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveWarning {
    /// A loop in the hierarchy or precedence graph; the looping path was
    /// ignored.
    Cycle { cycle: CycleWarning },
    /// `parent_id`, on the item or further up its chain, names an item the
    /// graph does not know.
    UnknownParent { parent: ItemId },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { cycle } => write!(f, "{cycle}"),
            Self::UnknownParent { parent } => write!(f, "parent '{parent}' does not exist"),
        }
    }
}

/// The attributes to persist plus what happened on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAttributes {
    pub item: WorkItem,
    /// Fields that differ from the item as passed in.
    pub changed: BTreeSet<Field>,
    /// Fields filled by defaulting.
    pub defaulted: Vec<Field>,
    /// Reconciliation steps that changed something.
    pub reconciled: Vec<ReconcileStep>,
    /// Earliest permissible start, whether or not it was applied.
    pub soonest_start: Option<NaiveDate>,
    pub warnings: Vec<ResolveWarning>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Resolve `changes` against `item`.
#[instrument(
    skip_all,
    fields(item = item.id.as_ref().map_or("<new>", ItemId::as_str))
)]
pub fn resolve_attributes<G, C>(
    graph: &G,
    catalog: &C,
    ctx: &ResolveContext,
    item: &WorkItem,
    changes: &AttributeChanges,
) -> ResolvedAttributes
where
    G: WorkGraph + ?Sized,
    C: Catalog + ?Sized,
{
    let baseline = if item.is_new() {
        WorkItem::default()
    } else {
        item.clone()
    };

    let mut working = item.clone();
    changes.apply_to(&mut working);

    let defaulted = apply_defaults(graph, catalog, ctx, changes, &mut working);

    let reconciled = reconcile(catalog, &baseline, working);
    let mut working = reconciled.item;

    if baseline.project_id != working.project_id || baseline.type_id != working.type_id {
        initialize_custom_values(catalog, &mut working);
    }

    let change = ScheduleChange::between(&baseline, &working);
    let soonest = propagate(graph, catalog, &mut working, change);

    if working.is_new() && baseline.type_id != working.type_id {
        apply_description_template(catalog, &mut working);
    }

    let mut warnings: Vec<ResolveWarning> = soonest
        .warnings
        .into_iter()
        .map(|cycle| ResolveWarning::Cycle { cycle })
        .collect();
    let unknown_parent = working
        .parent_id
        .clone()
        .filter(|parent| graph.item(parent).is_none())
        .or(soonest.unknown_parent);
    if let Some(parent) = unknown_parent {
        warn!(%parent, "parent does not exist");
        warnings.push(ResolveWarning::UnknownParent { parent });
    }

    ResolvedAttributes {
        changed: item.changed_fields(&working),
        item: working,
        defaulted,
        reconciled: reconciled.applied,
        soonest_start: soonest.date,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Custom values and description template
// ---------------------------------------------------------------------------

/// Give every custom field enabled in the item's (project, type) context a
/// value: the field's default, unless the item already has one.
pub fn initialize_custom_values<C: Catalog + ?Sized>(catalog: &C, item: &mut WorkItem) {
    let (Some(project), Some(type_id)) = (item.project_id, item.type_id) else {
        return;
    };
    for field in catalog.custom_fields_for(project, type_id) {
        if let Some(default) = &field.default_value {
            item.custom_values
                .entry(field.id)
                .or_insert_with(|| default.clone());
        }
    }
}

/// Replace the description with the type's template when the user has not
/// written one of their own.
///
/// A description counts as "not their own" when it is blank or matches any
/// type's template up to whitespace.
pub fn apply_description_template<C: Catalog + ?Sized>(catalog: &C, item: &mut WorkItem) {
    let Some(template) = item
        .type_id
        .and_then(|id| catalog.work_type(id))
        .and_then(|t| t.description.as_deref())
        .filter(|text| !text.trim().is_empty())
    else {
        return;
    };

    let replaceable = match item.description.as_deref() {
        None => true,
        Some(current) if current.trim().is_empty() => true,
        Some(current) => {
            let current = normalize_whitespace(current);
            catalog
                .work_types()
                .iter()
                .filter_map(|t| t.description.as_deref())
                .any(|text| normalize_whitespace(text) == current)
        }
    };

    if replaceable {
        item.description = Some(template.to_string());
    }
}

/// Every whitespace run becomes one space.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CustomField, Project, StaticCatalog, WorkType};
    use crate::model::ids::{CustomFieldId, ProjectId, TypeId};
    use crate::model::item::CustomValue;
    use crate::snapshot::Snapshot;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ctx() -> ResolveContext {
        ResolveContext::new(Some(UserId(1)), Settings::default(), d(2024, 6, 1))
    }

    fn work_type(id: u64, description: Option<&str>) -> WorkType {
        WorkType {
            id: TypeId(id),
            name: format!("type-{id}"),
            position: u32::try_from(id).unwrap(),
            is_milestone: false,
            description: description.map(str::to_string),
            status_ids: vec![],
        }
    }

    fn catalog() -> StaticCatalog {
        StaticCatalog {
            types: vec![
                work_type(1, Some("## Steps\n\n1.")),
                work_type(2, Some("## Goal")),
                work_type(3, None),
            ],
            projects: vec![Project {
                id: ProjectId(1),
                name: "p".into(),
                type_ids: vec![TypeId(1), TypeId(2), TypeId(3)],
                shared_version_ids: vec![],
                custom_field_ids: vec![CustomFieldId(1)],
            }],
            custom_fields: vec![CustomField {
                id: CustomFieldId(1),
                name: "risk".into(),
                default_value: Some(CustomValue::new("low")),
                type_ids: vec![TypeId(2)],
                is_for_all: false,
            }],
            ..StaticCatalog::default()
        }
    }

    #[test]
    fn empty_request_on_consistent_item_changes_nothing() {
        let graph = Snapshot::new(
            vec![WorkItem {
                project_id: Some(ProjectId(1)),
                type_id: Some(TypeId(1)),
                start_date: Some(d(2024, 1, 1)),
                due_date: Some(d(2024, 1, 3)),
                ..WorkItem::with_id("x")
            }],
            vec![],
        )
        .unwrap();
        let item = graph.item(&ItemId::new("x")).unwrap();
        let out = resolve_attributes(&graph, &catalog(), &ctx(), item, &AttributeChanges::default());
        assert_eq!(&out.item, item);
        assert!(out.changed.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn requested_changes_are_reported_as_changed() {
        let graph = Snapshot::new(vec![WorkItem::with_id("x")], vec![]).unwrap();
        let item = graph.item(&ItemId::new("x")).unwrap();
        let changes = AttributeChanges {
            subject: Some("renamed".into()),
            ..AttributeChanges::default()
        };
        let out = resolve_attributes(&graph, &catalog(), &ctx(), item, &changes);
        assert_eq!(out.item.subject, "renamed");
        assert_eq!(out.changed.into_iter().collect::<Vec<_>>(), vec![Field::Subject]);
    }

    #[test]
    fn unknown_parent_is_a_warning() {
        let graph = Snapshot::new(vec![], vec![]).unwrap();
        let draft = WorkItem::default();
        let changes = AttributeChanges {
            parent_id: Some(Some(ItemId::new("ghost"))),
            ..AttributeChanges::default()
        };
        let out = resolve_attributes(&graph, &catalog(), &ctx(), &draft, &changes);
        assert_eq!(
            out.warnings,
            vec![ResolveWarning::UnknownParent {
                parent: ItemId::new("ghost")
            }]
        );
        assert_eq!(out.warnings[0].to_string(), "parent 'ghost' does not exist");
    }

    #[test]
    fn unknown_grandparent_is_a_warning_after_a_move() {
        let graph = Snapshot::new(
            vec![
                WorkItem {
                    parent_id: Some(ItemId::new("gone")),
                    ..WorkItem::with_id("p")
                },
                WorkItem::with_id("x"),
            ],
            vec![],
        )
        .unwrap();
        let item = graph.item(&ItemId::new("x")).unwrap();
        let changes = AttributeChanges {
            parent_id: Some(Some(ItemId::new("p"))),
            ..AttributeChanges::default()
        };
        let out = resolve_attributes(&graph, &catalog(), &ctx(), item, &changes);
        assert_eq!(
            out.warnings,
            vec![ResolveWarning::UnknownParent {
                parent: ItemId::new("gone")
            }]
        );
    }

    #[test]
    fn custom_defaults_follow_type_change() {
        let mut item = WorkItem {
            project_id: Some(ProjectId(1)),
            type_id: Some(TypeId(2)),
            ..WorkItem::with_id("x")
        };
        initialize_custom_values(&catalog(), &mut item);
        assert_eq!(item.custom_values[&CustomFieldId(1)], CustomValue::new("low"));

        item.custom_values
            .insert(CustomFieldId(1), CustomValue::new("high"));
        initialize_custom_values(&catalog(), &mut item);
        assert_eq!(item.custom_values[&CustomFieldId(1)], CustomValue::new("high"));
    }

    #[test]
    fn custom_defaults_skip_fields_disabled_for_type() {
        let mut item = WorkItem {
            project_id: Some(ProjectId(1)),
            type_id: Some(TypeId(1)),
            ..WorkItem::with_id("x")
        };
        initialize_custom_values(&catalog(), &mut item);
        assert!(item.custom_values.is_empty());
    }

    #[test]
    fn template_fills_blank_description() {
        let mut item = WorkItem {
            type_id: Some(TypeId(1)),
            description: Some("  \n".into()),
            ..WorkItem::default()
        };
        apply_description_template(&catalog(), &mut item);
        assert_eq!(item.description.as_deref(), Some("## Steps\n\n1."));
    }

    #[test]
    fn template_replaces_another_types_template() {
        let mut item = WorkItem {
            type_id: Some(TypeId(2)),
            description: Some("## Steps \n 1.".into()),
            ..WorkItem::default()
        };
        apply_description_template(&catalog(), &mut item);
        assert_eq!(item.description.as_deref(), Some("## Goal"));
    }

    #[test]
    fn template_keeps_user_text() {
        let mut item = WorkItem {
            type_id: Some(TypeId(2)),
            description: Some("my notes".into()),
            ..WorkItem::default()
        };
        apply_description_template(&catalog(), &mut item);
        assert_eq!(item.description.as_deref(), Some("my notes"));
    }

    #[test]
    fn type_without_template_changes_nothing() {
        let mut item = WorkItem {
            type_id: Some(TypeId(3)),
            description: None,
            ..WorkItem::default()
        };
        apply_description_template(&catalog(), &mut item);
        assert_eq!(item.description, None);
    }

    #[test]
    fn new_item_gets_template_through_resolution() {
        let graph = Snapshot::new(vec![], vec![]).unwrap();
        let changes = AttributeChanges {
            project_id: Some(Some(ProjectId(1))),
            type_id: Some(Some(TypeId(2))),
            ..AttributeChanges::default()
        };
        let out = resolve_attributes(&graph, &catalog(), &ctx(), &WorkItem::default(), &changes);
        assert_eq!(out.item.description.as_deref(), Some("## Goal"));
        assert_eq!(out.item.custom_values[&CustomFieldId(1)], CustomValue::new("low"));
        assert_eq!(out.item.author_id, Some(UserId(1)));
        assert!(out.defaulted.contains(&Field::Author));
    }

    #[test]
    fn persisted_item_never_gets_template() {
        let graph = Snapshot::new(
            vec![WorkItem {
                project_id: Some(ProjectId(1)),
                type_id: Some(TypeId(3)),
                ..WorkItem::with_id("x")
            }],
            vec![],
        )
        .unwrap();
        let item = graph.item(&ItemId::new("x")).unwrap();
        let changes = AttributeChanges {
            type_id: Some(Some(TypeId(2))),
            ..AttributeChanges::default()
        };
        let out = resolve_attributes(&graph, &catalog(), &ctx(), item, &changes);
        assert_eq!(out.item.description, None);
    }
}
