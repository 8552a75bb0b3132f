//! Predecessor/successor lookups.
//!
//! Only scheduling relations are considered. A `follows` edge is read as
//! the inverted `precedes` edge, so callers never see the difference.

#![allow(clippy::must_use_candidate)]

use super::WorkGraph;
use crate::model::ids::ItemId;

/// Ids of the items that directly precede `id`.
pub fn predecessor_ids<G: WorkGraph + ?Sized>(graph: &G, id: &ItemId) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = graph
        .relations(id)
        .into_iter()
        .filter_map(|rel| rel.precedence())
        .filter(|(_, succ)| *succ == id)
        .map(|(pred, _)| pred.clone())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Ids of the items that `id` directly precedes.
pub fn successor_ids<G: WorkGraph + ?Sized>(graph: &G, id: &ItemId) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = graph
        .relations(id)
        .into_iter()
        .filter_map(|rel| rel.precedence())
        .filter(|(pred, _)| *pred == id)
        .map(|(_, succ)| succ.clone())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::WorkItem;
    use crate::model::relation::{Relation, RelationKind};
    use crate::snapshot::Snapshot;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn item(id: &str, due: Option<NaiveDate>) -> WorkItem {
        WorkItem {
            due_date: due,
            ..WorkItem::with_id(id)
        }
    }

    fn graph() -> Snapshot {
        Snapshot::new(
            vec![
                item("a", Some(d(2024, 1, 10))),
                item("b", Some(d(2024, 1, 20))),
                item("c", None),
                item("s", None),
            ],
            vec![
                Relation::precedes("a", "s"),
                Relation::new("s", "b", RelationKind::Follows),
                Relation::precedes("c", "s"),
                Relation::new("s", "a", RelationKind::Relates),
                Relation::precedes("s", "ghost"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn follows_counts_as_incoming_precedence() {
        let graph = graph();
        let ids = predecessor_ids(&graph, &ItemId::new("s"));
        assert_eq!(
            ids,
            vec![ItemId::new("a"), ItemId::new("b"), ItemId::new("c")]
        );
    }

    #[test]
    fn successors_ignore_informational_relations() {
        let graph = graph();
        assert_eq!(
            successor_ids(&graph, &ItemId::new("a")),
            vec![ItemId::new("s")]
        );
        assert_eq!(
            successor_ids(&graph, &ItemId::new("s")),
            vec![ItemId::new("ghost")]
        );
    }
}
