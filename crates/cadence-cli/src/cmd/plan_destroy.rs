//! `cadence plan-destroy`: preview destroying work packages.
//!
//! Nothing is modified. The command lists every work package that goes
//! away with the named ones (their whole subtrees) and checks what should
//! happen to dependent records.

use std::collections::BTreeSet;
use std::io::Write;

use cadence_core::cleanup::{DestroyAction, destroyed_ids, validate_destroy_action};
use cadence_core::model::ids::ItemId;
use clap::Args;
use serde::Serialize;

use super::{Inputs, find_item};
use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct PlanDestroyArgs {
    /// Work packages to destroy.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Move dependent records to this surviving work package.
    #[arg(long, value_name = "ID")]
    pub reassign_to: Option<String>,

    /// Detach dependent records instead of destroying them.
    #[arg(long, conflicts_with = "reassign_to")]
    pub nullify: bool,
}

impl PlanDestroyArgs {
    fn action(&self) -> DestroyAction {
        match (&self.reassign_to, self.nullify) {
            (Some(target), _) => DestroyAction::Reassign(ItemId::new(target.as_str())),
            (None, true) => DestroyAction::Nullify,
            (None, false) => DestroyAction::Destroy,
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    destroyed: BTreeSet<ItemId>,
    dependents: DestroyAction,
}

/// Execute `cadence plan-destroy`.
pub fn run_plan_destroy(
    args: &PlanDestroyArgs,
    output: OutputMode,
    inputs: &Inputs,
) -> anyhow::Result<()> {
    let snapshot = inputs.load_snapshot(output)?;
    for id in &args.ids {
        find_item(&snapshot, id, output)?;
    }
    let doomed: Vec<ItemId> = args.ids.iter().map(|id| ItemId::new(id.as_str())).collect();

    let action = args.action();
    if let Err(err) = validate_destroy_action(&snapshot, &doomed, &action) {
        return fail(output, &CliError::with_code(err.error_code(), err.to_string()));
    }

    let payload = PlanOutput {
        destroyed: destroyed_ids(&snapshot, &doomed),
        dependents: action,
    };
    render_mode(
        output,
        &payload,
        |p, w| {
            for id in &p.destroyed {
                writeln!(w, "destroy {id}")?;
            }
            writeln!(w, "dependents {}", describe(&p.dependents))
        },
        |p, w| {
            pretty_section(w, &format!("Destroying {} work package(s)", p.destroyed.len()))?;
            for id in &p.destroyed {
                writeln!(w, "  - {id}")?;
            }
            writeln!(w)?;
            pretty_kv(w, "Dependents", describe(&p.dependents))
        },
    )
}

fn describe(action: &DestroyAction) -> String {
    match action {
        DestroyAction::Destroy => "destroy".to_string(),
        DestroyAction::Nullify => "nullify".to_string(),
        DestroyAction::Reassign(target) => format!("reassign to {target}"),
    }
}
