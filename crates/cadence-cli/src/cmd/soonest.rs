//! `cadence soonest`: report the earliest permissible start of a work package.

use std::io::Write;

use cadence_core::graph::cycles::CycleWarning;
use cadence_core::model::ids::ItemId;
use cadence_core::schedule::soonest_start;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use super::{Inputs, find_item, or_dash};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct SoonestArgs {
    /// Work package to inspect.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct SoonestOutput {
    id: ItemId,
    soonest_start: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    schedule_manually: bool,
    warnings: Vec<CycleWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unknown_parent: Option<ItemId>,
}

/// Execute `cadence soonest`.
pub fn run_soonest(args: &SoonestArgs, output: OutputMode, inputs: &Inputs) -> anyhow::Result<()> {
    let snapshot = inputs.load_snapshot(output)?;
    let item = find_item(&snapshot, &args.id, output)?;
    let soonest = soonest_start(&snapshot, item);

    let payload = SoonestOutput {
        id: ItemId::new(args.id.as_str()),
        soonest_start: soonest.date,
        start_date: item.start_date,
        schedule_manually: item.schedule_manually,
        warnings: soonest.warnings,
        unknown_parent: soonest.unknown_parent,
    };

    render_mode(
        output,
        &payload,
        |p, w| {
            writeln!(w, "{} {}", p.id, or_dash(p.soonest_start))?;
            for warning in &p.warnings {
                writeln!(w, "warning {warning}")?;
            }
            if let Some(parent) = &p.unknown_parent {
                writeln!(w, "warning parent '{parent}' does not exist")?;
            }
            Ok(())
        },
        |p, w| {
            pretty_section(w, &format!("Soonest start of {}", p.id))?;
            pretty_kv(w, "Soonest", or_dash(p.soonest_start))?;
            pretty_kv(w, "Current", or_dash(p.start_date))?;
            if p.schedule_manually {
                pretty_kv(w, "Scheduling", "manual (not applied)")?;
            }
            for warning in &p.warnings {
                writeln!(w, "  ! {warning}")?;
            }
            if let Some(parent) = &p.unknown_parent {
                writeln!(w, "  ! parent '{parent}' does not exist")?;
            }
            Ok(())
        },
    )
}
