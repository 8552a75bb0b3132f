//! `cadence check`: whole-snapshot diagnostics.
//!
//! Lists every precedence and hierarchy cycle plus the contract violations
//! of each stored work package. Exits non-zero when anything is found.

use std::io::Write;

use cadence_core::contract::{ContractViolation, validate};
use cadence_core::error::ErrorCode;
use cadence_core::graph::cycles::{CycleWarning, find_hierarchy_cycles, find_precedence_cycles};
use cadence_core::model::ids::ItemId;
use clap::Args;
use serde::Serialize;
use tracing::debug;

use super::Inputs;
use crate::output::{CliError, OutputMode, fail, pretty_section, render_mode};

#[derive(Args, Debug, Default)]
pub struct CheckArgs {}

#[derive(Debug, Serialize)]
struct ItemViolations {
    id: ItemId,
    violations: Vec<ContractViolation>,
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    items: usize,
    cycles: Vec<CycleWarning>,
    violations: Vec<ItemViolations>,
}

impl CheckOutput {
    fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.violations.is_empty()
    }
}

/// Execute `cadence check`.
pub fn run_check(_args: &CheckArgs, output: OutputMode, inputs: &Inputs) -> anyhow::Result<()> {
    let snapshot = inputs.load_snapshot(output)?;

    let mut cycles = find_precedence_cycles(snapshot.all_relations());
    cycles.extend(find_hierarchy_cycles(snapshot.all_items()));

    let violations: Vec<ItemViolations> = snapshot
        .all_items()
        .iter()
        .filter_map(|item| {
            let id = item.id.clone()?;
            let violations = validate(&snapshot, &snapshot, item);
            (!violations.is_empty()).then_some(ItemViolations { id, violations })
        })
        .collect();
    debug!(
        cycles = cycles.len(),
        invalid_items = violations.len(),
        "snapshot checked"
    );

    let payload = CheckOutput {
        items: snapshot.all_items().len(),
        cycles,
        violations,
    };
    render_mode(output, &payload, render_text, render_pretty)?;

    if payload.is_clean() {
        return Ok(());
    }
    let code = if payload.cycles.is_empty() {
        ErrorCode::ContractViolation
    } else {
        ErrorCode::CycleDetected
    };
    fail(
        output,
        &CliError::with_code(
            code,
            format!(
                "{} cycle(s), {} invalid work package(s)",
                payload.cycles.len(),
                payload.violations.len()
            ),
        ),
    )
}

fn render_text(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for cycle in &payload.cycles {
        writeln!(w, "cycle {cycle}")?;
    }
    for entry in &payload.violations {
        for violation in &entry.violations {
            writeln!(w, "violation {} {violation}", entry.id)?;
        }
    }
    if payload.is_clean() {
        writeln!(w, "ok {} work package(s)", payload.items)?;
    }
    Ok(())
}

fn render_pretty(payload: &CheckOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Checked {} work package(s)", payload.items))?;
    if payload.is_clean() {
        writeln!(w, "No cycles or contract violations.")?;
        return Ok(());
    }

    if !payload.cycles.is_empty() {
        writeln!(w, "Cycles:")?;
        for cycle in &payload.cycles {
            writeln!(w, "  ! {cycle}")?;
        }
    }
    if !payload.violations.is_empty() {
        writeln!(w, "Contract violations:")?;
        for entry in &payload.violations {
            writeln!(w, "  {}", entry.id)?;
            for violation in &entry.violations {
                writeln!(w, "    x {violation}")?;
            }
        }
    }
    Ok(())
}
