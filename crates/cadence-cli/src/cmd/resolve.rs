//! `cadence resolve`: apply requested changes to one work package.
//!
//! Loads the snapshot, resolves the changes against the named item (or a
//! fresh one with `--new`) and prints the attributes to persist. Contract
//! violations are reported alongside; `--strict` turns them into a failure.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use cadence_core::contract::{ContractViolation, validate};
use cadence_core::error::ErrorCode;
use cadence_core::model::changes::AttributeChanges;
use cadence_core::model::ids::UserId;
use cadence_core::model::item::WorkItem;
use cadence_core::{ResolveContext, ResolvedAttributes, resolve_attributes};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::{Inputs, find_item, or_dash};
use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Work package to update.
    #[arg(required_unless_present = "new", conflicts_with = "new")]
    pub id: Option<String>,

    /// Resolve a work package that has not been persisted yet.
    #[arg(long)]
    pub new: bool,

    /// Requested changes as a JSON object, or `@path` to read them from a file.
    #[arg(long, default_value = "{}")]
    pub changes: String,

    /// Acting user; becomes the author of new work packages.
    #[arg(long)]
    pub user: Option<u64>,

    /// Date to treat as today (YYYY-MM-DD). Defaults to the local date.
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Fail when the resolved attributes violate the contract.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct ResolveOutput {
    #[serde(flatten)]
    resolved: ResolvedAttributes,
    violations: Vec<ContractViolation>,
}

/// Execute `cadence resolve`.
pub fn run_resolve(args: &ResolveArgs, output: OutputMode, inputs: &Inputs) -> anyhow::Result<()> {
    let snapshot = inputs.load_snapshot(output)?;
    let settings = inputs.load_settings(output)?;
    let changes = parse_changes(&args.changes, inputs.project_root, output)?;

    let item = match &args.id {
        Some(id) => find_item(&snapshot, id, output)?.clone(),
        None => WorkItem::default(),
    };

    let ctx = ResolveContext::new(
        args.user.map(UserId),
        settings,
        args.today.unwrap_or_else(|| Local::now().date_naive()),
    );
    let resolved = resolve_attributes(&snapshot, &snapshot, &ctx, &item, &changes);
    let violations = validate(&snapshot, &snapshot, &resolved.item);
    info!(
        changed = resolved.changed.len(),
        violations = violations.len(),
        "resolved work package"
    );

    let payload = ResolveOutput {
        resolved,
        violations,
    };
    render_mode(output, &payload, render_text, render_pretty)?;

    let blocking = payload.violations.first().filter(|_| args.strict);
    if let Some(first) = blocking {
        return fail(
            output,
            &CliError::with_code(
                first.error_code(),
                format!("{} contract violation(s): {first}", payload.violations.len()),
            ),
        );
    }
    Ok(())
}

fn parse_changes(
    raw: &str,
    project_root: &Path,
    output: OutputMode,
) -> anyhow::Result<AttributeChanges> {
    let text = match raw.strip_prefix('@') {
        Some(path) => {
            let path = project_root.join(path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
        }
        None => raw.to_string(),
    };
    serde_json::from_str::<AttributeChanges>(&text).or_else(|err| {
        fail(
            output,
            &CliError::with_code(ErrorCode::InvalidChanges, format!("invalid changes: {err}")),
        )
    })
}

fn label(item: &WorkItem) -> String {
    item.id
        .as_ref()
        .map_or_else(|| "new work package".to_string(), ToString::to_string)
}

fn render_text(payload: &ResolveOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let resolved = &payload.resolved;
    let item = &resolved.item;
    writeln!(w, "item {}", label(item))?;
    writeln!(w, "start_date {}", or_dash(item.start_date))?;
    writeln!(w, "due_date {}", or_dash(item.due_date))?;
    writeln!(w, "soonest_start {}", or_dash(resolved.soonest_start))?;
    for field in &resolved.changed {
        writeln!(w, "changed {field}")?;
    }
    for step in &resolved.reconciled {
        writeln!(w, "reconciled {step}")?;
    }
    for warning in &resolved.warnings {
        writeln!(w, "warning {warning}")?;
    }
    for violation in &payload.violations {
        writeln!(w, "violation {violation}")?;
    }
    Ok(())
}

fn render_pretty(payload: &ResolveOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let resolved = &payload.resolved;
    let item = &resolved.item;

    pretty_section(w, &format!("Resolved {}", label(item)))?;
    pretty_kv(w, "Subject", &item.subject)?;
    pretty_kv(w, "Project", or_dash(item.project_id))?;
    pretty_kv(w, "Type", or_dash(item.type_id))?;
    pretty_kv(w, "Status", or_dash(item.status_id))?;
    pretty_kv(w, "Parent", or_dash(item.parent_id.as_ref()))?;
    pretty_kv(w, "Start", or_dash(item.start_date))?;
    pretty_kv(w, "Due", or_dash(item.due_date))?;
    pretty_kv(
        w,
        "Scheduling",
        if item.schedule_manually { "manual" } else { "automatic" },
    )?;
    pretty_kv(w, "Soonest", or_dash(resolved.soonest_start))?;

    if !resolved.changed.is_empty() {
        let fields: Vec<String> = resolved.changed.iter().map(ToString::to_string).collect();
        pretty_kv(w, "Changed", fields.join(", "))?;
    }
    if !resolved.defaulted.is_empty() {
        let fields: Vec<String> = resolved.defaulted.iter().map(ToString::to_string).collect();
        pretty_kv(w, "Defaulted", fields.join(", "))?;
    }
    if !resolved.reconciled.is_empty() {
        let steps: Vec<String> = resolved.reconciled.iter().map(ToString::to_string).collect();
        pretty_kv(w, "Reconciled", steps.join(", "))?;
    }

    if !resolved.warnings.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Warnings")?;
        for warning in &resolved.warnings {
            writeln!(w, "  ! {warning}")?;
        }
    }
    if !payload.violations.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Contract violations")?;
        for violation in &payload.violations {
            writeln!(w, "  x {violation}")?;
        }
    }
    Ok(())
}
