#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cadence: date scheduling and attribute resolution for work packages",
    long_about = None
)]
struct Cli {
    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format. Defaults to pretty on a terminal, text when piped.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Snapshot file with work packages, relations and catalog.
    #[arg(long, global = true, default_value = "cadence.json")]
    snapshot: PathBuf,

    /// Settings file. Defaults to `.cadence/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Resolve requested changes against a work package",
        long_about = "Apply requested attribute changes to a work package, fill defaults, \
                      reconcile dependent attributes and reschedule dates.",
        after_help = "EXAMPLES:\n    # Move a task under a new parent\n    cadence resolve wp-7 --changes '{\"parent_id\": \"wp-2\"}'\n\n    # Resolve a new work package as user 4\n    cadence resolve --new --user 4 --changes @new.json\n\n    # Emit machine-readable output\n    cadence resolve wp-7 --json"
    )]
    Resolve(cmd::resolve::ResolveArgs),

    #[command(
        about = "Show the earliest permissible start of a work package",
        after_help = "EXAMPLES:\n    cadence soonest wp-7\n    cadence soonest wp-7 --json"
    )]
    Soonest(cmd::soonest::SoonestArgs),

    #[command(
        about = "Report cycles and contract violations in the snapshot",
        after_help = "EXAMPLES:\n    cadence check\n    cadence check --snapshot other.json --json"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        about = "Preview destroying work packages and their subtrees",
        after_help = "EXAMPLES:\n    cadence plan-destroy wp-3\n    cadence plan-destroy wp-3 --reassign-to wp-9"
    )]
    PlanDestroy(cmd::plan_destroy::PlanDestroyArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "cadence=debug,info"
        } else {
            "cadence=info,warn"
        })
    });

    let format = env::var("CADENCE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    let inputs = cmd::Inputs {
        project_root: &project_root,
        snapshot: &cli.snapshot,
        config: cli.config.as_deref(),
    };

    match &cli.command {
        Commands::Resolve(args) => cmd::resolve::run_resolve(args, output, &inputs),
        Commands::Soonest(args) => cmd::soonest::run_soonest(args, output, &inputs),
        Commands::Check(args) => cmd::check::run_check(args, output, &inputs),
        Commands::PlanDestroy(args) => {
            cmd::plan_destroy::run_plan_destroy(args, output, &inputs)
        }
    }
}
