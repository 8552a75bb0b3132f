pub mod check;
pub mod plan_destroy;
pub mod resolve;
pub mod soonest;

use std::path::Path;

use cadence_core::config::{Settings, load_settings, load_settings_file};
use cadence_core::error::ErrorCode;
use cadence_core::graph::WorkGraph;
use cadence_core::model::ids::ItemId;
use cadence_core::model::item::WorkItem;
use cadence_core::snapshot::Snapshot;
use tracing::debug;

use crate::output::{CliError, OutputMode, fail};

/// Where a command finds its snapshot and settings.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    pub project_root: &'a Path,
    /// Snapshot path, relative to `project_root` unless absolute.
    pub snapshot: &'a Path,
    /// Explicit settings file; `None` reads `.cadence/config.toml`.
    pub config: Option<&'a Path>,
}

impl Inputs<'_> {
    /// Load the snapshot, reporting failures with their error code.
    pub fn load_snapshot(&self, output: OutputMode) -> anyhow::Result<Snapshot> {
        let path = self.project_root.join(self.snapshot);
        debug!(path = %path.display(), "loading snapshot");
        Snapshot::load(&path)
            .or_else(|err| fail(output, &CliError::with_code(err.error_code(), err.to_string())))
    }

    /// Load the settings, reporting failures with their error code.
    pub fn load_settings(&self, output: OutputMode) -> anyhow::Result<Settings> {
        let loaded = match self.config {
            Some(path) => load_settings_file(&self.project_root.join(path)),
            None => load_settings(self.project_root),
        };
        loaded.or_else(|err| {
            fail(
                output,
                &CliError::with_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            )
        })
    }
}

/// Look up `id`, reporting an unknown id as [`ErrorCode::ItemNotFound`].
pub fn find_item<'s>(
    snapshot: &'s Snapshot,
    id: &str,
    output: OutputMode,
) -> anyhow::Result<&'s WorkItem> {
    match snapshot.item(&ItemId::new(id)) {
        Some(item) => Ok(item),
        None => fail(
            output,
            &CliError::with_code(ErrorCode::ItemNotFound, format!("work package '{id}' not found")),
        ),
    }
}

/// `"-"` for absent values in human output.
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
