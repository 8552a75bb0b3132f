use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Location of the settings file relative to a project root.
pub const SETTINGS_PATH: &str = ".cadence/config.toml";

/// Settings snapshot passed into every resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub work_packages: WorkPackageSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackageSettings {
    /// New items without an inherited start date start on the day they are
    /// created.
    #[serde(default)]
    pub start_date_is_creation_date: bool,
}

/// Load `.cadence/config.toml` under `project_root`. A missing file yields
/// the defaults.
pub fn load_settings(project_root: &Path) -> Result<Settings> {
    let path = project_root.join(SETTINGS_PATH);
    if !path.exists() {
        return Ok(Settings::default());
    }
    load_settings_file(&path)
}

/// Load settings from an explicit file. The file must exist.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Settings>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
