use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;

/// Runner address used when none is configured.
pub const DEFAULT_TEST_RUNNER_BASE_URL: &str = "http://localhost:4200/tests";

/// Files that get affordances when scanning a directory.
pub const DEFAULT_TEST_FILE_PATTERNS: &[&str] = &["**/*test.js", "**/*test.ts"];

/// Project-local storage directory, home of the persisted debug flag.
pub const STORAGE_DIR: &str = ".testlens";

/// File inside [`STORAGE_DIR`] holding state toggled at runtime.
const STATE_FILE: &str = "settings.toml";

/// Project config file, looked up in the project root.
pub const CONFIG_FILENAME: &str = "testlens.toml";

/// Recognized options. Field names follow the host's camelCase keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Log extraction counts and run details.
    pub debug: bool,
    /// Base of every runner URL.
    pub test_runner_base_url: String,
    /// Flatten every top-level suite instead of only the first one.
    pub all_root_suites: bool,
    /// Globs (project-relative) selecting test files in directory scans.
    pub test_file_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            test_runner_base_url: DEFAULT_TEST_RUNNER_BASE_URL.to_string(),
            all_root_suites: false,
            test_file_patterns: DEFAULT_TEST_FILE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Runtime state kept in the storage directory. Only the debug flag is
/// durable; everything else comes from the project config.
#[derive(Debug, Default, Deserialize)]
struct StoredState {
    debug: Option<bool>,
}

/// Find the settings file for a project.
///
/// If `config_override` is provided, use that path directly.
/// Otherwise, look for [`CONFIG_FILENAME`] in the project root.
pub fn find_config_path(project_root: &Path, config_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(override_path) = config_override {
        if override_path.exists() {
            return Some(override_path.to_path_buf());
        }
        return None;
    }

    Some(project_root.join(CONFIG_FILENAME)).filter(|path| path.exists())
}

/// Path of the persisted runtime state for a project.
pub fn state_path(project_root: &Path) -> PathBuf {
    project_root.join(STORAGE_DIR).join(STATE_FILE)
}

/// Load and parse settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_settings(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse settings from a TOML string. Missing keys take their defaults.
pub fn parse_settings(toml_str: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(toml_str)?;
    Ok(settings)
}

fn load_stored_debug(project_root: &Path) -> Result<Option<bool>> {
    let path = state_path(project_root);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let state: StoredState =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(state.debug)
}

/// Load the project's settings, falling back to defaults when no file
/// exists. An explicit override that does not exist is an error.
///
/// Without an override, a debug flag persisted by [`toggle_debug`] is
/// layered over the project config.
pub fn load_project_settings(project_root: &Path, config_override: Option<&Path>) -> Result<Settings> {
    let mut settings = match find_config_path(project_root, config_override) {
        Some(path) => load_settings(&path)?,
        None => {
            if let Some(path) = config_override {
                bail!("config file not found: {}", path.display());
            }
            Settings::default()
        }
    };

    if config_override.is_none() {
        if let Some(debug) = load_stored_debug(project_root)? {
            settings.debug = debug;
        }
    }
    Ok(settings)
}

/// Set `debug` in a TOML file, keeping every other key it holds.
pub fn persist_debug(path: &Path, debug: bool) -> Result<()> {
    let mut table = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        content
            .parse::<toml::Table>()
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::Table::new()
    };
    table.insert("debug".to_string(), toml::Value::Boolean(debug));

    let content = toml::to_string_pretty(&table).context("failed to serialize settings")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Make sure the storage directory exists.
///
/// Failure is logged and reported as `None`; callers carry on without
/// persistent storage.
pub fn ensure_storage_dir(project_root: &Path, diagnostics: &dyn Diagnostics) -> Option<PathBuf> {
    let dir = project_root.join(STORAGE_DIR);
    if dir.is_dir() {
        return Some(dir);
    }
    match std::fs::create_dir_all(&dir) {
        Ok(()) => {
            diagnostics.info(&format!("Created storage directory: {}", dir.display()));
            Some(dir)
        }
        Err(e) => {
            diagnostics.error(&format!(
                "Failed to create storage directory {}: {}",
                dir.display(),
                e
            ));
            None
        }
    }
}

/// Result of flipping the debug flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugToggle {
    pub debug: bool,
    /// Where the new value was written, if storage was available.
    pub persisted_to: Option<PathBuf>,
}

/// Flip `settings.debug` and persist it.
///
/// The flag goes into `config_override` when one is given, otherwise into
/// the project's storage directory.
pub fn toggle_debug(
    project_root: &Path,
    config_override: Option<&Path>,
    settings: &mut Settings,
    diagnostics: &dyn Diagnostics,
) -> Result<DebugToggle> {
    settings.debug = !settings.debug;
    diagnostics.info(&format!(
        "Debug mode {}",
        if settings.debug { "enabled" } else { "disabled" }
    ));

    let target = match config_override {
        Some(path) => Some(path.to_path_buf()),
        None => ensure_storage_dir(project_root, diagnostics).map(|dir| dir.join(STATE_FILE)),
    };
    if let Some(path) = &target {
        persist_debug(path, settings.debug)?;
    }

    Ok(DebugToggle {
        debug: settings.debug,
        persisted_to: target,
    })
}
