use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;

use crate::binder::{Action, LensProvider};
use crate::config::{self, Settings};
use crate::diagnostics::Diagnostics;
use crate::discovery::{discover_test_files_in, DiscoveredFile};
use crate::extract::TestExtractor;
use crate::model::Dialect;
use crate::runner::{Runner, UrlOpener};

use super::output::{format_reports, format_url, FileReport};
use super::OutputFormat;

/// Resolve scan targets: files are taken as given, directories are walked
/// for test files matching the project-relative patterns.
pub fn collect_targets(
    project_path: &Path,
    paths: &[String],
    settings: &Settings,
) -> Result<Vec<DiscoveredFile>> {
    let mut targets = Vec::new();
    for raw in paths {
        let path = project_path.join(raw);
        if path.is_dir() {
            targets.extend(discover_test_files_in(
                project_path,
                &path,
                &settings.test_file_patterns,
            )?);
        } else if path.is_file() {
            targets.push(DiscoveredFile {
                dialect: Dialect::from_path(&path),
                path,
            });
        } else {
            bail!("no such file or directory: {}", path.display());
        }
    }
    targets.sort_by(|a, b| a.path.cmp(&b.path));
    targets.dedup_by(|a, b| a.path == b.path);
    Ok(targets)
}

/// Extract and bind every target. Files are independent, so they are
/// processed in parallel; unreadable ones are logged and skipped.
pub fn scan_files(
    targets: &[DiscoveredFile],
    settings: &Settings,
    diagnostics: &dyn Diagnostics,
) -> Vec<FileReport> {
    targets
        .par_iter()
        .filter_map(|target| {
            let source = match std::fs::read_to_string(&target.path) {
                Ok(source) => source,
                Err(e) => {
                    diagnostics.error(&format!(
                        "Failed to read {}: {}",
                        target.path.display(),
                        e
                    ));
                    return None;
                }
            };
            let extractor = TestExtractor::new(settings, diagnostics).for_file(&target.path);
            let affordances =
                LensProvider::new().provide_document(&extractor, &source, target.dialect);
            Some(FileReport {
                path: target.path.clone(),
                dialect: target.dialect,
                affordances,
            })
        })
        .collect()
}

pub fn run_scan(
    project_path: &Path,
    paths: &[String],
    settings: &Settings,
    format: &OutputFormat,
    diagnostics: &dyn Diagnostics,
) -> Result<String> {
    let targets = collect_targets(project_path, paths, settings)?;
    let mut reports = scan_files(&targets, settings, diagnostics);
    for report in &mut reports {
        report.path = relative_to(&report.path, project_path);
    }
    Ok(format_reports(&reports, format))
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

/// Activate an action through `opener`, returning the opened URL.
pub fn run_action(
    action: &Action,
    settings: &Settings,
    opener: &dyn UrlOpener,
    diagnostics: &dyn Diagnostics,
) -> Result<String> {
    Runner::new(&settings.test_runner_base_url, opener, diagnostics).activate(action)
}

pub fn run_url(action: &Action, settings: &Settings, format: &OutputFormat) -> String {
    let runner_url = crate::runner::runner_url(
        &settings.test_runner_base_url,
        &crate::runner::filter_for(action),
    );
    format_url(&runner_url, format)
}

/// Flip the debug flag and persist it.
///
/// Works on the settings as stored, so CLI flags are never persisted. With
/// `--config` the flag is written back into that file.
pub fn run_toggle_debug(
    project_path: &Path,
    config_override: Option<&Path>,
    diagnostics: &dyn Diagnostics,
) -> Result<String> {
    let mut stored = config::load_project_settings(project_path, config_override)
        .context("failed to load settings")?;
    let toggle = config::toggle_debug(project_path, config_override, &mut stored, diagnostics)?;
    let state = if toggle.debug { "enabled" } else { "disabled" };
    Ok(match toggle.persisted_to {
        Some(path) => format!("Debug mode {} (saved to {})", state, path.display()),
        None => format!("Debug mode {} (not saved: storage unavailable)", state),
    })
}
