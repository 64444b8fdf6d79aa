use std::path::PathBuf;

use serde::Serialize;

use super::OutputFormat;
use crate::binder::{Action, Affordance};
use crate::model::Dialect;

/// Affordances found in one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub affordances: Vec<Affordance>,
}

impl FileReport {
    pub fn suite_count(&self) -> usize {
        self.affordances
            .iter()
            .filter(|a| matches!(a.action, Action::RunModuleTests { .. }))
            .count()
    }

    pub fn test_count(&self) -> usize {
        self.affordances.len() - self.suite_count()
    }
}

/// Format scan results for output.
pub fn format_reports(reports: &[FileReport], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(reports).unwrap_or_default(),
        OutputFormat::Compact => serde_json::to_string(reports).unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = String::new();
            for report in reports {
                output.push_str(&format!("{}\n", report.path.display()));
                for a in &report.affordances {
                    let location = format!("{}:{}", a.position.line, a.position.column + 1);
                    output.push_str(&format!(
                        "  {:<8} {:<20} {}\n",
                        location,
                        a.label,
                        describe(&a.action)
                    ));
                }
            }
            let suites: usize = reports.iter().map(FileReport::suite_count).sum();
            let tests: usize = reports.iter().map(FileReport::test_count).sum();
            output.push_str(&format!(
                "Scanned {} files: {} modules, {} tests",
                reports.len(),
                suites,
                tests
            ));
            output
        }
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::RunModuleTests { suite_path } => suite_path.clone(),
        Action::RunSingleTest {
            suite_path,
            test_name,
        } => format!("{} :: {}", suite_path, test_name),
    }
}

/// Format a runner URL.
pub fn format_url(url: &str, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Text => url.to_string(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&serde_json::json!({ "url": url })).unwrap_or_default()
        }
        OutputFormat::Compact => serde_json::json!({ "url": url }).to_string(),
    }
}
