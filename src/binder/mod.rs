//! Turns extracted suites and tests into clickable affordances.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extract::{TestExtractor, TEST_SEPARATOR};
use crate::model::{Dialect, Extraction, SourcePosition};

pub const RUN_MODULE_TESTS_COMMAND: &str = "testlens.runModuleTests";
pub const RUN_SINGLE_TEST_COMMAND: &str = "testlens.runSingleTest";
pub const TOGGLE_DEBUG_COMMAND: &str = "testlens.toggleDebug";

pub const RUN_MODULE_LABEL: &str = "▶ Run Module Tests";
pub const RUN_TEST_LABEL: &str = "▶ Run Test";

/// What activating an affordance does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    RunModuleTests { suite_path: String },
    #[serde(rename_all = "camelCase")]
    RunSingleTest {
        suite_path: String,
        test_name: String,
    },
}

impl Action {
    /// Host command id this action is registered under.
    pub fn command_id(&self) -> &'static str {
        match self {
            Action::RunModuleTests { .. } => RUN_MODULE_TESTS_COMMAND,
            Action::RunSingleTest { .. } => RUN_SINGLE_TEST_COMMAND,
        }
    }

    /// Positional command arguments, as a host passes them back on click.
    pub fn arguments(&self) -> Vec<String> {
        match self {
            Action::RunModuleTests { suite_path } => vec![suite_path.clone()],
            Action::RunSingleTest {
                suite_path,
                test_name,
            } => vec![suite_path.clone(), test_name.clone()],
        }
    }

    /// Rebuild an action from a host command invocation.
    pub fn from_command(command_id: &str, args: &[String]) -> Option<Self> {
        match (command_id, args) {
            (RUN_MODULE_TESTS_COMMAND, [suite_path]) => Some(Action::RunModuleTests {
                suite_path: suite_path.clone(),
            }),
            (RUN_SINGLE_TEST_COMMAND, [suite_path, test_name]) => Some(Action::RunSingleTest {
                suite_path: suite_path.clone(),
                test_name: test_name.clone(),
            }),
            _ => None,
        }
    }
}

/// A clickable annotation anchored at a source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordance {
    pub position: SourcePosition,
    pub label: String,
    pub command: String,
    #[serde(flatten)]
    pub action: Action,
}

/// Host capability that displays affordances.
pub trait AffordanceSink {
    fn register(&mut self, position: SourcePosition, label: &str, action: Action);
}

impl AffordanceSink for Vec<Affordance> {
    fn register(&mut self, position: SourcePosition, label: &str, action: Action) {
        self.push(Affordance {
            position,
            label: label.to_string(),
            command: action.command_id().to_string(),
            action,
        });
    }
}

/// Split a test's full path at the last `": "` into (suite path, test name).
///
/// Inverse of how test paths are built; ambiguous when a name itself
/// contains `": "`.
pub fn split_test_path(full_path: &str) -> Option<(&str, &str)> {
    let idx = full_path.rfind(TEST_SEPARATOR)?;
    Some((&full_path[..idx], &full_path[idx + TEST_SEPARATOR.len()..]))
}

/// Binds one document's extraction to affordances.
///
/// Also keeps a suite path -> test names index of the last document it
/// was given; the index is rebuilt from scratch on every call.
#[derive(Debug, Default)]
pub struct LensProvider {
    suite_tests: HashMap<String, Vec<String>>,
}

impl LensProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract `source` and return its affordances.
    pub fn provide_document(
        &mut self,
        extractor: &TestExtractor,
        source: &str,
        dialect: Dialect,
    ) -> Vec<Affordance> {
        let extraction = extractor.extract(source, dialect);
        self.provide(&extraction)
    }

    pub fn provide(&mut self, extraction: &Extraction) -> Vec<Affordance> {
        let mut affordances = Vec::new();
        self.provide_into(extraction, &mut affordances);
        affordances
    }

    /// Register suite affordances first, then test affordances, each in
    /// extraction order.
    pub fn provide_into(&mut self, extraction: &Extraction, sink: &mut dyn AffordanceSink) {
        self.suite_tests.clear();

        for suite in &extraction.suites {
            self.suite_tests.insert(suite.full_path.clone(), Vec::new());
        }
        for test in &extraction.tests {
            if let Some((suite_path, test_name)) = split_test_path(&test.full_path) {
                self.suite_tests
                    .entry(suite_path.to_string())
                    .or_default()
                    .push(test_name.to_string());
            }
        }

        for suite in &extraction.suites {
            sink.register(
                suite.position,
                RUN_MODULE_LABEL,
                Action::RunModuleTests {
                    suite_path: suite.full_path.clone(),
                },
            );
        }

        for test in &extraction.tests {
            let Some((suite_path, test_name)) = split_test_path(&test.full_path) else {
                continue;
            };
            sink.register(
                test.position,
                RUN_TEST_LABEL,
                Action::RunSingleTest {
                    suite_path: suite_path.to_string(),
                    test_name: test_name.to_string(),
                },
            );
        }
    }

    /// Test names directly inside `suite_path` in the last provided document.
    pub fn tests_in_suite(&self, suite_path: &str) -> &[String] {
        self.suite_tests
            .get(suite_path)
            .map(|tests| tests.as_slice())
            .unwrap_or(&[])
    }

    pub fn suite_count(&self) -> usize {
        self.suite_tests.len()
    }
}
