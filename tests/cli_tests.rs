use std::fs;
use std::path::Path;
use std::process::Command;

/// A scratch project in a temp directory; the binary runs with it as cwd.
struct TestProject {
    dir: tempfile::TempDir,
}

impl TestProject {
    fn new() -> Self {
        Self {
            dir: tempfile::TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file relative to the project root.
    fn write_file(&self, rel_path: &str, content: &str) {
        let full = self.dir.path().join(rel_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
    }

    fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_testlens"))
            .args(args)
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run testlens")
    }

    fn stdout(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "testlens {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

fn create_project() -> TestProject {
    let proj = TestProject::new();
    proj.write_file(
        "tests/unit/models/user-test.js",
        r#"import { module, test } from 'qunit';

module('Unit | Model | user', function (hooks) {
  test('has a name', function (assert) {
    assert.ok(true);
  });

  module('validations', function () {
    ['email', 'phone'].forEach((field) => {
      test(`requires ${field}`, function (assert) {
        assert.ok(field);
      });
    });
  });
});
"#,
    );
    proj.write_file("app/models/user.js", "export default class User {}\n");
    proj
}

#[test]
fn test_scan_text_output() {
    let proj = create_project();
    let out = proj.stdout(&["scan"]);

    assert!(out.contains("tests/unit/models/user-test.js"), "{}", out);
    assert!(out.contains("▶ Run Module Tests"));
    assert!(out.contains("Unit | Model | user > validations :: requires "));
    assert!(out.contains("Scanned 1 files: 2 modules, 2 tests"));
    assert!(!out.contains("app/models/user.js"));
}

#[test]
fn test_scan_json_output() {
    let proj = create_project();
    let out = proj.stdout(&["scan", "--format", "json", "tests/unit/models/user-test.js"]);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();

    let affordances = value[0]["affordances"].as_array().unwrap();
    assert_eq!(affordances.len(), 4);
    assert_eq!(affordances[0]["action"], "runModuleTests");
    assert_eq!(affordances[0]["suitePath"], "Unit | Model | user");
    assert_eq!(affordances[0]["position"]["line"], 3);
    assert_eq!(affordances[2]["action"], "runSingleTest");
    assert_eq!(affordances[2]["testName"], "has a name");
}

#[test]
fn test_scan_malformed_file_logs_error_but_succeeds() {
    let proj = TestProject::new();
    proj.write_file("broken-test.js", "module('x', function () {");
    let output = proj.run(&["scan", "broken-test.js"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("Scanned 1 files: 0 modules, 0 tests"));
    assert!(stderr.contains("Error parsing test file"), "{}", stderr);
}

#[test]
fn test_scan_missing_file_fails() {
    let proj = TestProject::new();
    let output = proj.run(&["scan", "missing-test.js"]);
    assert!(!output.status.success());
}

#[test]
fn test_url_command() {
    let proj = TestProject::new();
    let out = proj.stdout(&["url", "A > B", "c"]);
    assert_eq!(
        out.trim(),
        "http://localhost:4200/tests?hidepassed&filter=A%20%3E%20B%3A%20c"
    );
}

#[test]
fn test_url_respects_config_and_flag() {
    let proj = TestProject::new();
    proj.write_file("testlens.toml", "testRunnerBaseUrl = \"http://app.test/tests\"\n");
    assert_eq!(
        proj.stdout(&["url", "Suite"]).trim(),
        "http://app.test/tests?hidepassed&filter=Suite"
    );
    assert_eq!(
        proj.stdout(&["url", "Suite", "--base-url", "http://other/t"]).trim(),
        "http://other/t?hidepassed&filter=Suite"
    );
}

#[test]
fn test_run_test_print() {
    let proj = TestProject::new();
    let out = proj.stdout(&["run-test", "Unit | Model | user", "has a name", "--print"]);
    assert_eq!(
        out.trim(),
        "http://localhost:4200/tests?hidepassed&filter=Unit%20%7C%20Model%20%7C%20user%3A%20has%20a%20name"
    );
}

#[test]
fn test_run_module_print() {
    let proj = TestProject::new();
    let out = proj.stdout(&["run-module", "Unit | Model | user", "--print"]);
    assert_eq!(
        out.trim(),
        "http://localhost:4200/tests?hidepassed&filter=Unit%20%7C%20Model%20%7C%20user"
    );
}

#[test]
fn test_toggle_debug_persists_between_runs() {
    let proj = create_project();
    let out = proj.stdout(&["toggle-debug"]);
    assert!(out.starts_with("Debug mode enabled"), "{}", out);
    assert!(proj.path().join(".testlens/settings.toml").exists());

    let output = proj.run(&["scan"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Extracted 2 modules and 2 tests."), "{}", stderr);

    let out = proj.stdout(&["toggle-debug"]);
    assert!(out.starts_with("Debug mode disabled"), "{}", out);
}

#[test]
fn test_toggle_debug_with_config_flag_round_trips() {
    let proj = TestProject::new();
    proj.write_file("custom.toml", "debug = false\n");

    let out = proj.stdout(&["--config", "custom.toml", "toggle-debug"]);
    assert!(out.starts_with("Debug mode enabled"), "{}", out);
    assert!(out.contains("custom.toml"), "{}", out);
    let out = proj.stdout(&["--config", "custom.toml", "toggle-debug"]);
    assert!(out.starts_with("Debug mode disabled"), "{}", out);
    assert!(!proj.path().join(".testlens").exists());
}

#[test]
fn test_project_config_edits_apply_after_toggle() {
    let proj = TestProject::new();
    proj.write_file("testlens.toml", "testRunnerBaseUrl = \"http://a/tests\"\n");
    proj.stdout(&["toggle-debug"]);
    proj.write_file("testlens.toml", "testRunnerBaseUrl = \"http://b/tests\"\n");
    assert_eq!(
        proj.stdout(&["url", "S"]).trim(),
        "http://b/tests?hidepassed&filter=S"
    );
}

#[test]
fn test_scan_subdirectory_uses_project_relative_patterns() {
    let proj = create_project();
    proj.write_file("testlens.toml", "testFilePatterns = [\"tests/**/*-test.js\"]\n");
    let out = proj.stdout(&["scan", "tests"]);
    assert!(out.contains("tests/unit/models/user-test.js"), "{}", out);
    assert!(out.contains("Scanned 1 files: 2 modules, 2 tests"), "{}", out);
}

#[test]
fn test_scan_names_file_that_failed_to_parse() {
    let proj = create_project();
    proj.write_file("tests/unit/broken-test.js", "module('x', function () {");
    let output = proj.run(&["scan"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken-test.js"), "{}", stderr);
}

#[test]
fn test_bad_config_fails() {
    let proj = TestProject::new();
    proj.write_file("testlens.toml", "debug = \"definitely\"\n");
    let output = proj.run(&["url", "A"]);
    assert!(!output.status.success());
}
