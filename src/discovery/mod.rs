use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::model::Dialect;

/// A test file found under a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub dialect: Dialect,
}

/// Build output and dependency directories never worth scanning.
const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["node_modules/", "dist/", "tmp/", "coverage/"];

/// Matches project-relative paths against test-file globs.
///
/// Patterns prefixed with `!` are exclusions. A path matches if it
/// matches any include pattern and does not match any exclude pattern.
pub struct TestFileMatcher {
    include: GlobSet,
    exclude: GlobSet,
}

impl TestFileMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut include_builder = GlobSetBuilder::new();
        let mut exclude_builder = GlobSetBuilder::new();

        for pattern in patterns {
            if let Some(negated) = pattern.strip_prefix('!') {
                exclude_builder.add(
                    Glob::new(negated).with_context(|| format!("invalid pattern: {}", pattern))?,
                );
            } else {
                include_builder.add(
                    Glob::new(pattern).with_context(|| format!("invalid pattern: {}", pattern))?,
                );
            }
        }

        Ok(Self {
            include: include_builder.build()?,
            exclude: exclude_builder.build()?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

/// Find test files under `root`, respecting .gitignore.
pub fn discover_test_files(root: &Path, patterns: &[String]) -> Result<Vec<DiscoveredFile>> {
    discover_test_files_in(root, root, patterns)
}

/// Find test files under `dir`, a directory inside `project_root`.
///
/// Patterns are matched against paths relative to `project_root`, so
/// scanning a subdirectory selects the same files a full scan would.
pub fn discover_test_files_in(
    project_root: &Path,
    dir: &Path,
    patterns: &[String],
) -> Result<Vec<DiscoveredFile>> {
    let matcher = TestFileMatcher::new(patterns)?;
    let mut files = Vec::new();

    let mut builder = WalkBuilder::new(dir);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .parents(true);

    let mut overrides = ignore::overrides::OverrideBuilder::new(dir);
    for pattern in DEFAULT_EXCLUDE_PATTERNS {
        overrides
            .add(&format!("!{}", pattern))
            .context("invalid default exclude pattern")?;
    }
    builder.overrides(overrides.build().context("failed to build overrides")?);

    for entry in builder.build() {
        let entry = entry.context("error reading directory entry")?;

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(dialect) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Dialect::from_extension)
        else {
            continue;
        };

        let relative = path
            .strip_prefix(project_root)
            .or_else(|_| path.strip_prefix(dir))
            .unwrap_or(path);
        if !matcher.matches(relative) {
            continue;
        }

        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            dialect,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use std::fs;
    use tempfile::TempDir;

    fn default_patterns() -> Vec<String> {
        Settings::default().test_file_patterns
    }

    fn setup_test_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        fs::create_dir_all(root.join("tests/unit/services")).unwrap();
        fs::write(
            root.join("tests/unit/services/flash-test.js"),
            "module('x', function () {});",
        )
        .unwrap();
        fs::write(root.join("tests/unit/typed-test.ts"), "describe('y', () => {});").unwrap();
        fs::write(root.join("tests/helpers.js"), "export function setup() {}").unwrap();
        fs::write(root.join("app.js"), "console.log('hello');").unwrap();

        // Initialize a git repo so the ignore crate respects .gitignore
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".gitignore"), "generated/\n").unwrap();

        fs::create_dir_all(root.join("generated")).unwrap();
        fs::write(root.join("generated/skip-test.js"), "// ignored").unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("node_modules/pkg/index-test.js"), "// ignored").unwrap();

        dir
    }

    fn names(files: &[DiscoveredFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_discovers_test_files_only() {
        let dir = setup_test_project();
        let files = discover_test_files(dir.path(), &default_patterns()).unwrap();
        assert_eq!(names(&files), vec!["flash-test.js", "typed-test.ts"]);
    }

    #[test]
    fn test_dialect_detection() {
        let dir = setup_test_project();
        let files = discover_test_files(dir.path(), &default_patterns()).unwrap();
        let ts = files.iter().find(|f| f.path.ends_with("typed-test.ts")).unwrap();
        assert_eq!(ts.dialect, Dialect::TypeScript);
        let js = files.iter().find(|f| f.path.ends_with("flash-test.js")).unwrap();
        assert_eq!(js.dialect, Dialect::JavaScript);
    }

    #[test]
    fn test_respects_gitignore_and_default_excludes() {
        let dir = setup_test_project();
        let files = discover_test_files(dir.path(), &default_patterns()).unwrap();
        assert!(!files
            .iter()
            .any(|f| f.path.to_string_lossy().contains("generated")));
        assert!(!files
            .iter()
            .any(|f| f.path.to_string_lossy().contains("node_modules")));
    }

    #[test]
    fn test_custom_and_negated_patterns() {
        let dir = setup_test_project();
        let patterns = vec!["tests/**/*.js".to_string(), "!tests/helpers.js".to_string()];
        let files = discover_test_files(dir.path(), &patterns).unwrap();
        assert_eq!(names(&files), vec!["flash-test.js"]);
    }

    #[test]
    fn test_subdirectory_scan_matches_project_relative_patterns() {
        let dir = setup_test_project();
        let patterns = vec!["tests/**/*-test.js".to_string()];
        let files =
            discover_test_files_in(dir.path(), &dir.path().join("tests/unit"), &patterns).unwrap();
        assert_eq!(names(&files), vec!["flash-test.js"]);
        assert_eq!(
            files,
            discover_test_files(dir.path(), &patterns).unwrap()
        );
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(discover_test_files(dir.path(), &["a[".to_string()]).is_err());
    }

    #[test]
    fn test_root_level_match() {
        let matcher = TestFileMatcher::new(&default_patterns()).unwrap();
        assert!(matcher.matches(Path::new("login-test.js")));
        assert!(matcher.matches(Path::new("tests/acceptance/login-test.ts")));
        assert!(!matcher.matches(Path::new("tests/acceptance/login.js")));
    }

    #[test]
    fn test_results_are_sorted_by_path() {
        let dir = setup_test_project();
        let files = discover_test_files(dir.path(), &default_patterns()).unwrap();
        for window in files.windows(2) {
            assert!(window[0].path <= window[1].path);
        }
    }

    #[test]
    fn test_nonexistent_directory_returns_error() {
        let result = discover_test_files(
            Path::new("/nonexistent/path/that/surely/doesnt/exist"),
            &default_patterns(),
        );
        assert!(result.is_err());
    }
}
