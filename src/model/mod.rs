use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Source dialect handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    JavaScript,
    TypeScript,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::JavaScript => "javascript",
            Dialect::TypeScript => "typescript",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "tsx" | "mts" | "cts" => Some(Dialect::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Dialect::JavaScript),
            _ => None,
        }
    }

    /// Detect the dialect of a file, falling back to JavaScript.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(Dialect::JavaScript)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a recovered declaration starts in the source text.
///
/// `offset` is a byte offset; `line` is 1-based and `column` is a 0-based
/// byte column, matching what tree-sitter reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// A suite or test recovered from the syntax tree, before path flattening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestNode {
    Suite {
        name: String,
        position: SourcePosition,
        children: Vec<TestNode>,
    },
    Test {
        name: String,
        position: SourcePosition,
    },
}

impl TestNode {
    pub fn name(&self) -> &str {
        match self {
            TestNode::Suite { name, .. } | TestNode::Test { name, .. } => name,
        }
    }

    pub fn position(&self) -> SourcePosition {
        match self {
            TestNode::Suite { position, .. } | TestNode::Test { position, .. } => *position,
        }
    }

    pub fn is_suite(&self) -> bool {
        matches!(self, TestNode::Suite { .. })
    }
}

/// A flattened suite or test: its full filter path and anchor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub full_path: String,
    pub position: SourcePosition,
}

/// Everything recovered from one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub suites: Vec<PathEntry>,
    pub tests: Vec<PathEntry>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty() && self.tests.is_empty()
    }
}
