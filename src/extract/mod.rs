//! Recovers the suite/test hierarchy of a test file from its syntax tree.
//!
//! The walk only follows the shapes test files actually use: top-level
//! statements, suite callbacks, loop bodies and array-iteration callbacks.
//! Loops and iteration callbacks never add a nesting level; whatever they
//! declare belongs to the enclosing suite.

use std::path::Path;

use tree_sitter::Node;

use crate::config::Settings;
use crate::diagnostics::Diagnostics;
use crate::model::{Dialect, Extraction, PathEntry, SourcePosition, TestNode};
use crate::parser::{self, position_of, SyntaxKind, SyntaxTree};

pub mod names;

/// Calls that declare a suite.
pub const SUITE_FUNCTIONS: &[&str] = &["describe", "module", "context"];

/// Calls that declare a single test.
pub const TEST_FUNCTIONS: &[&str] = &["it", "test", "specify"];

/// Array methods whose callback body is scanned as if it were inline.
pub const ITERATION_METHODS: &[&str] = &["forEach", "map", "filter", "every", "some"];

/// Separator between nested suite names in a full path.
pub const SUITE_SEPARATOR: &str = " > ";

/// Separator between the suite path and the test name.
pub const TEST_SEPARATOR: &str = ": ";

pub struct TestExtractor<'d> {
    diagnostics: &'d dyn Diagnostics,
    debug: bool,
    all_root_suites: bool,
    file: Option<&'d Path>,
}

impl<'d> TestExtractor<'d> {
    pub fn new(settings: &Settings, diagnostics: &'d dyn Diagnostics) -> Self {
        Self {
            diagnostics,
            debug: settings.debug,
            all_root_suites: settings.all_root_suites,
            file: None,
        }
    }

    /// Name the file being extracted in parse-failure diagnostics.
    pub fn for_file(mut self, file: &'d Path) -> Self {
        self.file = Some(file);
        self
    }

    /// Extract suites and tests from one file.
    ///
    /// Never fails: unparsable input logs one error and yields an empty
    /// extraction.
    pub fn extract(&self, source: &str, dialect: Dialect) -> Extraction {
        let tree = match parser::parse(source, dialect) {
            Ok(tree) => tree,
            Err(e) => {
                let message = match self.file {
                    Some(file) => format!("Error parsing test file: {}: {}", file.display(), e),
                    None => format!("Error parsing test file: {}", e),
                };
                self.diagnostics.error(&message);
                return Extraction::default();
            }
        };

        let mut extraction = Extraction::default();
        for root in select_roots(recover_nodes(&tree), self.all_root_suites) {
            traverse_tree(&root, "", &mut extraction);
        }

        if self.debug {
            self.diagnostics.debug(&format!(
                "Extracted {} modules and {} tests.",
                extraction.suites.len(),
                extraction.tests.len()
            ));
        }

        extraction
    }
}

/// Recover every suite/test declared at the top level of the program,
/// including those spliced in from loops and iteration callbacks.
pub fn recover_nodes(tree: &SyntaxTree) -> Vec<TestNode> {
    let walker = Walker { tree };
    let root = tree.root();
    match SyntaxKind::of(root) {
        SyntaxKind::Program => walker.process_statements(root),
        _ => Vec::new(),
    }
}

/// Pick the tree roots to flatten.
///
/// Only the first top-level suite is used unless `all` is set; top-level
/// tests have no suite to qualify them and are never roots.
pub fn select_roots(nodes: Vec<TestNode>, all: bool) -> Vec<TestNode> {
    let suites = nodes.into_iter().filter(TestNode::is_suite);
    if all {
        suites.collect()
    } else {
        suites.take(1).collect()
    }
}

/// Flatten a recovered tree into path entries, parents before children.
pub fn traverse_tree(node: &TestNode, prefix: &str, out: &mut Extraction) {
    match node {
        TestNode::Suite {
            name,
            position,
            children,
        } => {
            let full_path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}{}{}", prefix, SUITE_SEPARATOR, name)
            };
            out.suites.push(PathEntry {
                full_path: full_path.clone(),
                position: *position,
            });
            for child in children {
                traverse_tree(child, &full_path, out);
            }
        }
        TestNode::Test { name, position } => {
            if prefix.is_empty() {
                return;
            }
            out.tests.push(PathEntry {
                full_path: format!("{}{}{}", prefix, TEST_SEPARATOR, name),
                position: *position,
            });
        }
    }
}

struct Walker<'t, 'a> {
    tree: &'t SyntaxTree<'a>,
}

impl<'t, 'a> Walker<'t, 'a> {
    fn process_statements(&self, container: Node) -> Vec<TestNode> {
        let mut nodes = Vec::new();
        let mut cursor = container.walk();
        for statement in container.named_children(&mut cursor) {
            nodes.extend(self.process_statement(statement));
        }
        nodes
    }

    fn process_statement(&self, node: Node) -> Vec<TestNode> {
        let kind = SyntaxKind::of(node);
        match kind {
            SyntaxKind::ExpressionStatement => match node.named_child(0) {
                Some(expr) => self.process_expression(expr, Some(position_of(node))),
                None => Vec::new(),
            },
            _ if kind.is_loop() || kind == SyntaxKind::LabeledStatement => {
                match node.child_by_field_name("body") {
                    Some(body) => self.process_body(body),
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    /// A loop or label body is either a block or a single statement.
    fn process_body(&self, body: Node) -> Vec<TestNode> {
        match SyntaxKind::of(body) {
            SyntaxKind::StatementBlock => self.process_statements(body),
            _ => self.process_statement(body),
        }
    }

    fn process_expression(&self, node: Node, anchor: Option<SourcePosition>) -> Vec<TestNode> {
        match SyntaxKind::of(node) {
            SyntaxKind::ParenthesizedExpression => match node.named_child(0) {
                Some(inner) => self.process_expression(inner, anchor),
                None => Vec::new(),
            },
            SyntaxKind::CallExpression => self.process_call(node, anchor),
            _ => Vec::new(),
        }
    }

    fn process_call(&self, call: Node, anchor: Option<SourcePosition>) -> Vec<TestNode> {
        let Some(callee) = call.child_by_field_name("function") else {
            return Vec::new();
        };
        let args = call_arguments(call);
        let position = anchor.unwrap_or_else(|| position_of(call));

        let Some(function_name) = self.callee_name(callee) else {
            return Vec::new();
        };

        if SUITE_FUNCTIONS.contains(&function_name) && !args.is_empty() {
            let children = args
                .get(1)
                .filter(|cb| SyntaxKind::of(**cb).is_function())
                .map(|cb| self.process_callback(*cb))
                .unwrap_or_default();
            return vec![TestNode::Suite {
                name: self.declared_name(args[0]),
                position,
                children,
            }];
        }

        if TEST_FUNCTIONS.contains(&function_name) && !args.is_empty() {
            return vec![TestNode::Test {
                name: self.declared_name(args[0]),
                position,
            }];
        }

        if SyntaxKind::of(callee) == SyntaxKind::MemberExpression
            && ITERATION_METHODS.contains(&function_name)
        {
            if let Some(callback) = args.first().filter(|cb| SyntaxKind::of(**cb).is_function()) {
                return self.process_callback(*callback);
            }
        }

        Vec::new()
    }

    /// Bare identifier, or the property of `obj.prop(...)`.
    fn callee_name(&self, callee: Node) -> Option<&'a str> {
        match SyntaxKind::of(callee) {
            SyntaxKind::Identifier => Some(self.tree.text(callee)),
            SyntaxKind::MemberExpression => {
                let property = callee.child_by_field_name("property")?;
                match SyntaxKind::of(property) {
                    SyntaxKind::PropertyIdentifier => Some(self.tree.text(property)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn process_callback(&self, function: Node) -> Vec<TestNode> {
        let Some(body) = function.child_by_field_name("body") else {
            return Vec::new();
        };
        match SyntaxKind::of(body) {
            SyntaxKind::StatementBlock => self.process_statements(body),
            // `() => it(...)`
            _ => self.process_expression(body, None),
        }
    }

    fn declared_name(&self, arg: Node) -> String {
        let source = self.tree.source();
        match SyntaxKind::of(arg) {
            SyntaxKind::String => names::string_value(arg, source),
            SyntaxKind::TemplateString => names::template_head(arg, source),
            _ => String::new(),
        }
    }
}

fn call_arguments(call: Node) -> Vec<Node> {
    let mut out = Vec::new();
    let Some(args) = call.child_by_field_name("arguments") else {
        return out;
    };
    // Tagged templates put a template_string here instead of an argument list.
    if args.kind() != "arguments" {
        return out;
    }
    let mut cursor = args.walk();
    for child in args.named_children(&mut cursor) {
        if child.kind() != "comment" {
            out.push(child);
        }
    }
    out
}
