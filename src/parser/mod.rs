use tree_sitter::{Node, Parser, Tree};

use crate::model::{Dialect, SourcePosition};

/// Failure to turn source text into a usable syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("failed to load {dialect} grammar: {message}")]
    Grammar { dialect: Dialect, message: String },

    #[error("tree-sitter returned no tree")]
    NoTree,

    #[error("unexpected token at line {line}, column {column}")]
    Syntax { line: usize, column: usize },

    #[error("missing {expected} at line {line}, column {column}")]
    Missing {
        expected: String,
        line: usize,
        column: usize,
    },
}

/// A parsed file: the tree-sitter tree and the text it was built from.
pub struct SyntaxTree<'a> {
    tree: Tree,
    source: &'a str,
}

impl<'a> SyntaxTree<'a> {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// The node kinds the test extractor distinguishes. Everything else is
/// `Other` and is never descended into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    Program,
    ExpressionStatement,
    CallExpression,
    MemberExpression,
    Identifier,
    PropertyIdentifier,
    String,
    TemplateString,
    ArrowFunction,
    FunctionExpression,
    StatementBlock,
    ParenthesizedExpression,
    ForStatement,
    /// `for (x in y)` and `for (x of y)` share one grammar rule.
    ForInStatement,
    WhileStatement,
    DoStatement,
    /// `outer: for (...)`; the label wraps the loop it names.
    LabeledStatement,
    Other,
}

impl SyntaxKind {
    pub fn of(node: Node) -> Self {
        match node.kind() {
            "program" => SyntaxKind::Program,
            "expression_statement" => SyntaxKind::ExpressionStatement,
            "call_expression" => SyntaxKind::CallExpression,
            "member_expression" => SyntaxKind::MemberExpression,
            "identifier" => SyntaxKind::Identifier,
            "property_identifier" => SyntaxKind::PropertyIdentifier,
            "string" => SyntaxKind::String,
            "template_string" => SyntaxKind::TemplateString,
            "arrow_function" => SyntaxKind::ArrowFunction,
            "function_expression" | "function" | "generator_function" => {
                SyntaxKind::FunctionExpression
            }
            "statement_block" => SyntaxKind::StatementBlock,
            "parenthesized_expression" => SyntaxKind::ParenthesizedExpression,
            "for_statement" => SyntaxKind::ForStatement,
            "for_in_statement" => SyntaxKind::ForInStatement,
            "while_statement" => SyntaxKind::WhileStatement,
            "do_statement" => SyntaxKind::DoStatement,
            "labeled_statement" => SyntaxKind::LabeledStatement,
            _ => SyntaxKind::Other,
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            SyntaxKind::ForStatement
                | SyntaxKind::ForInStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(self, SyntaxKind::ArrowFunction | SyntaxKind::FunctionExpression)
    }
}

fn create_parser(dialect: Dialect) -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    // Both dialects share one grammar: TSX is the typed superset plus JSX, so
    // annotations in a `.js` test file still parse.
    let language: tree_sitter::Language = tree_sitter_typescript::LANGUAGE_TSX.into();
    parser
        .set_language(&language)
        .map_err(|e| ParseError::Grammar {
            dialect,
            message: e.to_string(),
        })?;
    Ok(parser)
}

/// Parse `source` strictly: any error or missing node fails the parse.
///
/// tree-sitter always recovers, so the first ERROR/MISSING node is reported
/// the way a strict parser would report its first syntax error.
pub fn parse(source: &str, dialect: Dialect) -> Result<SyntaxTree<'_>, ParseError> {
    let mut parser = create_parser(dialect)?;
    let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(describe_error(root));
    }

    Ok(SyntaxTree { tree, source })
}

fn describe_error(root: Node) -> ParseError {
    let node = first_error(root).unwrap_or(root);
    let pos = position_of(node);
    if node.is_missing() {
        ParseError::Missing {
            expected: node.kind().to_string(),
            line: pos.line,
            column: pos.column,
        }
    } else {
        ParseError::Syntax {
            line: pos.line,
            column: pos.column,
        }
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

/// Anchor position of a node's first byte.
pub fn position_of(node: Node) -> SourcePosition {
    let start = node.start_position();
    SourcePosition {
        offset: node.start_byte(),
        line: start.row + 1,
        column: start.column,
    }
}
