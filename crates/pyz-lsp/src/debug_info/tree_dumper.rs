//! Indented text rendering of parse trees.

use pyz_common::LineMap;
use pyz_parser::{Node, NodeArena, NodeData, NodeIndex, ParseTreeWalker};

use super::stringify::{
    argument_category_name, error_category_name, keyword_name, operator_name,
    parameter_category_name, text_span, token_string,
};

const INDENT: &str = "  ";

/// Renders nodes one line each:
/// `[id] (Kind, p:start l:length [span])` plus kind-specific fields.
///
/// Walking a subtree indents children one level below their parent. The
/// output accumulates until [`reset`](TreeDumper::reset), so one dumper can
/// render several unrelated nodes in sequence.
pub struct TreeDumper<'a> {
    lines: &'a LineMap,
    indentation: String,
    output: String,
}

impl<'a> TreeDumper<'a> {
    pub fn new(lines: &'a LineMap) -> Self {
        TreeDumper {
            lines,
            indentation: String::new(),
            output: String::new(),
        }
    }

    /// Hand back the accumulated text and start over.
    pub fn take_output(&mut self) -> String {
        self.indentation.clear();
        std::mem::take(&mut self.output)
    }

    pub fn reset(&mut self) {
        self.indentation.clear();
        self.output.clear();
    }

    /// Emit the line for `node` alone.
    pub fn visit(&mut self, arena: &NodeArena, node: NodeIndex) {
        if let Some(data) = arena.get(node) {
            let line = self.describe(node, data);
            self.log(&line);
        }
    }

    fn log(&mut self, line: &str) {
        self.output.push_str(&self.indentation);
        self.output.push_str(line);
        self.output.push('\n');
    }

    fn prefix(&self, index: NodeIndex, node: &Node) -> String {
        format!(
            "[{}] ({:?}, p:{} l:{} [{}])",
            index.id(),
            node.kind(),
            node.start,
            node.length,
            text_span(node.range(), self.lines)
        )
    }

    fn describe(&self, index: NodeIndex, node: &Node) -> String {
        let prefix = self.prefix(index, node);
        let lines = self.lines;
        match &node.data {
            NodeData::Argument { category, .. } => {
                format!("{prefix} {}", argument_category_name(*category as u32))
            }
            NodeData::AugmentedAssignment { operator, .. } => {
                format!("{prefix} {}", operator_name(*operator as u32))
            }
            NodeData::BinaryOperation {
                operator,
                operator_token,
                parenthesized,
                ..
            } => format!(
                "{prefix} {} {} parenthesized:({parenthesized})",
                token_string(operator_token, lines),
                operator_name(*operator as u32)
            ),
            NodeData::UnaryOperation {
                operator,
                operator_token,
                ..
            } => format!(
                "{prefix} {} {}",
                token_string(operator_token, lines),
                operator_name(*operator as u32)
            ),
            NodeData::Constant { keyword } => {
                format!("{prefix} {}", keyword_name(*keyword as u32))
            }
            NodeData::Error { category, .. } => {
                format!("{prefix} {}", error_category_name(*category as u32))
            }
            NodeData::ImportFrom {
                is_wildcard_import,
                wildcard_token,
                uses_parens,
                missing_import_keyword,
                ..
            } => {
                let wildcard = wildcard_token
                    .as_ref()
                    .map_or_else(|| "N/A".to_string(), |token| token_string(token, lines));
                format!(
                    "{prefix} wildcard import:({is_wildcard_import}) paren:({uses_parens}) \
                     wildcard token:({wildcard}) missing import keyword:({missing_import_keyword})"
                )
            }
            NodeData::For { is_async, .. }
            | NodeData::Function { is_async, .. }
            | NodeData::With { is_async, .. }
            | NodeData::ListComprehensionFor { is_async, .. } => {
                format!("{prefix} async:({is_async})")
            }
            NodeData::String {
                token,
                value,
                has_unescape_errors,
            }
            | NodeData::FormatString {
                token,
                value,
                has_unescape_errors,
            } => format!(
                "{prefix} {} {value} unescape errors:({has_unescape_errors})",
                token_string(token, lines)
            ),
            NodeData::ModuleName {
                leading_dots,
                has_trailing_dot,
                ..
            } => format!(
                "{prefix} leading dots:({leading_dots}) trailing dot:({has_trailing_dot})"
            ),
            NodeData::Name { token, value } => {
                format!("{prefix} {} {value}", token_string(token, lines))
            }
            NodeData::Number {
                value,
                is_integer,
                is_imaginary,
            } => format!("{prefix} {value} int:({is_integer}) imaginary:({is_imaginary})"),
            NodeData::Parameter { category, .. } => {
                format!("{prefix} {}", parameter_category_name(*category as u32))
            }
            NodeData::Tuple {
                enclosed_in_parens, ..
            } => format!("{prefix} paren:({enclosed_in_parens})"),
            _ => prefix,
        }
    }
}

impl ParseTreeWalker for TreeDumper<'_> {
    fn visit_node(&mut self, arena: &NodeArena, node: NodeIndex) -> bool {
        self.visit(arena, node);
        true
    }

    fn walk(&mut self, arena: &NodeArena, node: NodeIndex) {
        if !self.visit_node(arena, node) || arena.children(node).is_empty() {
            return;
        }
        self.indentation.push_str(INDENT);
        self.walk_children(arena, node);
        self.indentation
            .truncate(self.indentation.len() - INDENT.len());
    }
}
