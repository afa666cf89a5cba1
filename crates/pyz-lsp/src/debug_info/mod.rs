//! Debug dumps of a file's tokens, parse tree and inferred types.
//!
//! `DumpFileDebugInfo` is the command entry point. It is read-only: it looks
//! a file up in a [`Project`], renders what was asked for and returns the
//! report lines. Every failure (missing arguments, unknown file, nothing at
//! the requested offsets) degrades to an empty report or a sentinel string.

pub mod range_resolver;
pub mod stringify;
pub mod tree_dumper;
pub mod type_printer;

pub use range_resolver::{
    TypeQueryTarget, find_node_by_offset, find_query_anchor, resolve_enclosing_expression,
    resolve_type_query,
};
pub use tree_dumper::TreeDumper;
pub use type_printer::TypePrinter;

use pyz_common::{CancellationToken, TextRange};
use pyz_parser::ParseTreeWalker;
use pyz_solver::TypeEvaluator;
use tracing::{debug, info};

use crate::project::{Project, ProjectFile};
use stringify::{text_span, token_string};

/// One untyped command argument, as received from the client.
pub type CommandArg = serde_json::Value;

/// What to dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugInfoKind {
    Tokens,
    Nodes,
    Types,
}

impl DebugInfoKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "tokens" => Some(DebugInfoKind::Tokens),
            "nodes" => Some(DebugInfoKind::Nodes),
            "types" => Some(DebugInfoKind::Types),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DebugInfoKind::Tokens => "tokens",
            DebugInfoKind::Nodes => "nodes",
            DebugInfoKind::Types => "types",
        }
    }
}

/// Dumps token, node or type information for one file of a project.
///
/// Arguments are `[filePath, kind, start?, end?]`; `start` and `end` are
/// byte offsets and are only read for `types`.
pub struct DumpFileDebugInfo<'p> {
    project: &'p Project,
}

impl<'p> DumpFileDebugInfo<'p> {
    pub fn new(project: &'p Project) -> Self {
        DumpFileDebugInfo { project }
    }

    pub fn execute(&self, args: &[CommandArg], token: &CancellationToken) -> Vec<String> {
        if token.is_cancellation_requested() {
            debug!("debug info request cancelled before start");
            return Vec::new();
        }
        if args.len() < 2 {
            return Vec::new();
        }
        let Some(file_path) = args[0].as_str() else {
            return Vec::new();
        };
        let Some(kind) = args[1].as_str().and_then(DebugInfoKind::parse) else {
            debug!(kind = %args[1], "unknown debug info kind");
            return Vec::new();
        };
        let Some(file) = self.project.file(file_path) else {
            debug!(file = file_path, "file is not part of the project");
            return Vec::new();
        };

        let mut report = Report::default();
        match kind {
            DebugInfoKind::Tokens => {
                report.line(format!("* Dump debug info for '{file_path}'"));
                report.line(format!(
                    "* Token info ({} tokens)",
                    file.parse_results().tokens().len()
                ));
                for line in token_lines(file) {
                    report.line(line);
                }
            }
            DebugInfoKind::Nodes => {
                report.line(format!("* Dump debug info for '{file_path}'"));
                report.line("* Node info".to_string());
                report.line(node_dump(file));
            }
            DebugInfoKind::Types => {
                let (Some(start), Some(end)) = (offset_arg(args, 2), offset_arg(args, 3)) else {
                    return Vec::new();
                };
                report.line(format!("* Dump debug info for '{file_path}'"));
                report.line("* Type info".to_string());
                report.line(type_info(file, start, end));
            }
        }
        report.lines
    }
}

/// Lines delivered to the caller, echoed to the log as they are produced.
#[derive(Default)]
struct Report {
    lines: Vec<String>,
}

impl Report {
    fn line(&mut self, line: String) {
        info!("{line}");
        self.lines.push(line);
    }
}

/// A non-zero integer offset at `args[index]`.
fn offset_arg(args: &[CommandArg], index: usize) -> Option<u32> {
    args.get(index)?
        .as_u64()
        .filter(|&offset| offset != 0)
        .and_then(|offset| u32::try_from(offset).ok())
}

/// `[i] <token string>` for every token of the file.
pub fn token_lines(file: &ProjectFile) -> Vec<String> {
    let lines = file.line_map();
    file.parse_results()
        .tokens()
        .iter()
        .enumerate()
        .map(|(i, token)| format!("[{i}] {}", token_string(token, lines)))
        .collect()
}

/// The whole parse tree, one indented line per node.
pub fn node_dump(file: &ProjectFile) -> String {
    let mut dumper = TreeDumper::new(file.line_map());
    dumper.walk(file.arena(), file.root());
    dumper.take_output()
}

/// Type report for the node at `[start, end)`.
///
/// Declaration names print the class or function result directly. Anything
/// else is widened to the enclosing expression, announced with an
/// `Expression node found at ...` header, and evaluated. `N/A` when nothing
/// suitable is found, `No result` when evaluation yields nothing.
pub fn type_info(file: &ProjectFile, start: u32, end: u32) -> String {
    let arena = file.arena();
    let lines = file.line_map();
    let range = TextRange::from_bounds(start, end);

    let Some(anchor) = find_query_anchor(arena, file.root(), range) else {
        debug!(start, end, "no node at the requested offsets");
        return "N/A".to_string();
    };
    let Some(target) = resolve_type_query(arena, anchor, range) else {
        return "N/A".to_string();
    };

    let mut checker = file.checker();
    match target {
        TypeQueryTarget::Class(class) => match checker.get_type_of_class(class) {
            Some(result) => {
                TypePrinter::new(checker.types(), arena, lines).print_class_result(result)
            }
            None => "N/A".to_string(),
        },
        TypeQueryTarget::Function(function) => match checker.get_type_of_function(function) {
            Some(result) => {
                TypePrinter::new(checker.types(), arena, lines).print_function_result(result)
            }
            None => "N/A".to_string(),
        },
        TypeQueryTarget::Expression(expression) => {
            let Some(expression_range) = arena.range(expression) else {
                return "N/A".to_string();
            };
            let header = format!(
                "Expression node found at {} from the given span {}\n",
                text_span(expression_range, lines),
                text_span(range, lines)
            );
            match checker.get_type(expression) {
                Some(ty) => {
                    let printed = TypePrinter::new(checker.types(), arena, lines).print_type(ty);
                    header + &printed
                }
                None => header + "No result",
            }
        }
    }
}
