use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use pyz_lsp::DebugInfoKind;

/// CLI arguments for the pyz-debug binary.
#[derive(Parser, Debug)]
#[command(
    name = "pyz-debug",
    version,
    about = "Dump the tokens, parse tree or inferred types of a Python source file"
)]
pub struct CliArgs {
    /// Source file to inspect.
    #[arg(required_unless_present = "request")]
    pub file: Option<PathBuf>,

    /// What to dump.
    #[arg(value_enum, ignore_case = true, required_unless_present = "request")]
    pub kind: Option<DumpKind>,

    /// Start byte offset of the range to type (`types` only).
    #[arg(long)]
    pub start: Option<u32>,

    /// End byte offset of the range to type (`types` only).
    #[arg(long)]
    pub end: Option<u32>,

    /// Disable colored header lines.
    #[arg(long)]
    pub no_color: bool,

    /// Raw command arguments as a JSON array, e.g. '["main.py", "types", 4, 5]'.
    #[arg(long, conflicts_with_all = ["file", "kind", "start", "end"])]
    pub request: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpKind {
    Tokens,
    Nodes,
    Types,
}

impl From<DumpKind> for DebugInfoKind {
    fn from(kind: DumpKind) -> Self {
        match kind {
            DumpKind::Tokens => DebugInfoKind::Tokens,
            DumpKind::Nodes => DebugInfoKind::Nodes,
            DumpKind::Types => DebugInfoKind::Types,
        }
    }
}
