//! Runs one debug info request against a file on disk.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use pyz_common::CancellationToken;
use pyz_lsp::{CommandArg, DebugInfoKind, DumpFileDebugInfo, Project};
use serde_json::json;
use tracing::debug;

use crate::args::CliArgs;

/// The file to load and the command arguments to run against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub path: PathBuf,
    pub args: Vec<CommandArg>,
}

/// Build the untyped command arguments from the CLI.
///
/// `--request` is passed through as is. Otherwise the arguments are
/// assembled as `[file, kind, start, end]`, with missing offsets sent as `0`
/// so the command rejects them the same way it would a raw request.
pub fn build_request(args: &CliArgs) -> Result<Request> {
    if let Some(raw) = &args.request {
        let request: Vec<CommandArg> = serde_json::from_str(raw)
            .with_context(|| format!("--request is not a JSON array: {raw}"))?;
        let Some(path) = request.first().and_then(CommandArg::as_str) else {
            bail!("--request must start with a file path");
        };
        return Ok(Request {
            path: PathBuf::from(path),
            args: request,
        });
    }

    let (Some(path), Some(kind)) = (&args.file, args.kind) else {
        bail!("a FILE and a KIND are required without --request");
    };
    let kind = DebugInfoKind::from(kind);
    let mut command_args = vec![json!(path.to_string_lossy()), json!(kind.as_str())];
    if kind == DebugInfoKind::Types {
        command_args.push(json!(args.start.unwrap_or(0)));
        command_args.push(json!(args.end.unwrap_or(0)));
    }
    Ok(Request {
        path: path.clone(),
        args: command_args,
    })
}

/// Whether header lines should be colored.
pub fn color_enabled(args: &CliArgs, is_terminal: bool) -> bool {
    !args.no_color && std::env::var_os("NO_COLOR").is_none() && is_terminal
}

/// Load the requested file, run the command and write its lines to `out`.
///
/// Returns the number of lines written. An empty report is an error: the
/// request named something the command could not answer.
pub fn run(args: &CliArgs, color: bool, out: &mut impl Write) -> Result<usize> {
    let request = build_request(args)?;
    let mut project = Project::new();
    project.open_file(&request.path)?;
    debug!(path = %request.path.display(), args = ?request.args, "running debug info request");

    let lines =
        DumpFileDebugInfo::new(&project).execute(&request.args, &CancellationToken::none());
    if lines.is_empty() {
        bail!(
            "no debug info for {} (types needs non-zero --start and --end)",
            request.path.display()
        );
    }

    for line in &lines {
        if color && line.starts_with("* ") {
            writeln!(out, "{}", line.cyan().bold())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    Ok(lines.len())
}
