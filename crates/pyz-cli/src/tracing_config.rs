//! Opt-in tracing output for pyz tools.
//!
//! Nothing is installed unless `PYZ_LOG` (or `RUST_LOG`) is set. The filter
//! uses `RUST_LOG` syntax, e.g. `PYZ_LOG=pyz_checker=trace,pyz_lsp=debug`.
//! `PYZ_LOG_FORMAT` picks the output shape:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `tree`: indented spans via `tracing-tree`
//! - `json`: one JSON object per event
//!
//! Everything is written to stderr; stdout carries only the dump.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Unrecognised values fall back to `Text`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => LogFormat::Tree,
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    fn from_env() -> Self {
        std::env::var("PYZ_LOG_FORMAT")
            .map(|value| LogFormat::parse(&value))
            .unwrap_or(LogFormat::Text)
    }
}

/// `PYZ_LOG` wins over `RUST_LOG`; `None` when neither is set.
fn filter_from_env() -> Option<EnvFilter> {
    if let Ok(directives) = std::env::var("PYZ_LOG") {
        return Some(EnvFilter::builder().parse_lossy(directives));
    }
    std::env::var_os("RUST_LOG").map(|_| EnvFilter::from_default_env())
}

/// Install the global subscriber if logging was requested.
///
/// Returns whether a subscriber is now active for this process.
pub fn init_tracing() -> bool {
    let Some(filter) = filter_from_env() else {
        return false;
    };

    let installed = match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_writer(std::io::stderr)
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).try_init()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init()
        }
        LogFormat::Text => {
            let text_layer = fmt::layer().with_writer(std::io::stderr);
            Registry::default().with(filter).with(text_layer).try_init()
        }
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::LogFormat;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!(LogFormat::parse("tree"), LogFormat::Tree);
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Text "), LogFormat::Text);
        assert_eq!(LogFormat::parse("fancy"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }
}
