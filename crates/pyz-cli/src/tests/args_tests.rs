use clap::Parser;
use std::path::Path;

use super::args::{CliArgs, DumpKind};

#[test]
fn parses_file_and_kind() {
    let args = CliArgs::try_parse_from(["pyz-debug", "main.py", "nodes"]).unwrap();
    assert_eq!(args.file.as_deref(), Some(Path::new("main.py")));
    assert_eq!(args.kind, Some(DumpKind::Nodes));
    assert_eq!(args.start, None);
    assert!(!args.no_color);
    assert!(args.request.is_none());
}

#[test]
fn parses_type_offsets() {
    let args = CliArgs::try_parse_from([
        "pyz-debug", "main.py", "TYPES", "--start", "4", "--end", "5", "--no-color",
    ])
    .unwrap();
    assert_eq!(args.kind, Some(DumpKind::Types));
    assert_eq!(args.start, Some(4));
    assert_eq!(args.end, Some(5));
    assert!(args.no_color);
}

#[test]
fn request_replaces_positionals() {
    let args =
        CliArgs::try_parse_from(["pyz-debug", "--request", r#"["main.py", "tokens"]"#]).unwrap();
    assert!(args.file.is_none());
    assert!(args.kind.is_none());
    assert_eq!(args.request.as_deref(), Some(r#"["main.py", "tokens"]"#));

    assert!(CliArgs::try_parse_from(["pyz-debug", "main.py", "nodes", "--request", "[]"]).is_err());
}

#[test]
fn rejects_missing_or_unknown_kinds() {
    assert!(CliArgs::try_parse_from(["pyz-debug"]).is_err());
    assert!(CliArgs::try_parse_from(["pyz-debug", "main.py"]).is_err());
    assert!(CliArgs::try_parse_from(["pyz-debug", "main.py", "symbols"]).is_err());
    assert!(CliArgs::try_parse_from(["pyz-debug", "main.py", "types", "--start", "-1"]).is_err());
}
