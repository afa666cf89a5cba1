//! Tests for the scanner internals.

use crate::scanner_impl::tokenize;
use crate::token::*;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn test_function_definition_tokens() {
    use TokenKind::*;
    assert_eq!(
        kinds("def f(x):\n    return x\n"),
        vec![
            Keyword,
            Identifier,
            OpenParenthesis,
            Identifier,
            CloseParenthesis,
            Colon,
            NewLine,
            Indent,
            Keyword,
            Identifier,
            NewLine,
            Dedent,
            EndOfStream,
        ]
    );
}

#[test]
fn test_blank_and_comment_lines_do_not_indent() {
    use TokenKind::*;
    let source = "if x:\n\n    # comment\n    y\n";
    assert_eq!(
        kinds(source),
        vec![
            Keyword, Identifier, Colon, NewLine, Indent, Identifier, NewLine, Dedent, EndOfStream,
        ]
    );
}

#[test]
fn test_newlines_inside_brackets_are_ignored() {
    let output = tokenize("f(a,\n  b)\n");
    let newlines = output
        .tokens
        .iter()
        .filter(|t| t.kind == TokenKind::NewLine)
        .count();
    assert_eq!(newlines, 1);
    assert!(!output.tokens.iter().any(|t| t.kind == TokenKind::Indent));
}

#[test]
fn test_implied_newline_at_end_of_file() {
    let output = tokenize("x = 1");
    let newline = &output.tokens[output.tokens.len() - 2];
    assert_eq!(newline.kind, TokenKind::NewLine);
    assert_eq!(newline.new_line_kind(), Some(NewLineKind::Implied));
    assert_eq!(newline.length, 0);
    assert_eq!(newline.start, 5);
}

#[test]
fn test_newline_kinds() {
    let output = tokenize("a\r\nb\rc\n");
    let kinds: Vec<_> = output
        .tokens
        .iter()
        .filter_map(|t| t.new_line_kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            NewLineKind::CarriageReturnLineFeed,
            NewLineKind::CarriageReturn,
            NewLineKind::LineFeed,
        ]
    );
}

#[test]
fn test_operators_longest_match() {
    let output = tokenize("a **= b // c -> d := e != f\n");
    let operators: Vec<_> = output
        .tokens
        .iter()
        .filter_map(|t| t.operator_kind())
        .collect();
    assert_eq!(
        operators,
        vec![
            OperatorKind::PowerEqual,
            OperatorKind::FloorDivide,
            OperatorKind::Walrus,
            OperatorKind::NotEquals,
        ]
    );
    assert!(output.tokens.iter().any(|t| t.kind == TokenKind::Arrow));
}

#[test]
fn test_numbers() {
    let output = tokenize("1 0x1f 1.5 2e3 3j 1_000\n");
    let numbers: Vec<_> = output
        .tokens
        .iter()
        .filter_map(|t| match &t.data {
            TokenData::Number {
                value,
                is_integer,
                is_imaginary,
            } => Some((*value, *is_integer, *is_imaginary)),
            _ => None,
        })
        .collect();
    assert_eq!(
        numbers,
        vec![
            (NumberValue::Int(1), true, false),
            (NumberValue::Int(31), true, false),
            (NumberValue::Float(1.5), false, false),
            (NumberValue::Float(2000.0), false, false),
            (NumberValue::Int(3), true, true),
            (NumberValue::Int(1000), true, false),
        ]
    );
}

#[test]
fn test_string_prefixes_and_escapes() {
    let output = tokenize("rb'\\n' f\"{x}\" 'a\\tb' '''tri\nple'''\n");
    let strings: Vec<_> = output
        .tokens
        .iter()
        .filter_map(|t| match &t.data {
            TokenData::String {
                flags,
                escaped_value,
                ..
            } => Some((*flags, escaped_value.clone())),
            _ => None,
        })
        .collect();

    assert_eq!(strings.len(), 4);
    assert_eq!(
        strings[0].0,
        StringFlags::RAW | StringFlags::BYTES | StringFlags::SINGLE_QUOTE
    );
    assert_eq!(strings[0].1, "\\n");
    assert_eq!(strings[1].0, StringFlags::FORMAT | StringFlags::DOUBLE_QUOTE);
    assert_eq!(strings[2].1, "a\tb");
    assert!(strings[3].0.contains(StringFlags::TRIPLICATE));
    assert_eq!(strings[3].1, "tri\nple");
}

#[test]
fn test_unterminated_string_is_flagged() {
    let output = tokenize("'abc\nx\n");
    let flags = output.tokens[0].string_flags().unwrap();
    assert!(flags.contains(StringFlags::UNTERMINATED));
    // The scanner recovers and keeps tokenizing the next line.
    assert_eq!(output.tokens[0].length, 4);
    assert!(output.tokens.iter().any(|t| t.identifier_text() == Some("x")));
}

#[test]
fn test_bad_hex_escape_sets_unescape_error() {
    let output = tokenize("'\\xZZ'\n");
    match &output.tokens[0].data {
        TokenData::String {
            has_unescape_errors,
            ..
        } => assert!(*has_unescape_errors),
        other => panic!("expected string token, got {other:?}"),
    }
}

#[test]
fn test_keywords_and_debug_constant() {
    let output = tokenize("not __debug__ and None\n");
    let keywords: Vec<_> = output
        .tokens
        .iter()
        .filter_map(|t| t.keyword_kind())
        .collect();
    assert_eq!(
        keywords,
        vec![
            KeywordKind::Not,
            KeywordKind::Debug,
            KeywordKind::And,
            KeywordKind::None,
        ]
    );
}

#[test]
fn test_dedent_to_unknown_level_does_not_match() {
    let output = tokenize("if a:\n        b\n    c\n");
    let dedent = output
        .tokens
        .iter()
        .find(|t| t.kind == TokenKind::Dedent)
        .unwrap();
    assert_eq!(
        dedent.data,
        TokenData::Dedent {
            amount: 0,
            matches_indent: false
        }
    );
}

#[test]
fn test_invalid_character() {
    let output = tokenize("a $ b\n");
    assert_eq!(output.tokens[1].kind, TokenKind::Invalid);
    assert_eq!(output.tokens[1].start, 2);
}
