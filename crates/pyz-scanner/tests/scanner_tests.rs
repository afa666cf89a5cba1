//! Token serialization and stream-level invariants.

use pyz_scanner::{TokenKind, tokenize};

#[test]
fn token_serializes_with_payload() {
    let output = tokenize("x += 1\n");

    let json = serde_json::to_string(&output.tokens[1]).unwrap();
    assert_eq!(
        json,
        r#"{"kind":"Operator","start":2,"length":2,"operator":"AddEqual"}"#
    );

    let json = serde_json::to_string(&output.tokens[0]).unwrap();
    assert_eq!(
        json,
        r#"{"kind":"Identifier","start":0,"length":1,"identifier":{"value":"x"}}"#
    );
}

#[test]
fn plain_tokens_serialize_without_payload() {
    let output = tokenize("(x)\n");
    let json = serde_json::to_string(&output.tokens[0]).unwrap();
    assert_eq!(json, r#"{"kind":"OpenParenthesis","start":0,"length":1}"#);
}

#[test]
fn token_ranges_are_ordered_and_within_file() {
    let source = "class A(B):\n    def m(self, *a, **k) -> int:\n        return [a, {k: 1}]\n";
    let output = tokenize(source);

    let mut last_start = 0;
    for token in &output.tokens {
        assert!(token.start >= last_start, "token out of order: {token:?}");
        assert!(token.end() as usize <= source.len());
        last_start = token.start;
    }
    assert_eq!(output.tokens.last().map(|t| t.kind), Some(TokenKind::EndOfStream));
}

#[test]
fn empty_file_has_only_end_of_stream() {
    let output = tokenize("");
    assert_eq!(output.count(), 1);
    assert_eq!(output.tokens[0].kind, TokenKind::EndOfStream);
}
