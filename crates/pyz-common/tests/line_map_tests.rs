//! Line map behaviour over whole files.

use pyz_common::{LineMap, Position, TextRange};

#[test]
fn end_of_file_offset_maps_to_last_line() {
    let source = "x = 1\ny = 2\n";
    let map = LineMap::build(source);

    // Trailing newline opens an empty final line.
    assert_eq!(map.line_count(), 3);
    assert_eq!(
        map.offset_to_position(source.len() as u32),
        Position::new(2, 0)
    );

    let unterminated = "x = 1\ny = 2";
    let map = LineMap::build(unterminated);
    assert_eq!(
        map.offset_to_position(unterminated.len() as u32),
        Position::new(1, 5)
    );
}

#[test]
fn lines_are_monotonic_in_offset() {
    let source = "class A:\n    pass\n\r\nif x:\r    y\n";
    let map = LineMap::build(source);

    let mut previous = map.offset_to_position(0);
    for offset in 1..=source.len() as u32 {
        let current = map.offset_to_position(offset);
        assert!(
            previous.line <= current.line,
            "line went backwards at offset {offset}: {previous:?} -> {current:?}"
        );
        previous = current;
    }
}

#[test]
fn precomputed_line_starts_match_built_map() {
    let source = "a\nbb\nccc\n";
    let built = LineMap::build(source);
    let table = LineMap::from_line_starts(vec![0, 2, 5, 9]);
    assert_eq!(built, table);

    // A table without the implicit first line is normalised.
    let partial = LineMap::from_line_starts(vec![2, 5, 9]);
    assert_eq!(partial.line_starts(), &[0, 2, 5, 9]);
}

#[test]
fn range_of_spans_lines() {
    let source = "def f(x):\n    return x\n";
    let map = LineMap::build(source);
    let range = map.range_of(TextRange::from_bounds(4, 21));
    assert_eq!(range.start, Position::new(0, 4));
    assert_eq!(range.end, Position::new(1, 11));
}

#[test]
fn positions_serialize_as_objects() {
    let json = serde_json::to_string(&Position::new(3, 7)).unwrap();
    assert_eq!(json, r#"{"line":3,"character":7}"#);
}
