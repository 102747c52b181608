//! Round-trip tests for the full-fidelity tokenizer.
//!
//! These tests verify that `TokenStream::from_source(code).to_source() == code`
//! for well-formed Python, including after dedent normalization.
//!
//! # Test Organization
//!
//! - Fixture-based tests: One test per fixture file in `tests/fixtures/`
//! - Inline tests: Individual test cases for specific constructs

use std::path::PathBuf;

use difference::assert_diff;
use tugup_core::stream::TokenStream;
use tugup_core::tokenizer::{tokenize, TokenKind};

/// Helper to visualize whitespace differences in test output
fn visualize(s: &str) -> String {
    s.replace(' ', "▩").replace('\t', "→").replace('\n', "↩\n")
}

/// Helper to perform round-trip test on source code
fn assert_roundtrip(input: &str, label: &str) {
    let stream = match TokenStream::from_source(input) {
        Ok(stream) => stream,
        Err(e) => panic!("{}: {}", label, e),
    };
    let generated = stream.to_source();

    if generated != input {
        let got = visualize(&generated);
        let expected = visualize(input);
        assert_diff!(expected.as_ref(), got.as_ref(), "", 0);
    }
}

/// Helper to load and test a fixture file
fn assert_roundtrip_fixture(fixture_name: &str) {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(format!("{}.py", fixture_name));
    let input = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e));
    assert_roundtrip(&input, fixture_name);
}

// ============================================================================
// Fixture-based tests
// ============================================================================

#[test]
fn roundtrip_fixture_models() {
    assert_roundtrip_fixture("models");
}

#[test]
fn roundtrip_fixture_views() {
    assert_roundtrip_fixture("views");
}

#[test]
fn roundtrip_fixture_syntax_tour() {
    assert_roundtrip_fixture("syntax_tour");
}

#[test]
fn roundtrip_fixture_crlf() {
    assert_roundtrip_fixture("crlf");
}

// ============================================================================
// Inline tests
// ============================================================================

#[test]
fn roundtrip_empty_and_whitespace_only() {
    for source in ["", "\n", "   \n", "\n\n\n", "# only a comment", "  # indented comment\n"] {
        assert_roundtrip(source, "blank");
    }
}

#[test]
fn roundtrip_trailing_whitespace_is_preserved() {
    assert_roundtrip("x = 1   \ny = 2\t\n", "trailing");
}

#[test]
fn roundtrip_deep_dedent_to_module_level() {
    assert_roundtrip(
        "class A:\n    def f(self):\n        if x:\n            return 1\n  \nz = 2\n",
        "deep dedent",
    );
}

#[test]
fn roundtrip_dedent_with_partial_indentation() {
    assert_roundtrip(
        "if a:\n        if b:\n                c\n        d\n",
        "partial dedent",
    );
}

#[test]
fn roundtrip_backslash_continuations() {
    assert_roundtrip("x = 1 + \\\n    2\nassert x, \\\r\n  'msg'\n", "continuation");
}

#[test]
fn roundtrip_non_ascii_identifiers_and_strings() {
    assert_roundtrip("café = 'naïve'  # ünïcode\nπ = 3.14\n", "unicode");
}

#[test]
fn every_lexed_token_carries_a_position() {
    let source = "def f(a,\n      b):\n    return a\n";
    let tokens = tokenize(source).expect("tokenize");
    assert!(tokens.iter().all(|t| t.position.is_some()));
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndMarker));
}
