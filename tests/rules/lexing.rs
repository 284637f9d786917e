//! Integration tests for the rule lexer and parser

use gramprod_foundation::ErrorKind;
use gramprod_rules::parser::{ItemKind, Qualifier};
use gramprod_rules::{Lexer, TokenKind, parse};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source)
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// =============================================================================
// Lexing
// =============================================================================

#[test]
fn lex_full_rule() {
    assert_eq!(
        kinds("[badness -2] 'take' (\"the\" | ) <noun adj>->obj *"),
        vec![
            TokenKind::LBracket,
            TokenKind::Symbol("badness".into()),
            TokenKind::Int(-2),
            TokenKind::RBracket,
            TokenKind::Literal("take".into()),
            TokenKind::LParen,
            TokenKind::Literal("the".into()),
            TokenKind::Pipe,
            TokenKind::RParen,
            TokenKind::LAngle,
            TokenKind::Symbol("noun".into()),
            TokenKind::Symbol("adj".into()),
            TokenKind::RAngle,
            TokenKind::Arrow,
            TokenKind::Symbol("obj".into()),
            TokenKind::Star,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_spans_track_lines() {
    let tokens = Lexer::tokenize_all("'a'\n  'b'");
    assert_eq!((tokens[0].span.line, tokens[0].span.column), (1, 1));
    assert_eq!((tokens[1].span.line, tokens[1].span.column), (2, 3));
    assert_eq!(tokens[1].span.text("'a'\n  'b'"), "'b'");
}

#[test]
fn lex_literal_escapes() {
    assert_eq!(
        kinds(r"'don\'t'"),
        vec![TokenKind::Literal("don't".into()), TokenKind::Eof]
    );
}

#[test]
fn lex_errors_are_tokens() {
    assert!(matches!(kinds("'open")[0], TokenKind::Error(_)));
    assert!(matches!(kinds("- x")[0], TokenKind::Error(_)));
    assert!(matches!(kinds("#")[0], TokenKind::Error(_)));
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn parse_branches_and_groups() {
    let ast = parse("('take' | 'get') noun->obj | 'inventory'").unwrap();
    assert_eq!(ast.branches.len(), 2);

    let first = &ast.branches[0].items;
    assert!(matches!(&first[0].kind, ItemKind::Group(g) if g.len() == 2));
    assert!(matches!(&first[1].kind, ItemKind::Symbol(s) if s == "noun"));
    assert_eq!(first[1].slot.as_ref().map(|n| n.text.as_str()), Some("obj"));
}

#[test]
fn parse_qualifiers() {
    let ast = parse("[badness 4] [score 1] 'x'").unwrap();
    let items = &ast.branches[0].items;
    assert!(matches!(items[0].kind, ItemKind::Qualifier(Qualifier::Badness, 4)));
    assert!(matches!(items[1].kind, ItemKind::Qualifier(Qualifier::Score, 1)));
}

#[test]
fn parse_trailing_empty_branch() {
    let ast = parse("'n' | 'north' |").unwrap();
    assert_eq!(ast.branches.len(), 3);
    assert!(ast.branches[2].items.is_empty());
}

#[test]
fn parse_error_reports_position() {
    let err = parse("'take'\n  <noun").unwrap_err();
    let ErrorKind::Syntax { line, .. } = err.kind else {
        panic!("expected syntax error, got {:?}", err.kind);
    };
    assert_eq!(line, 2);
}

#[test]
fn parse_rejects_malformed_rules() {
    for bad in ["('a' | 'b'", "'a')", "noun->", "[weight 1] 'x'", "('a')->x", "<>"] {
        let err = parse(bad).unwrap_err();
        assert!(err.is_configuration(), "{bad}: {err}");
    }
}
