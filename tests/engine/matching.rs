//! Integration tests for the matcher
//!
//! Tests literal, part-of-speech, token-type, and wildcard matching,
//! optional items, badness fallback, and left recursion.

use gramprod_engine::{ArenaConfig, EngineConfig, Grammar, SlotValue};
use gramprod_foundation::{ErrorKind, ProductionId, TokenTypeId, Value};

use crate::harness::{Game, tokens};

// =============================================================================
// Basic Matching
// =============================================================================

#[test]
fn greeting_matches_whole_input() {
    let mut game = Game::new();
    game.word("world", "noun");
    let greeting_class = game.objects.define_template("Greeting", None);
    let greeting = game.production("greeting");
    game.add(greeting, "'hello' noun->name", greeting_class).unwrap();

    let roots = game.parse(greeting, &["hello", "world"]);
    assert_eq!(roots.len(), 1);

    let name = game.prop("name");
    let node = game.node(roots[0]);
    assert_eq!(node.template, greeting_class);
    assert_eq!(node.slot(name), Some(&SlotValue::Token(Value::from("world"))));
    let info = node.info.as_ref().unwrap();
    assert_eq!((info.first, info.last), (0, 1));
}

#[test]
fn partial_input_does_not_match() {
    let mut game = Game::new();
    let t = game.objects.define_template("Cmd", None);
    let cmd = game.production("command");
    game.add(cmd, "'open' 'door'", t).unwrap();

    assert!(game.parse(cmd, &["open"]).is_empty());
    assert!(game.parse(cmd, &["open", "door", "now"]).is_empty());
    assert!(game.parse(cmd, &["close", "door"]).is_empty());
    assert_eq!(game.parse(cmd, &["open", "door"]).len(), 1);
}

#[test]
fn part_of_speech_list_accepts_any_member() {
    let mut game = Game::new();
    game.word("lamp", "noun");
    game.word("brass", "adjective");
    let t = game.objects.define_template("Word", None);
    let w = game.production("word");
    game.add(w, "<noun adjective>->word", t).unwrap();

    assert_eq!(game.parse(w, &["lamp"]).len(), 1);
    assert_eq!(game.parse(w, &["brass"]).len(), 1);
    assert!(game.parse(w, &["the"]).is_empty());
}

#[test]
fn token_type_matches_by_type_only() {
    let mut game = Game::new();
    let number = game.interner.intern_token_type("tokInt");
    let t = game.objects.define_template("Count", None);
    let count = game.production("count");
    game.add(count, "tokInt->n 'coins'", t).unwrap();

    let input = vec![
        Value::token("12", number),
        Value::token("coins", TokenTypeId::UNTYPED),
    ];
    let roots = game.try_parse(count, &input).unwrap();
    assert_eq!(roots.len(), 1);
    let n = game.prop("n");
    assert_eq!(game.node(roots[0]).slot(n), Some(&SlotValue::Token(Value::from("12"))));

    assert!(game.parse(count, &["12", "coins"]).is_empty());
}

#[test]
fn ambiguous_input_yields_every_parse() {
    let mut game = Game::new();
    game.word("orange", "noun");
    game.word("orange", "adjective");
    let t = game.objects.define_template("Word", None);
    let w = game.production("word");
    game.add(w, "noun->noun | adjective->adj", t).unwrap();

    assert_eq!(game.parse(w, &["orange"]).len(), 2);
}

// =============================================================================
// Optional Items and Wildcards
// =============================================================================

#[test]
fn empty_alternative_makes_item_optional() {
    let mut game = Game::new();
    game.word("lamp", "noun");
    let t = game.objects.define_template("Take", None);
    let article = game.production("article");
    let cmd = game.production("command");
    game.add(article, "'the' | 'a' | ", t).unwrap();
    game.add(cmd, "'take' article noun->obj", t).unwrap();

    assert_eq!(game.parse(cmd, &["take", "lamp"]).len(), 1);
    assert_eq!(game.parse(cmd, &["take", "the", "lamp"]).len(), 1);
    assert_eq!(game.parse(cmd, &["take", "a", "lamp"]).len(), 1);
    assert!(game.parse(cmd, &["take", "the", "the", "lamp"]).is_empty());
}

#[test]
fn empty_production_matches_empty_input() {
    let mut game = Game::new();
    let t = game.objects.define_template("Nothing", None);
    let blank = game.production("blank");
    game.add(blank, "", t).unwrap();

    assert_eq!(game.parse(blank, &[]).len(), 1);
    assert!(game.parse(blank, &["x"]).is_empty());
}

#[test]
fn empty_alternative_wins_on_empty_input_only() {
    let mut game = Game::new();
    let t = game.objects.define_template("Node", None);
    let p = game.production("p");
    game.add(p, "'look' | 'x' 'y' | ", t).unwrap();

    let roots = game.parse(p, &[]);
    assert_eq!(roots.len(), 1);
    assert!(game.node(roots[0]).info.as_ref().unwrap().is_empty());
}

#[test]
fn lone_star_matches_empty_input() {
    let mut game = Game::new();
    let t = game.objects.define_template("Anything", None);
    let any = game.production("anything");
    game.add(any, "*", t).unwrap();

    let roots = game.parse(any, &[]);
    assert_eq!(roots.len(), 1);
    assert_eq!(game.parse(any, &["a", "b", "c"]).len(), 1);
}

#[test]
fn star_absorbs_remaining_input() {
    let mut game = Game::new();
    let t = game.objects.define_template("Say", None);
    let say = game.production("say");
    game.add(say, "'say' *", t).unwrap();

    assert_eq!(game.parse(say, &["say"]).len(), 1);
    assert_eq!(game.parse(say, &["say", "xyzzy"]).len(), 1);
    assert_eq!(game.parse(say, &["say", "hello", "there", "sailor"]).len(), 1);
    assert!(game.parse(say, &["shout", "hello"]).is_empty());
}

#[test]
fn star_inside_sub_production_ends_the_parse() {
    let mut game = Game::new();
    let t = game.objects.define_template("Node", None);
    let rest = game.production("rest");
    let cmd = game.production("command");
    game.add(rest, "*", t).unwrap();
    game.add(cmd, "'note' rest->text", t).unwrap();

    assert_eq!(game.parse(cmd, &["note", "buy", "milk"]).len(), 1);
}

// =============================================================================
// Badness
// =============================================================================

#[test]
fn badness_alternatives_are_fallbacks() {
    let mut game = Game::new();
    let good = game.objects.define_template("Open", None);
    let fallback = game.objects.define_template("Unknown", None);
    let cmd = game.production("command");
    game.add(cmd, "'open' 'door'", good).unwrap();
    game.add(cmd, "[badness 5] 'open' *", fallback).unwrap();

    let roots = game.parse(cmd, &["open", "door"]);
    assert_eq!(roots.len(), 1);
    assert_eq!(game.node(roots[0]).template, good);

    let roots = game.parse(cmd, &["open", "window"]);
    assert_eq!(roots.len(), 1);
    assert_eq!(game.node(roots[0]).template, fallback);
}

#[test]
fn lowest_badness_tier_wins() {
    let mut game = Game::new();
    let mild = game.objects.define_template("Mild", None);
    let severe = game.objects.define_template("Severe", None);
    let cmd = game.production("command");
    game.add(cmd, "[badness 9] 'x' *", severe).unwrap();
    game.add(cmd, "[badness 2] 'x' *", mild).unwrap();

    let roots = game.parse(cmd, &["x", "y"]);
    assert_eq!(roots.len(), 1);
    assert_eq!(game.node(roots[0]).template, mild);
}

#[test]
fn badness_in_sub_production_applies() {
    let mut game = Game::new();
    game.word("lamp", "noun");
    let cmd_class = game.objects.define_template("Take", None);
    let noun_class = game.objects.define_template("NounPhrase", None);
    let misc_class = game.objects.define_template("MiscWords", Some(noun_class));
    let np = game.production("nounPhrase");
    let cmd = game.production("command");
    game.add(np, "noun->noun", noun_class).unwrap();
    game.add(np, "[badness 10] *", misc_class).unwrap();
    game.add(cmd, "'take' nounPhrase->dobj", cmd_class).unwrap();
    let dobj = game.prop("dobj");

    let roots = game.parse(cmd, &["take", "lamp"]);
    assert_eq!(roots.len(), 1);
    let Some(SlotValue::Node(np_node)) = game.node(roots[0]).slot(dobj).cloned() else {
        panic!("dobj is not a node");
    };
    assert_eq!(game.node(np_node).template, noun_class);

    let roots = game.parse(cmd, &["take", "frobozz"]);
    assert_eq!(roots.len(), 1);
    let Some(SlotValue::Node(np_node)) = game.node(roots[0]).slot(dobj).cloned() else {
        panic!("dobj is not a node");
    };
    assert_eq!(game.node(np_node).template, misc_class);
}

// =============================================================================
// Recursion
// =============================================================================

#[test]
fn left_recursion_terminates() {
    let mut game = Game::new();
    for word in ["lamp", "box", "key"] {
        game.word(word, "noun");
    }
    let t = game.objects.define_template("List", None);
    let list = game.production("list");
    game.add(list, "list->left 'and' noun->right | noun->only", t).unwrap();

    assert_eq!(game.parse(list, &["lamp"]).len(), 1);
    assert_eq!(game.parse(list, &["lamp", "and", "box"]).len(), 1);
    assert_eq!(
        game.parse(list, &["lamp", "and", "box", "and", "key"]).len(),
        1
    );
    assert!(game.parse(list, &["lamp", "and"]).is_empty());
    assert!(game.parse(list, &["and", "lamp"]).is_empty());
}

#[test]
fn doubly_recursive_production_terminates() {
    let mut game = Game::new();
    game.word("lamp", "noun");
    let t = game.objects.define_template("Np", None);
    let np = game.production("np");
    game.add(np, "np->a 'and' np->b | noun->n", t).unwrap();

    let roots = game.parse(np, &["lamp", "and", "lamp", "and", "lamp"]);
    assert!(!roots.is_empty());
    for root in roots {
        let info = game.node(root).info.as_ref().unwrap();
        assert_eq!((info.first, info.last), (0, 4));
    }
}

#[test]
fn left_recursion_with_optional_tail_terminates() {
    let mut game = Game::new();
    let t = game.objects.define_template("Np", None);
    let np = game.production("np");
    let opt = game.production("opt");
    game.add(opt, "'please' | ", t).unwrap();
    game.add(np, "np->head opt->tail | 'noun'", t).unwrap();

    // Bare noun, and noun with an empty tail.
    assert_eq!(game.parse(np, &["noun"]).len(), 2);
    // Tail consumed, then one more empty tail on top.
    assert_eq!(game.parse(np, &["noun", "please"]).len(), 2);
    assert!(game.parse(np, &["please"]).is_empty());
}

#[test]
fn right_recursion_consumes_runs() {
    let mut game = Game::new();
    for word in ["small", "brass", "old"] {
        game.word(word, "adjective");
    }
    game.word("lamp", "noun");
    let t = game.objects.define_template("Node", None);
    let adjs = game.production("adjectives");
    let np = game.production("nounPhrase");
    game.add(adjs, "adjective adjectives | ", t).unwrap();
    game.add(np, "adjectives noun->noun", t).unwrap();

    assert_eq!(game.parse(np, &["lamp"]).len(), 1);
    assert_eq!(game.parse(np, &["old", "small", "brass", "lamp"]).len(), 1);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn malformed_token_is_rejected() {
    let mut game = Game::new();
    let t = game.objects.define_template("Cmd", None);
    let cmd = game.production("command");
    game.add(cmd, "'look'", t).unwrap();

    let err = game.try_parse(cmd, &[Value::from("look")]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidInput { index: 0, .. }));

    let short = Value::list([Value::from("look")]);
    let err = game
        .try_parse(cmd, &[Value::token("x", TokenTypeId::UNTYPED), short])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidInput { index: 1, .. }));

    assert_eq!(game.try_parse(cmd, &tokens(&["look"])).unwrap().len(), 1);
}

#[test]
fn unknown_production_is_rejected() {
    let mut game = Game::new();
    let err = game.try_parse(ProductionId(42), &tokens(&["look"])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownProduction(ProductionId(42))));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn oversized_alternative_overflows_tiny_pages() {
    let mut game = Game::new();
    game.grammar = Grammar::with_config(
        EngineConfig::default().with_arena(ArenaConfig::default().with_page_size(16)),
    );
    let t = game.objects.define_template("Long", None);
    let long = game.production("long");
    game.add(long, "'a' 'b' 'c' 'd' 'e' 'f' 'g' 'h'", t).unwrap();

    let err = game
        .try_parse(long, &tokens(&["a", "b", "c", "d", "e", "f", "g", "h"]))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ArenaOverflow { page: 16, .. }));
}

#[test]
fn debug_config_parses_normally() {
    let mut game = Game::new();
    game.grammar = Grammar::with_config(EngineConfig::debug());
    assert!(game.grammar.config().trace_states);
    let t = game.objects.define_template("Cmd", None);
    let cmd = game.production("command");
    game.add(cmd, "'wait' | 'z'", t).unwrap();
    assert_eq!(game.parse(cmd, &["z"]).len(), 1);
}
