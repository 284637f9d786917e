//! Integration tests for rule compilation
//!
//! Tests symbol resolution, group expansion, and compile errors.

use gramprod_foundation::{ErrorKind, Interner, ProductionId, PropId, TemplateId, TokenTypeId};
use gramprod_rules::{Alternative, Scope, Symbol, SymbolTable, TokenMatcher, compile_rule};

/// Symbol environment for a small command grammar.
struct Env {
    table: SymbolTable,
    interner: Interner,
    noun: PropId,
    np: ProductionId,
    cmd: ProductionId,
    number: TokenTypeId,
}

impl Env {
    fn new() -> Self {
        let mut interner = Interner::new();
        let noun = interner.intern_prop("noun");
        let number = interner.intern_token_type("tokInt");
        let cmd = ProductionId(0);
        let np = ProductionId(1);
        let mut table = SymbolTable::new();
        table.define("command", Symbol::Production(cmd));
        table.define("nounPhrase", Symbol::Production(np));
        Self {
            table,
            interner,
            noun,
            np,
            cmd,
            number,
        }
    }

    fn compile(&mut self, source: &str) -> gramprod_foundation::Result<Vec<Alternative>> {
        let mut scope = Scope::new(&self.table, &mut self.interner);
        compile_rule(source, TemplateId(3), &mut scope)
    }
}

fn literals(alt: &Alternative) -> Vec<&str> {
    alt.literals().map(|s| &**s).collect()
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn every_token_kind_compiles() {
    let mut env = Env::new();
    let alts = env
        .compile("'put' nounPhrase->dobj <noun plural> tokInt->count *")
        .unwrap();
    assert_eq!(alts.len(), 1);

    let tokens = &alts[0].tokens;
    assert!(matches!(&tokens[0].matcher, TokenMatcher::Literal(l) if &*l.text == "put"));
    assert_eq!(tokens[1].matcher, TokenMatcher::Production(env.np));
    assert_eq!(tokens[1].slot, env.interner.find_prop("dobj"));
    let plural = env.interner.find_prop("plural").unwrap();
    assert_eq!(
        tokens[2].matcher,
        TokenMatcher::PartOfSpeechSet(vec![env.noun, plural].into())
    );
    assert_eq!(tokens[3].matcher, TokenMatcher::TokenType(env.number));
    assert_eq!(tokens[4].matcher, TokenMatcher::Star);
}

#[test]
fn bare_property_name_is_part_of_speech() {
    let mut env = Env::new();
    let alts = env.compile("noun->obj").unwrap();
    assert_eq!(alts[0].tokens[0].matcher, TokenMatcher::PartOfSpeech(env.noun));
}

#[test]
fn circularity_detected_by_owner() {
    let mut env = Env::new();
    let alts = env.compile("command 'and' command | 'wait'").unwrap();
    assert!(alts[0].is_circular_in(env.cmd));
    assert!(!alts[0].is_circular_in(env.np));
    assert!(!alts[1].is_circular_in(env.cmd));
}

#[test]
fn slots_listed_in_order() {
    let mut env = Env::new();
    let alts = env.compile("nounPhrase->dobj 'with' nounPhrase->iobj").unwrap();
    let dobj = env.interner.find_prop("dobj").unwrap();
    let iobj = env.interner.find_prop("iobj").unwrap();
    assert_eq!(alts[0].slots().collect::<Vec<_>>(), vec![dobj, iobj]);
}

// =============================================================================
// Expansion
// =============================================================================

#[test]
fn nested_groups_expand_depth_first() {
    let mut env = Env::new();
    let alts = env.compile("('pick' ('up' | ) | 'take') nounPhrase").unwrap();
    let rendered: Vec<Vec<&str>> = alts.iter().map(literals).collect();
    assert_eq!(
        rendered,
        vec![vec!["pick", "up"], vec!["pick"], vec!["take"]]
    );
    assert!(alts.iter().all(|a| a.tokens.len() == a.literals().count() + 1));
}

#[test]
fn qualifiers_apply_per_branch() {
    let mut env = Env::new();
    let alts = env
        .compile("[badness 5] ('x' | 'y') | [score -1] 'z'")
        .unwrap();
    let tiers: Vec<(i32, i32)> = alts.iter().map(|a| (a.badness, a.score)).collect();
    assert_eq!(tiers, vec![(5, 0), (5, 0), (0, -1)]);
}

#[test]
fn all_alternatives_share_template() {
    let mut env = Env::new();
    let alts = env.compile("'a' | 'b' | ").unwrap();
    assert_eq!(alts.len(), 3);
    assert!(alts.iter().all(|a| a.template == TemplateId(3)));
    assert!(alts[2].tokens.is_empty());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn undefined_name_is_reported() {
    let mut env = Env::new();
    let err = env.compile("'go' direction").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedSymbol(ref n) if n == "direction"));
    assert!(err.is_configuration());
}

#[test]
fn production_in_part_of_speech_list_rejected() {
    let mut env = Env::new();
    let err = env.compile("<noun command>").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::WrongSymbolKind { .. }));
}

#[test]
fn star_must_end_the_alternative() {
    let mut env = Env::new();
    assert!(env.compile("'say' * | 'shout' *").is_ok());
    assert!(env.compile("'say' * 'loudly'").is_err());
}
