//! Integration tests for rule editing
//!
//! Tests alternative selection, introspection, alt-slot summaries, and
//! baseline resets.

use gramprod_engine::{Selector, TemplateRegistry, TokenDetail};
use gramprod_foundation::{ErrorKind, ProductionId, TemplateId, Value};
use gramprod_rules::{Scope, TokenMatcher};

use crate::harness::{Game, assert_same_rules};

/// A command production holding rules built by two template families.
struct Commands {
    game: Game,
    cmd: ProductionId,
    action: TemplateId,
    travel: TemplateId,
    system: TemplateId,
}

fn commands() -> Commands {
    let mut game = Game::new();
    let action = game.objects.define_tagged("Action", "action", None);
    let travel = game.objects.define_tagged("Travel", "travel", Some(action));
    let system = game.objects.define_tagged("System", "system", None);
    let cmd = game.production("command");
    game.add(cmd, "'north' | 'n'", travel).unwrap();
    game.add(cmd, "'jump'", action).unwrap();
    game.add(cmd, "'save' | 'quit'", system).unwrap();
    Commands {
        game,
        cmd,
        action,
        travel,
        system,
    }
}

fn literal_words(game: &Game, cmd: ProductionId) -> Vec<String> {
    game.rules(cmd)
        .iter()
        .flat_map(|a| a.literals().map(ToString::to_string).collect::<Vec<_>>())
        .collect()
}

// =============================================================================
// Selectors
// =============================================================================

#[test]
fn delete_by_one_based_index() {
    let mut c = commands();
    assert_eq!(c.game.delete(c.cmd, &Selector::Index(2)).unwrap(), 1);
    assert_eq!(literal_words(&c.game, c.cmd), vec!["north", "jump", "save", "quit"]);
    assert!(c.game.parse(c.cmd, &["n"]).is_empty());
}

#[test]
fn delete_index_out_of_range_changes_nothing() {
    let mut c = commands();
    let before = c.game.rules(c.cmd);
    for index in [0, 6, -3] {
        let err = c.game.delete(c.cmd, &Selector::Index(index)).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::IndexOutOfRange { index: i, count: 5 } if i == index
        ));
    }
    assert_same_rules(&c.game.rules(c.cmd), &before);
    assert_eq!(c.game.grammar.journal().len(), 5);
}

#[test]
fn delete_by_tag() {
    let mut c = commands();
    assert_eq!(c.game.delete(c.cmd, &Selector::Tag("system".into())).unwrap(), 2);
    assert_eq!(literal_words(&c.game, c.cmd), vec!["north", "n", "jump"]);
    assert_eq!(c.game.delete(c.cmd, &Selector::Tag("missing".into())).unwrap(), 0);
}

#[test]
fn delete_by_template_includes_subclasses() {
    let mut c = commands();
    assert_eq!(c.game.delete(c.cmd, &Selector::Template(c.action)).unwrap(), 3);
    assert_eq!(literal_words(&c.game, c.cmd), vec!["save", "quit"]);
}

#[test]
fn delete_by_subclass_spares_parent() {
    let mut c = commands();
    assert_eq!(c.game.delete(c.cmd, &Selector::Template(c.travel)).unwrap(), 2);
    assert_eq!(literal_words(&c.game, c.cmd), vec!["jump", "save", "quit"]);
}

#[test]
fn selector_from_value() {
    assert_eq!(Selector::try_from(Value::from(3)).unwrap(), Selector::Index(3));
    assert_eq!(
        Selector::try_from(Value::from("travel")).unwrap(),
        Selector::Tag("travel".into())
    );
    let err = Selector::try_from(Value::Nil).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::WrongType { .. }));
}

#[test]
fn clear_removes_everything() {
    let mut c = commands();
    let cleared = c
        .game
        .grammar
        .clear_alternatives(c.cmd, Some(&mut c.game.vocab), &mut c.game.objects)
        .unwrap();
    assert_eq!(cleared, 5);
    assert!(c.game.grammar.production(c.cmd).unwrap().is_empty());
    assert!(c.game.parse(c.cmd, &["jump"]).is_empty());
}

// =============================================================================
// Introspection
// =============================================================================

#[test]
fn grammar_info_describes_tokens() {
    let mut game = Game::new();
    let t = game.objects.define_template("Put", None);
    let np = game.production("nounPhrase");
    let cmd = game.production("command");
    game.add(cmd, "[badness 2] [score 7] 'put' nounPhrase->dobj <noun adjective> *", t)
        .unwrap();

    let info = game.grammar.grammar_info(cmd).unwrap();
    assert_eq!(info.len(), 1);
    assert_eq!((info[0].badness, info[0].score, info[0].template), (2, 7, t));

    let codes: Vec<u8> = info[0].tokens.iter().map(|t| t.type_code).collect();
    assert_eq!(
        codes,
        vec![
            TokenMatcher::CODE_LITERAL,
            TokenMatcher::CODE_PRODUCTION,
            TokenMatcher::CODE_PART_OF_SPEECH_SET,
            TokenMatcher::CODE_STAR,
        ]
    );
    assert!(matches!(&info[0].tokens[0].detail, TokenDetail::Literal(w) if &**w == "put"));
    assert_eq!(info[0].tokens[1].detail, TokenDetail::Production(np));
    assert_eq!(info[0].tokens[1].slot, Some(game.prop("dobj")));
    assert!(matches!(&info[0].tokens[2].detail, TokenDetail::PartsOfSpeech(p) if p.len() == 2));
    assert_eq!(info[0].tokens[3].detail, TokenDetail::Star);
    assert_eq!(info[0].tokens[3].slot, None);

    let err = game.grammar.grammar_info(ProductionId(99)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownProduction(_)));
}

#[test]
fn compile_error_keeps_production_intact() {
    let mut c = commands();
    let before = c.game.rules(c.cmd);
    let err = c.game.add(c.cmd, "'go' nowhere", c.action).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UndefinedSymbol(_)));
    assert_eq!(
        err.context.as_ref().and_then(|ctx| ctx.rule.as_deref()),
        Some("'go' nowhere")
    );
    assert_same_rules(&c.game.rules(c.cmd), &before);
}

// =============================================================================
// Alt-Slot Summaries
// =============================================================================

#[test]
fn alt_slots_track_live_alternatives() {
    let mut game = Game::new();
    let t = game.objects.define_template("Give", None);
    let pronoun = game.objects.define_template("Pronoun", None);
    let np = game.production("nounPhrase");
    let cmd = game.production("command");
    game.add(np, "'it'", pronoun).unwrap();
    game.add(cmd, "'give' nounPhrase->dobj 'to' nounPhrase->iobj", t).unwrap();
    game.add(cmd, "'give' nounPhrase->iobj nounPhrase->dobj", t).unwrap();
    game.add(cmd, "'tip' nounPhrase->amount", t).unwrap();

    let dobj = game.prop("dobj");
    let iobj = game.prop("iobj");
    let amount = game.prop("amount");
    let mut expected = vec![dobj, iobj, amount];
    expected.sort();
    assert_eq!(game.objects.alt_slots(t), expected.as_slice());

    game.delete(cmd, &Selector::Index(3)).unwrap();
    let mut expected = vec![dobj, iobj];
    expected.sort();
    assert_eq!(game.objects.alt_slots(t), expected.as_slice());
}

#[test]
fn alt_slots_kept_per_template() {
    let mut c = commands();
    let dir = c.game.prop("dir");
    c.game.add(c.cmd, "'go' 'north'->dir", c.travel).unwrap();
    assert_eq!(c.game.objects.alt_slots(c.travel), &[dir]);
    assert!(c.game.objects.alt_slots(c.system).is_empty());

    c.game.objects.set_alt_slots(c.system, vec![dir]);
    c.game.delete(c.cmd, &Selector::Tag("system".into())).unwrap();
    assert!(c.game.objects.alt_slots(c.system).is_empty());
}

// =============================================================================
// Baseline
// =============================================================================

#[test]
fn reset_restores_baseline_and_is_idempotent() {
    let mut c = commands();
    c.game.grammar.mark_baseline();
    let baseline = c.game.rules(c.cmd);

    c.game.add(c.cmd, "'xyzzy'", c.action).unwrap();
    c.game.delete(c.cmd, &Selector::Index(1)).unwrap();
    assert!(c.game.grammar.production(c.cmd).unwrap().is_modified());

    assert_eq!(c.game.grammar.reset_to_baseline(), 1);
    assert_same_rules(&c.game.rules(c.cmd), &baseline);
    assert!(c.game.grammar.journal().is_empty());
    assert_eq!(c.game.parse(c.cmd, &["north"]).len(), 1);
    assert!(c.game.parse(c.cmd, &["xyzzy"]).is_empty());

    assert_eq!(c.game.grammar.reset_to_baseline(), 0);
    assert_same_rules(&c.game.rules(c.cmd), &baseline);
}

#[test]
fn reset_without_baseline_empties_production() {
    let mut c = commands();
    assert_eq!(c.game.grammar.reset_to_baseline(), 1);
    assert!(c.game.grammar.production(c.cmd).unwrap().is_empty());
}

#[test]
fn loaded_rules_form_the_baseline() {
    let mut game = Game::new();
    let t = game.objects.define_template("Wait", None);
    let cmd = game.production("command");
    let mut scope = Scope::new(&game.symbols, &mut game.interner);
    game.grammar
        .load_rules(cmd, "'wait' | 'z'", t, &mut scope)
        .unwrap();
    assert!(!game.grammar.production(cmd).unwrap().is_modified());
    assert!(game.grammar.journal().is_empty());

    game.add(cmd, "'sleep'", t).unwrap();
    game.grammar.reset_to_baseline();
    assert_eq!(game.parse(cmd, &["z"]).len(), 1);
    assert!(game.parse(cmd, &["sleep"]).is_empty());
}

#[test]
fn clear_then_reset_matches_untouched_grammar() {
    let mut edited = commands();
    edited.game.grammar.mark_baseline();
    let untouched = commands();

    edited
        .game
        .grammar
        .clear_alternatives(edited.cmd, None, &mut edited.game.objects)
        .unwrap();
    edited.game.grammar.reset_to_baseline();

    assert_same_rules(&edited.game.rules(edited.cmd), &untouched.game.rules(untouched.cmd));
}
