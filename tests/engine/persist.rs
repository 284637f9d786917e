//! Integration tests for saving and restoring rule edits

use gramprod_engine::Selector;
use gramprod_engine::persist::{restore_from_bytes, to_bytes};
use gramprod_foundation::{ErrorKind, ProductionId};

use crate::harness::{Game, assert_same_rules};

fn game() -> (Game, ProductionId, ProductionId) {
    let mut game = Game::new();
    game.word("lamp", "noun");
    let t = game.objects.define_tagged("Cmd", "cmd", None);
    let np = game.production("nounPhrase");
    let cmd = game.production("command");
    game.add(np, "noun->noun", t).unwrap();
    game.add(cmd, "'take' nounPhrase->dobj | 'look'", t).unwrap();
    game.grammar.mark_baseline();
    (game, np, cmd)
}

#[test]
fn edits_survive_save_and_restore() {
    let (mut saved, _, cmd) = game();
    let t = saved.objects.define_template("Wait", None);
    saved.add(cmd, "'wait' | 'z'", t).unwrap();
    saved.delete(cmd, &Selector::Index(2)).unwrap();
    let bytes = to_bytes(&saved.grammar).unwrap();

    let (mut fresh, np, cmd2) = game();
    fresh.objects.define_template("Wait", None);
    assert_eq!(restore_from_bytes(&mut fresh.grammar, &bytes).unwrap(), 1);
    assert_same_rules(&fresh.rules(cmd2), &saved.rules(cmd));
    assert!(!fresh.grammar.production(np).unwrap().is_modified());

    assert_eq!(fresh.parse(cmd2, &["z"]).len(), 1);
    assert_eq!(fresh.parse(cmd2, &["take", "lamp"]).len(), 1);
    assert!(fresh.parse(cmd2, &["look"]).is_empty());

    assert_eq!(fresh.grammar.reset_to_baseline(), 1);
    assert_eq!(fresh.parse(cmd2, &["look"]).len(), 1);
}

#[test]
fn unmodified_grammar_saves_nothing() {
    let (saved, _, _) = game();
    let bytes = to_bytes(&saved.grammar).unwrap();
    let (mut fresh, _, _) = game();
    assert_eq!(restore_from_bytes(&mut fresh.grammar, &bytes).unwrap(), 0);
}

#[test]
fn restore_into_foreign_grammar_fails() {
    let (mut saved, _, cmd) = game();
    let t = saved.objects.define_template("Wait", None);
    saved.add(cmd, "'wait'", t).unwrap();
    let bytes = to_bytes(&saved.grammar).unwrap();

    let mut other = Game::new();
    other.production("somethingElse");
    let err = restore_from_bytes(&mut other.grammar, &bytes).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
}
