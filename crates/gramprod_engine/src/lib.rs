//! Grammar matching engine for gramprod.
//!
//! This crate provides:
//! - [`Grammar`] - Productions, parsing, rule editing, and undo
//! - [`Production`] - The rule store for one production
//! - [`Matcher`] - The backtracking matching engine
//! - [`TreeBuilder`] - Match graphs to caller-owned trees
//! - [`Dictionary`] / [`Vocabulary`] - Word hashing, comparison, and parts
//!   of speech
//! - [`NodeFactory`] / [`TemplateRegistry`] - The template and node services,
//!   with the in-memory [`ObjectTable`]
//! - [`UndoJournal`] - Reversible rule edits with savepoints
//!
//! # Example
//!
//! ```
//! use gramprod_engine::{Grammar, ObjectTable, Vocabulary};
//! use gramprod_foundation::{Interner, TokenTypeId, Value};
//! use gramprod_rules::{Scope, Symbol, SymbolTable};
//!
//! let mut interner = Interner::new();
//! let noun = interner.intern_prop("noun");
//! let mut vocab = Vocabulary::new();
//! vocab.define_word("world", noun);
//!
//! let mut objects = ObjectTable::new();
//! let greeting_class = objects.define_template("Greeting", None);
//!
//! let mut grammar = Grammar::new();
//! let greeting = grammar.declare_production("greeting");
//! let mut symbols = SymbolTable::new();
//! symbols.define("greeting", Symbol::Production(greeting));
//!
//! let mut scope = Scope::new(&symbols, &mut interner);
//! grammar
//!     .add_alternative(greeting, "'hello' noun->name", greeting_class, &mut scope, Some(&mut vocab), &mut objects)
//!     .unwrap();
//!
//! let tokens = [
//!     Value::token("hello", TokenTypeId::UNTYPED),
//!     Value::token("world", TokenTypeId::UNTYPED),
//! ];
//! let roots = grammar.parse(greeting, &tokens, Some(&vocab), &mut objects).unwrap();
//! assert_eq!(roots.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod dictionary;
pub mod grammar;
pub mod input;
pub mod matcher;
#[cfg(feature = "serde")]
pub mod persist;
pub mod production;
pub mod template;
pub mod tree;
pub mod undo;

pub use arena::{Arena, Handle, ParseArena, Slice};
pub use config::{ArenaConfig, EngineConfig};
pub use dictionary::{
    Comparator, ComparatorId, Dictionary, ExactComparator, MatchQuality, StringComparator,
    Vocabulary,
};
pub use grammar::{AltInfo, Grammar, Selector, TokenDetail, TokenInfo};
pub use input::{InputToken, build_input};
pub use matcher::{Match, Matcher, ParseOutcome, ParseState, Success};
pub use production::{HashBasis, Production};
pub use template::{
    MatchInfo, NodeFactory, NodeId, ObjectTable, ParseNode, SlotValue, TemplateDef,
    TemplateRegistry,
};
pub use tree::TreeBuilder;
pub use undo::{NoUndo, Savepoint, UndoJournal, UndoLog, UndoOp, UndoRecord};
