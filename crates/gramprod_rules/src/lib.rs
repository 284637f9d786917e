//! Grammar rules for gramprod: the alternative data model and the rule-text
//! compiler.
//!
//! This crate provides:
//! - [`Alternative`] - One rule variant of a production, with its tokens
//! - `Lexer` / `Parser` - Rule text to syntax tree
//! - [`compile_rule`] - Syntax tree to alternatives, resolving symbols
//!
//! # Rule Text
//!
//! ```text
//! [badness 5] 'take' ('the' | ) nounPhrase->dobj
//! <noun adjective>->word tokWord *
//! ```
//!
//! Quoted words match literally, bare names resolve to productions, parts of
//! speech or token types, and `->name` binds the match to a template slot.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod alternative;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod token;

pub use alternative::{Alternative, Literal, RuleToken, TokenMatcher};
pub use compiler::{Scope, Symbol, SymbolResolver, SymbolTable, compile_rule};
pub use lexer::Lexer;
pub use parser::{Parser, RuleAst, parse};
pub use token::{Span, Token, TokenKind};
