//! gramprod - Grammar production matching for command parsers
//!
//! This crate re-exports all layers of the gramprod system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: gramprod_engine     - Rule store, matcher, undo, match trees
//! Layer 1: gramprod_rules      - Alternatives, rule-text lexer and compiler
//! Layer 0: gramprod_foundation - Core types (Value, interned ids, Error)
//! ```

pub use gramprod_engine as engine;
pub use gramprod_foundation as foundation;
pub use gramprod_rules as rules;
