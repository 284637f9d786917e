//! Integration tests for Layer 1: Rules
//!
//! Tests for rule-text lexing, parsing, and compilation into alternatives.

mod compiling;
mod lexing;
