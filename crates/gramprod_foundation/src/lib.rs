//! Core identifiers, values, and errors for gramprod.
//!
//! This crate provides:
//! - [`Value`] - The dynamic value type for caller token lists and node slots
//! - Interned identifiers ([`PropId`], [`TokenTypeId`]) and the [`Interner`]
//! - Registry handles ([`ProductionId`], [`TemplateId`])
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod intern;
pub mod value;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use intern::{Interner, ProductionId, PropId, TemplateId, TokenTypeId};
pub use value::Value;
