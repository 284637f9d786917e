//! Error types for the gramprod system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::intern::{ProductionId, TemplateId};

/// Result alias used throughout gramprod.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for gramprod operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a rule-text syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates an undefined symbol error.
    #[must_use]
    pub fn undefined_symbol(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndefinedSymbol(name.into()))
    }

    /// Creates an alternative index out of range error.
    #[must_use]
    pub fn index_out_of_range(index: i64, count: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfRange { index, count })
    }

    /// Creates an invalid input token error.
    #[must_use]
    pub fn invalid_input(index: usize, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput {
            index,
            reason: reason.into(),
        })
    }

    /// Creates a wrong argument type error.
    #[must_use]
    pub fn wrong_type(expected: &'static str, actual: &'static str) -> Self {
        Self::new(ErrorKind::WrongType { expected, actual })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this is a configuration error: the operation was
    /// rejected before anything was changed.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Syntax { .. }
                | ErrorKind::UndefinedSymbol(_)
                | ErrorKind::WrongSymbolKind { .. }
                | ErrorKind::IndexOutOfRange { .. }
                | ErrorKind::WrongType { .. }
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed rule text.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Description of the first error found.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
    },

    /// A rule referred to a name the symbol table does not define.
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// A name resolved to a symbol of the wrong kind.
    #[error("symbol {name} is not a {expected}")]
    WrongSymbolKind {
        /// The offending name.
        name: String,
        /// What the rule required at that position.
        expected: &'static str,
    },

    /// Alternative index outside `[1, count]`.
    #[error("alternative index out of range: {index} (count {count})")]
    IndexOutOfRange {
        /// The 1-based index that was requested.
        index: i64,
        /// The number of alternatives in the production.
        count: usize,
    },

    /// A caller-supplied input token was malformed.
    #[error("invalid input token at {index}: {reason}")]
    InvalidInput {
        /// Position of the token in the input list.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// An argument had the wrong dynamic type.
    #[error("wrong type: expected {expected}, got {actual}")]
    WrongType {
        /// The expected type.
        expected: &'static str,
        /// The actual type encountered.
        actual: &'static str,
    },

    /// A production handle does not refer to a registered production.
    #[error("unknown production: {0:?}")]
    UnknownProduction(ProductionId),

    /// A template handle does not refer to a registered template.
    #[error("unknown match template: {0:?}")]
    UnknownTemplate(TemplateId),

    /// An arena request exceeded the page size.
    #[error("arena request of {requested} bytes exceeds page size {page}")]
    ArenaOverflow {
        /// Bytes requested.
        requested: usize,
        /// Configured page size in bytes.
        page: usize,
    },

    /// Undo replay found the store inconsistent with the journal.
    #[error("undo replay mismatch: {0}")]
    UndoMismatch(String),

    /// Persistence encode/decode failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Production the operation was applied to.
    pub production: Option<String>,
    /// Rule text being compiled, if any.
    pub rule: Option<String>,
    /// Chain of operations leading to the error.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the production name.
    #[must_use]
    pub fn with_production(mut self, name: impl Into<String>) -> Self {
        self.production = Some(name.into());
        self
    }

    /// Sets the rule text.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(production) = &self.production {
            write!(f, "in production {production}")?;
        }
        if let Some(rule) = &self.rule {
            write!(f, " compiling {rule:?}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
