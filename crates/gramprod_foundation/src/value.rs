//! Dynamic value type for caller token lists and tree-node slots.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::intern::{PropId, TokenTypeId};

/// Dynamic value exchanged with callers.
///
/// Input tokens arrive as lists (`[value, type, ...]`), and terminal matches
/// hand the token's value to the tree builder unchanged. Values are cheaply
/// cloneable: lists use structural sharing.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// The nil value (represents absence).
    #[default]
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// String value.
    String(Arc<str>),
    /// Token type enumerator.
    TokenType(TokenTypeId),
    /// Property reference.
    Prop(PropId),
    /// Persistent list.
    List(im::Vector<Value>),
}

impl Value {
    /// Builds an input token `[text, type]` as a tokenizer would.
    #[must_use]
    pub fn token(text: &str, token_type: TokenTypeId) -> Self {
        Self::List(im::vector![Self::from(text), Self::TokenType(token_type)])
    }

    /// Builds a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Returns a short name for this value's type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::TokenType(_) => "token-type",
            Self::Prop(_) => "property",
            Self::List(_) => "list",
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a token type.
    #[must_use]
    pub const fn as_token_type(&self) -> Option<TokenTypeId> {
        match self {
            Self::TokenType(t) => Some(*t),
            _ => None,
        }
    }

    /// Attempts to extract a list reference.
    #[must_use]
    pub const fn as_list(&self) -> Option<&im::Vector<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::TokenType(t) => write!(f, "{t:?}"),
            Self::Prop(p) => write!(f, "{p:?}"),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            other => write!(f, "{other:?}"),
        }
    }
}
