//! Interned identifiers for properties and token types, plus the registry
//! handles for productions and match templates.
//!
//! Properties name both parts of speech (`noun`, `adjective`) and the slots
//! of a match template that `->slot` bindings write into. Token types are
//! the enumerators a tokenizer attaches to each input token.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interned property identifier.
///
/// Used for parts of speech and for match-template slots.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropId(pub(crate) u32);

impl PropId {
    /// Returns the raw index of this property.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    // =========================================================================
    // Reserved Properties
    // =========================================================================

    /// Property under which literal words of a rule are filed in a dictionary.
    pub const MISC_VOCAB: PropId = PropId(0);
}

impl fmt::Debug for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropId({})", self.0)
    }
}

/// Interned token type identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TokenTypeId(pub(crate) u32);

impl TokenTypeId {
    /// Returns the raw index of this token type.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// The type given to input tokens that carry no token type enumerator.
    pub const UNTYPED: TokenTypeId = TokenTypeId(0);
}

impl fmt::Debug for TokenTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenTypeId({})", self.0)
    }
}

/// Handle of a production registered with a grammar.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProductionId(pub u32);

impl ProductionId {
    /// Returns the raw index of this production.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ProductionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductionId({})", self.0)
    }
}

/// Handle of a match template (the class of tree node an alternative builds).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TemplateId(pub u32);

impl TemplateId {
    /// Returns the raw index of this template.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemplateId({})", self.0)
    }
}

/// Interner for property and token type names.
///
/// This is a simple interner that maps strings to unique IDs and back.
/// It is not thread-safe; use external synchronization if needed.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interner {
    /// Property names by index.
    props: Vec<Arc<str>>,
    /// Map from property name to `PropId`.
    prop_map: HashMap<Arc<str>, PropId>,
    /// Token type names by index.
    token_types: Vec<Arc<str>>,
    /// Map from token type name to `TokenTypeId`.
    token_type_map: HashMap<Arc<str>, TokenTypeId>,
}

impl Interner {
    /// Reserved properties that are pre-interned at startup.
    const RESERVED_PROPS: &'static [&'static str] = &[
        "miscVocab", // PropId(0) = MISC_VOCAB
    ];

    /// Reserved token types that are pre-interned at startup.
    const RESERVED_TOKEN_TYPES: &'static [&'static str] = &[
        "tokUntyped", // TokenTypeId(0) = UNTYPED
    ];

    /// Creates a new interner with the reserved names pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self::default();

        for (i, &name) in Self::RESERVED_PROPS.iter().enumerate() {
            let id = interner.intern_prop(name);
            debug_assert_eq!(id.0 as usize, i, "reserved property '{name}' moved");
        }
        for (i, &name) in Self::RESERVED_TOKEN_TYPES.iter().enumerate() {
            let id = interner.intern_token_type(name);
            debug_assert_eq!(id.0 as usize, i, "reserved token type '{name}' moved");
        }

        interner
    }

    /// Interns a property name, returning its [`PropId`].
    ///
    /// # Panics
    ///
    /// Panics if the number of interned properties exceeds `u32::MAX`.
    pub fn intern_prop(&mut self, name: &str) -> PropId {
        if let Some(&id) = self.prop_map.get(name) {
            return id;
        }

        let id = PropId(u32::try_from(self.props.len()).expect("too many properties"));
        let arc: Arc<str> = name.into();
        self.props.push(arc.clone());
        self.prop_map.insert(arc, id);
        id
    }

    /// Looks up a property without interning it.
    #[must_use]
    pub fn find_prop(&self, name: &str) -> Option<PropId> {
        self.prop_map.get(name).copied()
    }

    /// Gets the name of a property.
    #[must_use]
    pub fn prop_name(&self, id: PropId) -> Option<&str> {
        self.props.get(id.0 as usize).map(AsRef::as_ref)
    }

    /// Interns a token type name, returning its [`TokenTypeId`].
    ///
    /// # Panics
    ///
    /// Panics if the number of interned token types exceeds `u32::MAX`.
    pub fn intern_token_type(&mut self, name: &str) -> TokenTypeId {
        if let Some(&id) = self.token_type_map.get(name) {
            return id;
        }

        let id =
            TokenTypeId(u32::try_from(self.token_types.len()).expect("too many token types"));
        let arc: Arc<str> = name.into();
        self.token_types.push(arc.clone());
        self.token_type_map.insert(arc, id);
        id
    }

    /// Looks up a token type without interning it.
    #[must_use]
    pub fn find_token_type(&self, name: &str) -> Option<TokenTypeId> {
        self.token_type_map.get(name).copied()
    }

    /// Gets the name of a token type.
    #[must_use]
    pub fn token_type_name(&self, id: TokenTypeId) -> Option<&str> {
        self.token_types.get(id.0 as usize).map(AsRef::as_ref)
    }

    /// Returns the number of interned properties.
    #[must_use]
    pub fn prop_count(&self) -> usize {
        self.props.len()
    }

    /// Returns the number of interned token types.
    #[must_use]
    pub fn token_type_count(&self) -> usize {
        self.token_types.len()
    }
}
