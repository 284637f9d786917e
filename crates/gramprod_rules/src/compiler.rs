//! Compiles rule text into [`Alternative`]s.
//!
//! Parenthesized groups are expanded first, so `('take' | 'get') noun` yields
//! two alternatives. Each flattened branch then has its qualifiers applied and
//! its names resolved through a [`SymbolResolver`].

use std::collections::HashMap;
use std::sync::Arc;

use gramprod_foundation::{
    Error, ErrorKind, Interner, ProductionId, PropId, Result, TemplateId, TokenTypeId,
};

use crate::alternative::{Alternative, Literal, RuleToken, TokenMatcher};
use crate::parser::{self, Item, ItemKind, Name, Qualifier, Sequence, error_at};

// =============================================================================
// Symbol Resolution
// =============================================================================

/// What a bare name in rule text refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// A production, matched recursively.
    Production(ProductionId),
    /// A part-of-speech property.
    Property(PropId),
    /// A token type enumerator.
    TokenType(TokenTypeId),
}

/// Name lookup used while compiling rule text.
pub trait SymbolResolver {
    /// Resolves a bare name.
    fn resolve(&self, name: &str) -> Option<Symbol>;

    /// Finds or defines a property. Used for part-of-speech lists and slot
    /// bindings, whose names are defined on demand.
    fn define_property(&mut self, name: &str) -> PropId;
}

/// A table of named productions and token types.
///
/// Properties are not stored here; they live in the [`Interner`].
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<Arc<str>, Symbol>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines or redefines a name.
    pub fn define(&mut self, name: &str, symbol: Symbol) {
        self.symbols.insert(name.into(), symbol);
    }

    /// Looks up a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    /// Returns the name a production was defined under.
    #[must_use]
    pub fn production_name(&self, id: ProductionId) -> Option<&str> {
        self.symbols
            .iter()
            .find(|(_, s)| **s == Symbol::Production(id))
            .map(|(name, _)| name.as_ref())
    }
}

/// A [`SymbolTable`] layered over an [`Interner`].
///
/// Names missing from the table fall back to interned properties, then to
/// interned token types.
pub struct Scope<'a> {
    table: &'a SymbolTable,
    interner: &'a mut Interner,
}

impl<'a> Scope<'a> {
    /// Creates a scope.
    pub fn new(table: &'a SymbolTable, interner: &'a mut Interner) -> Self {
        Self { table, interner }
    }
}

impl SymbolResolver for Scope<'_> {
    fn resolve(&self, name: &str) -> Option<Symbol> {
        self.table
            .get(name)
            .or_else(|| self.interner.find_prop(name).map(Symbol::Property))
            .or_else(|| self.interner.find_token_type(name).map(Symbol::TokenType))
    }

    fn define_property(&mut self, name: &str) -> PropId {
        self.interner.intern_prop(name)
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compiles rule text into one alternative per flattened branch, all bound to
/// `template`.
///
/// # Errors
/// Returns the first syntax or symbol error; nothing is produced on error.
pub fn compile_rule(
    source: &str,
    template: TemplateId,
    resolver: &mut dyn SymbolResolver,
) -> Result<Vec<Alternative>> {
    let ast = parser::parse(source)?;
    let mut alternatives = Vec::new();
    for branch in &ast.branches {
        for items in expand(branch) {
            alternatives.push(compile_branch(&items, template, resolver)?);
        }
    }
    Ok(alternatives)
}

/// Expands groups into the cross product of their branches.
fn expand(seq: &Sequence) -> Vec<Vec<&Item>> {
    let mut acc: Vec<Vec<&Item>> = vec![Vec::new()];
    for item in &seq.items {
        if let ItemKind::Group(branches) = &item.kind {
            let suffixes: Vec<Vec<&Item>> = branches.iter().flat_map(expand).collect();
            acc = acc
                .iter()
                .flat_map(|prefix| {
                    suffixes.iter().map(move |suffix| {
                        let mut joined = prefix.clone();
                        joined.extend(suffix.iter().copied());
                        joined
                    })
                })
                .collect();
        } else {
            for prefix in &mut acc {
                prefix.push(item);
            }
        }
    }
    acc
}

fn compile_branch(
    items: &[&Item],
    template: TemplateId,
    resolver: &mut dyn SymbolResolver,
) -> Result<Alternative> {
    let mut tokens = Vec::with_capacity(items.len());
    let mut score = 0;
    let mut badness = 0;

    for (i, item) in items.iter().enumerate() {
        let matcher = match &item.kind {
            ItemKind::Qualifier(qualifier, value) => {
                if !tokens.is_empty() {
                    return Err(error_at(item.span, "qualifier must precede the rule items"));
                }
                let value = i32::try_from(*value)
                    .map_err(|_| error_at(item.span, "qualifier value out of range"))?;
                match qualifier {
                    Qualifier::Badness => badness = value,
                    Qualifier::Score => score = value,
                }
                continue;
            }
            ItemKind::Star => {
                if i + 1 != items.len() {
                    return Err(error_at(item.span, "'*' must be the last item of a rule"));
                }
                TokenMatcher::Star
            }
            ItemKind::Literal(text) => TokenMatcher::Literal(Literal::new(text)),
            ItemKind::Symbol(name) => match resolver.resolve(name) {
                Some(Symbol::Production(p)) => TokenMatcher::Production(p),
                Some(Symbol::Property(p)) => TokenMatcher::PartOfSpeech(p),
                Some(Symbol::TokenType(t)) => TokenMatcher::TokenType(t),
                None => return Err(Error::undefined_symbol(name.as_str())),
            },
            ItemKind::PartsOfSpeech(names) => {
                let props = names
                    .iter()
                    .map(|name| property(resolver, name, "part-of-speech property"))
                    .collect::<Result<Vec<_>>>()?;
                TokenMatcher::PartOfSpeechSet(props.into())
            }
            ItemKind::Group(_) => {
                return Err(Error::internal("group survived rule expansion"));
            }
        };
        let slot = item
            .slot
            .as_ref()
            .map(|name| property(resolver, name, "slot property"))
            .transpose()?;
        tokens.push(RuleToken { matcher, slot });
    }

    Ok(Alternative::new(template, tokens)
        .with_score(score)
        .with_badness(badness))
}

/// Resolves a name that must be a property, defining it if unknown.
fn property(
    resolver: &mut dyn SymbolResolver,
    name: &Name,
    expected: &'static str,
) -> Result<PropId> {
    match resolver.resolve(&name.text) {
        Some(Symbol::Property(p)) => Ok(p),
        None => Ok(resolver.define_property(&name.text)),
        Some(_) => Err(Error::new(ErrorKind::WrongSymbolKind {
            name: name.text.clone(),
            expected,
        })),
    }
}
