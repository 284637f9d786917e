//! The grammar facade: productions, parsing, and rule editing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use gramprod_foundation::{
    Error, ErrorContext, ErrorKind, ProductionId, PropId, Result, TemplateId, TokenTypeId, Value,
};
use gramprod_rules::{Alternative, SymbolResolver, TokenMatcher, compile_rule};
use tracing::debug;

use crate::arena::ParseArena;
use crate::config::EngineConfig;
use crate::dictionary::Dictionary;
use crate::input::build_input;
use crate::matcher::Matcher;
use crate::production::Production;
use crate::template::{NodeFactory, TemplateRegistry};
use crate::tree::TreeBuilder;
use crate::undo::{Savepoint, UndoJournal, UndoRecord};

// =============================================================================
// Delete Selectors
// =============================================================================

/// Which alternatives `delete_alternatives` removes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// The alternative at a 1-based index.
    Index(i64),
    /// Every alternative whose template carries this tag.
    Tag(String),
    /// Every alternative whose template is or inherits from this class.
    Template(TemplateId),
}

impl TryFrom<Value> for Selector {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(Self::Index(n)),
            Value::String(s) => Ok(Self::Tag(s.to_string())),
            other => Err(Error::wrong_type("index or tag name", other.type_name())),
        }
    }
}

// =============================================================================
// Grammar Info
// =============================================================================

/// Description of one rule token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenDetail {
    /// A sub-production.
    Production(ProductionId),
    /// A part of speech.
    PartOfSpeech(PropId),
    /// A part-of-speech list.
    PartsOfSpeech(Vec<PropId>),
    /// A literal word.
    Literal(Arc<str>),
    /// A token type.
    TokenType(TokenTypeId),
    /// The `*` wildcard.
    Star,
}

/// One token of an [`AltInfo`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    /// Target slot, if bound with `->`.
    pub slot: Option<PropId>,
    /// Numeric token kind, see [`TokenMatcher::type_code`].
    pub type_code: u8,
    /// Kind-specific detail.
    pub detail: TokenDetail,
}

/// Introspection record for one alternative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AltInfo {
    /// Ambiguity tie-break.
    pub score: i32,
    /// Fallback tier.
    pub badness: i32,
    /// Template built on success.
    pub template: TemplateId,
    /// The tokens, in order.
    pub tokens: Vec<TokenInfo>,
}

impl From<&Alternative> for AltInfo {
    fn from(alt: &Alternative) -> Self {
        let tokens = alt
            .tokens
            .iter()
            .map(|tok| TokenInfo {
                slot: tok.slot,
                type_code: tok.matcher.type_code(),
                detail: match &tok.matcher {
                    TokenMatcher::Production(p) => TokenDetail::Production(*p),
                    TokenMatcher::PartOfSpeech(p) => TokenDetail::PartOfSpeech(*p),
                    TokenMatcher::PartOfSpeechSet(set) => TokenDetail::PartsOfSpeech(set.to_vec()),
                    TokenMatcher::Literal(lit) => TokenDetail::Literal(Arc::clone(&lit.text)),
                    TokenMatcher::TokenType(t) => TokenDetail::TokenType(*t),
                    TokenMatcher::Star => TokenDetail::Star,
                },
            })
            .collect();
        Self {
            score: alt.score,
            badness: alt.badness,
            template: alt.template,
            tokens,
        }
    }
}

// =============================================================================
// Grammar
// =============================================================================

/// A set of productions with a shared parse arena and undo journal.
///
/// All operations take `&mut self`, so a grammar cannot be edited while one
/// of its parses is running.
pub struct Grammar {
    config: EngineConfig,
    productions: Vec<Production>,
    arena: ParseArena,
    journal: UndoJournal,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    /// Creates an empty grammar with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an empty grammar with the given configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let arena = ParseArena::new(&config.arena);
        Self {
            config,
            productions: Vec::new(),
            arena,
            journal: UndoJournal::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // Productions
    // =========================================================================

    /// Registers an empty production.
    ///
    /// # Panics
    ///
    /// Panics if the number of productions exceeds `u32::MAX`.
    pub fn declare_production(&mut self, name: &str) -> ProductionId {
        let id = ProductionId(u32::try_from(self.productions.len()).expect("too many productions"));
        self.productions.push(Production::new(id, name));
        id
    }

    /// Replaces a production's alternatives with a baseline definition.
    ///
    /// Nothing is journaled and the production is left unmodified.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownProduction`] for a dangling handle.
    pub fn load_baseline(&mut self, id: ProductionId, alternatives: Vec<Alternative>) -> Result<()> {
        let production = self.production_mut(id)?;
        *production = Production::with_baseline(id, production.name(), alternatives);
        Ok(())
    }

    /// Compiles rule text and loads it as a production's baseline.
    ///
    /// # Errors
    /// Returns compile errors, or [`ErrorKind::UnknownProduction`].
    pub fn load_rules(
        &mut self,
        id: ProductionId,
        source: &str,
        template: TemplateId,
        resolver: &mut dyn SymbolResolver,
    ) -> Result<()> {
        let name = self.production(id)?.name().to_string();
        let alternatives = compile_rule(source, template, resolver)
            .map_err(|e| e.with_context(ErrorContext::new().with_production(name).with_rule(source)))?;
        self.load_baseline(id, alternatives)
    }

    /// Looks up a production.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownProduction`] for a dangling handle.
    pub fn production(&self, id: ProductionId) -> Result<&Production> {
        self.productions
            .get(id.index())
            .ok_or_else(|| Error::new(ErrorKind::UnknownProduction(id)))
    }

    fn production_mut(&mut self, id: ProductionId) -> Result<&mut Production> {
        self.productions
            .get_mut(id.index())
            .ok_or_else(|| Error::new(ErrorKind::UnknownProduction(id)))
    }

    /// Finds a production by name.
    #[must_use]
    pub fn find_production(&self, name: &str) -> Option<ProductionId> {
        self.productions
            .iter()
            .find(|p| p.name() == name)
            .map(Production::id)
    }

    /// All productions, indexed by handle.
    #[must_use]
    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parses `tokens` as production `id` and builds one tree per success.
    ///
    /// Each token is a list `[value, type, ...]`. An empty result means no
    /// parse was found.
    ///
    /// # Errors
    /// Returns [`ErrorKind::InvalidInput`] for a malformed token; factory
    /// errors propagate unchanged. The rule store is not changed by a
    /// failed parse.
    pub fn parse<F: NodeFactory>(
        &mut self,
        id: ProductionId,
        tokens: &[Value],
        dict: Option<&dyn Dictionary>,
        factory: &mut F,
    ) -> Result<Vec<F::Node>> {
        let name = self.production(id)?.name().to_string();
        self.arena.reset();

        let rebuilt = self
            .productions
            .iter_mut()
            .filter_map(|p| p.refresh_hashes(dict).then_some(()))
            .count();
        if rebuilt > 0 {
            debug!(productions = rebuilt, "literal hashes rebuilt");
        }

        build_input(tokens, dict, &mut self.arena)?;
        let outcome = Matcher::new(&self.productions, dict, &mut self.arena, &self.config).run(id)?;
        let roots = TreeBuilder::new(&self.arena, tokens, factory).build_all(&outcome.successes)?;

        debug!(
            production = %name,
            tokens = tokens.len(),
            states = outcome.states_processed,
            successes = roots.len(),
            "parse complete"
        );
        Ok(roots)
    }

    // =========================================================================
    // Rule Editing
    // =========================================================================

    /// Compiles rule text and appends one alternative per branch.
    ///
    /// Returns the number of alternatives added. With a dictionary, each
    /// literal word is defined in it under [`PropId::MISC_VOCAB`].
    ///
    /// # Errors
    /// Returns compile errors, with nothing added.
    pub fn add_alternative(
        &mut self,
        id: ProductionId,
        source: &str,
        template: TemplateId,
        resolver: &mut dyn SymbolResolver,
        dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
    ) -> Result<usize> {
        let name = self.production(id)?.name().to_string();
        let alternatives = compile_rule(source, template, resolver)
            .map_err(|e| e.with_context(ErrorContext::new().with_production(name).with_rule(source)))?;
        let count = alternatives.len();
        let production = self
            .productions
            .get_mut(id.index())
            .ok_or_else(|| Error::new(ErrorKind::UnknownProduction(id)))?;
        production.add_alternatives(alternatives, dict, templates, &mut self.journal)?;
        Ok(count)
    }

    /// Deletes the alternatives chosen by `selector`.
    ///
    /// Returns the number deleted. Tag and template selectors that match
    /// nothing delete nothing.
    ///
    /// # Errors
    /// Returns [`ErrorKind::IndexOutOfRange`] for an index outside
    /// `[1, count]`, with nothing deleted.
    pub fn delete_alternatives(
        &mut self,
        id: ProductionId,
        selector: &Selector,
        dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
    ) -> Result<usize> {
        let production = self
            .productions
            .get_mut(id.index())
            .ok_or_else(|| Error::new(ErrorKind::UnknownProduction(id)))?;

        match selector {
            Selector::Index(n) => {
                let count = production.len();
                let index = usize::try_from(*n)
                    .ok()
                    .filter(|i| (1..=count).contains(i))
                    .ok_or_else(|| Error::index_out_of_range(*n, count))?;
                production.mark_where(|i, _| i + 1 == index);
            }
            Selector::Tag(tag) => {
                production.mark_where(|_, alt| templates.tag(alt.template) == Some(tag.as_str()));
            }
            Selector::Template(class) => {
                production.mark_where(|_, alt| templates.is_kind_of(alt.template, *class));
            }
        }
        production.delete_marked(dict, templates, &mut self.journal)
    }

    /// Deletes every alternative.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownProduction`] for a dangling handle.
    pub fn clear_alternatives(
        &mut self,
        id: ProductionId,
        dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
    ) -> Result<usize> {
        let production = self
            .productions
            .get_mut(id.index())
            .ok_or_else(|| Error::new(ErrorKind::UnknownProduction(id)))?;
        production.mark_where(|_, _| true);
        production.delete_marked(dict, templates, &mut self.journal)
    }

    /// Describes every alternative of a production.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownProduction`] for a dangling handle.
    pub fn grammar_info(&self, id: ProductionId) -> Result<Vec<AltInfo>> {
        Ok(self
            .production(id)?
            .alternatives()
            .iter()
            .map(AltInfo::from)
            .collect())
    }

    // =========================================================================
    // Undo and Baseline
    // =========================================================================

    /// The journal of edits made since the last commit.
    #[must_use]
    pub const fn journal(&self) -> &UndoJournal {
        &self.journal
    }

    /// Returns a savepoint to roll back to.
    #[must_use]
    pub fn savepoint(&self) -> Savepoint {
        self.journal.savepoint()
    }

    /// Makes every journaled edit permanent.
    pub fn commit(&mut self) {
        self.journal.commit();
    }

    /// Reverts every edit made since `savepoint`, newest first.
    ///
    /// Literal words return to or leave `dict` with their alternatives, and
    /// the alt-slots summary of every template the replayed records touch is
    /// rebuilt. Returns the number of records replayed.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UndoMismatch`] if the journal and the rule store
    /// disagree; the grammar is then in an undefined state.
    pub fn rollback_to(
        &mut self,
        savepoint: Savepoint,
        mut dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
    ) -> Result<usize> {
        let records = self.journal.unwind_to(savepoint);
        let mut touched: BTreeMap<ProductionId, BTreeSet<TemplateId>> = BTreeMap::new();
        for record in &records {
            self.replay(record, dict.as_deref_mut().map(|d| d as &mut dyn Dictionary))?;
            touched
                .entry(record.production)
                .or_default()
                .insert(record.snapshot.template);
        }
        for (id, templates_touched) in &touched {
            self.production(*id)?.rebuild_alt_slots(templates_touched, templates);
        }
        debug!(records = records.len(), "rolled back");
        Ok(records.len())
    }

    /// Applies the inverse of one recorded edit, as [`rollback_to`] does for
    /// each record it replays.
    ///
    /// [`rollback_to`]: Self::rollback_to
    ///
    /// # Errors
    /// Returns [`ErrorKind::UndoMismatch`] if the record does not describe
    /// the current rule store.
    pub fn apply_undo(
        &mut self,
        record: &UndoRecord,
        dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
    ) -> Result<()> {
        self.replay(record, dict)?;
        let touched = BTreeSet::from([record.snapshot.template]);
        self.production(record.production)?
            .rebuild_alt_slots(&touched, templates);
        Ok(())
    }

    fn replay(&mut self, record: &UndoRecord, dict: Option<&mut dyn Dictionary>) -> Result<()> {
        self.production_mut(record.production)
            .map_err(|_| {
                Error::new(ErrorKind::UndoMismatch(format!(
                    "record refers to unknown production {:?}",
                    record.production
                )))
            })?
            .apply_undo(record, dict)
    }

    /// Restores every modified production to its baseline and clears the
    /// journal. Returns the number of productions reset.
    pub fn reset_to_baseline(&mut self) -> usize {
        let reset = self
            .productions
            .iter_mut()
            .filter_map(|p| p.reset_to_baseline().then_some(()))
            .count();
        self.journal.commit();
        reset
    }

    /// Makes the current alternatives of every production its baseline.
    pub fn mark_baseline(&mut self) {
        for production in &mut self.productions {
            production.mark_baseline();
        }
        self.journal.commit();
    }

    #[cfg(feature = "serde")]
    pub(crate) fn productions_mut(&mut self) -> &mut [Production] {
        &mut self.productions
    }
}
