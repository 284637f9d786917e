//! The rule store: one production's ordered alternatives.
//!
//! Alternatives are held in a persistent vector so the baseline snapshot is a
//! cheap structural share of the live list. Edits made outside a baseline load
//! set the modified flag and emit one undo record per inserted or deleted
//! alternative.

use std::collections::BTreeSet;
use std::sync::Arc;

use gramprod_foundation::{Error, ErrorKind, ProductionId, PropId, Result, TemplateId};
use gramprod_rules::{Alternative, TokenMatcher};
use tracing::debug;

use crate::dictionary::{ComparatorId, Dictionary, byte_sum_hash};
use crate::template::TemplateRegistry;
use crate::undo::{UndoLog, UndoOp, UndoRecord};

/// What a production's cached literal hashes were computed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashBasis {
    /// Byte-sum hashing, used when parsing without a dictionary.
    ByteSum,
    /// A dictionary comparator.
    Comparator(ComparatorId),
}

impl HashBasis {
    /// Returns the basis for parsing with `dict`.
    #[must_use]
    pub fn of(dict: Option<&dyn Dictionary>) -> Self {
        dict.map_or(Self::ByteSum, |d| Self::Comparator(d.comparator_id()))
    }
}

/// A named, mutable set of alternatives.
#[derive(Clone, Debug)]
pub struct Production {
    id: ProductionId,
    name: Arc<str>,
    alternatives: im::Vector<Alternative>,
    baseline: im::Vector<Alternative>,
    has_circular: bool,
    hash_basis: Option<HashBasis>,
    modified: bool,
}

impl Production {
    /// Creates an empty production.
    #[must_use]
    pub fn new(id: ProductionId, name: &str) -> Self {
        Self {
            id,
            name: name.into(),
            alternatives: im::Vector::new(),
            baseline: im::Vector::new(),
            has_circular: false,
            hash_basis: None,
            modified: false,
        }
    }

    /// Creates a production loaded from a baseline definition.
    ///
    /// Loading records no undo entries and leaves the production unmodified.
    #[must_use]
    pub fn with_baseline(
        id: ProductionId,
        name: &str,
        alternatives: impl IntoIterator<Item = Alternative>,
    ) -> Self {
        let mut production = Self::new(id, name);
        production.alternatives = alternatives.into_iter().collect();
        production.baseline = production.alternatives.clone();
        production.recheck_circular();
        production
    }

    /// Returns the production's handle.
    #[must_use]
    pub const fn id(&self) -> ProductionId {
        self.id
    }

    /// Returns the production's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the live alternatives, in order.
    #[must_use]
    pub const fn alternatives(&self) -> &im::Vector<Alternative> {
        &self.alternatives
    }

    /// Returns the alternative at a 0-based index.
    #[must_use]
    pub fn alternative(&self, index: usize) -> Option<&Alternative> {
        self.alternatives.get(index)
    }

    /// Number of alternatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Returns true if the production has no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Returns true if any alternative begins with a self-reference.
    #[must_use]
    pub const fn has_circular(&self) -> bool {
        self.has_circular
    }

    /// Returns true if the production was edited since its baseline.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns the basis of the cached literal hashes, if they are valid.
    #[must_use]
    pub const fn hash_basis(&self) -> Option<HashBasis> {
        self.hash_basis
    }

    // =========================================================================
    // Single Edits
    // =========================================================================

    /// Inserts an alternative at a 0-based index.
    ///
    /// # Errors
    /// Returns [`ErrorKind::IndexOutOfRange`] if `index > len()`.
    pub fn insert(
        &mut self,
        index: usize,
        alternative: Alternative,
        undo: &mut dyn UndoLog,
    ) -> Result<()> {
        if index > self.alternatives.len() {
            return Err(Error::index_out_of_range(
                i64::try_from(index).unwrap_or(i64::MAX),
                self.alternatives.len(),
            ));
        }
        undo.record(UndoRecord {
            op: UndoOp::Added,
            production: self.id,
            index,
            snapshot: alternative.clone(),
        });
        self.raw_insert(index, alternative);
        self.modified = true;
        Ok(())
    }

    /// Removes the alternative at a 0-based index.
    ///
    /// The circular flag is not re-derived; call
    /// [`recheck_circular`](Self::recheck_circular) after a batch.
    ///
    /// # Errors
    /// Returns [`ErrorKind::IndexOutOfRange`] if `index >= len()`.
    pub fn delete(&mut self, index: usize, undo: &mut dyn UndoLog) -> Result<Alternative> {
        if index >= self.alternatives.len() {
            return Err(Error::index_out_of_range(
                i64::try_from(index).unwrap_or(i64::MAX),
                self.alternatives.len(),
            ));
        }
        let mut removed = self.alternatives.remove(index);
        removed.marked = false;
        undo.record(UndoRecord {
            op: UndoOp::Deleted,
            production: self.id,
            index,
            snapshot: removed.clone(),
        });
        self.modified = true;
        Ok(removed)
    }

    fn raw_insert(&mut self, index: usize, alternative: Alternative) {
        if alternative.is_circular_in(self.id) {
            self.has_circular = true;
        }
        self.alternatives.insert(index, alternative);
        self.hash_basis = None;
    }

    /// Re-derives the circular flag from the live alternatives.
    pub fn recheck_circular(&mut self) {
        self.has_circular = self.alternatives.iter().any(|a| a.is_circular_in(self.id));
    }

    // =========================================================================
    // Batch Edits
    // =========================================================================

    /// Appends alternatives, registering their literal words with `dict` and
    /// refreshing the alt-slots summary of every template they build.
    ///
    /// # Errors
    /// Propagates errors from [`insert`](Self::insert); appending at the
    /// end is always in range.
    pub fn add_alternatives(
        &mut self,
        alternatives: Vec<Alternative>,
        mut dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
        undo: &mut dyn UndoLog,
    ) -> Result<()> {
        let mut touched = BTreeSet::new();
        let count = alternatives.len();
        for alternative in alternatives {
            if let Some(dict) = dict.as_deref_mut() {
                register_literals(dict, self.id, &alternative);
            }
            touched.insert(alternative.template);
            self.insert(self.alternatives.len(), alternative, undo)?;
        }
        self.rebuild_alt_slots(&touched, templates);
        debug!(production = %self.name, added = count, total = self.len(), "alternatives added");
        Ok(())
    }

    /// Marks every alternative matching `predicate`, scanning from the end.
    ///
    /// Returns the number of alternatives marked.
    pub fn mark_where(&mut self, mut predicate: impl FnMut(usize, &Alternative) -> bool) -> usize {
        let mut marked = 0;
        for index in (0..self.alternatives.len()).rev() {
            if let Some(alt) = self.alternatives.get_mut(index) {
                if predicate(index, alt) {
                    alt.marked = true;
                    marked += 1;
                }
            }
        }
        marked
    }

    /// Deletes every marked alternative in one pass.
    ///
    /// Literal words used only by deleted alternatives are removed from
    /// `dict`, the circular flag is re-derived, and the alt-slots summary of
    /// every touched template is rebuilt from the survivors. Returns the
    /// number of alternatives deleted.
    ///
    /// # Errors
    /// Propagates errors from [`delete`](Self::delete); marked indices are
    /// always in range.
    pub fn delete_marked(
        &mut self,
        dict: Option<&mut dyn Dictionary>,
        templates: &mut dyn TemplateRegistry,
        undo: &mut dyn UndoLog,
    ) -> Result<usize> {
        if let Some(dict) = dict {
            let orphaned: BTreeSet<Arc<str>> = self
                .alternatives
                .iter()
                .filter(|a| a.marked)
                .flat_map(Alternative::literals)
                .filter(|word| !self.literal_in_survivors(word))
                .cloned()
                .collect();
            for word in &orphaned {
                dict.remove_word(word, self.id, PropId::MISC_VOCAB);
            }
        }

        let mut touched = BTreeSet::new();
        let mut deleted = 0;
        for index in (0..self.alternatives.len()).rev() {
            if !self.alternatives[index].marked {
                continue;
            }
            let removed = self.delete(index, undo)?;
            touched.insert(removed.template);
            deleted += 1;
        }

        if deleted > 0 {
            self.recheck_circular();
            self.rebuild_alt_slots(&touched, templates);
        }
        debug!(production = %self.name, deleted, remaining = self.len(), "alternatives deleted");
        Ok(deleted)
    }

    /// Returns true if a non-marked alternative uses the literal `word`.
    #[must_use]
    pub fn literal_in_survivors(&self, word: &str) -> bool {
        self.alternatives
            .iter()
            .filter(|a| !a.marked)
            .flat_map(Alternative::literals)
            .any(|w| &**w == word)
    }

    /// Rebuilds the alt-slots summary of each template in `touched` from the
    /// live alternatives that build it.
    pub fn rebuild_alt_slots(
        &self,
        touched: &BTreeSet<TemplateId>,
        templates: &mut dyn TemplateRegistry,
    ) {
        for &template in touched {
            let slots: BTreeSet<PropId> = self
                .alternatives
                .iter()
                .filter(|a| a.template == template)
                .flat_map(Alternative::slots)
                .collect();
            templates.set_alt_slots(template, slots.into_iter().collect());
        }
    }

    // =========================================================================
    // Undo and Baseline
    // =========================================================================

    /// Applies the inverse of a recorded edit.
    ///
    /// A restored alternative's literal words are registered with `dict`
    /// again, and an undone addition withdraws the words no survivor uses.
    /// The modified flag clears once the live list matches the baseline.
    /// Alt-slots summaries are left to the caller, which knows the full
    /// batch being replayed.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UndoMismatch`] if the record does not describe
    /// the current state of this production.
    pub fn apply_undo(
        &mut self,
        record: &UndoRecord,
        dict: Option<&mut dyn Dictionary>,
    ) -> Result<()> {
        if record.production != self.id {
            return Err(mismatch(format!(
                "record for {:?} replayed on {:?}",
                record.production, self.id
            )));
        }
        match record.op {
            UndoOp::Deleted => {
                if record.index > self.alternatives.len() {
                    return Err(mismatch(format!(
                        "cannot restore alternative {} of {} in {}",
                        record.index,
                        self.alternatives.len(),
                        self.name
                    )));
                }
                if let Some(dict) = dict {
                    register_literals(dict, self.id, &record.snapshot);
                }
                self.raw_insert(record.index, record.snapshot.clone());
            }
            UndoOp::Added => {
                let matches = self
                    .alternatives
                    .get(record.index)
                    .is_some_and(|a| a.same_rule(&record.snapshot));
                if !matches {
                    return Err(mismatch(format!(
                        "alternative {} of {} does not match the added snapshot",
                        record.index, self.name
                    )));
                }
                self.alternatives.remove(record.index);
                self.recheck_circular();
                if let Some(dict) = dict {
                    let orphaned: BTreeSet<Arc<str>> = record
                        .snapshot
                        .literals()
                        .filter(|word| !self.literal_in_survivors(word))
                        .cloned()
                        .collect();
                    for word in &orphaned {
                        dict.remove_word(word, self.id, PropId::MISC_VOCAB);
                    }
                }
            }
        }
        if self.matches_baseline() {
            self.modified = false;
        }
        debug!(production = %self.name, op = ?record.op, index = record.index, "undo applied");
        Ok(())
    }

    fn matches_baseline(&self) -> bool {
        self.alternatives.len() == self.baseline.len()
            && self
                .alternatives
                .iter()
                .zip(self.baseline.iter())
                .all(|(live, base)| live.same_rule(base))
    }

    /// Discards all edits and reloads the baseline alternatives.
    ///
    /// Returns true if anything was discarded.
    pub fn reset_to_baseline(&mut self) -> bool {
        if !self.modified {
            return false;
        }
        self.alternatives = self.baseline.clone();
        self.modified = false;
        self.hash_basis = None;
        self.recheck_circular();
        debug!(production = %self.name, alternatives = self.len(), "reset to baseline");
        true
    }

    /// Makes the live alternatives the new baseline.
    pub fn mark_baseline(&mut self) {
        self.baseline = self.alternatives.clone();
        self.modified = false;
    }

    /// Replaces the live alternatives wholesale, as when restoring saved
    /// state. The production is left modified.
    pub fn restore(&mut self, alternatives: impl IntoIterator<Item = Alternative>) {
        self.alternatives = alternatives.into_iter().collect();
        self.modified = true;
        self.hash_basis = None;
        self.recheck_circular();
    }

    // =========================================================================
    // Literal Hashes
    // =========================================================================

    /// Recomputes literal hashes unless they are already valid for `dict`.
    ///
    /// Returns true if the cache was rebuilt.
    pub fn refresh_hashes(&mut self, dict: Option<&dyn Dictionary>) -> bool {
        let basis = HashBasis::of(dict);
        if self.hash_basis == Some(basis) {
            return false;
        }
        for alternative in self.alternatives.iter_mut() {
            for token in alternative.tokens.iter_mut() {
                if let TokenMatcher::Literal(lit) = &mut token.matcher {
                    lit.hash = dict.map_or_else(|| byte_sum_hash(&lit.text), |d| d.hash_text(&lit.text));
                }
            }
        }
        self.hash_basis = Some(basis);
        true
    }
}

fn register_literals(dict: &mut dyn Dictionary, owner: ProductionId, alternative: &Alternative) {
    for word in alternative.literals() {
        dict.add_word(word, owner, PropId::MISC_VOCAB);
    }
}

fn mismatch(message: String) -> Error {
    Error::new(ErrorKind::UndoMismatch(message))
}
