//! Dictionary and comparator interfaces, with an in-memory vocabulary.
//!
//! The matcher never compares words itself when a dictionary is supplied:
//! it asks the dictionary for hash values, for literal comparisons, and for
//! the parts of speech of each input word. The comparator decides case
//! folding and truncation policy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gramprod_foundation::{ProductionId, PropId};
use tracing::debug;

// =============================================================================
// Match Quality
// =============================================================================

/// Result code of a successful word comparison.
///
/// Bit flags describing how the match was made; [`MatchQuality::EXACT`] is a
/// plain match with no folding or truncation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchQuality(pub u32);

impl MatchQuality {
    /// The strings matched.
    pub const MATCH: u32 = 0x0001;
    /// The match required case folding.
    pub const CASE_FOLD: u32 = 0x0002;
    /// The input was a truncated form of the reference word.
    pub const TRUNCATED: u32 = 0x0004;

    /// A plain match.
    pub const EXACT: Self = Self(Self::MATCH);

    /// Returns true if the match required case folding.
    #[must_use]
    pub const fn is_case_folded(self) -> bool {
        self.0 & Self::CASE_FOLD != 0
    }

    /// Returns true if the input was truncated.
    #[must_use]
    pub const fn is_truncated(self) -> bool {
        self.0 & Self::TRUNCATED != 0
    }
}

// =============================================================================
// Comparators
// =============================================================================

/// Word comparison policy.
///
/// `hash` must agree with `matches`: two strings that match must hash equal.
pub trait Comparator: fmt::Debug {
    /// Hashes a word.
    fn hash(&self, text: &str) -> u32;

    /// Compares an input word against a reference word.
    fn matches(&self, input: &str, reference: &str) -> Option<MatchQuality>;
}

/// Hash used for exact comparison: the byte sum of the text.
#[must_use]
pub fn byte_sum_hash(text: &str) -> u32 {
    text.bytes().fold(0u32, |h, b| h.wrapping_add(u32::from(b)))
}

/// Byte-for-byte comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactComparator;

impl Comparator for ExactComparator {
    fn hash(&self, text: &str) -> u32 {
        byte_sum_hash(text)
    }

    fn matches(&self, input: &str, reference: &str) -> Option<MatchQuality> {
        (input == reference).then_some(MatchQuality::EXACT)
    }
}

/// Comparison with optional case folding and truncation.
///
/// With a truncation length `n`, an input of at least `n` characters matches
/// any reference word it is a prefix of.
#[derive(Clone, Copy, Debug)]
pub struct StringComparator {
    /// Minimum input length for truncated matches; 0 disables truncation.
    pub truncation: usize,
    /// Whether case must match exactly.
    pub case_sensitive: bool,
}

impl StringComparator {
    /// Creates a comparator.
    #[must_use]
    pub const fn new(truncation: usize, case_sensitive: bool) -> Self {
        Self {
            truncation,
            case_sensitive,
        }
    }
}

impl Comparator for StringComparator {
    fn hash(&self, text: &str) -> u32 {
        let mut hash = 0u32;
        for (i, ch) in text.chars().enumerate() {
            if self.truncation != 0 && i == self.truncation {
                break;
            }
            if self.case_sensitive {
                hash = (hash + u32::from(ch)) & 0xFFFF;
            } else {
                for folded in ch.to_lowercase() {
                    hash = (hash + u32::from(folded)) & 0xFFFF;
                }
            }
        }
        hash
    }

    fn matches(&self, input: &str, reference: &str) -> Option<MatchQuality> {
        let mut bits = MatchQuality::MATCH;
        let mut count = 0;
        let mut inp = input.chars();
        let mut refc = reference.chars();
        loop {
            match (inp.next(), refc.next()) {
                (None, None) => return Some(MatchQuality(bits)),
                (None, Some(_)) => {
                    let truncated = self.truncation != 0 && count >= self.truncation;
                    return truncated.then_some(MatchQuality(bits | MatchQuality::TRUNCATED));
                }
                (Some(_), None) => return None,
                (Some(a), Some(b)) => {
                    if a != b {
                        if self.case_sensitive || !a.to_lowercase().eq(b.to_lowercase()) {
                            return None;
                        }
                        bits |= MatchQuality::CASE_FOLD;
                    }
                    count += 1;
                }
            }
        }
    }
}

// =============================================================================
// Dictionary
// =============================================================================

/// Identity of a dictionary's active comparator.
///
/// Literal hashes cached by a production are valid only for the comparator
/// identity they were computed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComparatorId(u64);

impl ComparatorId {
    /// Returns a fresh, never-before-used identity.
    #[must_use]
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// The dictionary service consumed by the engine.
pub trait Dictionary {
    /// Identity of the active comparator.
    fn comparator_id(&self) -> ComparatorId;

    /// Hashes a word under the active comparator.
    fn hash_text(&self, text: &str) -> u32;

    /// Compares an input word against a rule literal.
    fn match_text(&self, input: &str, literal: &str) -> Option<MatchQuality>;

    /// Appends the parts of speech the word is defined under to `out`.
    fn word_properties(&self, word: &str, out: &mut Vec<PropId>);

    /// Defines `word` under `prop`, owned by a production.
    fn add_word(&mut self, word: &str, owner: ProductionId, prop: PropId);

    /// Removes a definition previously made by [`Dictionary::add_word`].
    fn remove_word(&mut self, word: &str, owner: ProductionId, prop: PropId);
}

#[derive(Clone, Debug)]
struct WordEntry {
    word: Arc<str>,
    prop: PropId,
    owner: Option<ProductionId>,
}

/// In-memory dictionary with a pluggable comparator.
///
/// Words are bucketed by comparator hash; switching comparators rehashes
/// every entry and issues a new [`ComparatorId`].
#[derive(Clone, Debug)]
pub struct Vocabulary {
    comparator: Arc<dyn Comparator + Send + Sync>,
    comparator_id: ComparatorId,
    buckets: HashMap<u32, Vec<WordEntry>>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Creates an empty vocabulary with exact comparison.
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(ExactComparator)
    }

    /// Creates an empty vocabulary with the given comparator.
    #[must_use]
    pub fn with_comparator(comparator: impl Comparator + Send + Sync + 'static) -> Self {
        Self {
            comparator: Arc::new(comparator),
            comparator_id: ComparatorId::fresh(),
            buckets: HashMap::new(),
        }
    }

    /// Replaces the comparator, rehashing all words.
    pub fn set_comparator(&mut self, comparator: impl Comparator + Send + Sync + 'static) {
        self.comparator = Arc::new(comparator);
        self.comparator_id = ComparatorId::fresh();
        let entries: Vec<WordEntry> = self.buckets.drain().flat_map(|(_, v)| v).collect();
        for entry in entries {
            self.insert(entry);
        }
        debug!(comparator = ?self.comparator_id, words = self.len(), "comparator replaced");
    }

    /// Defines a word under a part of speech, with no owning production.
    pub fn define_word(&mut self, word: &str, prop: PropId) {
        self.insert(WordEntry {
            word: word.into(),
            prop,
            owner: None,
        });
    }

    /// Returns true if exactly `word` is defined under `prop`.
    #[must_use]
    pub fn contains(&self, word: &str, prop: PropId) -> bool {
        self.buckets
            .get(&self.comparator.hash(word))
            .is_some_and(|b| b.iter().any(|e| &*e.word == word && e.prop == prop))
    }

    /// Number of word definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns true if no words are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    fn insert(&mut self, entry: WordEntry) {
        let bucket = self
            .buckets
            .entry(self.comparator.hash(&entry.word))
            .or_default();
        let duplicate = bucket
            .iter()
            .any(|e| e.word == entry.word && e.prop == entry.prop && e.owner == entry.owner);
        if !duplicate {
            bucket.push(entry);
        }
    }
}

impl Dictionary for Vocabulary {
    fn comparator_id(&self) -> ComparatorId {
        self.comparator_id
    }

    fn hash_text(&self, text: &str) -> u32 {
        self.comparator.hash(text)
    }

    fn match_text(&self, input: &str, literal: &str) -> Option<MatchQuality> {
        self.comparator.matches(input, literal)
    }

    fn word_properties(&self, word: &str, out: &mut Vec<PropId>) {
        if let Some(bucket) = self.buckets.get(&self.comparator.hash(word)) {
            out.extend(
                bucket
                    .iter()
                    .filter(|e| self.comparator.matches(word, &e.word).is_some())
                    .map(|e| e.prop),
            );
        }
    }

    fn add_word(&mut self, word: &str, owner: ProductionId, prop: PropId) {
        self.insert(WordEntry {
            word: word.into(),
            prop,
            owner: Some(owner),
        });
    }

    fn remove_word(&mut self, word: &str, owner: ProductionId, prop: PropId) {
        let hash = self.comparator.hash(word);
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            bucket.retain(|e| !(&*e.word == word && e.prop == prop && e.owner == Some(owner)));
        }
    }
}
