//! The rule data model: alternatives and the tokens they are made of.

use std::fmt;
use std::sync::Arc;

use gramprod_foundation::{ProductionId, PropId, TemplateId, TokenTypeId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Token Matchers
// =============================================================================

/// A literal word in a rule, with its cached hash value.
///
/// The hash depends on the comparator active when it was computed; the rule
/// store recomputes it whenever the comparator changes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Literal {
    /// The literal text as written in the rule.
    pub text: Arc<str>,
    /// Hash of `text` under the comparator the cache was built for.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub hash: u32,
}

impl Literal {
    /// Creates a literal with no cached hash.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.into(),
            hash: 0,
        }
    }
}

/// What a single rule token matches.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenMatcher {
    /// A sub-production, matched recursively.
    Production(ProductionId),
    /// One input word defined under the given part of speech.
    PartOfSpeech(PropId),
    /// One input word defined under any of the given parts of speech.
    PartOfSpeechSet(Box<[PropId]>),
    /// One input word equal to the literal text.
    Literal(Literal),
    /// One input token of the given token type.
    TokenType(TokenTypeId),
    /// Everything that remains of the input, including nothing.
    Star,
}

impl TokenMatcher {
    /// Type code for [`TokenMatcher::Production`].
    pub const CODE_PRODUCTION: u8 = 1;
    /// Type code for [`TokenMatcher::PartOfSpeech`].
    pub const CODE_PART_OF_SPEECH: u8 = 2;
    /// Type code for [`TokenMatcher::Literal`].
    pub const CODE_LITERAL: u8 = 3;
    /// Type code for [`TokenMatcher::TokenType`].
    pub const CODE_TOKEN_TYPE: u8 = 4;
    /// Type code for [`TokenMatcher::Star`].
    pub const CODE_STAR: u8 = 5;
    /// Type code for [`TokenMatcher::PartOfSpeechSet`].
    pub const CODE_PART_OF_SPEECH_SET: u8 = 6;

    /// Returns the numeric type code reported by grammar introspection.
    #[must_use]
    pub const fn type_code(&self) -> u8 {
        match self {
            Self::Production(_) => Self::CODE_PRODUCTION,
            Self::PartOfSpeech(_) => Self::CODE_PART_OF_SPEECH,
            Self::Literal(_) => Self::CODE_LITERAL,
            Self::TokenType(_) => Self::CODE_TOKEN_TYPE,
            Self::Star => Self::CODE_STAR,
            Self::PartOfSpeechSet(_) => Self::CODE_PART_OF_SPEECH_SET,
        }
    }

    /// Returns true if any of this matcher's parts of speech is in `props`.
    #[must_use]
    pub fn accepts_parts_of_speech(&self, props: &[PropId]) -> bool {
        match self {
            Self::PartOfSpeech(p) => props.contains(p),
            Self::PartOfSpeechSet(set) => set.iter().any(|p| props.contains(p)),
            _ => false,
        }
    }
}

/// One item of an alternative: a matcher plus an optional target slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleToken {
    /// What this token matches.
    pub matcher: TokenMatcher,
    /// Slot of the enclosing match template that receives the match.
    pub slot: Option<PropId>,
}

impl RuleToken {
    /// Creates a token with no target slot.
    #[must_use]
    pub const fn new(matcher: TokenMatcher) -> Self {
        Self {
            matcher,
            slot: None,
        }
    }

    /// Sets the target slot.
    #[must_use]
    pub const fn with_slot(mut self, slot: PropId) -> Self {
        self.slot = Some(slot);
        self
    }
}

// =============================================================================
// Alternative
// =============================================================================

/// One rule variant of a production.
///
/// The token sequence is fixed at creation. Only the deletion mark and the
/// cached literal hashes change afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Alternative {
    /// The tokens to match, in order.
    pub tokens: Box<[RuleToken]>,
    /// Ambiguity tie-break; higher wins.
    pub score: i32,
    /// Fallback tier; 0 is normal, positive values are tried only when
    /// nothing better succeeds.
    pub badness: i32,
    /// Template instantiated when this alternative reduces.
    pub template: TemplateId,
    /// Transient mark used during batch deletion.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub marked: bool,
}

impl Alternative {
    /// Creates an alternative with zero score and badness.
    #[must_use]
    pub fn new(template: TemplateId, tokens: impl Into<Box<[RuleToken]>>) -> Self {
        Self {
            tokens: tokens.into(),
            score: 0,
            badness: 0,
            template,
            marked: false,
        }
    }

    /// Sets the badness tier.
    #[must_use]
    pub const fn with_badness(mut self, badness: i32) -> Self {
        self.badness = badness;
        self
    }

    /// Sets the score.
    #[must_use]
    pub const fn with_score(mut self, score: i32) -> Self {
        self.score = score;
        self
    }

    /// Returns true if the first token refers back to `owner`.
    #[must_use]
    pub fn is_circular_in(&self, owner: ProductionId) -> bool {
        matches!(
            self.tokens.first(),
            Some(RuleToken { matcher: TokenMatcher::Production(p), .. }) if *p == owner
        )
    }

    /// Iterates the slots bound by `->` in this alternative.
    pub fn slots(&self) -> impl Iterator<Item = PropId> + '_ {
        self.tokens.iter().filter_map(|t| t.slot)
    }

    /// Iterates the literal words of this alternative.
    pub fn literals(&self) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.tokens.iter().filter_map(|t| match &t.matcher {
            TokenMatcher::Literal(lit) => Some(&lit.text),
            _ => None,
        })
    }

    /// Returns true if `other` has the same tokens and metadata, ignoring
    /// cached hashes and the deletion mark.
    #[must_use]
    pub fn same_rule(&self, other: &Self) -> bool {
        self.score == other.score
            && self.badness == other.badness
            && self.template == other.template
            && self.tokens.len() == other.tokens.len()
            && self
                .tokens
                .iter()
                .zip(other.tokens.iter())
                .all(|(a, b)| a.slot == b.slot && same_matcher(&a.matcher, &b.matcher))
    }
}

fn same_matcher(a: &TokenMatcher, b: &TokenMatcher) -> bool {
    match (a, b) {
        (TokenMatcher::Literal(x), TokenMatcher::Literal(y)) => x.text == y.text,
        _ => a == b,
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.badness != 0 {
            write!(f, "[badness {}] ", self.badness)?;
        }
        for (i, tok) in self.tokens.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match &tok.matcher {
                TokenMatcher::Production(p) => write!(f, "{p:?}")?,
                TokenMatcher::PartOfSpeech(p) => write!(f, "<{p:?}>")?,
                TokenMatcher::PartOfSpeechSet(set) => write!(f, "<{set:?}>")?,
                TokenMatcher::Literal(lit) => write!(f, "'{}'", lit.text)?,
                TokenMatcher::TokenType(t) => write!(f, "{t:?}")?,
                TokenMatcher::Star => write!(f, "*")?,
            }
            if let Some(slot) = tok.slot {
                write!(f, "->{slot:?}")?;
            }
        }
        Ok(())
    }
}
