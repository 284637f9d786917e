//! The backtracking matching engine.
//!
//! Candidate alternatives become [`ParseState`]s on a LIFO work queue, or on
//! the badness queue when their alternative carries a positive badness. A
//! state advances over terminal tokens until it reaches a sub-production,
//! where it parks behind the sub-production's states, or its end, where it
//! reduces into a [`Match`] that either resumes the enclosing state or, at
//! top level, becomes a success.
//!
//! Alternatives whose first token refers back to their own production are
//! never seeded directly. Each time a state of such a production reduces,
//! the circular alternatives are seeded with that match filled in as their
//! first item. A circular reduction that consumed nothing past its head
//! seeds nothing.

use std::mem;

use gramprod_foundation::{Error, ErrorKind, ProductionId, PropId, Result, TemplateId};
use gramprod_rules::{Alternative, RuleToken, TokenMatcher};
use tracing::{debug, trace};

use crate::arena::{Handle, ParseArena, Slice};
use crate::config::EngineConfig;
use crate::dictionary::{Dictionary, MatchQuality};
use crate::production::Production;

// =============================================================================
// States and Matches
// =============================================================================

/// Progress through one alternative.
#[derive(Clone, Copy, Debug)]
pub struct ParseState {
    /// Next input token to match.
    pub tok_pos: usize,
    /// Next alternative item to match.
    pub alt_pos: usize,
    /// A `*` was matched here or in a completed sub-production.
    pub matched_star: bool,
    /// The state parked behind this one, if any.
    pub enclosing: Option<Handle<ParseState>>,
    /// Production the alternative belongs to.
    pub production: ProductionId,
    /// Index of the alternative within its production.
    pub alt: usize,
    /// Badness of the alternative.
    pub badness: i32,
    /// The production had circular alternatives when this state was made.
    pub circular_alt: bool,
    /// Slot of the sub-production item this state is parked on.
    pub sub_target: Option<PropId>,
    /// One entry per alternative item; filled up to `alt_pos`.
    pub matches: Slice<Option<Handle<Match>>>,
}

/// A node of the internal result graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Match {
    /// One consumed input token, or a `*`.
    Terminal {
        /// Input position the token was matched at.
        tok_pos: usize,
        /// Dictionary match quality, for literals.
        quality: Option<MatchQuality>,
        /// This terminal is a `*`.
        star: bool,
        /// Slot of the enclosing template that receives the token.
        target: Option<PropId>,
    },
    /// A reduced alternative.
    NonTerminal {
        /// Input position after the last consumed token.
        tok_pos: usize,
        /// Slot of the enclosing template that receives the node.
        target: Option<PropId>,
        /// Template to instantiate.
        template: TemplateId,
        /// Matches of the alternative's items, in order.
        subs: Slice<Option<Handle<Match>>>,
    },
}

impl Match {
    /// Slot this match is stored into.
    #[must_use]
    pub const fn target(&self) -> Option<PropId> {
        match self {
            Self::Terminal { target, .. } | Self::NonTerminal { target, .. } => *target,
        }
    }
}

/// A top-level match that consumed the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Success {
    /// Root of the match graph.
    pub root: Handle<Match>,
    /// Input position the parse ended at; short of the token count only
    /// when the parse ended on a `*`.
    pub tok_pos: usize,
}

/// Result of running the matcher to exhaustion.
#[derive(Clone, Debug, Default)]
pub struct ParseOutcome {
    /// Every success, most recently found first.
    pub successes: Vec<Success>,
    /// Number of states processed.
    pub states_processed: usize,
}

// =============================================================================
// Matcher
// =============================================================================

/// One run of the matching engine over a decoded input.
///
/// Expects `arena.tokens` to hold the decoded input and every production's
/// literal hashes to be current for `dict`.
pub struct Matcher<'a> {
    productions: &'a [Production],
    dict: Option<&'a dyn Dictionary>,
    arena: &'a mut ParseArena,
    work: Vec<Handle<ParseState>>,
    badness: Vec<Handle<ParseState>>,
    successes: Vec<Success>,
    processed: usize,
    trace_states: bool,
}

impl<'a> Matcher<'a> {
    /// Creates a matcher.
    pub fn new(
        productions: &'a [Production],
        dict: Option<&'a dyn Dictionary>,
        arena: &'a mut ParseArena,
        config: &EngineConfig,
    ) -> Self {
        Self {
            productions,
            dict,
            arena,
            work: Vec::new(),
            badness: Vec::new(),
            successes: Vec::new(),
            processed: 0,
            trace_states: config.trace_states,
        }
    }

    /// Seeds `start` at input position 0 and runs until both queues are
    /// empty.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnknownProduction`] for a dangling production
    /// reference and [`ErrorKind::ArenaOverflow`] for an alternative too
    /// long for an arena page.
    pub fn run(mut self, start: ProductionId) -> Result<ParseOutcome> {
        self.enqueue_alts(start, 0, None, false, None)?;
        loop {
            if self.work.is_empty() && self.successes.is_empty() {
                self.promote_badness();
            }
            let Some(handle) = self.work.pop() else {
                break;
            };
            self.process(handle)?;
        }
        self.successes.reverse();
        Ok(ParseOutcome {
            successes: self.successes,
            states_processed: self.processed,
        })
    }

    fn production(&self, id: ProductionId) -> Result<&'a Production> {
        let productions: &'a [Production] = self.productions;
        productions
            .get(id.index())
            .ok_or_else(|| Error::new(ErrorKind::UnknownProduction(id)))
    }

    fn alternative(&self, state: &ParseState) -> Result<&'a Alternative> {
        self.production(state.production)?
            .alternative(state.alt)
            .ok_or_else(|| Error::internal(format!("state refers to missing alternative {}", state.alt)))
    }

    /// Moves every minimum-badness state to the work queue.
    fn promote_badness(&mut self) {
        let Some(min) = self
            .badness
            .iter()
            .map(|h| self.arena.states.get(*h).badness)
            .min()
        else {
            return;
        };
        let pending = mem::take(&mut self.badness);
        let mut kept = Vec::with_capacity(pending.len());
        for handle in pending.into_iter().rev() {
            if self.arena.states.get(handle).badness == min {
                self.work.push(handle);
            } else {
                kept.push(handle);
            }
        }
        kept.reverse();
        self.badness = kept;
        debug!(badness = min, promoted = self.work.len(), deferred = self.badness.len(), "badness tier promoted");
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Creates states for the plausible alternatives of `id` starting at
    /// `tok_pos`.
    ///
    /// With `circ_only`, only the circular alternatives are seeded, each with
    /// `circ_match` installed as its first item.
    fn enqueue_alts(
        &mut self,
        id: ProductionId,
        tok_pos: usize,
        enclosing: Option<Handle<ParseState>>,
        circ_only: bool,
        circ_match: Option<Handle<Match>>,
    ) -> Result<()> {
        let production = self.production(id)?;
        let mut need_to_clone = circ_only;

        for (index, alt) in production.alternatives().iter().enumerate() {
            if alt.is_circular_in(id) != circ_only {
                continue;
            }
            if !self.plausible(alt, tok_pos, id, circ_only) {
                continue;
            }

            let mut owner = enclosing;
            if need_to_clone {
                if let Some(e) = owner {
                    owner = Some(self.clone_state(e)?);
                }
            }
            need_to_clone = true;

            let matches = self
                .arena
                .match_lists
                .alloc_slice(std::iter::repeat_n(None, alt.tokens.len()))?;
            let mut state = ParseState {
                tok_pos,
                alt_pos: 0,
                matched_star: false,
                enclosing: owner,
                production: id,
                alt: index,
                badness: alt.badness,
                circular_alt: production.has_circular(),
                sub_target: None,
                matches,
            };

            if let Some(first) = circ_match.filter(|_| circ_only) {
                let Match::NonTerminal {
                    tok_pos: end,
                    template,
                    subs,
                    ..
                } = *self.arena.matches.get(first)
                else {
                    return Err(Error::internal("circular seed is not a reduced match"));
                };
                let head = self.arena.matches.alloc(Match::NonTerminal {
                    tok_pos: end,
                    target: alt.tokens.first().and_then(|t| t.slot),
                    template,
                    subs,
                });
                set_sub_match(self.arena.match_lists.slice_mut(matches), 0, head)?;
                state.alt_pos = 1;
            }

            let handle = self.arena.states.alloc(state);
            if alt.badness == 0 {
                self.work.push(handle);
            } else {
                self.badness.push(handle);
            }
        }
        Ok(())
    }

    /// Cheap pre-filter: can `alt` possibly match from `start`?
    ///
    /// Sub-productions may consume any number of tokens, so once one has
    /// been passed, later terminals may match anywhere ahead of the cursor.
    fn plausible(&self, alt: &Alternative, start: usize, id: ProductionId, circ_only: bool) -> bool {
        let count = self.arena.tokens.len();
        let is_circ = alt.is_circular_in(id);
        let mut tok_idx = start;
        let mut prod_before = false;

        for (i, token) in alt.tokens.iter().enumerate() {
            match &token.matcher {
                TokenMatcher::Production(_) => {
                    if !(i == 0 && is_circ && circ_only) {
                        prod_before = true;
                    }
                }
                TokenMatcher::Star => tok_idx = count,
                matcher => {
                    while self.test_terminal(matcher, tok_idx).is_none() {
                        if !prod_before || tok_idx >= count {
                            return false;
                        }
                        tok_idx += 1;
                    }
                    if tok_idx < count {
                        tok_idx += 1;
                    }
                }
            }
        }
        true
    }

    /// Deep-copies a state and its enclosing chain.
    fn clone_state(&mut self, handle: Handle<ParseState>) -> Result<Handle<ParseState>> {
        let state = *self.arena.states.get(handle);
        let enclosing = state
            .enclosing
            .map(|e| self.clone_state(e))
            .transpose()?;
        let matches = self
            .arena
            .match_lists
            .copy_slice(state.matches, state.alt_pos, &None)?;
        Ok(self.arena.states.alloc(ParseState {
            enclosing,
            matches,
            ..state
        }))
    }

    // =========================================================================
    // Advancing
    // =========================================================================

    /// Tests a terminal item against the input token at `tok_idx`.
    ///
    /// Returns `None` on mismatch, otherwise the literal match quality if
    /// there is one.
    fn test_terminal(&self, matcher: &TokenMatcher, tok_idx: usize) -> Option<Option<MatchQuality>> {
        let token = self.arena.tokens.get(tok_idx)?;
        match matcher {
            TokenMatcher::PartOfSpeech(_) | TokenMatcher::PartOfSpeechSet(_) => matcher
                .accepts_parts_of_speech(self.arena.props.slice(token.parts_of_speech))
                .then_some(None),
            TokenMatcher::TokenType(ty) => (token.ty == *ty).then_some(None),
            TokenMatcher::Literal(lit) => {
                let text = token.text.as_deref()?;
                if token.hash != lit.hash {
                    return None;
                }
                match self.dict {
                    Some(dict) => dict.match_text(text, &lit.text).map(Some),
                    None => (text == &*lit.text).then_some(Some(MatchQuality::EXACT)),
                }
            }
            TokenMatcher::Production(_) | TokenMatcher::Star => None,
        }
    }

    fn process(&mut self, handle: Handle<ParseState>) -> Result<()> {
        let mut state = *self.arena.states.get(handle);
        let alt = self.alternative(&state)?;
        self.processed += 1;
        if self.trace_states {
            trace!(
                production = ?state.production,
                alt = state.alt,
                alt_pos = state.alt_pos,
                tok_pos = state.tok_pos,
                "processing state"
            );
        }

        while let Some(token) = alt.tokens.get(state.alt_pos) {
            let (quality, star) = match &token.matcher {
                TokenMatcher::Production(sub) => {
                    state.sub_target = token.slot;
                    *self.arena.states.get_mut(handle) = state;
                    return self.enqueue_alts(*sub, state.tok_pos, Some(handle), false, None);
                }
                TokenMatcher::Star => {
                    state.matched_star = true;
                    (None, true)
                }
                matcher => match self.test_terminal(matcher, state.tok_pos) {
                    Some(quality) => (quality, false),
                    None => return Ok(()),
                },
            };
            self.push_terminal(&mut state, token, quality, star)?;
        }

        self.reduce(&state, alt)
    }

    /// False when a circular alternative reduces at the position its
    /// seeded head ended at. Re-seeding from there would repeat the same
    /// states forever.
    fn advanced_past_seed(&self, state: &ParseState, alt: &Alternative) -> bool {
        if !alt.is_circular_in(state.production) {
            return true;
        }
        let head = self
            .arena
            .match_lists
            .slice(state.matches)
            .first()
            .copied()
            .flatten();
        match head.map(|h| *self.arena.matches.get(h)) {
            Some(Match::NonTerminal { tok_pos, .. }) => state.tok_pos > tok_pos,
            _ => true,
        }
    }

    fn push_terminal(
        &mut self,
        state: &mut ParseState,
        token: &RuleToken,
        quality: Option<MatchQuality>,
        star: bool,
    ) -> Result<()> {
        let terminal = self.arena.matches.alloc(Match::Terminal {
            tok_pos: state.tok_pos,
            quality,
            star,
            target: token.slot,
        });
        set_sub_match(
            self.arena.match_lists.slice_mut(state.matches),
            state.alt_pos,
            terminal,
        )?;
        state.alt_pos += 1;
        if !state.matched_star {
            state.tok_pos += 1;
        }
        Ok(())
    }

    /// Completes an alternative.
    fn reduce(&mut self, state: &ParseState, alt: &Alternative) -> Result<()> {
        let target = state
            .enclosing
            .and_then(|e| self.arena.states.get(e).sub_target);
        let reduced = self.arena.matches.alloc(Match::NonTerminal {
            tok_pos: state.tok_pos,
            target,
            template: alt.template,
            subs: state.matches,
        });

        if state.circular_alt && self.advanced_past_seed(state, alt) {
            self.enqueue_alts(state.production, state.tok_pos, state.enclosing, true, Some(reduced))?;
        }

        match state.enclosing {
            Some(handle) => {
                let mut outer = *self.arena.states.get(handle);
                set_sub_match(
                    self.arena.match_lists.slice_mut(outer.matches),
                    outer.alt_pos,
                    reduced,
                )?;
                outer.alt_pos += 1;
                outer.tok_pos = state.tok_pos;
                outer.matched_star = state.matched_star;
                *self.arena.states.get_mut(handle) = outer;
                self.work.push(handle);
            }
            None => {
                if state.tok_pos < self.arena.tokens.len() && !state.matched_star {
                    return Ok(());
                }
                self.successes.push(Success {
                    root: reduced,
                    tok_pos: state.tok_pos,
                });
            }
        }
        Ok(())
    }
}

fn set_sub_match(list: &mut [Option<Handle<Match>>], index: usize, value: Handle<Match>) -> Result<()> {
    let slot = list
        .get_mut(index)
        .ok_or_else(|| Error::internal(format!("sub-match index {index} out of range")))?;
    *slot = Some(value);
    Ok(())
}
