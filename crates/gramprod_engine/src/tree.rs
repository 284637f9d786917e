//! Converts match graphs into caller-owned trees.

use std::sync::Arc;

use gramprod_foundation::{Error, Result, Value};

use crate::arena::{Handle, ParseArena};
use crate::dictionary::MatchQuality;
use crate::matcher::{Match, Success};
use crate::template::{MatchInfo, NodeFactory, SlotValue};

/// Inclusive token range; `first > last` when nothing was consumed.
type Range = (usize, usize);

/// Builds the trees for a set of successes.
pub struct TreeBuilder<'a, F: NodeFactory> {
    arena: &'a ParseArena,
    tokens: &'a [Value],
    factory: &'a mut F,
}

impl<'a, F: NodeFactory> TreeBuilder<'a, F> {
    /// Creates a builder over the arena of a finished parse and the caller's
    /// token list.
    pub fn new(arena: &'a ParseArena, tokens: &'a [Value], factory: &'a mut F) -> Self {
        Self {
            arena,
            tokens,
            factory,
        }
    }

    /// Builds one tree per success, in order.
    ///
    /// # Errors
    /// Factory errors propagate unchanged. A success whose root is not a
    /// reduced alternative, or whose graph has unfilled items, is an
    /// internal error.
    pub fn build_all(&mut self, successes: &[Success]) -> Result<Vec<F::Node>> {
        let token_list = Value::list(self.tokens.iter().cloned());
        successes
            .iter()
            .map(|success| self.build_success(success, &token_list))
            .collect()
    }

    fn build_success(&mut self, success: &Success, token_list: &Value) -> Result<F::Node> {
        let mut token_matches = vec![None; success.tok_pos];
        let mut built = Vec::new();
        let (root, _) = self.build(success.root, &mut token_matches, &mut built)?;
        let SlotValue::Node(root) = root else {
            return Err(Error::internal("top-level match is not a reduced alternative"));
        };

        let token_matches: Arc<[Option<MatchQuality>]> = token_matches.into();
        for (node, (first, last)) in built {
            self.factory.set_match_info(
                &node,
                MatchInfo {
                    first,
                    last,
                    tokens: token_list.clone(),
                    token_matches: Arc::clone(&token_matches),
                },
            )?;
        }
        Ok(root)
    }

    /// Builds the subtree for one match, returning its value and token
    /// range. A `*` has no range.
    fn build(
        &mut self,
        handle: Handle<Match>,
        token_matches: &mut [Option<MatchQuality>],
        built: &mut Vec<(F::Node, Range)>,
    ) -> Result<(SlotValue<F::Node>, Option<Range>)> {
        let arena = self.arena;
        match *arena.matches.get(handle) {
            Match::Terminal {
                tok_pos,
                quality,
                star,
                ..
            } => {
                let value = self.token_value(tok_pos);
                if star {
                    return Ok((SlotValue::Token(value), None));
                }
                if let Some(entry) = token_matches.get_mut(tok_pos) {
                    *entry = quality;
                }
                Ok((SlotValue::Token(value), Some((tok_pos, tok_pos))))
            }
            Match::NonTerminal {
                tok_pos,
                template,
                subs,
                ..
            } => {
                let node = self.factory.instantiate(template)?;
                let mut range = (tok_pos + 1, tok_pos);

                for (i, sub) in arena.match_lists.slice(subs).iter().enumerate() {
                    let sub = sub.ok_or_else(|| Error::internal("reduced alternative has an unmatched item"))?;
                    let target = arena.matches.get(sub).target();
                    let (value, sub_range) = self.build(sub, token_matches, built)?;

                    match sub_range {
                        Some(r) if i == 0 => range = r,
                        Some((first, last)) if first <= last => {
                            range.0 = range.0.min(first);
                            range.1 = range.1.max(last);
                        }
                        _ => {}
                    }

                    if let Some(slot) = target {
                        self.factory.set_slot(&node, slot, value)?;
                    }
                }

                built.push((node.clone(), range));
                Ok((SlotValue::Node(node), Some(range)))
            }
        }
    }

    /// The value of the input token at `tok_pos`, or nil past the end.
    fn token_value(&self, tok_pos: usize) -> Value {
        self.tokens
            .get(tok_pos)
            .and_then(Value::as_list)
            .and_then(|items| items.front().cloned())
            .unwrap_or(Value::Nil)
    }
}
