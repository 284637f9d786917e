//! The per-parse input token cache.

use std::sync::Arc;

use gramprod_foundation::{Error, PropId, Result, TokenTypeId, Value};

use crate::arena::{ParseArena, Slice};
use crate::dictionary::{Dictionary, byte_sum_hash};

/// One caller token, decoded once per parse.
#[derive(Clone, Debug)]
pub struct InputToken {
    /// Word text; `None` if the token value is not a string.
    pub text: Option<Arc<str>>,
    /// Token type; [`TokenTypeId::UNTYPED`] if the caller gave none.
    pub ty: TokenTypeId,
    /// Hash of `text` under the active comparator.
    pub hash: u32,
    /// Parts of speech of `text`, sorted and deduplicated.
    pub parts_of_speech: Slice<PropId>,
}

/// Decodes `tokens` into `arena.tokens`.
///
/// Each token must be a list of at least two elements: the token value and
/// its type.
///
/// # Errors
/// Returns [`InvalidInput`](gramprod_foundation::ErrorKind::InvalidInput) for
/// a malformed token, or an arena overflow for a word with more parts of
/// speech than fit in a page.
pub fn build_input(
    tokens: &[Value],
    dict: Option<&dyn Dictionary>,
    arena: &mut ParseArena,
) -> Result<()> {
    arena.tokens.reserve(tokens.len());
    let mut props = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let items = token
            .as_list()
            .ok_or_else(|| Error::invalid_input(index, format!("expected list, got {}", token.type_name())))?;
        if items.len() < 2 {
            return Err(Error::invalid_input(
                index,
                format!("expected at least 2 elements, got {}", items.len()),
            ));
        }

        let ty = items[1].as_token_type().unwrap_or(TokenTypeId::UNTYPED);
        let text: Option<Arc<str>> = items[0].as_str().map(Arc::from);

        let (hash, parts_of_speech) = match (&text, dict) {
            (Some(word), Some(dict)) => {
                props.clear();
                dict.word_properties(word, &mut props);
                props.sort_unstable();
                props.dedup();
                (dict.hash_text(word), arena.props.alloc_slice(props.drain(..))?)
            }
            (Some(word), None) => (byte_sum_hash(word), Slice::EMPTY),
            (None, _) => (0, Slice::EMPTY),
        };

        arena.tokens.push(InputToken {
            text,
            ty,
            hash,
            parts_of_speech,
        });
    }
    Ok(())
}
