//! Saving and restoring rule edits using `MessagePack`.
//!
//! Only modified productions are written; an unmodified production is
//! reproduced by its baseline. Literal hashes and deletion marks are not
//! saved, so restored alternatives are rehashed on the next parse.

use gramprod_foundation::{Error, ErrorKind, Result};
use gramprod_rules::Alternative;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grammar::Grammar;

#[derive(Serialize, Deserialize)]
struct SavedProduction {
    name: String,
    alternatives: Vec<Alternative>,
}

#[derive(Serialize, Deserialize)]
struct SavedGrammar {
    productions: Vec<SavedProduction>,
}

/// Serializes the modified productions of a grammar.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(grammar: &Grammar) -> Result<Vec<u8>> {
    let saved = SavedGrammar {
        productions: grammar
            .productions()
            .iter()
            .filter(|p| p.is_modified())
            .map(|p| SavedProduction {
                name: p.name().to_string(),
                alternatives: p.alternatives().iter().cloned().collect(),
            })
            .collect(),
    };
    debug!(productions = saved.productions.len(), "saving modified productions");
    rmp_serde::to_vec_named(&saved).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Restores productions saved by [`to_bytes`], matching them by name.
///
/// Returns the number of productions restored.
///
/// # Errors
///
/// Returns an error if deserialization fails or a saved production has no
/// counterpart in `grammar`. Nothing is restored on error.
pub fn restore_from_bytes(grammar: &mut Grammar, bytes: &[u8]) -> Result<usize> {
    let saved: SavedGrammar =
        rmp_serde::from_slice(bytes).map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))?;

    let targets = saved
        .productions
        .iter()
        .map(|p| {
            grammar.find_production(&p.name).ok_or_else(|| {
                Error::new(ErrorKind::Serialization(format!(
                    "saved production {} is not declared",
                    p.name
                )))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let count = targets.len();
    for (id, production) in targets.into_iter().zip(saved.productions) {
        if let Some(target) = grammar.productions_mut().get_mut(id.index()) {
            target.restore(production.alternatives);
        }
    }
    debug!(productions = count, "restored saved productions");
    Ok(count)
}
