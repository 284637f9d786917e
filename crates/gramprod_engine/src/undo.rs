//! Undo records for rule edits.
//!
//! Every insert or delete outside a baseline load produces one
//! [`UndoRecord`] holding a snapshot of the alternative involved. Records are
//! handed to an [`UndoLog`]; [`UndoJournal`] is the in-memory log with
//! savepoints. Replaying a record applies the exact inverse edit, see
//! [`Production::apply_undo`](crate::Production::apply_undo).

use gramprod_foundation::ProductionId;
use gramprod_rules::Alternative;
use tracing::trace;

/// The kind of edit an undo record reverses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOp {
    /// An alternative was inserted; undo deletes it.
    Added,
    /// An alternative was deleted; undo re-inserts it.
    Deleted,
}

/// One reversible rule edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    /// What was done.
    pub op: UndoOp,
    /// Production that was edited.
    pub production: ProductionId,
    /// 0-based position of the alternative at the time of the edit.
    pub index: usize,
    /// The alternative that was inserted or deleted.
    pub snapshot: Alternative,
}

/// Receiver of undo records.
pub trait UndoLog {
    /// Appends a record.
    fn record(&mut self, record: UndoRecord);
}

/// Position in an [`UndoJournal`] to roll back to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Savepoint(usize);

/// In-memory undo log.
#[derive(Clone, Debug, Default)]
pub struct UndoJournal {
    records: Vec<UndoRecord>,
}

impl UndoJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current position.
    #[must_use]
    pub fn savepoint(&self) -> Savepoint {
        Savepoint(self.records.len())
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded edits, oldest first.
    #[must_use]
    pub fn records(&self) -> &[UndoRecord] {
        &self.records
    }

    /// Removes the records made after `savepoint` and returns them newest
    /// first, the order they must be replayed in.
    pub fn unwind_to(&mut self, savepoint: Savepoint) -> Vec<UndoRecord> {
        let start = savepoint.0.min(self.records.len());
        let mut unwound = self.records.split_off(start);
        unwound.reverse();
        trace!(savepoint = start, records = unwound.len(), "undo journal unwound");
        unwound
    }

    /// Discards every record, making the current state permanent.
    pub fn commit(&mut self) {
        self.records.clear();
    }
}

impl UndoLog for UndoJournal {
    fn record(&mut self, record: UndoRecord) {
        trace!(op = ?record.op, production = ?record.production, index = record.index, "undo recorded");
        self.records.push(record);
    }
}

/// An undo log that drops every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoUndo;

impl UndoLog for NoUndo {
    fn record(&mut self, _record: UndoRecord) {}
}
