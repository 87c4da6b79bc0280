//! Client-side reconciliation of the editable allocation grid.
//!
//! The grid shows one editable value per cell (skill × date bucket). Three
//! layers exist per cell: the last-known server value, a pending overlay of
//! edits sent but not yet confirmed by a reload, and a transient input
//! string for the field currently being typed. The overlay is an owned
//! structure with explicit merge and sweep operations — call sites never
//! mutate shared state directly.
//!
//! # Merge rule
//! On every reload, pending values take precedence over freshly reloaded
//! values, so an in-flight edit never visibly reverts. Immediately after
//! merging, the overlay is swept: entries confirmed by the server are
//! dropped, entries for deleted cells are dropped (a server-side clear must
//! propagate), and everything else is kept and reported as a
//! [`ConsistencyWarning`] until a later reload confirms it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifies one editable grid cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    /// Skill of the row.
    pub skill: String,
    /// Start date of the column's bucket.
    pub bucket_start: NaiveDate,
}

impl CellKey {
    /// Creates a cell key.
    pub fn new(skill: impl Into<String>, bucket_start: NaiveDate) -> Self {
        Self {
            skill: skill.into(),
            bucket_start,
        }
    }
}

/// A pending edit that a reload did not confirm. Non-fatal; resolved
/// automatically once a later reload reports the value back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyWarning {
    /// The unconfirmed cell.
    pub cell: CellKey,
    /// The value still awaiting confirmation.
    pub pending: u32,
    /// What the server currently reports, if the cell exists there.
    pub server: Option<u32>,
}

/// Three-layer state of the editable allocation grid.
#[derive(Debug, Clone, Default)]
pub struct GridReconciler {
    server: BTreeMap<CellKey, u32>,
    pending: BTreeMap<CellKey, u32>,
    input: BTreeMap<CellKey, String>,
    saving: bool,
}

impl GridReconciler {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value a cell should display: pending overlay first, then the
    /// last-known server value.
    pub fn effective(&self, cell: &CellKey) -> Option<u32> {
        self.pending.get(cell).or_else(|| self.server.get(cell)).copied()
    }

    /// Records the raw text of the field currently being typed.
    pub fn begin_edit(&mut self, cell: CellKey, raw: impl Into<String>) {
        self.input.insert(cell, raw.into());
    }

    /// The transient input for a cell, if one is being typed.
    pub fn input(&self, cell: &CellKey) -> Option<&str> {
        self.input.get(cell).map(String::as_str)
    }

    /// Drops the transient input for a cell without sending it.
    pub fn cancel_edit(&mut self, cell: &CellKey) {
        self.input.remove(cell);
    }

    /// Records that an edit was sent to the store and now awaits
    /// confirmation by a reload. Clears the cell's transient input.
    pub fn record_pending(&mut self, cell: CellKey, value: u32) {
        self.input.remove(&cell);
        self.pending.insert(cell, value);
    }

    /// Number of edits still awaiting confirmation.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Merges a fresh server snapshot and sweeps the overlay layers.
    ///
    /// The snapshot is complete: a cell absent from it no longer exists
    /// server-side. Sweep rules, per overlay entry:
    /// - value equals the fresh server value and is non-zero → confirmed,
    ///   dropped;
    /// - cell absent from the snapshot but present in the previous one →
    ///   the period was deleted server-side; the entry is dropped so the
    ///   clear propagates (zero-valued entries included — this is their
    ///   confirmation);
    /// - cell absent from both → a new, unconfirmed edit; kept;
    /// - anything else (including zero-valued entries for live cells, where
    ///   zero is ambiguous between "never set" and "explicitly cleared") →
    ///   kept, awaiting confirmation.
    ///
    /// Returns a warning per entry still pending after the sweep.
    pub fn merge_reload(&mut self, fresh: BTreeMap<CellKey, u32>) -> Vec<ConsistencyWarning> {
        let previous = std::mem::replace(&mut self.server, fresh);

        let server = &self.server;
        self.pending.retain(|cell, value| match server.get(cell) {
            Some(confirmed) => *value != *confirmed || *value == 0,
            None => !previous.contains_key(cell),
        });
        self.input.retain(|cell, raw| {
            let parsed: Option<u32> = raw.trim().parse().ok();
            match (parsed, server.get(cell)) {
                (Some(value), Some(confirmed)) if value == *confirmed && value != 0 => false,
                (_, None) => !previous.contains_key(cell),
                _ => true,
            }
        });

        self.pending
            .iter()
            .map(|(cell, value)| ConsistencyWarning {
                cell: cell.clone(),
                pending: *value,
                server: self.server.get(cell).copied(),
            })
            .collect()
    }

    /// Claims the per-grid in-flight guard.
    ///
    /// Returns `false` when a save is already outstanding; the caller must
    /// not submit again until [`finish_save`] releases the guard. This is
    /// a per-instance guard, not a lock shared across views.
    ///
    /// [`finish_save`]: GridReconciler::finish_save
    pub fn begin_save(&mut self) -> bool {
        if self.saving {
            return false;
        }
        self.saving = true;
        true
    }

    /// Releases the in-flight guard after the save round-trip finishes,
    /// successfully or not.
    pub fn finish_save(&mut self) {
        self.saving = false;
    }
}
