//! Board reconciliation: the state machine between the rendered columns
//! and the task store.
//!
//! A `BoardSnapshot` is the owned "last known good" view of the four
//! columns, rebuilt from the repository on load. When the UI hands back a
//! rearranged board, `apply_arrangement` validates it, diffs it against
//! the stored rows, commits the minimal mutation set in one atomic batch
//! and returns the fresh snapshot. A deep-equal arrangement is detected
//! up front and performs zero writes.

use std::collections::HashSet;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::fields::{Order, Status};
use crate::filter::FilterCriteria;
use crate::store::{Mutation, Store};
use crate::task::Task;

/// Structured card reference handed across the UI boundary: an id plus a
/// ready-made display label, never a delimited string to be re-parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRef {
    pub id: u64,
    pub label: String,
}

/// Ordered per-column task ids, as produced by the UI after a drag.
/// Columns follow `Status::ALL` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arrangement {
    pub columns: [Vec<u64>; 4],
}

impl Arrangement {
    pub fn column(&self, status: Status) -> &[u64] {
        &self.columns[status.index()]
    }

    /// Move a task to `to` at `position` (clamped to the column length),
    /// preserving the relative order of everything else. Returns false if
    /// the id is not present in the arrangement.
    pub fn move_task(&mut self, id: u64, to: Status, position: usize) -> bool {
        let mut found = false;
        for column in self.columns.iter_mut() {
            if let Some(pos) = column.iter().position(|&c| c == id) {
                column.remove(pos);
                found = true;
                break;
            }
        }
        if !found {
            return false;
        }
        let target = &mut self.columns[to.index()];
        target.insert(position.min(target.len()), id);
        true
    }
}

/// Result of a reconciliation pass.
#[derive(Debug)]
pub enum Outcome {
    /// The arrangement deep-equals the snapshot; nothing was written and
    /// no re-render is needed.
    Unchanged,
    /// Mutations were committed; `snapshot` is the new authoritative state.
    Applied {
        snapshot: BoardSnapshot,
        mutations: usize,
    },
}

/// The authoritative in-memory board state: one ordered card list per
/// status column. Owned by the caller and replaced on every successful
/// reconciliation — there is no ambient shared board cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    columns: [Vec<CardRef>; 4],
}

impl BoardSnapshot {
    /// Rebuild the board from the repository. Tasks land in their status
    /// column in board order, so rows with tied sort indices come out in
    /// a deterministic `(priority, due, id)` order.
    pub fn load(store: &Store, criteria: &FilterCriteria) -> BoardSnapshot {
        let rows = store.query(&criteria.compile(), Order::Board);
        let mut columns: [Vec<CardRef>; 4] = Default::default();
        for task in &rows {
            columns[task.status.index()].push(CardRef {
                id: task.id,
                label: card_label(task),
            });
        }
        BoardSnapshot { columns }
    }

    pub fn column(&self, status: Status) -> &[CardRef] {
        &self.columns[status.index()]
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// The arrangement currently shown, for the UI to start a drag from.
    pub fn arrangement(&self) -> Arrangement {
        let mut arrangement = Arrangement::default();
        for (i, column) in self.columns.iter().enumerate() {
            arrangement.columns[i] = column.iter().map(|c| c.id).collect();
        }
        arrangement
    }

    /// Reconcile the store with a full replacement arrangement.
    ///
    /// Validates that the arrangement is a permutation of this snapshot's
    /// ids, stages a mutation only for cards whose stored status or
    /// position actually differs, and commits the batch atomically. A
    /// card deleted since the snapshot was taken fails the whole batch
    /// with `StaleArrangement`; the caller should reload and retry.
    pub fn apply_arrangement(&self, store: &mut Store, new: &Arrangement) -> Result<Outcome> {
        self.validate(new)?;

        if *new == self.arrangement() {
            debug!("arrangement unchanged, skipping reconciliation");
            return Ok(Outcome::Unchanged);
        }

        let mut staged: Vec<Mutation> = Vec::new();
        for (ci, status) in Status::ALL.into_iter().enumerate() {
            for (i, &id) in new.columns[ci].iter().enumerate() {
                let sort_index = i as i64;
                let task = store.get(id).ok_or(Error::StaleArrangement(id))?;
                if task.status != status || task.sort_index != sort_index {
                    staged.push(Mutation {
                        id,
                        status,
                        sort_index,
                    });
                }
            }
        }
        debug!("staged {} mutation(s) for {} card(s)", staged.len(), self.card_count());
        store.apply(&staged)?;

        // Reread the rows so concurrent edits to other fields show up in
        // the fresh labels.
        let mut columns: [Vec<CardRef>; 4] = Default::default();
        for (ci, column) in new.columns.iter().enumerate() {
            for &id in column {
                let task = store.get(id).ok_or(Error::StaleArrangement(id))?;
                columns[ci].push(CardRef {
                    id,
                    label: card_label(task),
                });
            }
        }
        info!("reconciled board with {} write(s)", staged.len());
        Ok(Outcome::Applied {
            snapshot: BoardSnapshot { columns },
            mutations: staged.len(),
        })
    }

    /// Reject arrangements that are not a permutation of the snapshot:
    /// duplicated ids, unknown ids, or ids left out.
    fn validate(&self, new: &Arrangement) -> Result<()> {
        let known: HashSet<u64> = self
            .columns
            .iter()
            .flat_map(|col| col.iter().map(|c| c.id))
            .collect();
        let mut seen: HashSet<u64> = HashSet::with_capacity(known.len());
        for column in &new.columns {
            for &id in column {
                if !known.contains(&id) {
                    return Err(Error::InvalidArrangement(format!(
                        "task {id} is not on the board"
                    )));
                }
                if !seen.insert(id) {
                    return Err(Error::InvalidArrangement(format!(
                        "task {id} appears more than once"
                    )));
                }
            }
        }
        if let Some(missing) = known.iter().find(|id| !seen.contains(id)) {
            return Err(Error::InvalidArrangement(format!(
                "task {missing} is missing from the arrangement"
            )));
        }
        Ok(())
    }
}

fn card_label(task: &Task) -> String {
    let due = task
        .due
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".into());
    format!(
        "{} (prio:{}, due:{}, hrs:{})",
        task.title, task.priority, due, task.hours_logged
    )
}
