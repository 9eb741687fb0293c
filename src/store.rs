//! JSON-file-backed task repository.
//!
//! The store keeps the full task set in memory and persists it as a JSON
//! array using an atomic temp-file + rename write. Every mutating call
//! stages its change on a copy, persists the copy, and only then swaps it
//! in, so a call either commits completely or leaves the previous state
//! intact. Batch operations (`apply`, `create_all`) extend the same
//! guarantee to the whole batch.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::debug;

use crate::error::{Error, Result};
use crate::fields::{Order, Status};
use crate::task::{NewTask, Task};

/// A staged status/position write produced by board reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub id: u64,
    pub status: Status,
    pub sort_index: i64,
}

/// File-backed repository holding every persisted task.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl Store {
    /// Open the store at `path`, starting empty if the file does not exist.
    /// A file that exists but fails to parse is an error, not a fresh start.
    pub fn open(path: &Path) -> Result<Store> {
        if !path.exists() {
            return Ok(Store {
                path: path.to_path_buf(),
                tasks: Vec::new(),
            });
        }
        let mut buf = String::new();
        File::open(path).and_then(|mut f| f.read_to_string(&mut buf))?;
        let tasks: Vec<Task> = serde_json::from_str(&buf)?;
        debug!("opened store {} with {} task(s)", path.display(), tasks.len());
        Ok(Store {
            path: path.to_path_buf(),
            tasks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Validate a draft, assign id/sort_index/timestamps and persist.
    pub fn create(&mut self, draft: NewTask) -> Result<u64> {
        let mut next = self.tasks.clone();
        let task = self.build_task(draft, self.next_id())?;
        let id = task.id;
        next.push(task);
        self.commit(next)?;
        Ok(id)
    }

    /// Create every draft in one atomic batch: all rows are validated and
    /// persisted together, or none are.
    pub fn create_all(&mut self, drafts: Vec<NewTask>) -> Result<Vec<u64>> {
        let mut next = self.tasks.clone();
        let mut ids = Vec::with_capacity(drafts.len());
        let mut next_id = self.next_id();
        // sort_index counters must account for rows staged earlier in the
        // same batch, so track them apart from the committed state.
        let mut counters = [0i64; 4];
        for status in Status::ALL {
            counters[status.index()] = self.next_sort_index(status);
        }
        for draft in drafts {
            let status = draft.status;
            let mut task = self.build_task(draft, next_id)?;
            task.sort_index = counters[status.index()];
            counters[status.index()] += 1;
            ids.push(task.id);
            next.push(task);
            next_id += 1;
        }
        self.commit(next)?;
        Ok(ids)
    }

    /// Apply `mutator` to the task, re-validate, refresh `updated_at_utc`
    /// and persist. Fails with `NotFound` if the id is absent.
    pub fn update<F>(&mut self, id: u64, mutator: F) -> Result<()>
    where
        F: FnOnce(&mut Task),
    {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound(id))?;
        let mut next = self.tasks.clone();
        {
            let task = &mut next[idx];
            mutator(task);
            task.title = task.title.trim().to_string();
            validate(task)?;
            task.updated_at_utc = Utc::now().timestamp().max(task.created_at_utc);
        }
        self.commit(next)
    }

    /// Hard-delete a task. Deleting a missing id is reported as `NotFound`.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(Error::NotFound(id))?;
        let mut next = self.tasks.clone();
        next.remove(idx);
        self.commit(next)
    }

    /// Apply a batch of status/position writes atomically. If any id no
    /// longer exists the whole batch fails with `StaleArrangement` and
    /// nothing is written. An empty batch is a no-op and does not touch
    /// the file.
    pub fn apply(&mut self, batch: &[Mutation]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut next = self.tasks.clone();
        let now = Utc::now().timestamp();
        for m in batch {
            let task = next
                .iter_mut()
                .find(|t| t.id == m.id)
                .ok_or(Error::StaleArrangement(m.id))?;
            task.status = m.status;
            task.sort_index = m.sort_index;
            task.updated_at_utc = now.max(task.created_at_utc);
        }
        debug!("applying {} staged mutation(s)", batch.len());
        self.commit(next)
    }

    /// Return the tasks matching `predicate`, ordered by `order`.
    ///
    /// `Order::Board` sorts by `(status, sort_index, priority, due NULLS
    /// LAST, id)`; the trailing keys make column contents deterministic
    /// when sort indices tie (freshly imported rows, for instance).
    pub fn query(&self, predicate: &dyn Fn(&Task) -> bool, order: Order) -> Vec<Task> {
        let mut rows: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| predicate(t))
            .cloned()
            .collect();
        match order {
            Order::Board => rows.sort_by_key(|t| {
                (
                    t.status.index(),
                    t.sort_index,
                    t.priority,
                    t.due.is_none(),
                    t.due,
                    t.id,
                )
            }),
            Order::Due => rows.sort_by_key(|t| (t.due.is_none(), t.due, t.priority, t.id)),
            Order::Priority => rows.sort_by_key(|t| (t.priority, t.due.is_none(), t.due, t.id)),
            Order::Id => rows.sort_by_key(|t| t.id),
        }
        rows
    }

    /// Next append-order sort index for a column.
    pub fn next_sort_index(&self, status: Status) -> i64 {
        self.tasks
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.sort_index)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }

    fn next_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn build_task(&self, draft: NewTask, id: u64) -> Result<Task> {
        let now = Utc::now().timestamp();
        let task = Task {
            id,
            title: draft.title.trim().to_string(),
            status: draft.status,
            priority: draft.priority,
            assignee: none_if_blank(draft.assignee),
            description: none_if_blank(draft.description),
            tags: none_if_blank(draft.tags),
            due: draft.due,
            sort_index: self.next_sort_index(draft.status),
            hours_logged: draft.hours_logged,
            created_at_utc: now,
            updated_at_utc: now,
        };
        validate(&task)?;
        Ok(task)
    }

    /// Persist `next` with a temp + rename write, then swap it in. On any
    /// failure the in-memory state is left untouched.
    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(&next)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, &self.path)?;
        self.tasks = next;
        Ok(())
    }
}

fn validate(task: &Task) -> Result<()> {
    if task.title.trim().is_empty() {
        return Err(Error::Validation("title must not be blank".into()));
    }
    if !(1..=5).contains(&task.priority) {
        return Err(Error::Validation(format!(
            "priority must be 1..=5, got {}",
            task.priority
        )));
    }
    if task.hours_logged < 0.0 {
        return Err(Error::Validation(format!(
            "hours logged must not be negative, got {}",
            task.hours_logged
        )));
    }
    Ok(())
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn open_temp(dir: &tempfile::TempDir) -> Store {
        Store::open(&dir.path().join("tasks.json")).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn create_assigns_sequential_ids_and_append_sort_order() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let a = store.create(NewTask::new("first")).unwrap();
        let b = store.create(NewTask::new("second")).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(store.get(a).unwrap().sort_index, 0);
        assert_eq!(store.get(b).unwrap().sort_index, 1);
        assert_eq!(store.get(a).unwrap().status, Status::Backlog);
    }

    #[test]
    fn blank_title_is_rejected() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let err = store.create(NewTask::new("   ")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn out_of_range_priority_is_rejected() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let mut draft = NewTask::new("task");
        draft.priority = 6;
        assert!(matches!(
            store.create(draft).unwrap_err(),
            Error::Validation(_)
        ));
        let id = store.create(NewTask::new("task")).unwrap();
        let err = store.update(id, |t| t.priority = 0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // Failed update must not leave a partial write behind.
        assert_eq!(store.get(id).unwrap().priority, 3);
    }

    #[test]
    fn update_refreshes_timestamp_and_persists() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let id = store.create(NewTask::new("task")).unwrap();
        store.update(id, |t| t.title = "renamed".into()).unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.title, "renamed");
        assert!(task.updated_at_utc >= task.created_at_utc);

        let reopened = Store::open(store.path()).unwrap();
        assert_eq!(reopened.get(id).unwrap().title, "renamed");
    }

    #[test]
    fn update_and_delete_report_not_found() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        assert!(matches!(
            store.update(99, |t| t.priority = 1).unwrap_err(),
            Error::NotFound(99)
        ));
        assert!(matches!(store.delete(99).unwrap_err(), Error::NotFound(99)));
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let id = store.create(NewTask::new("task")).unwrap();
        let batch = vec![
            Mutation {
                id,
                status: Status::Done,
                sort_index: 0,
            },
            Mutation {
                id: 999,
                status: Status::Done,
                sort_index: 1,
            },
        ];
        assert!(matches!(
            store.apply(&batch).unwrap_err(),
            Error::StaleArrangement(999)
        ));
        // First mutation must not have leaked through.
        assert_eq!(store.get(id).unwrap().status, Status::Backlog);
    }

    #[test]
    fn empty_apply_does_not_touch_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let mut store = Store::open(&path).unwrap();
        store.apply(&[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn board_order_sorts_nulls_last_and_breaks_ties_deterministically() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let mut early = NewTask::new("early");
        early.due = Some(date("2026-01-01"));
        early.priority = 2;
        let mut urgent = NewTask::new("urgent");
        urgent.priority = 1;
        let mut late = NewTask::new("no due");
        late.priority = 2;
        let no_due = store.create(late).unwrap();
        let with_due = store.create(early).unwrap();
        let top = store.create(urgent).unwrap();
        // Collapse sort indices so priority and due decide the order.
        for id in [no_due, with_due, top] {
            store.update(id, |t| t.sort_index = 0).unwrap();
        }
        let rows = store.query(&|_| true, Order::Board);
        let ids: Vec<u64> = rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![top, with_due, no_due]);
    }

    #[test]
    fn create_all_is_atomic() {
        let dir = tempdir().unwrap();
        let mut store = open_temp(&dir);
        let drafts = vec![NewTask::new("ok"), NewTask::new("  ")];
        assert!(matches!(
            store.create_all(drafts).unwrap_err(),
            Error::Validation(_)
        ));
        assert!(store.tasks().is_empty());

        let mut in_progress = NewTask::new("second");
        in_progress.status = Status::InProgress;
        let ids = store
            .create_all(vec![NewTask::new("first"), in_progress, NewTask::new("third")])
            .unwrap();
        assert_eq!(ids.len(), 3);
        // Append order within each column, counted per column.
        assert_eq!(store.get(ids[0]).unwrap().sort_index, 0);
        assert_eq!(store.get(ids[1]).unwrap().sort_index, 0);
        assert_eq!(store.get(ids[2]).unwrap().sort_index, 1);
    }

    #[test]
    fn corrupt_file_is_surfaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Store::open(&path).unwrap_err(), Error::Corrupt(_)));
    }
}
