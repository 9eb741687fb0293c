//! Task data structure and the draft type used to create one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::Status;

/// A single work item on the board.
///
/// `sort_index` orders tasks within their status column; only the relative
/// order within one column matters, values are neither contiguous nor
/// globally unique. Moving a task between columns always updates `status`
/// and `sort_index` together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub status: Status,
    /// 1 (highest) to 5 (lowest).
    pub priority: u8,
    pub assignee: Option<String>,
    pub description: Option<String>,
    /// Comma-separated free text, kept verbatim.
    pub tags: Option<String>,
    pub due: Option<NaiveDate>,
    pub sort_index: i64,
    #[serde(default)]
    pub hours_logged: f64,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

/// Fields supplied by the caller when creating a task. The repository
/// assigns `id`, `sort_index` and the timestamps.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub status: Status,
    pub priority: u8,
    pub assignee: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub due: Option<NaiveDate>,
    pub hours_logged: f64,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            status: Status::default(),
            priority: 3,
            assignee: None,
            description: None,
            tags: None,
            due: None,
            hours_logged: 0.0,
        }
    }
}
