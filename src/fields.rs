//! Enumerations and field types for the task board.
//!
//! `Status` is the closed set of board columns with one canonical
//! serialization (kebab-case); display labels and permissive label parsing
//! live here so conversion happens at the boundary only.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Board column a task belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[serde(alias = "Backlog")]
    Backlog,
    #[serde(alias = "InProgress")]
    InProgress,
    #[serde(alias = "Blocked")]
    Blocked,
    #[serde(alias = "Done")]
    Done,
}

impl Status {
    /// Column order as rendered on the board.
    pub const ALL: [Status; 4] = [
        Status::Backlog,
        Status::InProgress,
        Status::Blocked,
        Status::Done,
    ];

    /// Position of this status in the board column order.
    pub fn index(self) -> usize {
        match self {
            Status::Backlog => 0,
            Status::InProgress => 1,
            Status::Blocked => 2,
            Status::Done => 3,
        }
    }

    /// Human-readable column label, also used in CSV rows.
    pub fn label(self) -> &'static str {
        match self {
            Status::Backlog => "Backlog",
            Status::InProgress => "In Progress",
            Status::Blocked => "Blocked",
            Status::Done => "Done",
        }
    }

    /// Parse a display label or canonical variant name (case-sensitive).
    /// Returns `None` for anything unrecognized; import callers default
    /// to Backlog.
    pub fn from_label(s: &str) -> Option<Status> {
        match s {
            "Backlog" => Some(Status::Backlog),
            "In Progress" | "InProgress" => Some(Status::InProgress),
            "Blocked" => Some(Status::Blocked),
            "Done" => Some(Status::Done),
            _ => None,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Backlog
    }
}

/// Available orderings for repository queries.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Order {
    /// `(status, sort_index, priority, due NULLS LAST, id)` — the board order.
    Board,
    Due,
    Priority,
    Id,
}
