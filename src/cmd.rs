//! Command implementations for the CLI interface.
//!
//! Each handler maps one user interaction onto a single synchronous pass
//! through the core: compile filters, query the store, reconcile or
//! mutate, render. Handlers return `Result` and leave rendering of
//! failures to `main`.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{Local, NaiveDate};
use clap::{Args, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use crate::board::{BoardSnapshot, Outcome};
use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::fields::{Order, Status};
use crate::filter::FilterCriteria;
use crate::store::Store;
use crate::task::{NewTask, Task};
use crate::transfer;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Assignee name.
        #[arg(long)]
        assignee: Option<String>,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Comma-separated tags.
        #[arg(long)]
        tags: Option<String>,
        /// Due date: YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        /// Priority 1 (highest) to 5 (lowest).
        #[arg(long, default_value_t = 3)]
        priority: u8,
        /// Column: backlog | in-progress | blocked | done.
        #[arg(long, value_enum, default_value_t = Status::Backlog)]
        status: Status,
        /// Hours already logged.
        #[arg(long, default_value_t = 0.0)]
        hours: f64,
    },

    /// List tasks with optional filters.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = Order::Board)]
        sort: Order,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// View a single task by ID.
    View {
        /// Task ID to view.
        id: u64,
    },

    /// Update fields on a task.
    Update {
        /// Task ID to update.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// Comma-separated tags (replaces the existing set).
        #[arg(long)]
        tags: Option<String>,
        /// Due date: YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        priority: Option<u8>,
        /// Moving status this way appends the task to its new column.
        #[arg(long, value_enum)]
        status: Option<Status>,
        #[arg(long)]
        hours: Option<f64>,
        /// Clear the due date.
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a task by ID.
    Delete {
        /// Task ID to delete.
        id: u64,
    },

    /// Render the board columns for the filtered task set.
    Board {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Move a task to a column position, reconciling the whole board.
    Move {
        /// Task ID to move.
        id: u64,
        /// Target column.
        #[arg(long, value_enum)]
        to: Status,
        /// 0-based position within the column (default: append).
        #[arg(long)]
        pos: Option<usize>,
    },

    /// Export the filtered task set to CSV.
    Export {
        /// Output file path (default: tasks_export.csv).
        #[arg(long, short)]
        output: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Import tasks from CSV. The whole file is validated before any
    /// task is created.
    Import {
        /// Input CSV file path.
        input: String,
        /// Skip creating a backup before import.
        #[arg(long)]
        no_backup: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Filter flags shared by list, board and export.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Filter by status. May be repeated; none selected means all.
    #[arg(long = "status", value_enum)]
    pub statuses: Vec<Status>,
    /// Assignee contains (case-insensitive).
    #[arg(long)]
    pub assignee: Option<String>,
    /// Tag contains (case-insensitive).
    #[arg(long)]
    pub tag: Option<String>,
    /// Search in title and description.
    #[arg(long)]
    pub search: Option<String>,
    /// Due on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub due_from: Option<String>,
    /// Due on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub due_to: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> Result<FilterCriteria> {
        Ok(FilterCriteria {
            statuses: self.statuses.clone(),
            assignee_contains: self.assignee.clone(),
            tag_contains: self.tag.clone(),
            text_search: self.search.clone(),
            due_from: self.due_from.as_deref().map(parse_date).transpose()?,
            due_to: self.due_to.as_deref().map(parse_date).transpose()?,
        })
    }
}

/// Parse a calendar date in ISO format.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("unparseable date '{s}', expected YYYY-MM-DD")))
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    store: &mut Store,
    title: String,
    assignee: Option<String>,
    desc: Option<String>,
    tags: Option<String>,
    due: Option<String>,
    priority: u8,
    status: Status,
    hours: f64,
) -> Result<()> {
    let draft = NewTask {
        title,
        status,
        priority,
        assignee,
        description: desc,
        tags,
        due: due.as_deref().map(parse_date).transpose()?,
        hours_logged: hours,
    };
    let id = store.create(draft)?;
    println!("Added task {id}");
    Ok(())
}

pub fn cmd_list(store: &Store, filter: &FilterArgs, sort: Order, limit: Option<usize>) -> Result<()> {
    let criteria = filter.criteria()?;
    let mut rows = store.query(&criteria.compile(), sort);
    if let Some(n) = limit {
        rows.truncate(n);
    }
    print_table(&rows);
    println!("{} task(s)", rows.len());
    Ok(())
}

pub fn cmd_view(store: &Store, id: u64) -> Result<()> {
    let task = store.get(id).ok_or(Error::NotFound(id))?;
    println!("ID:          {}", task.id);
    println!("Title:       {}", task.title);
    println!("Status:      {}", task.status.label());
    println!("Priority:    {}", task.priority);
    println!("Assignee:    {}", task.assignee.as_deref().unwrap_or("-"));
    println!("Tags:        {}", task.tags.as_deref().unwrap_or("-"));
    println!(
        "Due:         {}",
        task.due.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("Hours:       {}", task.hours_logged);
    println!("Sort index:  {}", task.sort_index);
    println!(
        "Description: {}",
        task.description.as_deref().unwrap_or("-")
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    store: &mut Store,
    id: u64,
    title: Option<String>,
    desc: Option<String>,
    assignee: Option<String>,
    tags: Option<String>,
    due: Option<String>,
    priority: Option<u8>,
    status: Option<Status>,
    hours: Option<f64>,
    clear_due: bool,
) -> Result<()> {
    let current = store.get(id).ok_or(Error::NotFound(id))?;
    // A column change is one atomic status + sort_index write; the task
    // is appended to its new column.
    let moved = status.filter(|s| *s != current.status);
    let new_sort = moved.map(|s| store.next_sort_index(s));
    let new_due = match (clear_due, due) {
        (true, _) => Some(None),
        (false, Some(s)) => Some(Some(parse_date(&s)?)),
        (false, None) => None,
    };

    store.update(id, |task| {
        if let Some(v) = title {
            task.title = v;
        }
        if let Some(v) = desc {
            task.description = blank_to_none(v);
        }
        if let Some(v) = assignee {
            task.assignee = blank_to_none(v);
        }
        if let Some(v) = tags {
            task.tags = blank_to_none(v);
        }
        if let Some(v) = priority {
            task.priority = v;
        }
        if let Some(v) = hours {
            task.hours_logged = v;
        }
        if let Some(d) = new_due {
            task.due = d;
        }
        if let (Some(s), Some(sort_index)) = (moved, new_sort) {
            task.status = s;
            task.sort_index = sort_index;
        }
    })?;
    println!("Updated task {id}");
    Ok(())
}

pub fn cmd_delete(store: &mut Store, id: u64) -> Result<()> {
    store.delete(id)?;
    println!("Deleted task {id}");
    Ok(())
}

pub fn cmd_board(store: &Store, filter: &FilterArgs) -> Result<()> {
    let criteria = filter.criteria()?;
    let snapshot = BoardSnapshot::load(store, &criteria);
    for status in Status::ALL {
        let column = snapshot.column(status);
        println!("## {} ({})", status.label(), column.len());
        for (i, card) in column.iter().enumerate() {
            println!("  {:>2}. [{}] {}", i, card.id, card.label);
        }
        println!();
    }
    Ok(())
}

pub fn cmd_move(store: &mut Store, id: u64, to: Status, pos: Option<usize>) -> Result<()> {
    // The move always reconciles against the full board, not a filtered
    // view, so the arrangement covers every known task.
    let snapshot = BoardSnapshot::load(store, &FilterCriteria::default());
    let mut arrangement = snapshot.arrangement();
    let position = pos.unwrap_or(arrangement.column(to).len());
    if !arrangement.move_task(id, to, position) {
        return Err(Error::NotFound(id));
    }
    match snapshot.apply_arrangement(store, &arrangement)? {
        Outcome::Unchanged => println!("Task {id} already in place"),
        Outcome::Applied { mutations, .. } => {
            println!("Moved task {id} to {} ({mutations} write(s))", to.label())
        }
    }
    Ok(())
}

pub fn cmd_export(store: &Store, output: Option<String>, filter: &FilterArgs) -> Result<()> {
    let criteria = filter.criteria()?;
    let rows = store.query(&criteria.compile(), Order::Board);
    let output_path = output.unwrap_or_else(|| "tasks_export.csv".to_string());
    fs::write(&output_path, transfer::export_csv(&rows))?;
    println!("Exported {} task(s) to {}", rows.len(), output_path);
    Ok(())
}

pub fn cmd_import(store: &mut Store, input: String, no_backup: bool) -> Result<()> {
    let content = fs::read_to_string(&input)?;
    let drafts = transfer::import_csv(&content)?;
    if !no_backup && store.path().exists() {
        let backup_path = create_backup(store.path())?;
        println!("Created backup at {backup_path}");
    }
    let ids = store.create_all(drafts)?;
    println!("Imported {} task(s)", ids.len());
    Ok(())
}

/// Create a timestamped backup copy of the store file.
pub fn create_backup(db_path: &Path) -> std::io::Result<String> {
    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let db_filename = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("tasks.json");
    let backup_path = backup_dir.join(format!("{timestamp}_{db_filename}"));
    fs::copy(db_path, &backup_path)?;
    Ok(backup_path.to_string_lossy().to_string())
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "tb", &mut io::stdout());
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[Task]) {
    println!(
        "{:<5} {:<12} {:<4} {:<11} {:<12} {:<6} {}",
        "ID", "Status", "Pri", "Due", "Assignee", "Hrs", "Title [tags]"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let tags = t
            .tags
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        println!(
            "{:<5} {:<12} {:<4} {:<11} {:<12} {:<6} {}{}",
            t.id,
            t.status.label(),
            t.priority,
            format_due_relative(t.due, today),
            truncate(t.assignee.as_deref().unwrap_or("-"), 12),
            t.hours_logged,
            t.title,
            tags
        );
    }
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = d - today;
            if delta.num_days() == 0 {
                "today".into()
            } else if delta.num_days() == 1 {
                "tomorrow".into()
            } else if delta.num_days() > 1 {
                format!("in {}d", delta.num_days())
            } else {
                format!("{}d late", -delta.num_days())
            }
        }
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

fn blank_to_none(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_only() {
        assert_eq!(parse_date("2026-09-15").unwrap().to_string(), "2026-09-15");
        assert!(parse_date("15/09/2026").is_err());
        assert!(parse_date("tomorrow").is_err());
    }

    #[test]
    fn format_due_relative_buckets() {
        let today = parse_date("2026-08-30").unwrap();
        assert_eq!(format_due_relative(None, today), "-");
        assert_eq!(format_due_relative(Some(today), today), "today");
        assert_eq!(
            format_due_relative(Some(parse_date("2026-08-31").unwrap()), today),
            "tomorrow"
        );
        assert_eq!(
            format_due_relative(Some(parse_date("2026-09-02").unwrap()), today),
            "in 3d"
        );
        assert_eq!(
            format_due_relative(Some(parse_date("2026-08-28").unwrap()), today),
            "2d late"
        );
    }

    #[test]
    fn truncate_respects_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer string", 8), "a longe…");
    }
}
