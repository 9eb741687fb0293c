//! Bulk CSV transfer: export of the filtered task set, fail-fast import.
//!
//! The row format is quote-aware CSV (RFC-4180 style quoting, embedded
//! commas, quotes and newlines survive a round trip). Import validates
//! every row before a single task is created; the one documented
//! leniency is an unparseable due date, which leaves the field unset
//! with a warning instead of failing the row.

use chrono::NaiveDate;
use log::warn;

use crate::error::{Error, Result};
use crate::fields::Status;
use crate::task::{NewTask, Task};

/// Fixed export column set. Import matches headers case-insensitively
/// and ignores anything it does not recognize.
pub const EXPORT_HEADER: &str =
    "id,title,status,priority,assignee,due_date,tags,description,sort_index,hours_spent";

/// Serialize tasks to CSV in the order given. Optional fields export as
/// their defined defaults (empty string, 0), never as a missing column.
pub fn export_csv(tasks: &[Task]) -> String {
    let mut out = String::new();
    out.push_str(EXPORT_HEADER);
    out.push('\n');
    for task in tasks {
        let due = task.due.map(|d| d.to_string()).unwrap_or_default();
        let fields = [
            task.id.to_string(),
            task.title.clone(),
            task.status.label().to_string(),
            task.priority.to_string(),
            task.assignee.clone().unwrap_or_default(),
            due,
            task.tags.clone().unwrap_or_default(),
            task.description.clone().unwrap_or_default(),
            task.sort_index.to_string(),
            task.hours_logged.to_string(),
        ];
        let row: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Parse CSV content into task drafts, validating every row up front.
///
/// `title` is mandatory (case-insensitive header match) and must be
/// non-blank in every row; any violation rejects the whole import so the
/// caller commits zero rows. Recognized optional columns: `status`
/// (unrecognized labels fall back to Backlog), `priority` (default 3),
/// `assignee`, `due_date`, `tags`, `description`, `hours_spent`
/// (default 0.0). Row order carries no meaning; the repository assigns
/// fresh append-order sort indices on creation.
pub fn import_csv(content: &str) -> Result<Vec<NewTask>> {
    let records = parse_csv(content);
    let mut rows = records.iter();
    let header = rows
        .next()
        .ok_or_else(|| Error::Transfer("CSV input is empty".into()))?;

    let col = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let title_col =
        col("title").ok_or_else(|| Error::Transfer("missing required column 'title'".into()))?;
    let status_col = col("status");
    let priority_col = col("priority");
    let assignee_col = col("assignee");
    let due_col = col("due_date");
    let tags_col = col("tags");
    let description_col = col("description");
    let hours_col = col("hours_spent");

    let mut drafts = Vec::new();
    for (i, record) in rows.enumerate() {
        let line = i + 2;
        // An entirely empty line (trailing newline artifact) is not a row.
        if record.len() == 1 && record[0].is_empty() {
            continue;
        }
        let title = field(record, Some(title_col));
        if title.is_empty() {
            return Err(Error::Transfer(format!("row {line}: title is blank")));
        }

        let status = match field(record, status_col) {
            "" => Status::Backlog,
            // Permissive: an unrecognized label lands in Backlog rather
            // than rejecting the row.
            s => Status::from_label(s).unwrap_or(Status::Backlog),
        };

        let priority = match field(record, priority_col) {
            "" => 3,
            s => s.parse::<u8>().map_err(|_| {
                Error::Transfer(format!("row {line}: invalid priority '{s}'"))
            })?,
        };
        if !(1..=5).contains(&priority) {
            return Err(Error::Transfer(format!(
                "row {line}: priority {priority} out of range 1..=5"
            )));
        }

        let hours_logged = match field(record, hours_col) {
            "" => 0.0,
            s => s.parse::<f64>().map_err(|_| {
                Error::Transfer(format!("row {line}: invalid hours_spent '{s}'"))
            })?,
        };
        if hours_logged < 0.0 {
            return Err(Error::Transfer(format!(
                "row {line}: hours_spent must not be negative"
            )));
        }

        let due = match field(record, due_col) {
            "" => None,
            s => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    warn!("row {line}: unparseable due date '{s}', leaving unset");
                    None
                }
            },
        };

        drafts.push(NewTask {
            title: title.to_string(),
            status,
            priority,
            assignee: optional(field(record, assignee_col)),
            description: optional(field(record, description_col)),
            tags: optional(field(record, tags_col)),
            due,
            hours_logged,
        });
    }
    Ok(drafts)
}

/// Trimmed field value at a recognized column, or "" when the column is
/// absent or the row is short.
fn field<'a>(record: &'a [String], idx: Option<usize>) -> &'a str {
    idx.and_then(|c| record.get(c))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn optional(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Escape a CSV field: quote when it contains a comma, quote or newline,
/// doubling embedded quotes.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Quote-aware CSV parser. Splits records on newlines outside quotes, so
/// quoted fields may span lines; `""` inside a quoted field is an
/// escaped quote.
fn parse_csv(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                record.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
