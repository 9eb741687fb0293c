//! Filter compilation: user-supplied criteria to a single task predicate.
//!
//! All provided criteria are conjoined; an absent criterion imposes no
//! constraint. An empty status list matches every status, mirroring a
//! sidebar multi-select that defaults to all columns selected.

use chrono::NaiveDate;

use crate::fields::Status;
use crate::task::Task;

/// Compiled filter, evaluated by the repository.
pub type Predicate = Box<dyn Fn(&Task) -> bool>;

/// Optional filter criteria collected from the surrounding UI.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub statuses: Vec<Status>,
    pub assignee_contains: Option<String>,
    pub tag_contains: Option<String>,
    /// Case-insensitive substring over title OR description.
    pub text_search: Option<String>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
}

impl FilterCriteria {
    /// Compile the criteria into one predicate. Pure: no side effects,
    /// the criteria themselves are left untouched.
    pub fn compile(&self) -> Predicate {
        let statuses = self.statuses.clone();
        let assignee = lower(&self.assignee_contains);
        let tag = lower(&self.tag_contains);
        let search = lower(&self.text_search);
        let due_from = self.due_from;
        let due_to = self.due_to;

        Box::new(move |task: &Task| {
            if !statuses.is_empty() && !statuses.contains(&task.status) {
                return false;
            }
            if let Some(needle) = &assignee {
                if !contains_ci(task.assignee.as_deref(), needle) {
                    return false;
                }
            }
            if let Some(needle) = &tag {
                if !contains_ci(task.tags.as_deref(), needle) {
                    return false;
                }
            }
            if let Some(needle) = &search {
                let in_title = task.title.to_lowercase().contains(needle.as_str());
                if !in_title && !contains_ci(task.description.as_deref(), needle) {
                    return false;
                }
            }
            // Date bounds are inclusive; tasks without a due date never
            // fall inside a bounded window.
            if let Some(from) = due_from {
                match task.due {
                    Some(d) if d >= from => {}
                    _ => return false,
                }
            }
            if let Some(to) = due_to {
                match task.due {
                    Some(d) if d <= to => {}
                    _ => return false,
                }
            }
            true
        })
    }
}

fn lower(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: Option<&str>, lowered_needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(lowered_needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;

    fn task(id: u64, draft: NewTask) -> Task {
        Task {
            id,
            title: draft.title,
            status: draft.status,
            priority: draft.priority,
            assignee: draft.assignee,
            description: draft.description,
            tags: draft.tags,
            due: draft.due,
            sort_index: 0,
            hours_logged: draft.hours_logged,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn empty_criteria_match_everything() {
        let pred = FilterCriteria::default().compile();
        assert!(pred(&task(1, NewTask::new("anything"))));
    }

    #[test]
    fn empty_status_list_is_no_constraint() {
        let criteria = FilterCriteria {
            statuses: Vec::new(),
            ..Default::default()
        };
        let pred = criteria.compile();
        let mut done = NewTask::new("done");
        done.status = Status::Done;
        assert!(pred(&task(1, done)));
    }

    #[test]
    fn criteria_are_conjunctive() {
        let criteria = FilterCriteria {
            statuses: vec![Status::Done],
            assignee_contains: Some("x".into()),
            ..Default::default()
        };
        let pred = criteria.compile();

        let mut both = NewTask::new("both");
        both.status = Status::Done;
        both.assignee = Some("Xavier".into());
        assert!(pred(&task(1, both)));

        let mut status_only = NewTask::new("status only");
        status_only.status = Status::Done;
        status_only.assignee = Some("Yara".into());
        assert!(!pred(&task(2, status_only)));

        let mut assignee_only = NewTask::new("assignee only");
        assignee_only.assignee = Some("Xavier".into());
        assert!(!pred(&task(3, assignee_only)));
    }

    #[test]
    fn text_search_covers_title_and_description() {
        let criteria = FilterCriteria {
            text_search: Some("SPEC".into()),
            ..Default::default()
        };
        let pred = criteria.compile();

        assert!(pred(&task(1, NewTask::new("Write spec"))));

        let mut in_desc = NewTask::new("other");
        in_desc.description = Some("covers the spec draft".into());
        assert!(pred(&task(2, in_desc)));

        assert!(!pred(&task(3, NewTask::new("unrelated"))));
    }

    #[test]
    fn due_window_is_inclusive_and_excludes_undated_tasks() {
        let criteria = FilterCriteria {
            due_from: Some(date("2026-09-01")),
            due_to: Some(date("2026-09-30")),
            ..Default::default()
        };
        let pred = criteria.compile();

        let mut on_edge = NewTask::new("edge");
        on_edge.due = Some(date("2026-09-30"));
        assert!(pred(&task(1, on_edge)));

        let mut outside = NewTask::new("outside");
        outside.due = Some(date("2026-10-01"));
        assert!(!pred(&task(2, outside)));

        assert!(!pred(&task(3, NewTask::new("undated"))));
    }

    #[test]
    fn tag_filter_matches_substring_case_insensitively() {
        let criteria = FilterCriteria {
            tag_contains: Some("Backend".into()),
            ..Default::default()
        };
        let pred = criteria.compile();
        let mut tagged = NewTask::new("tagged");
        tagged.tags = Some("backend,urgent".into());
        assert!(pred(&task(1, tagged)));
        assert!(!pred(&task(2, NewTask::new("untagged"))));
    }
}
