//! Task model: the entity, its lifecycle mutations and derived predicates.
//!
//! Tasks are read-only snapshots for the scheduler and the statistics
//! engine; only the store layer applies the mutators here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock;

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// French label used in notifications and the weekly email.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "🔴 Haute",
            Priority::Medium => "🟡 Moyenne",
            Priority::Low => "🟢 Basse",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "haute" => Ok(Priority::High),
            "medium" | "moyenne" => Ok(Priority::Medium),
            "low" | "basse" => Ok(Priority::Low),
            other => Err(ValidationError::UnknownPriority(other.to_string())),
        }
    }
}

/// Fixed category set of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Maison,
    Travail,
    Courses,
    Personnel,
    #[serde(rename = "Santé")]
    Sante,
    Loisirs,
}

pub const CATEGORIES: [Category; 6] = [
    Category::Maison,
    Category::Travail,
    Category::Courses,
    Category::Personnel,
    Category::Sante,
    Category::Loisirs,
];

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Maison => "Maison",
            Category::Travail => "Travail",
            Category::Courses => "Courses",
            Category::Personnel => "Personnel",
            Category::Sante => "Santé",
            Category::Loisirs => "Loisirs",
        };
        f.write_str(label)
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "maison" => Ok(Category::Maison),
            "travail" => Ok(Category::Travail),
            "courses" => Ok(Category::Courses),
            "personnel" => Ok(Category::Personnel),
            "sante" | "santé" => Ok(Category::Sante),
            "loisirs" => Ok(Category::Loisirs),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// Advisory reminder cadence stored on the task. The scheduler re-derives
/// the actual cadence from the due date at planning time, so this field can
/// lag behind until the next planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    Daily,
    Weekly,
}

/// Daily when the due date is at most 7 days out, weekly otherwise.
/// No due date means weekly.
pub fn determine_frequency(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> ReminderFrequency {
    match due_date {
        Some(due) => {
            let days_until = (due - now).num_seconds() as f64 / 86_400.0;
            if days_until <= 7.0 {
                ReminderFrequency::Daily
            } else {
                ReminderFrequency::Weekly
            }
        }
        None => ReminderFrequency::Weekly,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub categories: Vec<Category>,
    pub reminder_frequency: ReminderFrequency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub is_snoozed: bool,
    pub snooze_until: Option<DateTime<Utc>>,
    pub last_reminder_sent: Option<DateTime<Utc>>,
    pub is_archived: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::Medium,
            categories: Vec::new(),
            reminder_frequency: ReminderFrequency::Weekly,
            created_at: now,
            updated_at: now,
            completed_at: None,
            is_completed: false,
            is_snoozed: false,
            snooze_until: None,
            last_reminder_sent: None,
            is_archived: false,
        }
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // --- lifecycle -------------------------------------------------------

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn uncomplete(&mut self, now: DateTime<Utc>) {
        self.is_completed = false;
        self.completed_at = None;
        self.updated_at = now;
    }

    /// Push the due date back. Counts from the existing due date, or from
    /// now when the task had none.
    pub fn postpone(&mut self, days: i64, now: DateTime<Utc>) {
        let base = self.due_date.unwrap_or(now);
        self.due_date = Some(base + Duration::days(days));
        self.updated_at = now;
    }

    pub fn snooze(&mut self, until: DateTime<Utc>, now: DateTime<Utc>) {
        self.is_snoozed = true;
        self.snooze_until = Some(until);
        self.updated_at = now;
    }

    pub fn unsnooze(&mut self, now: DateTime<Utc>) {
        self.is_snoozed = false;
        self.snooze_until = None;
        self.updated_at = now;
    }

    pub fn archive(&mut self, now: DateTime<Utc>) {
        self.is_archived = true;
        self.updated_at = now;
    }

    // --- predicates ------------------------------------------------------

    /// Past due and not due today. Completed tasks are never overdue.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        if self.is_completed {
            return false;
        }
        match self.due_date {
            Some(due) => clock::is_past_day(due, now),
            None => false,
        }
    }

    pub fn is_due_today(&self, now: DateTime<Utc>) -> bool {
        if self.is_completed {
            return false;
        }
        match self.due_date {
            Some(due) => clock::same_day(due, now),
            None => false,
        }
    }

    /// Snoozed with a snooze-until instant that has not yet passed.
    pub fn snooze_active(&self, now: DateTime<Utc>) -> bool {
        self.is_snoozed && self.snooze_until.map(|u| u > now).unwrap_or(false)
    }

    /// Candidate for reminder inclusion: not completed, not archived,
    /// not currently snoozed.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && !self.is_archived && !self.snooze_active(now)
    }
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong,
    #[error("description exceeds {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong,
    #[error("unknown priority: {0}")]
    UnknownPriority(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// User input for "add task". Validated before any store mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub categories: Vec<Category>,
    pub reminder_frequency: Option<ReminderFrequency>,
}

impl CreateTaskInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong);
        }
        if let Some(desc) = &self.description {
            if desc.trim().chars().count() > MAX_DESCRIPTION_LEN {
                return Err(ValidationError::DescriptionTooLong);
            }
        }
        Ok(())
    }

    /// Build the task, trimming text fields and deriving the cadence from
    /// the due date when none was given explicitly.
    pub fn into_task(self, id: impl Into<String>, now: DateTime<Utc>) -> Result<Task, ValidationError> {
        self.validate()?;

        let frequency = self
            .reminder_frequency
            .unwrap_or_else(|| determine_frequency(self.due_date, now));

        let mut task = Task::new(id, self.title.trim(), now);
        task.description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        task.due_date = self.due_date;
        task.priority = self.priority;
        task.categories = self.categories;
        task.reminder_frequency = frequency;
        Ok(task)
    }
}

// --- list helpers --------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Completed,
    All,
}

pub fn filter_by_status(tasks: &[Task], status: StatusFilter) -> Vec<Task> {
    match status {
        StatusFilter::All => tasks.to_vec(),
        StatusFilter::Completed => tasks.iter().filter(|t| t.is_completed).cloned().collect(),
        StatusFilter::Active => tasks.iter().filter(|t| !t.is_completed).cloned().collect(),
    }
}

pub fn sort_by_priority(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by_key(|t| t.priority);
    sorted
}

/// App list order: uncompleted first, newest created first within a group.
pub fn sort_for_display(tasks: &[Task]) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        a.is_completed
            .cmp(&b.is_completed)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    sorted
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

pub fn count_by_priority(tasks: &[Task]) -> PriorityCounts {
    let mut counts = PriorityCounts::default();
    for t in tasks {
        match t.priority {
            Priority::High => counts.high += 1,
            Priority::Medium => counts.medium += 1,
            Priority::Low => counts.low += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn complete_and_uncomplete_keep_completed_at_in_sync() {
        let now = at(2026, 5, 1, 10, 0);
        let mut t = Task::new("t1", "write report", now);
        assert!(!t.is_completed && t.completed_at.is_none());

        t.complete(at(2026, 5, 1, 12, 0));
        assert!(t.is_completed);
        assert_eq!(t.completed_at, Some(at(2026, 5, 1, 12, 0)));

        t.uncomplete(at(2026, 5, 1, 13, 0));
        assert!(!t.is_completed && t.completed_at.is_none());
    }

    #[test]
    fn overdue_excludes_today_and_completed() {
        let now = at(2026, 5, 10, 12, 0);

        let yesterday = Task::new("t1", "a", now).with_due_date(at(2026, 5, 9, 18, 0));
        assert!(yesterday.is_overdue(now));
        assert!(!yesterday.is_due_today(now));

        let this_morning = Task::new("t2", "b", now).with_due_date(at(2026, 5, 10, 8, 0));
        assert!(!this_morning.is_overdue(now));
        assert!(this_morning.is_due_today(now));

        let mut done = Task::new("t3", "c", now).with_due_date(at(2026, 5, 1, 9, 0));
        done.complete(now);
        assert!(!done.is_overdue(now));
        assert!(!done.is_due_today(now));

        let no_due = Task::new("t4", "d", now);
        assert!(!no_due.is_overdue(now));
    }

    #[test]
    fn snooze_window_controls_eligibility() {
        let now = at(2026, 5, 10, 12, 0);
        let mut t = Task::new("t1", "a", now);
        assert!(t.is_eligible(now));

        t.snooze(at(2026, 5, 10, 13, 0), now);
        assert!(t.snooze_active(now));
        assert!(!t.is_eligible(now));

        // Snooze that already elapsed no longer excludes the task.
        t.snooze(at(2026, 5, 10, 11, 0), now);
        assert!(!t.snooze_active(now));
        assert!(t.is_eligible(now));
    }

    #[test]
    fn archived_tasks_are_not_eligible() {
        let now = at(2026, 5, 10, 12, 0);
        let mut t = Task::new("t1", "a", now);
        t.archive(now);
        assert!(!t.is_eligible(now));
    }

    #[test]
    fn frequency_boundary_at_seven_days() {
        let now = at(2026, 5, 10, 12, 0);
        assert_eq!(
            determine_frequency(Some(now + Duration::days(3)), now),
            ReminderFrequency::Daily
        );
        assert_eq!(
            determine_frequency(Some(now + Duration::days(7)), now),
            ReminderFrequency::Daily
        );
        assert_eq!(
            determine_frequency(Some(now + Duration::days(7) + Duration::hours(1)), now),
            ReminderFrequency::Weekly
        );
        assert_eq!(determine_frequency(None, now), ReminderFrequency::Weekly);
    }

    #[test]
    fn postpone_counts_from_due_date_or_now() {
        let now = at(2026, 5, 10, 12, 0);
        let mut with_due = Task::new("t1", "a", now).with_due_date(at(2026, 5, 12, 9, 0));
        with_due.postpone(3, now);
        assert_eq!(with_due.due_date, Some(at(2026, 5, 15, 9, 0)));

        let mut without = Task::new("t2", "b", now);
        without.postpone(2, now);
        assert_eq!(without.due_date, Some(at(2026, 5, 12, 12, 0)));
    }

    #[test]
    fn validation_boundaries() {
        let input = |title: String, description: Option<String>| CreateTaskInput {
            title,
            description,
            due_date: None,
            priority: Priority::Medium,
            categories: vec![],
            reminder_frequency: None,
        };

        assert_eq!(
            input("   ".to_string(), None).validate(),
            Err(ValidationError::EmptyTitle)
        );
        assert!(input("x".repeat(100), None).validate().is_ok());
        assert_eq!(
            input("x".repeat(101), None).validate(),
            Err(ValidationError::TitleTooLong)
        );
        assert!(input("ok".to_string(), Some("d".repeat(500))).validate().is_ok());
        assert_eq!(
            input("ok".to_string(), Some("d".repeat(501))).validate(),
            Err(ValidationError::DescriptionTooLong)
        );
    }

    #[test]
    fn into_task_trims_and_derives_frequency() {
        let now = at(2026, 5, 10, 12, 0);
        let task = CreateTaskInput {
            title: "  appeler le dentiste  ".to_string(),
            description: Some("   ".to_string()),
            due_date: Some(now + Duration::days(2)),
            priority: Priority::High,
            categories: vec![Category::Sante],
            reminder_frequency: None,
        }
        .into_task("t1", now)
        .unwrap();

        assert_eq!(task.title, "appeler le dentiste");
        assert_eq!(task.description, None);
        assert_eq!(task.reminder_frequency, ReminderFrequency::Daily);
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
    }

    #[test]
    fn display_order_puts_uncompleted_newest_first() {
        let now = at(2026, 5, 10, 12, 0);
        let older = Task::new("t1", "old", at(2026, 5, 1, 9, 0));
        let newer = Task::new("t2", "new", at(2026, 5, 8, 9, 0));
        let mut done = Task::new("t3", "done", at(2026, 5, 9, 9, 0));
        done.complete(now);

        let sorted = sort_for_display(&[older, done, newer]);
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t1", "t3"]);
    }

    #[test]
    fn category_serde_uses_french_labels() {
        let json = serde_json::to_string(&Category::Sante).unwrap();
        assert_eq!(json, "\"Santé\"");
        let back: Category = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Category::Sante);
    }

    #[test]
    fn parse_priority_and_category() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("Basse".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("santé".parse::<Category>().unwrap(), Category::Sante);
        assert_eq!("sante".parse::<Category>().unwrap(), Category::Sante);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
