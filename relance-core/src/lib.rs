//! relance-core: task model, calendar utilities and weekly statistics.

pub mod clock;
pub mod stats;
pub mod store;
pub mod task;

pub use stats::{WeeklyStats, compute_weekly_stats, congratulations_message};
pub use store::TaskStore;
pub use task::{
    CATEGORIES, Category, CreateTaskInput, MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, Priority,
    PriorityCounts, ReminderFrequency, StatusFilter, Task, ValidationError, count_by_priority,
    determine_frequency, filter_by_status, sort_by_priority, sort_for_display,
};
