//! relance-notify: reminder planning over an abstract notification sink.

pub mod config;
pub mod scheduler;
pub mod sink;

pub use config::{Preferences, ReminderConfig, parse_hhmm};
pub use scheduler::{ReminderScheduler, next_daily_trigger, next_weekly_trigger};
pub use sink::{
    GROUPED_REMINDER_ID, NotificationEntry, NotificationMeta, NotificationSink,
    TEST_NOTIFICATION_ID, derive_reminder_id,
};
