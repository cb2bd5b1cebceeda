use anyhow::Result;
use chrono::Utc;
use chrono_tz::Tz;
use clap::Subcommand;

use relance_core::store::TaskStore;
use relance_notify::config::ReminderConfig;
use relance_notify::scheduler::ReminderScheduler;
use relance_notify::sink::NotificationSink;

use crate::config::{FilePrefs, load_config};
use crate::queue::FileSink;
use crate::state::{pending_notifications_path, tasks_path};
use crate::store::JsonTaskStore;

#[derive(Subcommand, Debug)]
pub enum RemindCommand {
    /// Recompute the grouped reminder from the current task list
    Replan,

    /// Send a test notification (fires in 5 seconds)
    Test,

    /// Cancel every pending notification
    Cancel,

    /// Show the pending notification queue
    Status,
}

pub async fn run(cmd: RemindCommand) -> Result<()> {
    match cmd {
        RemindCommand::Replan => {
            let eligible = replan_now().await?;
            println!("Replan complete: {eligible} tâche(s) éligible(s)");
        }

        RemindCommand::Test => {
            let scheduler = ReminderScheduler::new(FileSink::new(pending_notifications_path()?));
            scheduler.send_test_notification(Utc::now()).await?;
            println!("Notification de test planifiée dans 5 secondes");
        }

        RemindCommand::Cancel => {
            let mut scheduler =
                ReminderScheduler::new(FileSink::new(pending_notifications_path()?));
            scheduler.cancel_all().await;
            println!("Toutes les notifications annulées");
        }

        RemindCommand::Status => {
            let sink = FileSink::new(pending_notifications_path()?);
            let pending = sink.list_pending().await?;
            if pending.is_empty() {
                println!("No pending notifications.");
                return Ok(());
            }
            for (i, entry) in pending.iter().enumerate() {
                let kind = if entry.meta.grouped { "groupée" } else { "tâche" };
                println!(
                    "{}. [{kind}] {} at {}",
                    i + 1,
                    entry.title,
                    entry.trigger_at.to_rfc3339()
                );
            }
            println!("\nQueue: {} pending", pending.len());
        }
    }

    Ok(())
}

/// Load settings and run a full replan over the live task list.
/// Returns the eligible-task count the scheduler published.
pub async fn replan_now() -> Result<usize> {
    let config = reminder_config().await?;
    let store = JsonTaskStore::new(tasks_path()?);
    let tasks = store.active().await?;

    let mut scheduler = ReminderScheduler::new(FileSink::new(pending_notifications_path()?));
    scheduler.replan(&tasks, &config, Utc::now()).await;
    Ok(scheduler.active_count())
}

async fn reminder_config() -> Result<ReminderConfig> {
    let cfg = load_config()?;
    let tz: Tz = cfg
        .reminders
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {}", cfg.reminders.timezone))?;
    ReminderConfig::from_prefs(&FilePrefs, tz).await
}
