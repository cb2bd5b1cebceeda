use anyhow::{Result, bail};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use clap::Subcommand;
use uuid::Uuid;

use relance_core::store::TaskStore;
use relance_core::task::{
    Category, CreateTaskInput, Priority, StatusFilter, Task, filter_by_status, sort_for_display,
};

use crate::config::load_config;
use crate::remind_cmd::replan_now;
use crate::state::tasks_path;
use crate::store::JsonTaskStore;

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Due date in local time: "YYYY-MM-DD" (end of day) or "YYYY-MM-DD HH:MM"
        #[arg(long)]
        due: Option<String>,

        /// high | medium | low
        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Category, repeatable (maison, travail, courses, personnel, santé, loisirs)
        #[arg(long = "category")]
        categories: Vec<Category>,
    },

    /// List tasks
    List {
        /// active | completed | all
        #[arg(long, default_value = "active")]
        status: String,
    },

    /// Mark a task completed
    Complete { id: String },

    /// Undo a completion
    Uncomplete { id: String },

    /// Push the due date back by N days
    Postpone {
        id: String,

        #[arg(long, default_value_t = 1)]
        days: i64,
    },

    /// Silence reminders for a task for N hours
    Snooze {
        id: String,

        #[arg(long, default_value_t = 24)]
        hours: i64,
    },

    /// Delete a task
    Delete { id: String },
}

pub async fn run(cmd: TaskCommand) -> Result<()> {
    let store = JsonTaskStore::new(tasks_path()?);
    let now = Utc::now();

    match cmd {
        TaskCommand::Add {
            title,
            description,
            due,
            priority,
            categories,
        } => {
            let tz = local_timezone()?;
            let due_date = due.as_deref().map(|d| parse_due(d, tz)).transpose()?;

            let input = CreateTaskInput {
                title,
                description,
                due_date,
                priority,
                categories,
                reminder_frequency: None,
            };
            let task = input
                .into_task(Uuid::new_v4().to_string(), now)
                .map_err(|e| anyhow::anyhow!("invalid task: {e}"))?;

            let id = task.id.clone();
            let frequency = task.reminder_frequency;
            store.insert(task).await?;
            println!("Added task {id} (rappel {frequency:?})");
            replan_quietly().await;
        }

        TaskCommand::List { status } => {
            let filter = parse_status(&status)?;
            let tasks = store.active().await?;
            let visible = sort_for_display(&filter_by_status(&tasks, filter));

            if visible.is_empty() {
                println!("No tasks.");
                return Ok(());
            }
            for t in &visible {
                print_task(t, now);
            }
            let open = tasks.iter().filter(|t| !t.is_completed).count();
            println!("\n{} task(s), {} open", tasks.len(), open);
        }

        TaskCommand::Complete { id } => {
            let mut task = find(&store, &id).await?;
            task.complete(now);
            let title = task.title.clone();
            store.update(task).await?;
            println!("Completed: {title}");
            replan_quietly().await;
        }

        TaskCommand::Uncomplete { id } => {
            let mut task = find(&store, &id).await?;
            task.uncomplete(now);
            let title = task.title.clone();
            store.update(task).await?;
            println!("Reopened: {title}");
            replan_quietly().await;
        }

        TaskCommand::Postpone { id, days } => {
            let mut task = find(&store, &id).await?;
            task.postpone(days, now);
            let due = task.due_date;
            store.update(task).await?;
            match due {
                Some(d) => println!("Postponed to {}", d.format("%Y-%m-%d %H:%M")),
                None => println!("Postponed."),
            }
            replan_quietly().await;
        }

        TaskCommand::Snooze { id, hours } => {
            let mut task = find(&store, &id).await?;
            let until = now + Duration::hours(hours);
            task.snooze(until, now);
            let title = task.title.clone();
            store.update(task).await?;
            println!("Snoozed \"{title}\" until {}", until.format("%Y-%m-%d %H:%M"));
            replan_quietly().await;
        }

        TaskCommand::Delete { id } => {
            let task = find(&store, &id).await?;
            store.delete(&task.id).await?;
            println!("Deleted: {}", task.title);
            replan_quietly().await;
        }
    }

    Ok(())
}

/// Accept a full id or an unambiguous prefix.
async fn find(store: &JsonTaskStore, id: &str) -> Result<Task> {
    if let Some(task) = store.get(id).await? {
        return Ok(task);
    }
    let matches: Vec<Task> = store
        .active()
        .await?
        .into_iter()
        .filter(|t| t.id.starts_with(id))
        .collect();
    match matches.len() {
        0 => bail!("no task with id {id}"),
        1 => Ok(matches.into_iter().next().expect("one match")),
        n => bail!("id prefix {id} is ambiguous ({n} matches)"),
    }
}

fn parse_status(raw: &str) -> Result<StatusFilter> {
    match raw {
        "active" => Ok(StatusFilter::Active),
        "completed" => Ok(StatusFilter::Completed),
        "all" => Ok(StatusFilter::All),
        other => bail!("unknown status filter: {other} (active | completed | all)"),
    }
}

fn local_timezone() -> Result<Tz> {
    let cfg = load_config()?;
    cfg.reminders
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {}", cfg.reminders.timezone))
}

/// Parse a local due date. A bare date means end of that day.
fn parse_due(raw: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let s = raw.trim();
    let full = if s.len() == 10 {
        format!("{s} 23:59")
    } else {
        s.to_string()
    };

    let ndt = NaiveDateTime::parse_from_str(&full, "%Y-%m-%d %H:%M")
        .map_err(|e| anyhow::anyhow!("invalid due date '{raw}': {e}"))?;

    let local = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow::anyhow!("ambiguous or invalid local time (DST?): {raw} {tz}"))?;

    Ok(local.with_timezone(&Utc))
}

fn print_task(t: &Task, now: DateTime<Utc>) {
    let check = if t.is_completed { "✓" } else { " " };
    let short_id: String = t.id.chars().take(8).collect();

    let mut notes: Vec<String> = Vec::new();
    if t.is_overdue(now) {
        notes.push("en retard".to_string());
    } else if t.is_due_today(now) {
        notes.push("aujourd'hui".to_string());
    } else if let Some(due) = t.due_date {
        notes.push(format!("échéance {}", due.format("%Y-%m-%d")));
    }
    if t.snooze_active(now) {
        notes.push("snoozée".to_string());
    }

    let suffix = if notes.is_empty() {
        String::new()
    } else {
        format!("  ({})", notes.join(", "))
    };

    println!("[{check}] {short_id}  {}  {}{suffix}", t.priority.label(), t.title);
}

async fn replan_quietly() {
    match replan_now().await {
        Ok(eligible) => println!("Rappels replanifiés ({eligible} tâche(s) éligible(s))"),
        Err(e) => tracing::warn!("replan after change failed: {e:#}"),
    }
}
