//! Reminder scheduler: cancel-and-recompute planning over a task snapshot.
//!
//! `replan` is idempotent and total. It never propagates sink failures;
//! scheduling is best-effort and the next replan cycle corrects any drift.
//! Concurrent replans converge last-caller-wins because each call fully
//! recomputes the pending set from its snapshot.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{info, warn};

use relance_core::task::{ReminderFrequency, Task, determine_frequency};

use crate::config::ReminderConfig;
use crate::sink::{
    GROUPED_REMINDER_ID, NotificationEntry, NotificationMeta, NotificationSink,
    TEST_NOTIFICATION_ID, derive_reminder_id,
};

/// How many listed tasks the grouped digest body shows before truncating.
const GROUPED_BODY_LIMIT: usize = 5;

pub struct ReminderScheduler<S: NotificationSink> {
    sink: S,
    active_count: usize,
}

impl<S: NotificationSink> ReminderScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, active_count: 0 }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Eligible-task count published by the last replan, for badge display.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Recompute the authoritative reminder set from a task snapshot.
    ///
    /// Cancels every pending notification first, then schedules one grouped
    /// digest for the eligible tasks. Safe to call repeatedly with the same
    /// inputs; the pending set converges to the same single entry.
    pub async fn replan(&mut self, tasks: &[Task], config: &ReminderConfig, now: DateTime<Utc>) {
        if !self.ensure_permission().await {
            info!("notification permission not granted; replan skipped");
            return;
        }

        // Cancel-phase must finish before anything new is scheduled.
        self.cancel_all_pending().await;

        if !config.enabled {
            self.active_count = 0;
            return;
        }

        let eligible: Vec<&Task> = tasks.iter().filter(|t| t.is_eligible(now)).collect();
        self.active_count = eligible.len();

        if eligible.is_empty() {
            return;
        }

        let Some(trigger_at) = next_daily_trigger(now, config.hour, config.minute, config.tz)
        else {
            warn!("no valid trigger instant for {:02}:{:02}", config.hour, config.minute);
            return;
        };

        let entry = grouped_notification(&eligible, trigger_at);
        match self.sink.schedule(vec![entry]).await {
            Ok(()) => info!(
                "scheduled grouped reminder for {} task(s) at {}",
                eligible.len(),
                trigger_at
            ),
            Err(e) => warn!("failed to schedule grouped reminder: {e:#}"),
        }
    }

    /// Plan a single task's reminder (the finer-grained alternative to the
    /// grouped flow). Cadence is re-derived from the due date, not read from
    /// the stored frequency.
    pub async fn schedule_one(&self, task: &Task, config: &ReminderConfig, now: DateTime<Utc>) {
        if !config.enabled || !task.is_eligible(now) {
            return;
        }

        let cadence = determine_frequency(task.due_date, now);
        let trigger = match cadence {
            ReminderFrequency::Daily => {
                next_daily_trigger(now, config.hour, config.minute, config.tz)
            }
            ReminderFrequency::Weekly => {
                // Weekly reminders stay on the 7-day grid anchored at the
                // last send, or at creation when nothing was sent yet.
                let anchor = task.last_reminder_sent.unwrap_or(task.created_at);
                next_weekly_trigger(anchor, now, config.hour, config.minute, config.tz)
            }
        };

        let Some(trigger_at) = trigger else {
            warn!("no valid trigger instant for task {}", task.id);
            return;
        };

        let title = match cadence {
            ReminderFrequency::Daily => "🔔 Rappel quotidien",
            ReminderFrequency::Weekly => "📅 Rappel hebdomadaire",
        };

        let entry = NotificationEntry {
            id: derive_reminder_id(&task.id),
            title: title.to_string(),
            body: format!("Tâche: {}", task.title),
            trigger_at,
            allow_while_idle: true,
            meta: NotificationMeta {
                task_id: Some(task.id.clone()),
                grouped: false,
            },
        };

        match self.sink.schedule(vec![entry]).await {
            Ok(()) => info!("scheduled reminder for \"{}\" at {}", task.title, trigger_at),
            Err(e) => warn!("failed to schedule reminder for task {}: {e:#}", task.id),
        }
    }

    /// Fire a test notification a few seconds out. Unlike planning, a
    /// permission refusal here is an error the caller surfaces.
    pub async fn send_test_notification(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        if !self.ensure_permission().await {
            anyhow::bail!("notification permission refused");
        }

        let entry = NotificationEntry {
            id: TEST_NOTIFICATION_ID,
            title: "✅ Notification de test".to_string(),
            body: "Les notifications fonctionnent correctement ! 🎉".to_string(),
            trigger_at: now + Duration::seconds(5),
            allow_while_idle: true,
            meta: NotificationMeta::default(),
        };

        self.sink.schedule(vec![entry]).await
    }

    /// Drop every pending reminder and reset the observable count.
    pub async fn cancel_all(&mut self) {
        self.cancel_all_pending().await;
        self.active_count = 0;
    }

    async fn ensure_permission(&self) -> bool {
        match self.sink.check_permission().await {
            Ok(true) => true,
            Ok(false) => match self.sink.request_permission().await {
                Ok(granted) => granted,
                Err(e) => {
                    warn!("permission request failed: {e:#}");
                    false
                }
            },
            Err(e) => {
                warn!("permission check failed: {e:#}");
                false
            }
        }
    }

    async fn cancel_all_pending(&self) {
        let pending = match self.sink.list_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("failed to list pending notifications: {e:#}");
                return;
            }
        };

        if pending.is_empty() {
            return;
        }

        let ids: Vec<i32> = pending.iter().map(|n| n.id).collect();
        if let Err(e) = self.sink.cancel(&ids).await {
            warn!("failed to cancel {} pending notification(s): {e:#}", ids.len());
        }
    }
}

/// Single digest entry summarizing the eligible tasks: count in the title,
/// first few titles as bullets, "... et N autre(s)" past the cap.
fn grouped_notification(eligible: &[&Task], trigger_at: DateTime<Utc>) -> NotificationEntry {
    let count = eligible.len();
    let title = format!(
        "📋 {count} tâche{} en attente",
        if count > 1 { "s" } else { "" }
    );

    let mut body = eligible
        .iter()
        .take(GROUPED_BODY_LIMIT)
        .map(|t| format!("• {}", t.title))
        .collect::<Vec<_>>()
        .join("\n");

    let extra = count.saturating_sub(GROUPED_BODY_LIMIT);
    if extra > 0 {
        body.push_str(&format!(
            "\n... et {extra} autre{}",
            if extra > 1 { "s" } else { "" }
        ));
    }

    NotificationEntry {
        id: GROUPED_REMINDER_ID,
        title,
        body,
        trigger_at,
        allow_while_idle: true,
        meta: NotificationMeta {
            task_id: None,
            grouped: true,
        },
    }
}

/// Today at `hour:minute` in `tz`, or the next day when that instant is not
/// strictly in the future. Skips calendar days the slot does not exist on
/// (DST gap); ambiguous times resolve to the earlier instant.
pub fn next_daily_trigger(
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
    tz: Tz,
) -> Option<DateTime<Utc>> {
    let today = now.with_timezone(&tz).date_naive();
    for offset in 0..3 {
        let day = today + Duration::days(offset);
        if let Some(candidate) = local_instant(tz, day, hour, minute) {
            if candidate > now {
                return Some(candidate);
            }
        }
    }
    None
}

/// First instant on the anchor's 7-day grid strictly after now, at
/// `hour:minute` in `tz`. Jumps whole weeks instead of stepping one at a
/// time, so anchors far in the past stay cheap.
pub fn next_weekly_trigger(
    anchor: DateTime<Utc>,
    now: DateTime<Utc>,
    hour: u32,
    minute: u32,
    tz: Tz,
) -> Option<DateTime<Utc>> {
    let first = anchor.with_timezone(&tz).date_naive() + Duration::days(7);
    let today = now.with_timezone(&tz).date_naive();

    let mut target = first;
    if target < today {
        let whole_weeks = (today - target).num_days() / 7;
        target += Duration::days(whole_weeks * 7);
    }

    // At most two more steps: the jump lands within a week of today, and a
    // DST gap can invalidate one slot.
    for _ in 0..3 {
        if let Some(candidate) = local_instant(tz, target, hour, minute) {
            if candidate > now {
                return Some(candidate);
            }
        }
        target += Duration::days(7);
    }
    None
}

fn local_instant(tz: Tz, day: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(hour, minute, 0)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
