//! Notification sink boundary and reminder identifiers.
//!
//! The device/OS notification queue is the only shared mutable resource in
//! the system and it is owned exclusively by the scheduler; nothing else may
//! enqueue or cancel entries.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved id for the single grouped daily digest notification.
pub const GROUPED_REMINDER_ID: i32 = 999_999;

/// Reserved id for the ad-hoc "do notifications work" test notification.
pub const TEST_NOTIFICATION_ID: i32 = 999_998;

/// Derived per-task ids start here, keeping them disjoint from the
/// sentinels above.
const DERIVED_ID_FLOOR: i64 = 1_000_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMeta {
    pub task_id: Option<String>,
    /// Marks the grouped digest so notification-open handling can branch.
    pub grouped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntry {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub trigger_at: DateTime<Utc>,
    pub allow_while_idle: bool,
    pub meta: NotificationMeta,
}

/// Device-level notification scheduling primitive.
///
/// Identifiers are 32-bit; scheduling an id that is already pending replaces
/// that entry, which is what makes per-task replanning safe to repeat.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn request_permission(&self) -> Result<bool>;

    async fn check_permission(&self) -> Result<bool>;

    async fn schedule(&self, entries: Vec<NotificationEntry>) -> Result<()>;

    async fn list_pending(&self) -> Result<Vec<NotificationEntry>>;

    async fn cancel(&self, ids: &[i32]) -> Result<()>;
}

/// Deterministic reminder id for a task.
///
/// FNV-1a over the task id, folded into [1_000_000, i32::MAX). Stable across
/// runs, so replanning a task always targets the same notification slot, and
/// wide enough that distinct ids do not collide the way truncating the
/// digits of a uuid would.
pub fn derive_reminder_id(task_id: &str) -> i32 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in task_id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    let span = (i32::MAX as i64 - DERIVED_ID_FLOOR) as u64;
    (DERIVED_ID_FLOOR + (hash % span) as i64) as i32
}
