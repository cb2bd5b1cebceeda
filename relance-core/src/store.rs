//! Task store boundary. The hosted database is out of scope; consumers see
//! this trait and receive immutable snapshots from it.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::task::Task;

/// Persistent task collection, keyed by task id.
///
/// The scheduler and the statistics engine never hold a store; callers query
/// a snapshot here and pass it on.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task, archived included. This is the statistics input.
    async fn all(&self) -> Result<Vec<Task>>;

    /// Non-archived tasks, the live collection the app works with.
    async fn active(&self) -> Result<Vec<Task>>;

    async fn get(&self, id: &str) -> Result<Option<Task>>;

    async fn insert(&self, task: Task) -> Result<()>;

    /// Replace the stored task with the same id.
    async fn update(&self, task: Task) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Archive every completed task (weekly report housekeeping).
    /// Returns how many tasks were archived.
    async fn archive_completed(&self, now: DateTime<Utc>) -> Result<usize>;
}
