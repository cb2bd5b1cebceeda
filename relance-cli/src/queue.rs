//! Local notification queue: a JSON file standing in for the OS scheduling
//! primitive. Permissions are always granted here; the real device sink is
//! the mobile shell's concern.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

use relance_notify::sink::{NotificationEntry, NotificationSink};

pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<Vec<NotificationEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&s).context("parse pending notifications")?)
    }

    fn save(&self, entries: &[NotificationEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for FileSink {
    async fn request_permission(&self) -> Result<bool> {
        Ok(true)
    }

    async fn check_permission(&self) -> Result<bool> {
        Ok(true)
    }

    async fn schedule(&self, entries: Vec<NotificationEntry>) -> Result<()> {
        let mut pending = self.load()?;
        for entry in entries {
            // Same id replaces the existing slot.
            pending.retain(|p| p.id != entry.id);
            pending.push(entry);
        }
        pending.sort_by_key(|p| p.trigger_at);
        self.save(&pending)
    }

    async fn list_pending(&self) -> Result<Vec<NotificationEntry>> {
        self.load()
    }

    async fn cancel(&self, ids: &[i32]) -> Result<()> {
        let mut pending = self.load()?;
        pending.retain(|p| !ids.contains(&p.id));
        self.save(&pending)
    }
}
