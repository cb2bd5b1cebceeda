//! File-backed task store: one JSON document holding every task.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use relance_core::store::TaskStore;
use relance_core::task::Task;

pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        if s.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&s).context("parse tasks.json")?)
    }

    fn save(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, json).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn all(&self) -> Result<Vec<Task>> {
        self.load()
    }

    async fn active(&self) -> Result<Vec<Task>> {
        Ok(self.load()?.into_iter().filter(|t| !t.is_archived).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.load()?.into_iter().find(|t| t.id == id))
    }

    async fn insert(&self, task: Task) -> Result<()> {
        let mut tasks = self.load()?;
        tasks.push(task);
        self.save(&tasks)
    }

    async fn update(&self, task: Task) -> Result<()> {
        let mut tasks = self.load()?;
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => anyhow::bail!("no task with id {}", task.id),
        }
        self.save(&tasks)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tasks = self.load()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            anyhow::bail!("no task with id {id}");
        }
        self.save(&tasks)
    }

    async fn archive_completed(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut tasks = self.load()?;
        let mut archived = 0;
        for t in tasks.iter_mut() {
            if t.is_completed && !t.is_archived {
                t.archive(now);
                archived += 1;
            }
        }
        self.save(&tasks)?;
        Ok(archived)
    }
}
