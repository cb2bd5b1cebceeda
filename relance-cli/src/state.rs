use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn relance_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".relance"))
}

pub fn ensure_relance_home() -> Result<PathBuf> {
    let dir = relance_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn tasks_path() -> Result<PathBuf> {
    Ok(ensure_relance_home()?.join("tasks.json"))
}

pub fn pending_notifications_path() -> Result<PathBuf> {
    Ok(ensure_relance_home()?.join("notifications").join("pending.json"))
}
