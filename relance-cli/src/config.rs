use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use relance_notify::config::{Preferences, keys, parse_hhmm};

use crate::state::ensure_relance_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub reminders: RemindersSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersSection {
    /// "HH:MM" wall-clock slot for the daily grouped reminder.
    pub time: String,
    pub enabled: bool,
    /// IANA timezone the reminder slot is anchored in.
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub email: Option<String>,
    /// 0 = dimanche .. 6 = samedi.
    pub day: u8,
    pub time: String,
    pub enabled: bool,
    pub from: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reminders: RemindersSection {
                time: "17:00".to_string(),
                enabled: true,
                timezone: "Europe/Paris".to_string(),
            },
            report: ReportSection {
                email: None,
                day: 0,
                time: "09:00".to_string(),
                enabled: true,
                from: "noreply@relance.app".to_string(),
            },
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_relance_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn config_check() -> Result<()> {
    let cfg = load_config()?;

    println!("Reminder config:\n");
    println!("- time: {}", cfg.reminders.time);
    println!("- enabled: {}", cfg.reminders.enabled);
    println!("- timezone: {}", cfg.reminders.timezone);
    println!("\nWeekly report config:\n");
    println!("- email: {}", cfg.report.email.as_deref().unwrap_or("<not set>"));
    println!("- day: {} (0 = dimanche)", cfg.report.day);
    println!("- time: {}", cfg.report.time);
    println!("- enabled: {}", cfg.report.enabled);
    println!("- from: {}", cfg.report.from);

    if cfg.report.email.is_none() {
        println!("\nWhat to configure next:");
        println!("Set ~/.relance/config.toml:");
        println!("[report]");
        println!("email = \"vous@example.com\"");
        println!("day = 0");
        println!("time = \"09:00\"");
        println!("enabled = true");
        println!("from = \"noreply@relance.app\"");
        println!("\nAnd export RESEND_API_KEY for delivery.");
    }

    Ok(())
}

/// Preference store backed by config.toml, keyed like the mobile app's
/// key-value storage.
pub struct FilePrefs;

#[async_trait]
impl Preferences for FilePrefs {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let cfg = load_config()?;
        Ok(match key {
            keys::REMINDER_TIME => Some(cfg.reminders.time),
            keys::NOTIFICATIONS_ENABLED => Some(cfg.reminders.enabled.to_string()),
            keys::USER_EMAIL => cfg.report.email,
            keys::WEEKLY_REPORT_DAY => Some(cfg.report.day.to_string()),
            keys::WEEKLY_REPORT_TIME => Some(cfg.report.time),
            keys::WEEKLY_REPORT_ENABLED => Some(cfg.report.enabled.to_string()),
            _ => None,
        })
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut cfg = load_config()?;
        match key {
            keys::REMINDER_TIME => {
                parse_hhmm(value)?;
                cfg.reminders.time = value.to_string();
            }
            keys::NOTIFICATIONS_ENABLED => {
                cfg.reminders.enabled = value.parse().context("expected true/false")?;
            }
            keys::USER_EMAIL => {
                cfg.report.email = Some(value.to_string()).filter(|v| !v.trim().is_empty());
            }
            keys::WEEKLY_REPORT_DAY => {
                let day: u8 = value.parse().context("expected 0-6")?;
                if day > 6 {
                    bail!("weekly report day out of range: {day}");
                }
                cfg.report.day = day;
            }
            keys::WEEKLY_REPORT_TIME => {
                parse_hhmm(value)?;
                cfg.report.time = value.to_string();
            }
            keys::WEEKLY_REPORT_ENABLED => {
                cfg.report.enabled = value.parse().context("expected true/false")?;
            }
            other => bail!("unknown preference key: {other}"),
        }
        save_config(&cfg)
    }
}
