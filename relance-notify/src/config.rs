//! Scheduler configuration and the preference-store boundary.
//!
//! Settings are threaded into `replan` explicitly instead of being read
//! inside the scheduler, so planning stays deterministic under test.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono_tz::Tz;

/// Preference keys, string-encoded as the app stores them.
pub mod keys {
    pub const REMINDER_TIME: &str = "reminderTime";
    pub const NOTIFICATIONS_ENABLED: &str = "notificationsEnabled";
    pub const USER_EMAIL: &str = "userEmail";
    pub const WEEKLY_REPORT_DAY: &str = "weeklyReportDay";
    pub const WEEKLY_REPORT_TIME: &str = "weeklyReportTime";
    pub const WEEKLY_REPORT_ENABLED: &str = "weeklyReportEnabled";
}

/// Simple key-value settings storage ("HH:MM" strings, booleans as
/// "true"/"false").
#[async_trait]
pub trait Preferences: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Configured reminder slot, default 17:00.
    async fn reminder_time(&self) -> Result<(u32, u32)> {
        match self.get(keys::REMINDER_TIME).await? {
            Some(raw) => parse_hhmm(&raw),
            None => Ok((17, 0)),
        }
    }

    /// Enabled unless explicitly stored as "false".
    async fn notifications_enabled(&self) -> Result<bool> {
        Ok(self.get(keys::NOTIFICATIONS_ENABLED).await?.as_deref() != Some("false"))
    }

    async fn user_email(&self) -> Result<Option<String>> {
        Ok(self.get(keys::USER_EMAIL).await?.filter(|v| !v.trim().is_empty()))
    }

    /// Weekly report day, 0 = Sunday. Default Sunday.
    async fn weekly_report_day(&self) -> Result<u8> {
        match self.get(keys::WEEKLY_REPORT_DAY).await? {
            Some(raw) => {
                let day: u8 = raw.trim().parse()?;
                if day > 6 {
                    bail!("weekly report day out of range: {day}");
                }
                Ok(day)
            }
            None => Ok(0),
        }
    }

    /// Weekly report slot, default 09:00.
    async fn weekly_report_time(&self) -> Result<(u32, u32)> {
        match self.get(keys::WEEKLY_REPORT_TIME).await? {
            Some(raw) => parse_hhmm(&raw),
            None => Ok((9, 0)),
        }
    }

    async fn weekly_report_enabled(&self) -> Result<bool> {
        Ok(self.get(keys::WEEKLY_REPORT_ENABLED).await?.as_deref() != Some("false"))
    }
}

/// Parse a "HH:MM" wall-clock string.
pub fn parse_hhmm(raw: &str) -> Result<(u32, u32)> {
    let mut parts = raw.trim().split(':');
    let (Some(h), Some(m), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("invalid time '{raw}': expected HH:MM");
    };
    let hour: u32 = h.parse().map_err(|_| anyhow::anyhow!("invalid hour in '{raw}'"))?;
    let minute: u32 = m.parse().map_err(|_| anyhow::anyhow!("invalid minute in '{raw}'"))?;
    if hour > 23 || minute > 59 {
        bail!("time out of range: '{raw}'");
    }
    Ok((hour, minute))
}

/// Everything `replan` needs to know about settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    pub hour: u32,
    pub minute: u32,
    pub enabled: bool,
    /// Timezone the "today at HH:MM" slot is anchored in.
    pub tz: Tz,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            hour: 17,
            minute: 0,
            enabled: true,
            tz: chrono_tz::UTC,
        }
    }
}

impl ReminderConfig {
    pub async fn from_prefs<P: Preferences + ?Sized>(prefs: &P, tz: Tz) -> Result<Self> {
        let (hour, minute) = prefs.reminder_time().await?;
        let enabled = prefs.notifications_enabled().await?;
        Ok(Self { hour, minute, enabled, tz })
    }
}
