//! Weekly report dispatch: validate, compute, render, send, archive.
//!
//! Mirrors the hosted endpoint contract: JSON success body on 200,
//! `{ error, message }` with a 4xx/5xx status otherwise. No retries; the
//! next report cycle corrects drift.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use relance_core::stats::{WeeklyStats, compute_weekly_stats};
use relance_core::store::TaskStore;

use crate::email::render_weekly_email;
use crate::error::ReportError;
use crate::resend::EmailSender;

/// One dispatch invocation: cron fires with `test == false`, the settings
/// screen's "send me a test" with `test == true`.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub test: bool,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub api_key: Option<String>,
    pub from: String,
    /// Fallback recipient when the request carries no email.
    pub default_recipient: Option<String>,
}

impl ReportConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("RESEND_API_KEY").ok().filter(|v| !v.is_empty()),
            from: std::env::var("EMAIL_FROM")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "noreply@relance.app".to_string()),
            default_recipient: std::env::var("USER_EMAIL").ok().filter(|v| !v.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
    pub email_id: Option<String>,
    pub stats: WeeklyStats,
}

/// Send the weekly report.
///
/// Validation happens before any side effect: a missing recipient or missing
/// credentials produce an error without an email or archival. A delivery
/// failure also archives nothing. On a successful non-test send, every
/// completed task is archived.
pub async fn send_weekly_report<S, E>(
    store: &S,
    mailer: &E,
    req: &ReportRequest,
    cfg: &ReportConfig,
    now: DateTime<Utc>,
) -> Result<ReportResponse, ReportError>
where
    S: TaskStore,
    E: EmailSender,
{
    let recipient = req
        .email
        .clone()
        .or_else(|| cfg.default_recipient.clone())
        .filter(|e| !e.trim().is_empty())
        .ok_or(ReportError::MissingEmail)?;

    if cfg.api_key.is_none() {
        return Err(ReportError::MissingCredentials);
    }

    let tasks = store
        .all()
        .await
        .map_err(|e| ReportError::Store(format!("{e:#}")))?;

    let stats = compute_weekly_stats(&tasks, now);
    let html = render_weekly_email(&stats, &tasks, now, req.test);

    let subject = if req.test {
        "📧 Test - Bilan Hebdomadaire Relance"
    } else {
        "📊 Votre Bilan Hebdomadaire Relance"
    };

    let email_id = mailer
        .send_email(&cfg.from, &recipient, subject, &html)
        .await
        .map_err(|e| ReportError::Delivery(format!("{e:#}")))?;

    if !req.test {
        let archived = store
            .archive_completed(now)
            .await
            .map_err(|e| ReportError::Store(format!("{e:#}")))?;
        info!("archived {archived} completed task(s) after weekly report");
    }

    Ok(ReportResponse {
        success: true,
        message: if req.test {
            "Test email sent successfully".to_string()
        } else {
            "Weekly report sent successfully".to_string()
        },
        email_id: Some(email_id),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use relance_core::task::Task;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    struct MemoryStore {
        tasks: Mutex<Vec<Task>>,
        archive_calls: AtomicUsize,
    }

    impl MemoryStore {
        fn new(tasks: Vec<Task>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                archive_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskStore for MemoryStore {
        async fn all(&self) -> Result<Vec<Task>> {
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn active(&self) -> Result<Vec<Task>> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .iter()
                .filter(|t| !t.is_archived)
                .cloned()
                .collect())
        }

        async fn get(&self, id: &str) -> Result<Option<Task>> {
            Ok(self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned())
        }

        async fn insert(&self, task: Task) -> Result<()> {
            self.tasks.lock().unwrap().push(task);
            Ok(())
        }

        async fn update(&self, task: Task) -> Result<()> {
            let mut tasks = self.tasks.lock().unwrap();
            if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                *slot = task;
            }
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.tasks.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }

        async fn archive_completed(&self, now: DateTime<Utc>) -> Result<usize> {
            self.archive_calls.fetch_add(1, Ordering::SeqCst);
            let mut tasks = self.tasks.lock().unwrap();
            let mut archived = 0;
            for t in tasks.iter_mut() {
                if t.is_completed && !t.is_archived {
                    t.archive(now);
                    archived += 1;
                }
            }
            Ok(archived)
        }
    }

    struct MockMailer {
        fail: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl MockMailer {
        fn ok() -> Self {
            Self {
                fail: false,
                sent: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmailSender for MockMailer {
        async fn send_email(&self, _from: &str, to: &str, subject: &str, _html: &str) -> Result<String> {
            if self.fail {
                anyhow::bail!("delivery refused");
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok("email-123".to_string())
        }
    }

    fn cfg() -> ReportConfig {
        ReportConfig {
            api_key: Some("re_test".to_string()),
            from: "noreply@relance.app".to_string(),
            default_recipient: None,
        }
    }

    fn sample_tasks(now: DateTime<Utc>) -> Vec<Task> {
        let mut done = Task::new("t1", "fini", at(2026, 6, 18, 9, 0));
        done.complete(now - chrono::Duration::hours(3));
        let open = Task::new("t2", "en cours", at(2026, 6, 19, 9, 0));
        vec![done, open]
    }

    #[tokio::test]
    async fn missing_email_is_a_400_with_no_side_effects() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(sample_tasks(now));
        let mailer = MockMailer::ok();

        let err = send_weekly_report(&store, &mailer, &ReportRequest::default(), &cfg(), now)
            .await
            .unwrap_err();

        assert_eq!(err.status(), 400);
        assert!(mailer.sent.lock().unwrap().is_empty());
        assert_eq!(store.archive_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_credentials_is_a_500_with_no_side_effects() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(sample_tasks(now));
        let mailer = MockMailer::ok();
        let req = ReportRequest {
            test: false,
            email: Some("user@example.com".to_string()),
        };
        let no_key = ReportConfig {
            api_key: None,
            ..cfg()
        };

        let err = send_weekly_report(&store, &mailer, &req, &no_key, now)
            .await
            .unwrap_err();

        assert_eq!(err.status(), 500);
        assert!(mailer.sent.lock().unwrap().is_empty());
        assert_eq!(store.archive_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_send_skips_archival() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(sample_tasks(now));
        let mailer = MockMailer::ok();
        let req = ReportRequest {
            test: true,
            email: Some("user@example.com".to_string()),
        };

        let resp = send_weekly_report(&store, &mailer, &req, &cfg(), now)
            .await
            .unwrap();

        assert!(resp.success);
        assert_eq!(resp.email_id.as_deref(), Some("email-123"));
        assert_eq!(resp.message, "Test email sent successfully");
        assert_eq!(resp.stats.completed_count, 1);
        assert_eq!(store.archive_calls.load(Ordering::SeqCst), 0);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].0, "user@example.com");
        assert!(sent[0].1.contains("Test"));
    }

    #[tokio::test]
    async fn real_send_archives_completed_tasks() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(sample_tasks(now));
        let mailer = MockMailer::ok();
        let req = ReportRequest {
            test: false,
            email: Some("user@example.com".to_string()),
        };

        let resp = send_weekly_report(&store, &mailer, &req, &cfg(), now)
            .await
            .unwrap();

        assert_eq!(resp.message, "Weekly report sent successfully");
        assert_eq!(store.archive_calls.load(Ordering::SeqCst), 1);
        let archived = store.all().await.unwrap();
        assert!(archived.iter().find(|t| t.id == "t1").unwrap().is_archived);
        assert!(!archived.iter().find(|t| t.id == "t2").unwrap().is_archived);
    }

    #[tokio::test]
    async fn delivery_failure_is_a_500_and_archives_nothing() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(sample_tasks(now));
        let mailer = MockMailer::failing();
        let req = ReportRequest {
            test: false,
            email: Some("user@example.com".to_string()),
        };

        let err = send_weekly_report(&store, &mailer, &req, &cfg(), now)
            .await
            .unwrap_err();

        assert_eq!(err.status(), 500);
        assert_eq!(store.archive_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_recipient_backfills_missing_email() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(sample_tasks(now));
        let mailer = MockMailer::ok();
        let with_default = ReportConfig {
            default_recipient: Some("owner@example.com".to_string()),
            ..cfg()
        };

        let resp = send_weekly_report(
            &store,
            &mailer,
            &ReportRequest { test: true, email: None },
            &with_default,
            now,
        )
        .await
        .unwrap();

        assert!(resp.success);
        assert_eq!(mailer.sent.lock().unwrap()[0].0, "owner@example.com");
    }

    #[tokio::test]
    async fn response_serializes_with_camel_case_email_id() {
        let now = at(2026, 6, 20, 12, 0);
        let store = MemoryStore::new(vec![]);
        let mailer = MockMailer::ok();
        let req = ReportRequest {
            test: true,
            email: Some("user@example.com".to_string()),
        };

        let resp = send_weekly_report(&store, &mailer, &req, &cfg(), now)
            .await
            .unwrap();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["emailId"], "email-123");
        assert_eq!(json["stats"]["completedCount"], 0);
    }
}
