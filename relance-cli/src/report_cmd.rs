use anyhow::{Result, bail};
use chrono::Utc;
use clap::Subcommand;

use relance_report::dispatch::{ReportConfig, ReportRequest, send_weekly_report};
use relance_report::resend::EmailClient;

use crate::config::load_config;
use crate::state::tasks_path;
use crate::store::JsonTaskStore;

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Send the weekly report email
    Send {
        /// Test mode: send the email but archive nothing
        #[arg(long, default_value_t = false)]
        test: bool,

        /// Recipient override (defaults to config [report].email)
        #[arg(long)]
        email: Option<String>,
    },
}

pub async fn run(cmd: ReportCommand) -> Result<()> {
    match cmd {
        ReportCommand::Send { test, email } => send(test, email).await,
    }
}

async fn send(test: bool, email: Option<String>) -> Result<()> {
    let file_cfg = load_config()?;

    // API key comes from the environment; sender and fallback recipient
    // from config.toml.
    let report_cfg = ReportConfig {
        from: file_cfg.report.from.clone(),
        default_recipient: file_cfg.report.email.clone(),
        ..ReportConfig::from_env()
    };

    let mailer = EmailClient::new(report_cfg.api_key.clone().unwrap_or_default());
    let store = JsonTaskStore::new(tasks_path()?);
    let req = ReportRequest { test, email };

    match send_weekly_report(&store, &mailer, &req, &report_cfg, Utc::now()).await {
        Ok(resp) => {
            println!("{}", serde_json::to_string_pretty(&resp)?);
            Ok(())
        }
        Err(e) => {
            let body = serde_json::to_string_pretty(&e.to_body())?;
            println!("HTTP {}\n{body}", e.status());
            bail!("report dispatch failed");
        }
    }
}
