use anyhow::Result;
use clap::{Parser, Subcommand};

mod config;
mod queue;
mod remind_cmd;
mod report_cmd;
mod state;
mod store;
mod tasks_cmd;

#[derive(Parser, Debug)]
#[command(name = "relance", version, about = "Relance - rappels de tâches et bilan hebdomadaire")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: tasks_cmd::TaskCommand,
    },

    /// Reminder planning and the local notification queue
    Remind {
        #[command(subcommand)]
        command: remind_cmd::RemindCommand,
    },

    /// Weekly report
    Report {
        #[command(subcommand)]
        command: report_cmd::ReportCommand,
    },

    /// Configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default ~/.relance/config.toml
    Init,

    /// Show current configuration and what to set next
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Task { command } => tasks_cmd::run(command).await?,
        Command::Remind { command } => remind_cmd::run(command).await?,
        Command::Report { command } => report_cmd::run(command).await?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Check => config::config_check()?,
        },
    }

    Ok(())
}
