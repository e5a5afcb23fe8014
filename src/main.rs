//! adc-backup - Main entry point
//!
//! Command-line client orchestrating system backups and backup-account
//! provisioning across a fleet of Citrix ADC appliances.

use adc_backup::config::BackupConfiguration;
use adc_backup::credentials::{CredentialSource, TerminalPrompt};
use adc_backup::orchestrator::provision::SetupTarget;
use adc_backup::orchestrator::runner::{self, RunSummary};
use adc_backup::orchestrator::sessions::NitroSessionFactory;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, value_name = "FILE", default_value = "adc-backup.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Back up every target defined in the configuration file
    Backup,
    /// Provision the backup account and command policy on every target
    Install,
    /// Remove the backup account and command policy from every target
    Uninstall,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    match run(args).await {
        Ok(summary) if summary.all_succeeded() => ExitCode::SUCCESS,
        Ok(summary) => {
            tracing::error!(
                "{} of {} targets failed",
                summary.failed_count(),
                summary.total()
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<RunSummary> {
    let config = BackupConfiguration::from_file(&args.config)?;
    let factory = Arc::new(NitroSessionFactory);

    match args.command {
        Command::Backup => runner::run_backup(factory, &config).await,
        Command::Install => {
            let setups = collect_setup_targets(&config, &mut TerminalPrompt)?;
            Ok(runner::run_install(factory, setups).await)
        }
        Command::Uninstall => {
            let setups = collect_setup_targets(&config, &mut TerminalPrompt)?;
            Ok(runner::run_uninstall(factory, setups).await)
        }
    }
}

fn collect_setup_targets(
    config: &BackupConfiguration,
    source: &mut dyn CredentialSource,
) -> anyhow::Result<Vec<SetupTarget>> {
    config
        .targets
        .iter()
        .map(|target| {
            let credentials = source.credentials_for(&target.name)?;
            Ok(SetupTarget::new(target.clone(), credentials))
        })
        .collect()
}
