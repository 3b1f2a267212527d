//! slotcheck CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use slotcheck_client::cli::{Cli, Command, ConfigAction};
use slotcheck_client::config::ClientConfig;
use slotcheck_client::error::{ClientError, ClientResult};
use slotcheck_client::{CheckPlan, run_check};
use slotcheck_core::init_tracing;
use slotcheck_providers::EventSource;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => ClientConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(cli.tracing_config(&config)) {
        eprintln!("warning: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    if let Some(Command::Config { action }) = &cli.command {
        return match action {
            ConfigAction::Path => {
                println!("{}", ClientConfig::default_path().display());
                Ok(())
            }
            ConfigAction::Dump => {
                let dump = toml::to_string_pretty(&config.redacted())
                    .map_err(|e| ClientError::Config(e.to_string()))?;
                print!("{}", dump);
                Ok(())
            }
        };
    }

    let plan = CheckPlan::new(&config, &cli, chrono::Utc::now())?;
    debug!(?plan, "check plan");

    let source = build_source(&config)?;
    let summary = run_check(source, &plan, &mut std::io::stdout().lock()).await?;

    if !summary.failed_calendars.is_empty() {
        eprintln!(
            "warning: incomplete results for {}",
            summary.failed_calendars.join(", ")
        );
    }
    Ok(())
}

#[cfg(feature = "google")]
fn build_source(config: &ClientConfig) -> ClientResult<Arc<dyn EventSource>> {
    use slotcheck_providers::google::{GoogleConfig, GoogleEventSource};

    let token = config.resolve_access_token()?;
    Ok(Arc::new(GoogleEventSource::new(GoogleConfig::new(token))?))
}

#[cfg(not(feature = "google"))]
fn build_source(_config: &ClientConfig) -> ClientResult<Arc<dyn EventSource>> {
    Err(ClientError::Config(
        "built without a calendar source, enable the `google` feature".into(),
    ))
}
