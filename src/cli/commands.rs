//! Command handlers for IG Fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments to
//! the acquisition pipeline, credential management and configuration files.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::orchestrator::{create_shutdown_channel, SignalHandler};
use crate::app::{
    CompetitionResultsParser, LeaderboardParser, MemberListParser, ReportKind,
    ReportOrchestrator, ReportParser,
};
use crate::auth::{setup_credentials, show_auth_status, Credentials};
use crate::cli::{AuthAction, AuthArgs, ConfigAction, ConfigArgs, ReportArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the report command
///
/// Fetches one report through the full pipeline and prints its records as
/// pretty JSON. CTRL-C aborts the acquisition.
pub async fn handle_report(args: ReportArgs, config: &AppConfig) -> Result<()> {
    let start_time = Instant::now();
    let credentials = Credentials::from_env()?;
    let orchestrator = ReportOrchestrator::from_config(config, credentials)?;

    let (shutdown_tx, mut shutdown_rx) = create_shutdown_channel();
    let signal_task = SignalHandler::new(shutdown_tx.clone()).setup();
    let background = orchestrator.start_background_tasks(&shutdown_tx);

    info!("Fetching {} report from {}", args.kind, args.url);

    let output = tokio::select! {
        output = fetch_report(&orchestrator, &args) => Some(output),
        _ = shutdown_rx.recv() => None,
    };

    let _ = shutdown_tx.send(());
    background.shutdown_all().await;
    signal_task.abort();

    let Some(output) = output else {
        warn!("Report acquisition interrupted");
        return Err(AppError::generic("Interrupted"));
    };
    let (count, json) = output?;

    println!("{}", json);
    info!(
        "Printed {} {} records in {:.2}s",
        count,
        args.kind,
        start_time.elapsed().as_secs_f64()
    );
    debug!("Cache stats: {:?}", orchestrator.cache().stats());

    if count == 0 {
        warn!("No {} records were returned; rerun with -v for details", args.kind);
    }

    Ok(())
}

/// Fetch with the parser selected by the report kind
async fn fetch_report(
    orchestrator: &ReportOrchestrator,
    args: &ReportArgs,
) -> Result<(usize, String)> {
    match args.kind {
        ReportKind::Leaderboard => run_parser(orchestrator, args, &LeaderboardParser::new()).await,
        ReportKind::Results => {
            run_parser(orchestrator, args, &CompetitionResultsParser::new()).await
        }
        ReportKind::Members => run_parser(orchestrator, args, &MemberListParser::new()).await,
    }
}

async fn run_parser<P: ReportParser>(
    orchestrator: &ReportOrchestrator,
    args: &ReportArgs,
    parser: &P,
) -> Result<(usize, String)> {
    let records = orchestrator
        .get_data(&args.request(), parser, &args.options())
        .await?;
    Ok((records.len(), to_pretty_json(&records)?))
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::generic(format!("Failed to render JSON: {}", e)))
}

/// Handle authentication commands
pub async fn handle_auth(args: AuthArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        AuthAction::Setup => {
            setup_credentials(config).await?;
        }
        AuthAction::Verify => {
            handle_auth_verify(config).await?;
        }
        AuthAction::Status { check } => {
            show_auth_status(config, check).await?;
        }
    }

    Ok(())
}

/// Log in through the session coordinator and print its state
async fn handle_auth_verify(config: &AppConfig) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let orchestrator = ReportOrchestrator::from_config(config, credentials)?;

    println!("Logging in to {}...", orchestrator.base_url());
    let authenticated = orchestrator.session().force_refresh().await;
    let snapshot = orchestrator.session().snapshot().await;

    println!("{}", to_pretty_json(&snapshot)?);
    if authenticated {
        println!("Login and admin step-up succeeded");
        Ok(())
    } else {
        println!("Login failed; rerun with -v for details");
        Err(AppError::generic("Credential verification failed"))
    }
}

/// Handle configuration commands
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = AppConfig::init(path, force).await?;
            println!("Created configuration file:");
            println!("   {}", path.display());
            println!("   You can customize settings by editing this file.");
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}
