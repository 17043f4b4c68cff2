use claims_server::{create_app, AppState};
use claims_service::ClaimsConfig;
use clap::Parser;
use colored::*;
use error_common::{log_error, ClaimTrackError, Result};
use std::path::PathBuf;
use tracing::info;

/// ClaimTrack HTTP server
#[derive(Parser, Debug)]
#[command(name = "claims-server")]
#[command(version, about = "Serve ClaimTrack uploads, claims and dashboard over HTTP")]
struct Args {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host, overrides the configuration
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Postgres connection string; claims are kept in memory when unset
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = try_main().await {
        log_error("claims-server", &err);
        eprintln!("{} {}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let args = Args::parse();

    let mut config = ClaimsConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }

    let logging = config.logging.clone().verbose(args.verbose);
    logger_redacted::init(&logging).map_err(|err| ClaimTrackError::ConfigError(err.to_string()))?;
    logger_redacted::set_redaction_enabled(logging.redaction_enabled);

    let address = config.bind_address();
    let state = AppState::from_config(config).await?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|err| ClaimTrackError::ServerError(format!("failed to bind {}: {}", address, err)))?;

    info!("ClaimTrack server listening on {}", address);
    println!("{} http://{}", "Listening on".green(), address);

    axum::serve(listener, app)
        .await
        .map_err(|err| ClaimTrackError::ServerError(err.to_string()))?;

    Ok(())
}
