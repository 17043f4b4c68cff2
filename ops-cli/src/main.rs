use clap::Parser;
use claims_service::ClaimsConfig;
use colored::*;
use error_common::Result;
use logger_redacted::redacted_error;
use ops_cli::{run, Cli};

#[tokio::main]
async fn main() {
    if let Err(err) = try_main().await {
        // Coercion errors echo source values, so the log line is redacted
        redacted_error!("claimtrack failed [{}]: {}", err.code(), err);
        eprintln!("{} {}", "error:".bright_red().bold(), err);
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let config = ClaimsConfig::load(cli.config.as_deref())?;
    logger_redacted::init(&config.logging.clone().verbose(cli.verbose))
        .map_err(|err| error_common::ClaimTrackError::ConfigError(err.to_string()))?;
    logger_redacted::set_redaction_enabled(config.logging.redaction_enabled);

    run(cli, config).await
}
