use crate::cli::{Cli, Command, DashboardArgs, FlagCommand, ImportOptions, LoadClaimsArgs, LoadDetailsArgs, NoteCommand};
use claims_service::{
    locate_default_source, sample_records, ClaimImporter, ClaimStore, ClaimsConfig, CoercionMode, DashboardFilter,
    DashboardQuery, DashboardReport, DefaultSource, DetailImporter, ImportReport, InMemoryClaimStore, NewFlag,
    NewNote, PgClaimStore,
};
use colored::*;
use error_common::{ClaimTrackError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Execute one parsed command
///
/// # Errors
///
/// Returns the first fatal error; per-record import problems are printed as
/// warnings instead.
pub async fn run(cli: Cli, config: ClaimsConfig) -> Result<()> {
    let database_url = cli.database_url.or_else(|| config.database_url.clone());

    if let Command::Migrate = cli.command {
        let url = database_url.ok_or_else(|| {
            ClaimTrackError::ConfigError("migrate needs --database-url or DATABASE_URL".to_string())
        })?;
        let store = PgClaimStore::connect(&url).await?;
        store.migrate().await?;
        println!("{}", "Database schema is up to date".green());
        return Ok(());
    }

    let store = open_store(database_url.as_deref()).await?;
    match cli.command {
        Command::LoadClaims(args) => load_claims(store, &config, args).await,
        Command::LoadDetails(args) => load_details(store, &config, args).await,
        Command::Dashboard(args) => dashboard(store.as_ref(), args).await,
        Command::Flag(command) => flag(store.as_ref(), command).await,
        Command::Note(command) => note(store.as_ref(), command).await,
        Command::Migrate => Ok(()),
    }
}

async fn open_store(database_url: Option<&str>) -> Result<Arc<dyn ClaimStore>> {
    match database_url {
        Some(url) => Ok(Arc::new(PgClaimStore::connect(url).await?)),
        None => {
            warn!("No database configured, using an in-memory store; changes will not be persisted");
            Ok(Arc::new(InMemoryClaimStore::new()))
        }
    }
}

fn coercion_mode(config: &ClaimsConfig, options: &ImportOptions) -> CoercionMode {
    if options.strict {
        CoercionMode::Strict
    } else {
        config.import.coercion
    }
}

async fn load_claims(store: Arc<dyn ClaimStore>, config: &ClaimsConfig, args: LoadClaimsArgs) -> Result<()> {
    let importer = ClaimImporter::new(store, coercion_mode(config, &args.options));
    if args.options.clear {
        println!("Clearing existing data...");
    }

    let report = match args.file {
        Some(path) => importer.import_file(&path, args.options.format, args.options.clear).await?,
        None => match locate_default_source(&config.data_dir) {
            DefaultSource::File { path, format } => {
                info!(path = %path.display(), "Using default data file");
                importer.import_file(&path, Some(format), args.options.clear).await?
            }
            DefaultSource::Sample => {
                println!("{}", "No data files found. Creating sample data...".yellow());
                let report = importer.import_records(sample_records(), args.options.clear).await?;
                print_report(&report);
                println!("{}", "Created sample data. Use --file to load from JSON/CSV files.".green());
                return Ok(());
            }
        },
    };

    print_report(&report);
    Ok(())
}

async fn load_details(store: Arc<dyn ClaimStore>, config: &ClaimsConfig, args: LoadDetailsArgs) -> Result<()> {
    let importer = DetailImporter::new(store, coercion_mode(config, &args.options));
    if args.options.clear {
        println!("Clearing existing claim details...");
    }

    let report = importer
        .import_file(&args.file, args.options.format, args.options.clear)
        .await?;
    print_report(&report);
    Ok(())
}

/// Print each warning, then the summary line
pub fn print_report(report: &ImportReport) {
    for warning in &report.warnings {
        let claim = warning.claim_id.as_deref().unwrap_or("-");
        println!(
            "{} record {} (claim {}): {}",
            "warning:".yellow(),
            warning.record,
            claim,
            warning.message
        );
    }
    if report.skipped > 0 || report.failed > 0 {
        println!(
            "{}",
            format!("{} skipped, {} failed", report.skipped, report.failed).yellow()
        );
    }
    println!("{}", report.summary().green());
}

async fn dashboard(store: &dyn ClaimStore, args: DashboardArgs) -> Result<()> {
    let query = DashboardQuery {
        from_date: args.from.map(|date| date.to_string()),
        to_date: args.to.map(|date| date.to_string()),
        insurer: args.insurer,
        status: args.status,
    };
    let report = DashboardReport::load(store, DashboardFilter::from(&query)).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", "Claims".bright_cyan().bold());
    println!("  Total:         {}", report.total_claims);
    println!("  Paid:          {}", report.paid_claims);
    println!("  Denied:        {}", report.denied_claims);
    println!("  Under Review:  {}", report.under_review_claims);
    println!("  Payment rate:  {}%", report.payment_rate);
    println!("  Denial rate:   {}%", report.denial_rate);

    println!("{}", "Aging (Under Review)".bright_cyan().bold());
    let aging = &report.aging_buckets;
    println!(
        "  0-30: {}  31-60: {}  61-90: {}  90+: {}",
        aging.days_0_30, aging.days_31_60, aging.days_61_90, aging.days_over_90
    );

    println!("{}", "Flags".bright_cyan().bold());
    println!("  Total: {}  Last 7 days: {}", report.total_flags, report.recent_flags);

    if !report.top_cpt_codes.is_empty() {
        println!("{}", "Top CPT codes".bright_cyan().bold());
        for entry in &report.top_cpt_codes {
            println!("  {:<8} {}", entry.code, entry.count);
        }
    }

    if !report.top_underpayment.is_empty() {
        println!("{}", "Top underpayments".bright_cyan().bold());
        for entry in &report.top_underpayment {
            println!(
                "  {:<10} {:<24} {:>14}",
                entry.claim_id, entry.insurer_name, entry.underpayment
            );
        }
    }

    Ok(())
}

async fn flag(store: &dyn ClaimStore, command: FlagCommand) -> Result<()> {
    match command {
        FlagCommand::Add {
            claim_id,
            author,
            reason,
        } => {
            let flag = store.add_flag(NewFlag { claim_id, author, reason }).await?;
            println!("{} flag {} on claim {}", "Added".green(), flag.id, flag.claim_id);
        }
        FlagCommand::Resolve { flag_id } => {
            let flag = store.resolve_flag(flag_id).await?;
            println!("{} flag {} on claim {}", "Resolved".green(), flag.id, flag.claim_id);
        }
    }
    Ok(())
}

async fn note(store: &dyn ClaimStore, command: NoteCommand) -> Result<()> {
    match command {
        NoteCommand::Add {
            claim_id,
            author,
            content,
            note_type,
        } => {
            let note = store
                .add_note(NewNote {
                    claim_id,
                    author,
                    content,
                    note_type,
                })
                .await?;
            println!("{} {} note {} on claim {}", "Added".green(), note.note_type.as_str(), note.id, note.claim_id);
        }
    }
    Ok(())
}
