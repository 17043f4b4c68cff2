use chrono::NaiveDate;
use claims_service::{FileFormat, NoteType};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// ClaimTrack operator CLI
#[derive(Parser, Debug)]
#[command(name = "claimtrack")]
#[command(version, about = "Load, annotate and report on insurance claims")]
pub struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Postgres connection string; claims are kept in memory when unset
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load claims from a JSON or CSV file
    LoadClaims(LoadClaimsArgs),

    /// Load claim details (CPT codes, denial reasons) for existing claims
    LoadDetails(LoadDetailsArgs),

    /// Print dashboard figures
    Dashboard(DashboardArgs),

    /// Raise or resolve flags on claims
    #[command(subcommand)]
    Flag(FlagCommand),

    /// Annotate claims
    #[command(subcommand)]
    Note(NoteCommand),

    /// Apply database migrations
    Migrate,
}

#[derive(Args, Debug)]
pub struct ImportOptions {
    /// File format; detected from the extension when omitted
    #[arg(long)]
    pub format: Option<FileFormat>,

    /// Clear existing data before loading
    #[arg(long)]
    pub clear: bool,

    /// Reject the whole file on the first unparseable amount, date or status
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct LoadClaimsArgs {
    /// Claims file; defaults to claims.json or claims.csv in the data directory
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    #[command(flatten)]
    pub options: ImportOptions,
}

#[derive(Args, Debug)]
pub struct LoadDetailsArgs {
    /// Claim details file
    #[arg(short, long)]
    pub file: PathBuf,

    #[command(flatten)]
    pub options: ImportOptions,
}

#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Earliest discharge date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Latest discharge date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Insurer name, partial match
    #[arg(long)]
    pub insurer: Option<String>,

    /// Claim status, or "all"
    #[arg(long)]
    pub status: Option<String>,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum FlagCommand {
    /// Flag a claim for review
    Add {
        claim_id: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        reason: String,
    },
    /// Mark a flag resolved
    Resolve { flag_id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Add a note to a claim
    Add {
        claim_id: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        content: String,
        /// admin, system or user
        #[arg(long = "type", default_value = "user")]
        note_type: NoteType,
    },
}
