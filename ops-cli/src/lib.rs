//! Operator CLI for ClaimTrack
//!
//! ```bash
//! # Load claims, replacing whatever is stored
//! claimtrack load-claims --file data/claims.csv --clear
//!
//! # Attach CPT codes and denial reasons to existing claims
//! claimtrack load-details --file data/claim_details.json
//!
//! # Dashboard for one insurer
//! claimtrack dashboard --insurer aetna --from 2023-01-01
//!
//! # Annotations
//! claimtrack flag add 30002 --author auditor --reason "Coverage dispute"
//! claimtrack flag resolve 1
//! claimtrack note add 30002 --author auditor --content "Appeal filed" --type admin
//!
//! # Schema
//! DATABASE_URL=postgres://localhost/claimtrack claimtrack migrate
//! ```

pub mod cli;
pub mod commands;

pub use cli::*;
pub use commands::*;
