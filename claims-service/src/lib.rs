//! Claims service for ClaimTrack
//!
//! Records insurance claims and their procedure details, and loads them in bulk:
//! - JSON and CSV import files, parsed whole before any write
//! - Idempotent upsert keyed by the external claim id
//! - Lenient or strict coercion of amounts, dates and statuses
//! - Per-record failure isolation with a warning report
//! - Staff flags and notes on claims
//! - Dashboard aggregation over claims, details and annotations
//!
//! Storage sits behind [`ClaimStore`], with an in-memory implementation and a
//! Postgres one.

pub mod coerce;
pub mod config;
pub mod details;
pub mod error;
pub mod importer;
pub mod models;
pub mod reporting;
pub mod sample;
pub mod source;
pub mod store;

pub use coerce::CoercionMode;
pub use config::*;
pub use details::*;
pub use error::*;
pub use importer::*;
pub use models::*;
pub use reporting::*;
pub use sample::*;
pub use source::*;
pub use store::*;
