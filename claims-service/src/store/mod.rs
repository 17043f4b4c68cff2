//! Claim storage.
//!
//! [`ClaimStore`] is the only mutation surface for claims and their dependants.
//! Each upsert is a single keyed operation whose atomicity belongs to the backend:
//! the in-memory store uses the map's entry API, Postgres uses
//! `INSERT ... ON CONFLICT`.

#[cfg(test)]
pub(crate) mod failing;
mod memory;
mod postgres;

pub use memory::InMemoryClaimStore;
pub use postgres::PgClaimStore;

use crate::error::ClaimsResult;
use crate::models::{
    Claim, ClaimDetail, ClaimFilter, ClaimPatch, DetailPatch, Flag, NewFlag, NewNote, Note, Upserted,
};
use async_trait::async_trait;

#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Create the claim or overwrite the fields present in `patch`
    async fn upsert_claim(&self, patch: ClaimPatch) -> ClaimsResult<Upserted<Claim>>;

    /// Create or update the detail of an existing claim.
    /// Fails with `ClaimNotFound` when the claim does not exist.
    async fn upsert_detail(&self, patch: DetailPatch) -> ClaimsResult<Upserted<ClaimDetail>>;

    async fn get_claim(&self, id: &str) -> ClaimsResult<Option<Claim>>;

    async fn get_detail(&self, claim_id: &str) -> ClaimsResult<Option<ClaimDetail>>;

    /// Claims matching `filter`, newest discharge first
    async fn list_claims(&self, filter: &ClaimFilter) -> ClaimsResult<Vec<Claim>>;

    async fn list_details(&self) -> ClaimsResult<Vec<ClaimDetail>>;

    /// Delete every claim together with its details, flags and notes.
    /// Returns the number of claims removed.
    async fn clear_claims(&self) -> ClaimsResult<u64>;

    /// Delete every claim detail. Returns the number removed.
    async fn clear_details(&self) -> ClaimsResult<u64>;

    async fn add_flag(&self, flag: NewFlag) -> ClaimsResult<Flag>;

    /// Mark a flag resolved. Fails with `FlagNotFound` for an unknown id.
    async fn resolve_flag(&self, flag_id: i64) -> ClaimsResult<Flag>;

    /// Flags for one claim, or all flags when `claim_id` is `None`, newest first
    async fn list_flags(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Flag>>;

    async fn add_note(&self, note: NewNote) -> ClaimsResult<Note>;

    /// Notes for one claim, or all notes when `claim_id` is `None`, newest first
    async fn list_notes(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Note>>;
}

pub(crate) fn validate_flag(flag: &NewFlag) -> ClaimsResult<()> {
    require("author", &flag.author)?;
    require("reason", &flag.reason)
}

pub(crate) fn validate_note(note: &NewNote) -> ClaimsResult<()> {
    require("author", &note.author)?;
    require("content", &note.content)
}

fn require(field: &str, value: &str) -> ClaimsResult<()> {
    if value.trim().is_empty() {
        return Err(crate::error::ClaimsError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
