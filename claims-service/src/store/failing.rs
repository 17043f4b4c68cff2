//! Store wrapper that fails upserts for chosen ids, for importer tests

use super::{ClaimStore, InMemoryClaimStore};
use crate::error::{ClaimsError, ClaimsResult};
use crate::models::{Claim, ClaimDetail, ClaimFilter, ClaimPatch, DetailPatch, Flag, NewFlag, NewNote, Note, Upserted};
use async_trait::async_trait;

#[derive(Default)]
pub(crate) struct FailingStore {
    pub inner: InMemoryClaimStore,
    /// `upsert_claim` fails with a database error for this id
    pub fail_claim: Option<String>,
    /// `upsert_detail` fails with a validation error for this claim id
    pub fail_detail: Option<String>,
}

#[async_trait]
impl ClaimStore for FailingStore {
    async fn upsert_claim(&self, patch: ClaimPatch) -> ClaimsResult<Upserted<Claim>> {
        if self.fail_claim.as_deref() == Some(patch.id.as_str()) {
            return Err(ClaimsError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.upsert_claim(patch).await
    }

    async fn upsert_detail(&self, patch: DetailPatch) -> ClaimsResult<Upserted<ClaimDetail>> {
        if self.fail_detail.as_deref() == Some(patch.claim_id.as_str()) {
            return Err(ClaimsError::Validation("cpt_codes rejected".to_string()));
        }
        self.inner.upsert_detail(patch).await
    }

    async fn get_claim(&self, id: &str) -> ClaimsResult<Option<Claim>> {
        self.inner.get_claim(id).await
    }

    async fn get_detail(&self, claim_id: &str) -> ClaimsResult<Option<ClaimDetail>> {
        self.inner.get_detail(claim_id).await
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> ClaimsResult<Vec<Claim>> {
        self.inner.list_claims(filter).await
    }

    async fn list_details(&self) -> ClaimsResult<Vec<ClaimDetail>> {
        self.inner.list_details().await
    }

    async fn clear_claims(&self) -> ClaimsResult<u64> {
        self.inner.clear_claims().await
    }

    async fn clear_details(&self) -> ClaimsResult<u64> {
        self.inner.clear_details().await
    }

    async fn add_flag(&self, flag: NewFlag) -> ClaimsResult<Flag> {
        self.inner.add_flag(flag).await
    }

    async fn resolve_flag(&self, flag_id: i64) -> ClaimsResult<Flag> {
        self.inner.resolve_flag(flag_id).await
    }

    async fn list_flags(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Flag>> {
        self.inner.list_flags(claim_id).await
    }

    async fn add_note(&self, note: NewNote) -> ClaimsResult<Note> {
        self.inner.add_note(note).await
    }

    async fn list_notes(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Note>> {
        self.inner.list_notes(claim_id).await
    }
}
