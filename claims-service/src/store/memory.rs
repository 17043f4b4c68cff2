use super::{validate_flag, validate_note, ClaimStore};
use crate::error::{ClaimsError, ClaimsResult};
use crate::models::{
    today, Claim, ClaimDetail, ClaimFilter, ClaimPatch, DetailPatch, Flag, NewFlag, NewNote, Note, Upserted,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// In-memory claim store for tests, demos and running without a database
pub struct InMemoryClaimStore {
    claims: Arc<DashMap<String, Claim>>,
    details: Arc<DashMap<String, ClaimDetail>>,
    flags: Arc<DashMap<i64, Flag>>,
    notes: Arc<DashMap<i64, Note>>,
    next_flag_id: AtomicI64,
    next_note_id: AtomicI64,
}

impl InMemoryClaimStore {
    pub fn new() -> Self {
        Self {
            claims: Arc::new(DashMap::new()),
            details: Arc::new(DashMap::new()),
            flags: Arc::new(DashMap::new()),
            notes: Arc::new(DashMap::new()),
            next_flag_id: AtomicI64::new(1),
            next_note_id: AtomicI64::new(1),
        }
    }

    fn ensure_claim(&self, claim_id: &str) -> ClaimsResult<()> {
        if self.claims.contains_key(claim_id) {
            Ok(())
        } else {
            Err(ClaimsError::ClaimNotFound(claim_id.to_string()))
        }
    }
}

impl Default for InMemoryClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn upsert_claim(&self, patch: ClaimPatch) -> ClaimsResult<Upserted<Claim>> {
        let now = Utc::now();
        match self.claims.entry(patch.id.clone()) {
            Entry::Occupied(mut entry) => {
                patch.apply_to(entry.get_mut(), now);
                Ok(Upserted::updated(entry.get().clone()))
            }
            Entry::Vacant(entry) => {
                let claim = patch.to_new_claim(today(), now);
                entry.insert(claim.clone());
                Ok(Upserted::created(claim))
            }
        }
    }

    async fn upsert_detail(&self, patch: DetailPatch) -> ClaimsResult<Upserted<ClaimDetail>> {
        self.ensure_claim(&patch.claim_id)?;

        let now = Utc::now();
        match self.details.entry(patch.claim_id.clone()) {
            Entry::Occupied(mut entry) => {
                patch.apply_to(entry.get_mut(), now);
                Ok(Upserted::updated(entry.get().clone()))
            }
            Entry::Vacant(entry) => {
                let detail = patch.to_new_detail(now);
                entry.insert(detail.clone());
                Ok(Upserted::created(detail))
            }
        }
    }

    async fn get_claim(&self, id: &str) -> ClaimsResult<Option<Claim>> {
        Ok(self.claims.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_detail(&self, claim_id: &str) -> ClaimsResult<Option<ClaimDetail>> {
        Ok(self.details.get(claim_id).map(|entry| entry.value().clone()))
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> ClaimsResult<Vec<Claim>> {
        let mut claims: Vec<Claim> = self
            .claims
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        claims.sort_by(|a, b| {
            b.discharge_date
                .cmp(&a.discharge_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(claims)
    }

    async fn list_details(&self) -> ClaimsResult<Vec<ClaimDetail>> {
        let mut details: Vec<ClaimDetail> = self.details.iter().map(|entry| entry.value().clone()).collect();
        details.sort_by(|a, b| a.claim_id.cmp(&b.claim_id));
        Ok(details)
    }

    async fn clear_claims(&self) -> ClaimsResult<u64> {
        let removed = self.claims.len() as u64;
        self.claims.clear();
        self.details.clear();
        self.flags.clear();
        self.notes.clear();
        Ok(removed)
    }

    async fn clear_details(&self) -> ClaimsResult<u64> {
        let removed = self.details.len() as u64;
        self.details.clear();
        Ok(removed)
    }

    async fn add_flag(&self, flag: NewFlag) -> ClaimsResult<Flag> {
        validate_flag(&flag)?;
        self.ensure_claim(&flag.claim_id)?;

        let id = self.next_flag_id.fetch_add(1, Ordering::SeqCst);
        let flag = Flag {
            id,
            claim_id: flag.claim_id,
            author: flag.author,
            reason: flag.reason,
            is_resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.flags.insert(id, flag.clone());
        Ok(flag)
    }

    async fn resolve_flag(&self, flag_id: i64) -> ClaimsResult<Flag> {
        let mut flag = self
            .flags
            .get_mut(&flag_id)
            .ok_or(ClaimsError::FlagNotFound(flag_id))?;
        if !flag.is_resolved {
            flag.is_resolved = true;
            flag.resolved_at = Some(Utc::now());
        }
        Ok(flag.clone())
    }

    async fn list_flags(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Flag>> {
        let mut flags: Vec<Flag> = self
            .flags
            .iter()
            .filter(|entry| claim_id.map_or(true, |id| entry.claim_id == id))
            .map(|entry| entry.value().clone())
            .collect();
        flags.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(flags)
    }

    async fn add_note(&self, note: NewNote) -> ClaimsResult<Note> {
        validate_note(&note)?;
        self.ensure_claim(&note.claim_id)?;

        let id = self.next_note_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let note = Note {
            id,
            claim_id: note.claim_id,
            author: note.author,
            content: note.content,
            note_type: note.note_type,
            created_at: now,
            updated_at: now,
        };
        self.notes.insert(id, note.clone());
        Ok(note)
    }

    async fn list_notes(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|entry| claim_id.map_or(true, |id| entry.claim_id == id))
            .map(|entry| entry.value().clone())
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimStatus, NoteType};
    use rust_decimal::Decimal;

    fn patch(id: &str) -> ClaimPatch {
        ClaimPatch {
            patient_name: Some(format!("Patient {}", id)),
            billed_amount: Some(Decimal::new(10000, 2)),
            ..ClaimPatch::new(id)
        }
    }

    #[tokio::test]
    async fn test_upsert_reports_created_then_updated() {
        let store = InMemoryClaimStore::new();
        assert!(store.upsert_claim(patch("1")).await.unwrap().created);

        let second = store
            .upsert_claim(ClaimPatch {
                status: Some(ClaimStatus::Paid),
                ..ClaimPatch::new("1")
            })
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.record.patient_name, "Patient 1");
        assert_eq!(second.record.status, ClaimStatus::Paid);
    }

    #[tokio::test]
    async fn test_detail_requires_claim() {
        let store = InMemoryClaimStore::new();
        let result = store
            .upsert_detail(DetailPatch {
                claim_id: "missing".into(),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(ClaimsError::ClaimNotFound(_))));
        assert!(store.list_details().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_claims_cascades() {
        let store = InMemoryClaimStore::new();
        store.upsert_claim(patch("1")).await.unwrap();
        store
            .upsert_detail(DetailPatch {
                claim_id: "1".into(),
                cpt_codes: Some("99213".into()),
                denial_reason: None,
            })
            .await
            .unwrap();
        store
            .add_flag(NewFlag {
                claim_id: "1".into(),
                author: "auditor".into(),
                reason: "Check coding".into(),
            })
            .await
            .unwrap();
        store
            .add_note(NewNote {
                claim_id: "1".into(),
                author: "auditor".into(),
                content: "Called insurer".into(),
                note_type: NoteType::User,
            })
            .await
            .unwrap();

        assert_eq!(store.clear_claims().await.unwrap(), 1);
        assert!(store.get_detail("1").await.unwrap().is_none());
        assert!(store.list_flags(None).await.unwrap().is_empty());
        assert!(store.list_notes(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_flag() {
        let store = InMemoryClaimStore::new();
        store.upsert_claim(patch("1")).await.unwrap();
        let flag = store
            .add_flag(NewFlag {
                claim_id: "1".into(),
                author: "auditor".into(),
                reason: "Underpaid".into(),
            })
            .await
            .unwrap();
        assert!(!flag.is_resolved);

        let resolved = store.resolve_flag(flag.id).await.unwrap();
        assert!(resolved.is_resolved);
        assert!(resolved.resolved_at.is_some());
        assert!(matches!(store.resolve_flag(999).await, Err(ClaimsError::FlagNotFound(999))));
    }

    #[tokio::test]
    async fn test_annotations_validate_input() {
        let store = InMemoryClaimStore::new();
        let unknown = store
            .add_flag(NewFlag {
                claim_id: "nope".into(),
                author: "a".into(),
                reason: "r".into(),
            })
            .await;
        assert!(matches!(unknown, Err(ClaimsError::ClaimNotFound(_))));

        store.upsert_claim(patch("1")).await.unwrap();
        let blank = store
            .add_note(NewNote {
                claim_id: "1".into(),
                author: "a".into(),
                content: "   ".into(),
                note_type: NoteType::Admin,
            })
            .await;
        assert!(matches!(blank, Err(ClaimsError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_claims_filters() {
        let store = InMemoryClaimStore::new();
        store.upsert_claim(patch("30001")).await.unwrap();
        store
            .upsert_claim(ClaimPatch {
                insurer_name: Some("Aetna".into()),
                ..patch("30002")
            })
            .await
            .unwrap();

        let filter = ClaimFilter {
            insurer: Some("aet".into()),
            ..Default::default()
        };
        let claims = store.list_claims(&filter).await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].id, "30002");
    }
}
