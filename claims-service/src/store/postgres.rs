use super::{validate_flag, validate_note, ClaimStore};
use crate::error::{ClaimsError, ClaimsResult};
use crate::models::{
    today, Claim, ClaimDetail, ClaimFilter, ClaimPatch, ClaimStatus, DetailPatch, Flag, NewFlag, NewNote, Note,
    NoteType, Upserted,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::info;

const CLAIM_COLUMNS: &str =
    "id, patient_name, billed_amount, paid_amount, status, insurer_name, discharge_date, created_at, updated_at";

/// Postgres-backed claim store
#[derive(Clone)]
pub struct PgClaimStore {
    pool: PgPool,
}

impl PgClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::Database` when the server cannot be reached.
    pub async fn connect(database_url: &str) -> ClaimsResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await?;

        info!("Connected to claims database");
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations
    ///
    /// # Errors
    ///
    /// Returns `ClaimsError::Migration` when a migration fails to apply.
    pub async fn migrate(&self) -> ClaimsResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Claims schema is up to date");
        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct ClaimRow {
    id: String,
    patient_name: String,
    billed_amount: Decimal,
    paid_amount: Decimal,
    status: String,
    insurer_name: String,
    discharge_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = ClaimsError;

    fn try_from(row: ClaimRow) -> ClaimsResult<Self> {
        let status: ClaimStatus = row.status.parse().map_err(ClaimsError::Validation)?;
        Ok(Claim {
            id: row.id,
            patient_name: row.patient_name,
            billed_amount: row.billed_amount,
            paid_amount: row.paid_amount,
            status,
            insurer_name: row.insurer_name,
            discharge_date: row.discharge_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct UpsertedClaimRow {
    #[sqlx(flatten)]
    claim: ClaimRow,
    inserted: bool,
}

#[derive(Debug, FromRow)]
struct DetailRow {
    claim_id: String,
    cpt_codes: String,
    denial_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DetailRow> for ClaimDetail {
    fn from(row: DetailRow) -> Self {
        ClaimDetail {
            claim_id: row.claim_id,
            cpt_codes: row.cpt_codes,
            denial_reason: row.denial_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UpsertedDetailRow {
    #[sqlx(flatten)]
    detail: DetailRow,
    inserted: bool,
}

#[derive(Debug, FromRow)]
struct FlagRow {
    id: i64,
    claim_id: String,
    author: String,
    reason: String,
    is_resolved: bool,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl From<FlagRow> for Flag {
    fn from(row: FlagRow) -> Self {
        Flag {
            id: row.id,
            claim_id: row.claim_id,
            author: row.author,
            reason: row.reason,
            is_resolved: row.is_resolved,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NoteRow {
    id: i64,
    claim_id: String,
    author: String,
    content: String,
    note_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoteRow> for Note {
    type Error = ClaimsError;

    fn try_from(row: NoteRow) -> ClaimsResult<Self> {
        let note_type: NoteType = row.note_type.parse().map_err(ClaimsError::Validation)?;
        Ok(Note {
            id: row.id,
            claim_id: row.claim_id,
            author: row.author,
            content: row.content,
            note_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ClaimStore for PgClaimStore {
    async fn upsert_claim(&self, patch: ClaimPatch) -> ClaimsResult<Upserted<Claim>> {
        // Absent fields take the column default on insert and keep the stored value on update
        let row = sqlx::query_as::<_, UpsertedClaimRow>(&format!(
            r#"
            INSERT INTO claims (id, patient_name, billed_amount, paid_amount, status, insurer_name, discharge_date)
            VALUES ($1, COALESCE($2, ''), COALESCE($3, 0.00), COALESCE($4, 0.00),
                    COALESCE($5, 'Under Review'), COALESCE($6, ''), COALESCE($7, $8))
            ON CONFLICT (id) DO UPDATE SET
                patient_name = COALESCE($2, claims.patient_name),
                billed_amount = COALESCE($3, claims.billed_amount),
                paid_amount = COALESCE($4, claims.paid_amount),
                status = COALESCE($5, claims.status),
                insurer_name = COALESCE($6, claims.insurer_name),
                discharge_date = COALESCE($7, claims.discharge_date),
                updated_at = NOW()
            RETURNING {CLAIM_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(&patch.id)
        .bind(&patch.patient_name)
        .bind(patch.billed_amount)
        .bind(patch.paid_amount)
        .bind(patch.status.map(|status| status.as_str()))
        .bind(&patch.insurer_name)
        .bind(patch.discharge_date)
        .bind(today())
        .fetch_one(&self.pool)
        .await?;

        let created = row.inserted;
        let claim = Claim::try_from(row.claim)?;
        Ok(Upserted { record: claim, created })
    }

    async fn upsert_detail(&self, patch: DetailPatch) -> ClaimsResult<Upserted<ClaimDetail>> {
        let reason_present = patch.denial_reason.is_some();
        let reason = patch.denial_reason.clone().flatten();

        // Selecting from claims means an unknown claim inserts nothing
        let row = sqlx::query_as::<_, UpsertedDetailRow>(
            r#"
            INSERT INTO claim_details (claim_id, cpt_codes, denial_reason)
            SELECT id, COALESCE($2, ''), $4 FROM claims WHERE id = $1
            ON CONFLICT (claim_id) DO UPDATE SET
                cpt_codes = COALESCE($2, claim_details.cpt_codes),
                denial_reason = CASE WHEN $3 THEN $4 ELSE claim_details.denial_reason END,
                updated_at = NOW()
            RETURNING claim_id, cpt_codes, denial_reason, created_at, updated_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(&patch.claim_id)
        .bind(&patch.cpt_codes)
        .bind(reason_present)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ClaimsError::ClaimNotFound(patch.claim_id.clone()))?;

        Ok(Upserted {
            created: row.inserted,
            record: row.detail.into(),
        })
    }

    async fn get_claim(&self, id: &str) -> ClaimsResult<Option<Claim>> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Claim::try_from).transpose()
    }

    async fn get_detail(&self, claim_id: &str) -> ClaimsResult<Option<ClaimDetail>> {
        let row = sqlx::query_as::<_, DetailRow>(
            "SELECT claim_id, cpt_codes, denial_reason, created_at, updated_at FROM claim_details WHERE claim_id = $1",
        )
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ClaimDetail::from))
    }

    async fn list_claims(&self, filter: &ClaimFilter) -> ClaimsResult<Vec<Claim>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE 1=1"));

        if let Some(search) = &filter.search {
            query.push(" AND (strpos(lower(id), lower(");
            query.push_bind(search.clone());
            query.push(")) > 0 OR strpos(lower(patient_name), lower(");
            query.push_bind(search.clone());
            query.push(")) > 0)");
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.as_str());
        }

        if let Some(insurer) = &filter.insurer {
            query.push(" AND strpos(lower(insurer_name), lower(");
            query.push_bind(insurer.clone());
            query.push(")) > 0");
        }

        if let Some(from) = filter.from_date {
            query.push(" AND discharge_date >= ");
            query.push_bind(from);
        }

        if let Some(to) = filter.to_date {
            query.push(" AND discharge_date <= ");
            query.push_bind(to);
        }

        query.push(" ORDER BY discharge_date DESC, id ASC");

        let rows = query.build_query_as::<ClaimRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Claim::try_from).collect()
    }

    async fn list_details(&self) -> ClaimsResult<Vec<ClaimDetail>> {
        let rows = sqlx::query_as::<_, DetailRow>(
            "SELECT claim_id, cpt_codes, denial_reason, created_at, updated_at FROM claim_details ORDER BY claim_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ClaimDetail::from).collect())
    }

    async fn clear_claims(&self) -> ClaimsResult<u64> {
        // Details, flags and notes go with their claims via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM claims").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn clear_details(&self) -> ClaimsResult<u64> {
        let result = sqlx::query("DELETE FROM claim_details").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn add_flag(&self, flag: NewFlag) -> ClaimsResult<Flag> {
        validate_flag(&flag)?;

        let row = sqlx::query_as::<_, FlagRow>(
            r#"
            INSERT INTO flags (claim_id, author, reason)
            SELECT id, $2, $3 FROM claims WHERE id = $1
            RETURNING id, claim_id, author, reason, is_resolved, created_at, resolved_at
            "#,
        )
        .bind(&flag.claim_id)
        .bind(&flag.author)
        .bind(&flag.reason)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ClaimsError::ClaimNotFound(flag.claim_id.clone()))?;

        Ok(row.into())
    }

    async fn resolve_flag(&self, flag_id: i64) -> ClaimsResult<Flag> {
        let row = sqlx::query_as::<_, FlagRow>(
            r#"
            UPDATE flags
            SET is_resolved = TRUE, resolved_at = COALESCE(resolved_at, NOW())
            WHERE id = $1
            RETURNING id, claim_id, author, reason, is_resolved, created_at, resolved_at
            "#,
        )
        .bind(flag_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ClaimsError::FlagNotFound(flag_id))?;

        Ok(row.into())
    }

    async fn list_flags(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Flag>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, claim_id, author, reason, is_resolved, created_at, resolved_at FROM flags WHERE 1=1",
        );
        if let Some(claim_id) = claim_id {
            query.push(" AND claim_id = ");
            query.push_bind(claim_id.to_string());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query.build_query_as::<FlagRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Flag::from).collect())
    }

    async fn add_note(&self, note: NewNote) -> ClaimsResult<Note> {
        validate_note(&note)?;

        let row = sqlx::query_as::<_, NoteRow>(
            r#"
            INSERT INTO notes (claim_id, author, content, note_type)
            SELECT id, $2, $3, $4 FROM claims WHERE id = $1
            RETURNING id, claim_id, author, content, note_type, created_at, updated_at
            "#,
        )
        .bind(&note.claim_id)
        .bind(&note.author)
        .bind(&note.content)
        .bind(note.note_type.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ClaimsError::ClaimNotFound(note.claim_id.clone()))?;

        Note::try_from(row)
    }

    async fn list_notes(&self, claim_id: Option<&str>) -> ClaimsResult<Vec<Note>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, claim_id, author, content, note_type, created_at, updated_at FROM notes WHERE 1=1",
        );
        if let Some(claim_id) = claim_id {
            query.push(" AND claim_id = ");
            query.push_bind(claim_id.to_string());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows = query.build_query_as::<NoteRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(Note::try_from).collect()
    }
}
