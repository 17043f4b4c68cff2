//! Standalone claim-detail import.
//!
//! Rows reference claims that must already exist; a row for an unknown claim is
//! skipped so no orphan detail is ever stored. Present fields override the
//! stored detail and absent fields keep it, the same policy the claims importer
//! applies.

use crate::coerce::{identifier, CoercionMode};
use crate::error::{ClaimsError, ClaimsResult};
use crate::importer::{as_record, detail_patch, ImportKind, ImportReport, Prepared};
use crate::models::DetailPatch;
use crate::source::{read_records, FileFormat};
use crate::store::ClaimStore;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const DETAIL_ID_KEYS: [&str; 2] = ["claim_id", "id"];

pub struct DetailImporter {
    store: Arc<dyn ClaimStore>,
    mode: CoercionMode,
}

impl DetailImporter {
    pub fn new(store: Arc<dyn ClaimStore>, mode: CoercionMode) -> Self {
        Self { store, mode }
    }

    /// Import a claim-details file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or when clearing existing
    /// details fails.
    pub async fn import_file(
        &self,
        path: &Path,
        format: Option<FileFormat>,
        clear_existing: bool,
    ) -> ClaimsResult<ImportReport> {
        let format = FileFormat::resolve(format, path)?;
        info!(path = %path.display(), %format, mode = %self.mode, "Importing claim details");

        let records = read_records(path, format, "details")?;
        self.import_records(records, clear_existing).await
    }

    /// Import already parsed records
    ///
    /// # Errors
    ///
    /// See [`DetailImporter::import_file`].
    pub async fn import_records(&self, records: Vec<Value>, clear_existing: bool) -> ClaimsResult<ImportReport> {
        // Detail fields are free text, so there is nothing for strict mode to reject
        let prepared: Vec<Prepared<DetailPatch>> = records
            .iter()
            .enumerate()
            .map(|(index, value)| prepare(index + 1, value))
            .collect();

        if clear_existing {
            let removed = self.store.clear_details().await?;
            info!(removed, "Cleared existing claim details");
        }

        let mut report = ImportReport::new(ImportKind::ClaimDetails, records.len());
        for item in prepared {
            match item {
                Prepared::Skip { record, message } => report.skip(record, None, message),
                Prepared::Fail { record, message } => report.fail(record, None, message),
                Prepared::Ready {
                    record,
                    claim_id,
                    value,
                    ..
                } => self.save(&mut report, record, &claim_id, value).await,
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "{}",
            report.summary()
        );
        Ok(report)
    }

    async fn save(&self, report: &mut ImportReport, record: usize, claim_id: &str, patch: DetailPatch) {
        match self.store.get_claim(claim_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                report.skip(record, Some(claim_id), format!("Claim {} not found, skipping detail", claim_id));
                return;
            }
            Err(err) => {
                report.fail(record, Some(claim_id), format!("Error looking up claim: {}", err));
                return;
            }
        }

        match self.store.upsert_detail(patch).await {
            Ok(upserted) if upserted.created => report.created += 1,
            Ok(_) => report.updated += 1,
            // The claim was removed between the lookup and the upsert
            Err(ClaimsError::ClaimNotFound(_)) => {
                report.skip(record, Some(claim_id), format!("Claim {} not found, skipping detail", claim_id));
            }
            Err(err) => report.fail(record, Some(claim_id), format!("Error processing claim detail: {}", err)),
        }
    }
}

fn prepare(record: usize, value: &Value) -> Prepared<DetailPatch> {
    let fields = match as_record(value) {
        Ok(fields) => fields,
        Err(message) => return Prepared::Fail { record, message },
    };

    match identifier(fields, &DETAIL_ID_KEYS) {
        Some(claim_id) => Prepared::Ready {
            record,
            value: detail_patch(&claim_id, fields),
            claim_id,
            warnings: Vec::new(),
        },
        None => Prepared::Skip {
            record,
            message: "Skipping claim detail without claim ID".to_string(),
        },
    }
}
