//! Bulk claim import.
//!
//! A batch runs in two phases. Every record is first normalized into a
//! [`ClaimPatch`] and [`DetailPatch`]; strict-mode coercion failures abort here,
//! before anything is cleared or written. The prepared records are then upserted
//! one at a time in file order. Per-record problems become warnings on the
//! [`ImportReport`] and never abort the batch.

use crate::coerce::{identifier, text, Coercer, CoercionMode};
use crate::error::ClaimsResult;
use crate::models::{today, ClaimPatch, DetailPatch};
use crate::source::{read_records, FileFormat, RawRecord};
use crate::store::ClaimStore;
use chrono::NaiveDate;
use logger_redacted::redacted_warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const CLAIM_ID_KEYS: [&str; 2] = ["id", "claim_id"];

/// What a batch imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Claims,
    ClaimDetails,
}

impl ImportKind {
    pub fn label(&self) -> &'static str {
        match self {
            ImportKind::Claims => "claims",
            ImportKind::ClaimDetails => "claim details",
        }
    }
}

/// A per-record problem reported back to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    /// 1-based position of the record in the batch
    pub record: usize,
    pub claim_id: Option<String>,
    pub message: String,
}

/// Outcome of one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub kind: ImportKind,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub warnings: Vec<ImportWarning>,
}

impl ImportReport {
    pub fn new(kind: ImportKind, processed: usize) -> Self {
        Self {
            kind,
            processed,
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            warnings: Vec::new(),
        }
    }

    /// Operator-facing summary line
    pub fn summary(&self) -> String {
        format!(
            "Successfully processed {} {}: {} created, {} updated",
            self.processed,
            self.kind.label(),
            self.created,
            self.updated
        )
    }

    pub(crate) fn warn(&mut self, record: usize, claim_id: Option<&str>, message: impl Into<String>) {
        let warning = ImportWarning {
            record,
            claim_id: claim_id.map(str::to_string),
            message: message.into(),
        };
        redacted_warn!(
            "{} import, record {} ({}): {}",
            self.kind.label(),
            warning.record,
            warning.claim_id.as_deref().unwrap_or("unknown"),
            warning.message
        );
        self.warnings.push(warning);
    }

    pub(crate) fn skip(&mut self, record: usize, claim_id: Option<&str>, message: impl Into<String>) {
        self.skipped += 1;
        self.warn(record, claim_id, message);
    }

    pub(crate) fn fail(&mut self, record: usize, claim_id: Option<&str>, message: impl Into<String>) {
        self.failed += 1;
        self.warn(record, claim_id, message);
    }
}

/// A record after the first phase
#[derive(Debug)]
pub(crate) enum Prepared<T> {
    Ready {
        record: usize,
        claim_id: String,
        value: T,
        warnings: Vec<String>,
    },
    Skip {
        record: usize,
        message: String,
    },
    Fail {
        record: usize,
        message: String,
    },
}

/// View a raw value as an object record, or explain why it is not one
pub(crate) fn as_record(value: &Value) -> Result<&RawRecord, String> {
    value
        .as_object()
        .ok_or_else(|| format!("expected an object record, found {}", json_kind(value)))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Detail fields carried by a record. A present `denial_reason` key always
/// counts, so a blank value clears a stored reason.
pub(crate) fn detail_patch(claim_id: &str, record: &RawRecord) -> DetailPatch {
    DetailPatch {
        claim_id: claim_id.to_string(),
        cpt_codes: text(record.get("cpt_codes")),
        denial_reason: record.get("denial_reason").map(|value| text(Some(value))),
    }
}

/// Imports claims, and the detail fields carried on the same rows
pub struct ClaimImporter {
    store: Arc<dyn ClaimStore>,
    mode: CoercionMode,
}

impl ClaimImporter {
    pub fn new(store: Arc<dyn ClaimStore>, mode: CoercionMode) -> Self {
        Self { store, mode }
    }

    /// Import a claims file.
    ///
    /// # Errors
    ///
    /// Fails without touching the store when the file cannot be read or parsed,
    /// or when strict coercion rejects a value. A failure while clearing existing
    /// claims is also fatal.
    pub async fn import_file(
        &self,
        path: &Path,
        format: Option<FileFormat>,
        clear_existing: bool,
    ) -> ClaimsResult<ImportReport> {
        let format = FileFormat::resolve(format, path)?;
        info!(path = %path.display(), %format, mode = %self.mode, "Importing claims");

        let records = read_records(path, format, "claims")?;
        self.import_records(records, clear_existing).await
    }

    /// Import already parsed records
    ///
    /// # Errors
    ///
    /// See [`ClaimImporter::import_file`].
    pub async fn import_records(&self, records: Vec<Value>, clear_existing: bool) -> ClaimsResult<ImportReport> {
        let today = today();
        let prepared = records
            .iter()
            .enumerate()
            .map(|(index, value)| self.prepare(index + 1, value, today))
            .collect::<ClaimsResult<Vec<_>>>()?;

        if clear_existing {
            let removed = self.store.clear_claims().await?;
            info!(removed, "Cleared existing claims");
        }

        let mut report = ImportReport::new(ImportKind::Claims, records.len());
        for item in prepared {
            match item {
                Prepared::Skip { record, message } => report.skip(record, None, message),
                Prepared::Fail { record, message } => report.fail(record, None, message),
                Prepared::Ready {
                    record,
                    claim_id,
                    value: (claim, detail),
                    warnings,
                } => {
                    for warning in warnings {
                        report.warn(record, Some(&claim_id), warning);
                    }
                    self.save(&mut report, record, &claim_id, claim, detail).await;
                }
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

    fn prepare(
        &self,
        record: usize,
        value: &Value,
        today: NaiveDate,
    ) -> ClaimsResult<Prepared<(ClaimPatch, DetailPatch)>> {
        let fields = match as_record(value) {
            Ok(fields) => fields,
            Err(message) => return Ok(Prepared::Fail { record, message }),
        };

        let Some(claim_id) = identifier(fields, &CLAIM_ID_KEYS) else {
            return Ok(Prepared::Skip {
                record,
                message: "Skipping claim without ID".to_string(),
            });
        };

        let mut coercer = Coercer::new(self.mode, today, record);
        let claim = ClaimPatch {
            id: claim_id.clone(),
            patient_name: text(fields.get("patient_name")),
            billed_amount: coercer.amount(fields, "billed_amount")?,
            paid_amount: coercer.amount(fields, "paid_amount")?,
            status: coercer.status(fields, "status")?,
            insurer_name: text(fields.get("insurer_name")),
            discharge_date: coercer.date(fields, "discharge_date")?,
        };
        let detail = detail_patch(&claim_id, fields);

        Ok(Prepared::Ready {
            record,
            claim_id,
            value: (claim, detail),
            warnings: coercer.into_warnings(),
        })
    }

    async fn save(
        &self,
        report: &mut ImportReport,
        record: usize,
        claim_id: &str,
        claim: ClaimPatch,
        detail: DetailPatch,
    ) {
        match self.store.upsert_claim(claim).await {
            Ok(upserted) if upserted.created => report.created += 1,
            Ok(_) => report.updated += 1,
            Err(err) => {
                report.fail(record, Some(claim_id), format!("Error processing claim: {}", err));
                return;
            }
        }

        match self.store.upsert_detail(detail).await {
            Ok(upserted) => debug!(claim_id, created = upserted.created, "Saved claim detail"),
            Err(err) => report.warn(record, Some(claim_id), format!("Error saving claim detail: {}", err)),
        }
    }
}
