use chrono::{DateTime, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClaimStatus {
    Denied,
    #[serde(rename = "Under Review")]
    UnderReview,
    Paid,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 3] = [ClaimStatus::Paid, ClaimStatus::Denied, ClaimStatus::UnderReview];

    /// Label as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Denied => "Denied",
            ClaimStatus::UnderReview => "Under Review",
            ClaimStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        match normalized.as_str() {
            "denied" => Ok(ClaimStatus::Denied),
            "under review" => Ok(ClaimStatus::UnderReview),
            "paid" => Ok(ClaimStatus::Paid),
            _ => Err(format!("unknown claim status: {}", s)),
        }
    }
}

/// Insurance claim keyed by its externally supplied id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub patient_name: String,
    pub billed_amount: Decimal,
    pub paid_amount: Decimal,
    pub status: ClaimStatus,
    pub insurer_name: String,
    pub discharge_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Billed minus paid, floored at zero
    pub fn underpayment(&self) -> Decimal {
        (self.billed_amount - self.paid_amount).max(Decimal::ZERO)
    }
}

/// Procedure codes and denial reason attached to one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDetail {
    pub claim_id: String,
    /// Comma-separated CPT codes as received
    pub cpt_codes: String,
    pub denial_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimDetail {
    pub fn cpt_codes_list(&self) -> Vec<String> {
        self.cpt_codes
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Field values supplied by one import row. `None` means the field was absent and the
/// stored value is kept; on creation the documented default is used instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimPatch {
    pub id: String,
    pub patient_name: Option<String>,
    pub billed_amount: Option<Decimal>,
    pub paid_amount: Option<Decimal>,
    pub status: Option<ClaimStatus>,
    pub insurer_name: Option<String>,
    pub discharge_date: Option<NaiveDate>,
}

impl ClaimPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Build a new claim, filling absent fields with defaults
    pub fn to_new_claim(&self, today: NaiveDate, now: DateTime<Utc>) -> Claim {
        Claim {
            id: self.id.clone(),
            patient_name: self.patient_name.clone().unwrap_or_default(),
            billed_amount: self.billed_amount.unwrap_or_else(zero_amount),
            paid_amount: self.paid_amount.unwrap_or_else(zero_amount),
            status: self.status.unwrap_or(ClaimStatus::UnderReview),
            insurer_name: self.insurer_name.clone().unwrap_or_default(),
            discharge_date: self.discharge_date.unwrap_or(today),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the supplied fields of an existing claim
    pub fn apply_to(&self, claim: &mut Claim, now: DateTime<Utc>) {
        if let Some(name) = &self.patient_name {
            claim.patient_name = name.clone();
        }
        if let Some(amount) = self.billed_amount {
            claim.billed_amount = amount;
        }
        if let Some(amount) = self.paid_amount {
            claim.paid_amount = amount;
        }
        if let Some(status) = self.status {
            claim.status = status;
        }
        if let Some(insurer) = &self.insurer_name {
            claim.insurer_name = insurer.clone();
        }
        if let Some(date) = self.discharge_date {
            claim.discharge_date = date;
        }
        claim.updated_at = now;
    }
}

/// Detail values supplied by one import row, same presence rules as [`ClaimPatch`].
/// `denial_reason: Some(None)` clears a stored reason.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPatch {
    pub claim_id: String,
    pub cpt_codes: Option<String>,
    pub denial_reason: Option<Option<String>>,
}

impl DetailPatch {
    pub fn to_new_detail(&self, now: DateTime<Utc>) -> ClaimDetail {
        ClaimDetail {
            claim_id: self.claim_id.clone(),
            cpt_codes: self.cpt_codes.clone().unwrap_or_default(),
            denial_reason: self.denial_reason.clone().flatten(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(&self, detail: &mut ClaimDetail, now: DateTime<Utc>) {
        if let Some(codes) = &self.cpt_codes {
            detail.cpt_codes = codes.clone();
        }
        if let Some(reason) = &self.denial_reason {
            detail.denial_reason = reason.clone();
        }
        detail.updated_at = now;
    }
}

/// Result of an upsert: the stored record and whether it was newly created
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub record: T,
    pub created: bool,
}

impl<T> Upserted<T> {
    pub fn created(record: T) -> Self {
        Self { record, created: true }
    }

    pub fn updated(record: T) -> Self {
        Self { record, created: false }
    }
}

/// Staff flag raised against a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub id: i64,
    pub claim_id: String,
    pub author: String,
    pub reason: String,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlag {
    pub claim_id: String,
    pub author: String,
    pub reason: String,
}

/// Note type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Admin,
    System,
    #[default]
    User,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Admin => "admin",
            NoteType::System => "system",
            NoteType::User => "user",
        }
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(NoteType::Admin),
            "system" => Ok(NoteType::System),
            "user" => Ok(NoteType::User),
            other => Err(format!("unknown note type: {}", other)),
        }
    }
}

/// Free-text annotation on a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub claim_id: String,
    pub author: String,
    pub content: String,
    pub note_type: NoteType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub claim_id: String,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub note_type: NoteType,
}

/// Listing filter; every field is optional and all given fields must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFilter {
    /// Case-insensitive substring of the claim id or patient name
    pub search: Option<String>,
    pub status: Option<ClaimStatus>,
    /// Case-insensitive substring of the insurer name
    pub insurer: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl ClaimFilter {
    pub fn matches(&self, claim: &Claim) -> bool {
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            if !claim.id.to_lowercase().contains(&search)
                && !claim.patient_name.to_lowercase().contains(&search)
            {
                return false;
            }
        }
        if let Some(status) = self.status {
            if claim.status != status {
                return false;
            }
        }
        if let Some(insurer) = self.insurer.as_deref().map(str::to_lowercase) {
            if !claim.insurer_name.to_lowercase().contains(&insurer) {
                return false;
            }
        }
        if let Some(from) = self.from_date {
            if claim.discharge_date < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if claim.discharge_date > to {
                return false;
            }
        }
        true
    }
}

/// Monetary zero at the stored scale
pub fn zero_amount() -> Decimal {
    Decimal::new(0, 2)
}

/// Local calendar date used for date fallbacks
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
