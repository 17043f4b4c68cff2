//! Dashboard aggregation over claims, details and annotations.
//!
//! [`DashboardReport::build`] is a pure function of its inputs and the current
//! date. [`DashboardReport::load`] fetches everything from a [`ClaimStore`] first.

use crate::error::ClaimsResult;
use crate::models::{today, Claim, ClaimDetail, ClaimFilter, ClaimStatus, Flag, Note, NoteType};
use crate::store::ClaimStore;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

const TREND_WINDOW_DAYS: i64 = 180;
const RECENT_FLAG_DAYS: i64 = 7;
const TOP_LIMIT: usize = 10;
const ACTIVITY_PREVIEW_CHARS: usize = 50;

/// Dashboard filter as typed by a user. Unparseable values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub insurer: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub insurer: Option<String>,
    pub status: Option<ClaimStatus>,
}

impl From<&DashboardQuery> for DashboardFilter {
    fn from(query: &DashboardQuery) -> Self {
        let date = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
        };
        let insurer = query
            .insurer
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        // "all" and unknown statuses leave the status unfiltered
        let status = query
            .status
            .as_deref()
            .and_then(|value| value.parse::<ClaimStatus>().ok());

        Self {
            from_date: date(&query.from_date),
            to_date: date(&query.to_date),
            insurer,
            status,
        }
    }
}

impl DashboardFilter {
    fn claim_filter(&self) -> ClaimFilter {
        ClaimFilter {
            search: None,
            status: self.status,
            insurer: self.insurer.clone(),
            from_date: self.from_date,
            to_date: self.to_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStatusCount {
    /// First day of the month
    pub month: NaiveDate,
    pub status: ClaimStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPaymentRatio {
    pub month: NaiveDate,
    pub total_billed: Decimal,
    pub total_paid: Decimal,
    pub payment_ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsurerStatusCount {
    pub insurer_name: String,
    pub status: ClaimStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CptCodeCount {
    pub code: String,
    pub count: usize,
}

/// Under Review claims by days since discharge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgingBuckets {
    #[serde(rename = "0-30")]
    pub days_0_30: usize,
    #[serde(rename = "31-60")]
    pub days_31_60: usize,
    #[serde(rename = "61-90")]
    pub days_61_90: usize,
    #[serde(rename = "90+")]
    pub days_over_90: usize,
}

impl AgingBuckets {
    fn record(&mut self, days: i64) {
        match days {
            i64::MIN..=30 => self.days_0_30 += 1,
            31..=60 => self.days_31_60 += 1,
            61..=90 => self.days_61_90 += 1,
            _ => self.days_over_90 += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Flag,
    Note,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub claim_id: String,
    pub author: String,
    /// Reason or note text, shortened for display
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_resolved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Underpayment {
    pub claim_id: String,
    pub patient_name: String,
    pub insurer_name: String,
    pub billed_amount: Decimal,
    pub paid_amount: Decimal,
    pub underpayment: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub total_claims: usize,
    pub paid_claims: usize,
    pub denied_claims: usize,
    pub under_review_claims: usize,
    /// Paid over billed, percent, one decimal place
    pub payment_rate: Decimal,
    /// Denied over total claims, percent, one decimal place
    pub denial_rate: Decimal,
    pub monthly_status: Vec<MonthlyStatusCount>,
    pub monthly_payment_ratio: Vec<MonthlyPaymentRatio>,
    pub insurer_breakdown: Vec<InsurerStatusCount>,
    pub top_cpt_codes: Vec<CptCodeCount>,
    pub aging_buckets: AgingBuckets,
    pub total_flags: usize,
    pub recent_flags: usize,
    pub recent_activity: Vec<Activity>,
    pub top_underpayment: Vec<Underpayment>,
    /// Every insurer on file, ignoring the filter
    pub insurers: Vec<String>,
    pub filter: DashboardFilter,
}

impl DashboardReport {
    /// Fetch everything from `store` and build the report for today
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn load(store: &dyn ClaimStore, filter: DashboardFilter) -> ClaimsResult<Self> {
        let claims = store.list_claims(&ClaimFilter::default()).await?;
        let details = store.list_details().await?;
        let flags = store.list_flags(None).await?;
        let notes = store.list_notes(None).await?;

        Ok(Self::build(&claims, &details, &flags, &notes, filter, today()))
    }

    pub fn build(
        all_claims: &[Claim],
        details: &[ClaimDetail],
        flags: &[Flag],
        notes: &[Note],
        filter: DashboardFilter,
        today: NaiveDate,
    ) -> Self {
        let claim_filter = filter.claim_filter();
        let claims: Vec<&Claim> = all_claims.iter().filter(|claim| claim_filter.matches(claim)).collect();
        let claim_ids: HashSet<&str> = claims.iter().map(|claim| claim.id.as_str()).collect();

        let count_status = |status: ClaimStatus| claims.iter().filter(|claim| claim.status == status).count();
        let total_claims = claims.len();
        let paid_claims = count_status(ClaimStatus::Paid);
        let denied_claims = count_status(ClaimStatus::Denied);
        let under_review_claims = count_status(ClaimStatus::UnderReview);

        let total_billed = total(claims.iter().map(|claim| claim.billed_amount));
        let total_paid = total(claims.iter().map(|claim| claim.paid_amount));
        let payment_rate = percent(total_paid, total_billed);
        let denial_rate = percent(Decimal::from(denied_claims), Decimal::from(total_claims));

        let (monthly_status, monthly_payment_ratio) = monthly_trends(&claims, today);

        let mut insurer_counts: BTreeMap<(&str, ClaimStatus), usize> = BTreeMap::new();
        for claim in &claims {
            *insurer_counts.entry((claim.insurer_name.as_str(), claim.status)).or_default() += 1;
        }
        let insurer_breakdown = insurer_counts
            .into_iter()
            .map(|((insurer_name, status), count)| InsurerStatusCount {
                insurer_name: insurer_name.to_string(),
                status,
                count,
            })
            .collect();

        let mut aging_buckets = AgingBuckets::default();
        for claim in claims.iter().filter(|claim| claim.status == ClaimStatus::UnderReview) {
            aging_buckets.record((today - claim.discharge_date).num_days());
        }

        let flags: Vec<&Flag> = flags
            .iter()
            .filter(|flag| claim_ids.contains(flag.claim_id.as_str()))
            .collect();
        let notes: Vec<&Note> = notes
            .iter()
            .filter(|note| claim_ids.contains(note.claim_id.as_str()))
            .collect();
        let recent_cutoff = today - Duration::days(RECENT_FLAG_DAYS);
        let recent_flags = flags
            .iter()
            .filter(|flag| flag.created_at.date_naive() >= recent_cutoff)
            .count();

        let insurers: BTreeSet<&str> = all_claims
            .iter()
            .map(|claim| claim.insurer_name.as_str())
            .filter(|name| !name.is_empty())
            .collect();

        Self {
            total_claims,
            paid_claims,
            denied_claims,
            under_review_claims,
            payment_rate,
            denial_rate,
            monthly_status,
            monthly_payment_ratio,
            insurer_breakdown,
            top_cpt_codes: top_cpt_codes(details, &claim_ids),
            aging_buckets,
            total_flags: flags.len(),
            recent_flags,
            recent_activity: recent_activity(&flags, &notes),
            top_underpayment: top_underpayment(&claims),
            insurers: insurers.into_iter().map(str::to_string).collect(),
            filter,
        }
    }
}

/// Sum that saturates at `Decimal::MAX` instead of overflowing
fn total(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

/// `part / whole * 100` to one decimal place, zero when `whole` is zero
fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    let ratio = part
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(whole))
        .or_else(|| part.checked_div(whole).and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED)))
        .unwrap_or(Decimal::ZERO);
    ratio.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn monthly_trends(claims: &[&Claim], today: NaiveDate) -> (Vec<MonthlyStatusCount>, Vec<MonthlyPaymentRatio>) {
    let window_start = today - Duration::days(TREND_WINDOW_DAYS);
    let mut by_status: BTreeMap<(NaiveDate, ClaimStatus), usize> = BTreeMap::new();
    let mut by_month: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();

    for claim in claims.iter().filter(|claim| claim.discharge_date >= window_start) {
        let month = month_start(claim.discharge_date);
        *by_status.entry((month, claim.status)).or_default() += 1;
        let totals = by_month.entry(month).or_insert((Decimal::ZERO, Decimal::ZERO));
        totals.0 = totals.0.saturating_add(claim.billed_amount);
        totals.1 = totals.1.saturating_add(claim.paid_amount);
    }

    let status_counts = by_status
        .into_iter()
        .map(|((month, status), count)| MonthlyStatusCount { month, status, count })
        .collect();
    let ratios = by_month
        .into_iter()
        .map(|(month, (total_billed, total_paid))| MonthlyPaymentRatio {
            month,
            total_billed,
            total_paid,
            payment_ratio: percent(total_paid, total_billed),
        })
        .collect();

    (status_counts, ratios)
}

fn top_cpt_codes(details: &[ClaimDetail], claim_ids: &HashSet<&str>) -> Vec<CptCodeCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for detail in details.iter().filter(|detail| claim_ids.contains(detail.claim_id.as_str())) {
        for code in detail.cpt_codes_list() {
            *counts.entry(code).or_default() += 1;
        }
    }

    let mut ranked: Vec<CptCodeCount> = counts
        .into_iter()
        .map(|(code, count)| CptCodeCount { code, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
    ranked.truncate(TOP_LIMIT);
    ranked
}

fn preview(text: &str) -> String {
    if text.chars().count() > ACTIVITY_PREVIEW_CHARS {
        let head: String = text.chars().take(ACTIVITY_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn recent_activity(flags: &[&Flag], notes: &[&Note]) -> Vec<Activity> {
    let mut activity: Vec<Activity> = flags
        .iter()
        .map(|flag| Activity {
            kind: ActivityKind::Flag,
            claim_id: flag.claim_id.clone(),
            author: flag.author.clone(),
            content: preview(&flag.reason),
            created_at: flag.created_at,
            is_resolved: Some(flag.is_resolved),
            note_type: None,
        })
        .chain(notes.iter().map(|note| Activity {
            kind: ActivityKind::Note,
            claim_id: note.claim_id.clone(),
            author: note.author.clone(),
            content: preview(&note.content),
            created_at: note.created_at,
            is_resolved: None,
            note_type: Some(note.note_type),
        }))
        .collect();

    activity.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    activity.truncate(TOP_LIMIT);
    activity
}

fn top_underpayment(claims: &[&Claim]) -> Vec<Underpayment> {
    let mut underpaid: Vec<Underpayment> = claims
        .iter()
        .filter(|claim| claim.status == ClaimStatus::Paid && claim.underpayment() > Decimal::ZERO)
        .map(|claim| Underpayment {
            claim_id: claim.id.clone(),
            patient_name: claim.patient_name.clone(),
            insurer_name: claim.insurer_name.clone(),
            billed_amount: claim.billed_amount,
            paid_amount: claim.paid_amount,
            underpayment: claim.underpayment(),
        })
        .collect();

    underpaid.sort_by(|a, b| {
        b.underpayment
            .cmp(&a.underpayment)
            .then_with(|| a.claim_id.cmp(&b.claim_id))
    });
    underpaid.truncate(TOP_LIMIT);
    underpaid
}
