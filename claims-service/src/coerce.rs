//! Field coercion for raw import records.
//!
//! The `parse_*` functions are pure and return `None` when a value cannot be
//! interpreted. [`Coercer`] layers the fallback policy on top: in lenient mode it
//! substitutes the documented default and records a warning, in strict mode it
//! turns the first bad value into [`ClaimsError::Coercion`].

use crate::error::{ClaimsError, ClaimsResult};
use crate::models::{zero_amount, ClaimStatus};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Date formats tried in order; the first match wins
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Largest amount a `NUMERIC(12, 2)` column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2); // 9_999_999_999.99

/// How unparseable amounts, dates and statuses are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionMode {
    /// Substitute a default and record a warning
    #[default]
    Lenient,
    /// Fail the whole batch before anything is written
    Strict,
}

impl fmt::Display for CoercionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoercionMode::Lenient => f.write_str("lenient"),
            CoercionMode::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for CoercionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(CoercionMode::Lenient),
            "strict" => Ok(CoercionMode::Strict),
            other => Err(format!("unknown coercion mode: {}", other)),
        }
    }
}

/// Parse a monetary amount. Numbers are taken as-is; strings have `$` and `,`
/// stripped first. Negative values and values above [`MAX_AMOUNT`] are rejected.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.replace(['$', ','], ""),
        _ => return None,
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()?;
    if amount.is_zero() {
        return Some(zero_amount());
    }
    if amount.is_sign_negative() {
        return None;
    }

    let mut amount = amount.round_dp(2);
    if amount > MAX_AMOUNT {
        return None;
    }
    amount.rescale(2);
    Some(amount)
}

/// Parse a discharge date against the accepted formats
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

pub fn parse_status(value: &Value) -> Option<ClaimStatus> {
    value.as_str()?.parse().ok()
}

/// Text view of a field. `null` and blank strings count as absent; arrays (such
/// as CPT code lists) are joined with `", "`.
pub fn text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        other @ Value::Object(_) => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// First non-blank identifier among `keys`
pub fn identifier(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A field is present when its key exists with a non-null, non-blank value
fn present<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    }
}

/// Applies the fallback policy for one record and collects its warnings
#[derive(Debug)]
pub struct Coercer {
    mode: CoercionMode,
    today: NaiveDate,
    record: usize,
    warnings: Vec<String>,
}

impl Coercer {
    /// `record` is the 1-based position of the record in its batch
    pub fn new(mode: CoercionMode, today: NaiveDate, record: usize) -> Self {
        Self {
            mode,
            today,
            record,
            warnings: Vec::new(),
        }
    }

    pub fn amount(&mut self, record: &Map<String, Value>, field: &'static str) -> ClaimsResult<Option<Decimal>> {
        let Some(value) = present(record, field) else {
            return Ok(None);
        };
        match parse_amount(value) {
            Some(amount) => Ok(Some(amount)),
            None => self.fallback(field, value, "0.00").map(|()| Some(zero_amount())),
        }
    }

    pub fn date(&mut self, record: &Map<String, Value>, field: &'static str) -> ClaimsResult<Option<NaiveDate>> {
        let Some(value) = present(record, field) else {
            return Ok(None);
        };
        match parse_date(value) {
            Some(date) => Ok(Some(date)),
            None => {
                let today = self.today;
                self.fallback(field, value, &today.to_string()).map(|()| Some(today))
            }
        }
    }

    pub fn status(&mut self, record: &Map<String, Value>, field: &'static str) -> ClaimsResult<Option<ClaimStatus>> {
        let Some(value) = present(record, field) else {
            return Ok(None);
        };
        match parse_status(value) {
            Some(status) => Ok(Some(status)),
            None => self
                .fallback(field, value, ClaimStatus::UnderReview.as_str())
                .map(|()| Some(ClaimStatus::UnderReview)),
        }
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn fallback(&mut self, field: &'static str, value: &Value, substitute: &str) -> ClaimsResult<()> {
        let shown = value.as_str().map_or_else(|| value.to_string(), str::to_string);
        match self.mode {
            CoercionMode::Strict => Err(ClaimsError::Coercion {
                record: self.record,
                field,
                value: shown,
            }),
            CoercionMode::Lenient => {
                self.warnings
                    .push(format!("invalid {} {:?}, using {}", field, shown, substitute));
                Ok(())
            }
        }
    }
}
