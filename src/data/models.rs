//! Data models representing the grants dataset.
//!
//! `GrantsResponse` mirrors the upstream wire shape and keeps each grant as raw
//! JSON so one malformed entry cannot fail the whole payload. `RawGrant` is the
//! lenient per-record view; `GrantRecord` is the validated record the rest of
//! the crate works with.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantsResponse {
    #[serde(default)]
    pub success: bool,
    pub result: GrantsResult,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// The `result` object of a response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrantsResult {
    #[serde(default)]
    pub grants: Vec<serde_json::Value>,
}

/// Pagination metadata reported by the upstream source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total_results: u64,
    pub pages: u64,
}

/// A grant entry as it appears on the wire.
///
/// Fields stay untyped JSON so a wrongly typed optional field degrades to
/// "absent" instead of failing the whole record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGrant {
    #[serde(default)]
    pub date: Option<serde_json::Value>,
    #[serde(default)]
    pub agency: Option<serde_json::Value>,
    #[serde(default)]
    pub recipient: Option<serde_json::Value>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub savings: Option<serde_json::Value>,
    #[serde(default)]
    pub link: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
}

/// Why a single wire record was dropped during load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordRejection {
    #[error("record is not a grant object: {0}")]
    Malformed(String),
    #[error("missing agency")]
    MissingAgency,
    #[error("missing recipient")]
    MissingRecipient,
    #[error("missing value")]
    MissingValue,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("invalid savings: {0}")]
    InvalidSavings(String),
}

/// One funded grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    /// Award date as stored upstream (`M/D/YYYY` or ISO)
    pub date: String,
    pub agency: String,
    pub recipient: String,
    /// Whole currency units
    pub value: u64,
    /// `None` means "not reported"
    pub savings: Option<u64>,
    pub link: Option<String>,
    pub description: Option<String>,
}

impl GrantRecord {
    /// Validate a raw JSON grant entry
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordRejection> {
        let raw: RawGrant = serde_json::from_value(value)
            .map_err(|e| RecordRejection::Malformed(e.to_string()))?;
        raw.validate()
    }

    /// Parse the stored date into a calendar date, if it is in a known layout
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let date = self.date.trim();
        NaiveDate::parse_from_str(date, "%m/%d/%Y")
            .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
            .ok()
    }
}

impl RawGrant {
    /// Turn a wire record into a `GrantRecord`, or explain why it can't be one
    pub fn validate(self) -> Result<GrantRecord, RecordRejection> {
        let agency = text(self.agency).ok_or(RecordRejection::MissingAgency)?;
        let recipient = text(self.recipient).ok_or(RecordRejection::MissingRecipient)?;
        let value = match self.value {
            None | Some(serde_json::Value::Null) => return Err(RecordRejection::MissingValue),
            Some(v) => {
                whole_units(&v).ok_or_else(|| RecordRejection::InvalidValue(v.to_string()))?
            }
        };
        let savings = match self.savings {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => {
                let units = whole_units(&v);
                Some(units.ok_or_else(|| RecordRejection::InvalidSavings(v.to_string()))?)
            }
        };

        Ok(GrantRecord {
            date: text(self.date).unwrap_or_default(),
            agency,
            recipient,
            value,
            savings,
            link: text(self.link),
            description: text(self.description),
        })
    }
}

/// A non-blank string field; other JSON types and blank strings count as absent
fn text(field: Option<serde_json::Value>) -> Option<String> {
    match field {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}

/// Convert a JSON number to whole currency units.
/// Non-numbers and negative or non-finite amounts are rejected.
/// Fractional amounts round to the nearest unit.
fn whole_units(value: &serde_json::Value) -> Option<u64> {
    let serde_json::Value::Number(n) = value else {
        return None;
    };
    if let Some(v) = n.as_u64() {
        return Some(v);
    }
    if n.is_i64() {
        return None;
    }
    let v = n.as_f64()?;
    if !v.is_finite() || v < 0.0 || v >= u64::MAX as f64 {
        return None;
    }
    Some(v.round() as u64)
}

/// An ordered, immutable sequence of grants.
///
/// Cloning is cheap; every clone shares the same records. Order is whatever
/// the producer delivered (upstream promises descending `value`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantCollection {
    records: Arc<Vec<GrantRecord>>,
}

impl GrantCollection {
    pub fn new(records: Vec<GrantRecord>) -> Self {
        GrantCollection {
            records: Arc::new(records),
        }
    }
}

impl std::ops::Deref for GrantCollection {
    type Target = [GrantRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_record() {
        let record = GrantRecord::from_json(json!({
            "date": "3/23/2025",
            "agency": "Department of Health and Human Services",
            "recipient": "NEW YORK, CITY OF",
            "value": 807512729,
            "savings": 39516923,
            "link": null,
            "description": null
        }))
        .unwrap();

        assert_eq!(record.value, 807_512_729);
        assert_eq!(record.savings, Some(39_516_923));
        assert_eq!(record.link, None);
    }

    #[test]
    fn test_null_savings_is_not_reported() {
        let record = GrantRecord::from_json(json!({
            "date": "3/1/2025", "agency": "USAID", "recipient": "X", "value": 10, "savings": null
        }))
        .unwrap();
        assert_eq!(record.savings, None);
    }

    #[test]
    fn test_rejects_negative_value() {
        let err = GrantRecord::from_json(json!({
            "date": "3/1/2025", "agency": "USAID", "recipient": "X", "value": -5
        }))
        .unwrap_err();
        assert!(matches!(err, RecordRejection::InvalidValue(_)));
    }

    #[test]
    fn test_rejects_missing_or_blank_names() {
        assert_eq!(
            GrantRecord::from_json(json!({ "recipient": "X", "value": 1 })).unwrap_err(),
            RecordRejection::MissingAgency
        );
        assert_eq!(
            GrantRecord::from_json(json!({ "agency": "USAID", "recipient": "  ", "value": 1 }))
                .unwrap_err(),
            RecordRejection::MissingRecipient
        );
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            GrantRecord::from_json(json!("not a grant")).unwrap_err(),
            RecordRejection::Malformed(_)
        ));
        assert!(matches!(
            GrantRecord::from_json(json!({ "agency": "USAID", "recipient": "X", "value": "12" }))
                .unwrap_err(),
            RecordRejection::InvalidValue(_)
        ));
        assert_eq!(
            GrantRecord::from_json(json!({ "agency": "USAID", "recipient": "X", "value": null }))
                .unwrap_err(),
            RecordRejection::MissingValue
        );
    }

    #[test]
    fn test_wrongly_typed_optional_fields_are_absent() {
        let record = GrantRecord::from_json(json!({
            "date": 20250301,
            "agency": "USAID",
            "recipient": "X",
            "value": 10,
            "link": 5,
            "description": { "text": "nested" }
        }))
        .unwrap();
        assert_eq!(record.date, "");
        assert_eq!(record.link, None);
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_non_string_agency_is_missing() {
        assert_eq!(
            GrantRecord::from_json(json!({ "agency": 7, "recipient": "X", "value": 1 }))
                .unwrap_err(),
            RecordRejection::MissingAgency
        );
    }

    #[test]
    fn test_fractional_value_rounds() {
        let record = GrantRecord::from_json(json!({
            "agency": "USAID", "recipient": "X", "value": 1234.6, "savings": 0.4
        }))
        .unwrap();
        assert_eq!(record.value, 1235);
        assert_eq!(record.savings, Some(0));
    }

    #[test]
    fn test_calendar_date_formats() {
        let mut record = GrantRecord::from_json(json!({
            "date": "3/1/2025", "agency": "USAID", "recipient": "X", "value": 1
        }))
        .unwrap();
        assert_eq!(record.calendar_date(), NaiveDate::from_ymd_opt(2025, 3, 1));

        record.date = "2025-03-23".to_string();
        assert_eq!(record.calendar_date(), NaiveDate::from_ymd_opt(2025, 3, 23));

        record.date = "sometime".to_string();
        assert_eq!(record.calendar_date(), None);
    }
}
