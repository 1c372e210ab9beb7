//! Aggregates over a grant collection.
//!
//! Everything here is a pure function of the records passed in. Dashboard
//! figures are recomputed from the current snapshot rather than cached.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::GrantRecord;
use crate::format::Usd;

/// Sum of `value` over all records
pub fn total_value(records: &[GrantRecord]) -> Usd {
    records.iter().map(|g| Usd::from_dollars(g.value)).sum()
}

/// Sum of `savings`, counting "not reported" as zero
pub fn total_savings(records: &[GrantRecord]) -> Usd {
    records
        .iter()
        .map(|g| Usd::from_dollars(g.savings.unwrap_or(0)))
        .sum()
}

/// Mean `value`, zero for an empty collection
pub fn average_value(records: &[GrantRecord]) -> Usd {
    total_value(records).div_round(records.len())
}

/// Unique recipients in first-seen order
pub fn distinct_recipients(records: &[GrantRecord]) -> Vec<&str> {
    distinct_by(records, |g| g.recipient.as_str())
}

/// Unique agencies in first-seen order
pub fn distinct_agencies(records: &[GrantRecord]) -> Vec<&str> {
    distinct_by(records, |g| g.agency.as_str())
}

fn distinct_by<'a>(
    records: &'a [GrantRecord],
    field: impl Fn(&'a GrantRecord) -> &'a str,
) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(field)
        .filter(|name| seen.insert(*name))
        .collect()
}

/// The record with the greatest `value`, scanning rather than trusting order.
/// Ties go to the earliest record.
pub fn max_by_value(records: &[GrantRecord]) -> Option<&GrantRecord> {
    records.iter().reduce(|best, g| if g.value > best.value { g } else { best })
}

/// Earliest and latest parseable award dates
pub fn date_range(records: &[GrantRecord]) -> Option<(NaiveDate, NaiveDate)> {
    records
        .iter()
        .filter_map(GrantRecord::calendar_date)
        .fold(None, |range, d| match range {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

/// Dashboard figures for one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedMetrics {
    pub grant_count: usize,
    pub total_value: Usd,
    pub total_savings: Usd,
    pub average_value: Usd,
    pub distinct_recipients: usize,
    pub distinct_agencies: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

impl DerivedMetrics {
    pub fn compute(records: &[GrantRecord]) -> Self {
        DerivedMetrics {
            grant_count: records.len(),
            total_value: total_value(records),
            total_savings: total_savings(records),
            average_value: average_value(records),
            distinct_recipients: distinct_recipients(records).len(),
            distinct_agencies: distinct_agencies(records).len(),
            date_range: date_range(records),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{GrantSource, StaticSource};

    pub(crate) fn grant(
        agency: &str,
        recipient: &str,
        value: u64,
        savings: Option<u64>,
    ) -> GrantRecord {
        GrantRecord {
            date: "3/1/2025".to_string(),
            agency: agency.to_string(),
            recipient: recipient.to_string(),
            value,
            savings,
            link: None,
            description: None,
        }
    }

    pub(crate) async fn sample_records() -> Vec<GrantRecord> {
        StaticSource::sample()
            .fetch()
            .await
            .unwrap()
            .result
            .grants
            .into_iter()
            .map(|g| GrantRecord::from_json(g).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_sample_totals() {
        let records = sample_records().await;
        assert_eq!(total_value(&records), Usd::from_dollars(15_295_411_694));
        assert_eq!(total_savings(&records), Usd::from_dollars(4_715_870_760));
        assert_eq!(average_value(&records), Usd::from_cents(152_954_116_940));
    }

    #[tokio::test]
    async fn test_sample_derived_metrics() {
        let metrics = DerivedMetrics::compute(&sample_records().await);
        assert_eq!(metrics.grant_count, 10);
        assert_eq!(metrics.distinct_recipients, 9);
        assert_eq!(metrics.distinct_agencies, 2);
        assert_eq!(
            metrics.date_range,
            Some((
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 23).unwrap()
            ))
        );
    }

    #[test]
    fn test_empty_collection() {
        let metrics = DerivedMetrics::compute(&[]);
        assert_eq!(metrics.total_value, Usd::ZERO);
        assert_eq!(metrics.total_savings, Usd::ZERO);
        assert_eq!(metrics.average_value, Usd::ZERO);
        assert_eq!(metrics.distinct_recipients, 0);
        assert_eq!(metrics.date_range, None);
        assert!(max_by_value(&[]).is_none());
    }

    #[test]
    fn test_null_savings_count_as_zero() {
        let records = vec![
            grant("USAID", "A", 100, Some(40)),
            grant("USAID", "B", 200, None),
            grant("HHS", "C", 300, Some(0)),
        ];
        assert_eq!(total_savings(&records), Usd::from_dollars(40));
        assert_eq!(average_value(&records), Usd::from_dollars(200));
    }

    #[test]
    fn test_totals_are_exact_at_large_magnitudes() {
        let records: Vec<GrantRecord> = (0..1000)
            .map(|i| grant("HHS", "X", 9_999_999_999 - i, Some(1)))
            .collect();
        let expected: u128 = (0..1000u128).map(|i| 9_999_999_999 - i).sum();
        assert_eq!(total_value(&records).whole_dollars(), expected);
        assert_eq!(total_value(&records).cents() % 100, 0);
    }

    #[test]
    fn test_distinct_is_case_sensitive_and_ordered() {
        let records = vec![
            grant("USAID", "Gavi", 1, None),
            grant("HHS", "GAVI", 1, None),
            grant("USAID", "Gavi", 1, None),
        ];
        assert_eq!(distinct_recipients(&records), vec!["Gavi", "GAVI"]);
        assert_eq!(distinct_agencies(&records), vec!["USAID", "HHS"]);
        assert!(distinct_recipients(&records).len() < records.len());
    }

    #[test]
    fn test_distinct_count_equals_len_when_all_unique() {
        let records = vec![
            grant("USAID", "A", 1, None),
            grant("USAID", "B", 2, None),
            grant("HHS", "C", 3, None),
        ];
        assert_eq!(distinct_recipients(&records).len(), records.len());
        assert_eq!(DerivedMetrics::compute(&records).distinct_recipients, records.len());
    }

    #[test]
    fn test_max_by_value_scans_unsorted_input() {
        let records = vec![
            grant("HHS", "small", 10, None),
            grant("USAID", "big", 500, None),
            grant("HHS", "tied", 500, None),
        ];
        assert_eq!(max_by_value(&records).unwrap().recipient, "big");
    }
}
