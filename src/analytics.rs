//! Incident report analytics
//!
//! The dashboard asks three questions of `incident_reports`: how often each
//! violation type occurs, how many reports each country has, and how many
//! reports fall on each day. Against MongoDB these run as aggregation
//! pipelines; the in-memory store folds over decoded reports with the same
//! filter and ordering rules.

use std::collections::BTreeMap;

use bson::{doc, Bson, Document};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::db::ReportDoc;
use crate::models::dates::{format_day, DAY_FORMAT};
use crate::models::{parse_day, DayRange, ViolationType};
use crate::types::HrmError;

/// Earliest day shown when no `from` filter is given
pub const DEFAULT_FROM: (i32, u32, u32) = (2024, 1, 1);

/// Dashboard filter over incident reports
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsFilter {
    pub from: NaiveDate,
    /// Inclusive
    pub to: NaiveDate,
    pub violation_type: Option<ViolationType>,
    pub country: Option<String>,
}

impl Default for AnalyticsFilter {
    fn default() -> Self {
        let (y, m, d) = DEFAULT_FROM;
        Self {
            from: NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN),
            to: Utc::now().date_naive(),
            violation_type: None,
            country: None,
        }
    }
}

impl AnalyticsFilter {
    /// Build a filter from raw form values; blanks fall back to defaults
    pub fn parse(
        from: Option<&str>,
        to: Option<&str>,
        violation_type: Option<&str>,
        country: Option<&str>,
    ) -> Result<Self, HrmError> {
        let mut filter = Self::default();

        if let Some(raw) = non_blank(from) {
            filter.from = parse_day(raw)?;
        }
        if let Some(raw) = non_blank(to) {
            filter.to = parse_day(raw)?;
        }
        if filter.from > filter.to {
            return Err(HrmError::BadRequest(
                "'from' must not be later than 'to'".to_string(),
            ));
        }
        filter.violation_type = non_blank(violation_type)
            .map(str::parse::<ViolationType>)
            .transpose()?;
        filter.country = non_blank(country).map(|c| c.trim().to_string());

        Ok(filter)
    }

    fn range(&self) -> DayRange {
        DayRange {
            from: Some(self.from),
            to: Some(self.to),
        }
    }

    /// `$match` stage shared by all three pipelines
    pub fn match_stage(&self) -> Document {
        let mut cond = doc! {};
        if let Some(range) = self.range().to_condition() {
            cond.insert("incident_details.date", range);
        }
        if let Some(violation) = self.violation_type {
            cond.insert("incident_details.violation_types", violation.as_str());
        }
        if let Some(ref country) = self.country {
            cond.insert("incident_details.location.country", country.as_str());
        }
        doc! { "$match": cond }
    }

    pub fn matches(&self, report: &ReportDoc) -> bool {
        let details = &report.incident_details;
        if !self.range().contains(details.date) {
            return false;
        }
        if let Some(violation) = self.violation_type {
            if !details.violation_types.contains(&violation) {
                return false;
            }
        }
        if let Some(ref country) = self.country {
            if &details.location.country != country {
                return false;
            }
        }
        true
    }

    /// Query-string form of the filter, for links that keep the selection
    pub fn to_query(&self) -> String {
        let mut pairs = vec![
            ("from", self.from.format(DAY_FORMAT).to_string()),
            ("to", self.to.format(DAY_FORMAT).to_string()),
        ];
        if let Some(violation) = self.violation_type {
            pairs.push(("violation_type", violation.as_str().to_string()));
        }
        if let Some(ref country) = self.country {
            pairs.push(("country", country.clone()));
        }
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// One row of an aggregation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub key: String,
    pub count: u64,
}

impl CountBucket {
    pub fn new(key: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            count,
        }
    }
}

/// Report count per violation type
pub fn violation_pipeline(filter: &AnalyticsFilter) -> Vec<Document> {
    vec![
        filter.match_stage(),
        doc! { "$unwind": "$incident_details.violation_types" },
        doc! { "$group": { "_id": "$incident_details.violation_types", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
    ]
}

/// Report count per country
pub fn country_pipeline(filter: &AnalyticsFilter) -> Vec<Document> {
    vec![
        filter.match_stage(),
        doc! { "$group": { "_id": "$incident_details.location.country", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
    ]
}

/// Report count per incident day
pub fn timeline_pipeline(filter: &AnalyticsFilter) -> Vec<Document> {
    vec![
        filter.match_stage(),
        doc! {
            "$group": {
                "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$incident_details.date" } },
                "count": { "$sum": 1 }
            }
        },
        doc! { "$sort": { "_id": 1 } },
    ]
}

/// Decode `{_id, count}` documents returned by a pipeline
///
/// Groups with a null or non-string key are dropped.
pub fn buckets_from_documents(docs: Vec<Document>) -> Vec<CountBucket> {
    docs.into_iter()
        .filter_map(|d| {
            let key = d.get_str("_id").ok()?.to_string();
            let count = match d.get("count")? {
                Bson::Int32(n) => *n as u64,
                Bson::Int64(n) => *n as u64,
                Bson::Double(n) => *n as u64,
                _ => return None,
            };
            Some(CountBucket { key, count })
        })
        .collect()
}

fn ranked(counts: BTreeMap<String, u64>) -> Vec<CountBucket> {
    let mut buckets: Vec<CountBucket> = counts
        .into_iter()
        .map(|(key, count)| CountBucket { key, count })
        .collect();
    // BTreeMap order already breaks ties by key; the sort is stable
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

/// In-memory equivalent of [`violation_pipeline`]
pub fn tally_violations<'a>(
    reports: impl IntoIterator<Item = &'a ReportDoc>,
    filter: &AnalyticsFilter,
) -> Vec<CountBucket> {
    let mut counts = BTreeMap::new();
    for report in reports.into_iter().filter(|r| filter.matches(r)) {
        for violation in &report.incident_details.violation_types {
            *counts.entry(violation.as_str().to_string()).or_insert(0) += 1;
        }
    }
    ranked(counts)
}

/// In-memory equivalent of [`country_pipeline`]
pub fn tally_countries<'a>(
    reports: impl IntoIterator<Item = &'a ReportDoc>,
    filter: &AnalyticsFilter,
) -> Vec<CountBucket> {
    let mut counts = BTreeMap::new();
    for report in reports.into_iter().filter(|r| filter.matches(r)) {
        *counts
            .entry(report.incident_details.location.country.clone())
            .or_insert(0) += 1;
    }
    ranked(counts)
}

/// In-memory equivalent of [`timeline_pipeline`]
pub fn tally_days<'a>(
    reports: impl IntoIterator<Item = &'a ReportDoc>,
    filter: &AnalyticsFilter,
) -> Vec<CountBucket> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for report in reports.into_iter().filter(|r| filter.matches(r)) {
        *counts.entry(format_day(report.incident_details.date)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| CountBucket { key, count })
        .collect()
}

/// All three result sets for one filter
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardData {
    pub violations: Vec<CountBucket>,
    pub countries: Vec<CountBucket>,
    pub timeline: Vec<CountBucket>,
}

impl DashboardData {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty() && self.countries.is_empty() && self.timeline.is_empty()
    }
}
