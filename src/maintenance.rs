//! Data maintenance for `incident_reports`
//!
//! Seeding synthetic reports for dashboard work, and repairing records written
//! by older tooling: string dates in `incident_details.date` and `created_at`,
//! and violation types stored as display labels. Repair works on raw documents
//! because legacy records do not decode as [`ReportDoc`].

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use chrono::{DateTime as ChronoDateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures::TryStreamExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::db::schemas::{
    GeoPoint, IncidentDetails, IncidentLocation, ReportContact, REPORT_COLLECTION,
};
use crate::db::{MongoClient, ReportDoc};
use crate::models::dates::{day_start, DAY_FORMAT};
use crate::models::{ReportStatus, ReporterType, ViolationType};
use crate::types::HrmError;

/// Countries and the city used for each in seeded reports
pub const SEED_PLACES: [(&str, &str); 5] = [
    ("Palestine", "Gaza"),
    ("Syria", "Aleppo"),
    ("Iraq", "Baghdad"),
    ("Lebanon", "Beirut"),
    ("Yemen", "Sana'a"),
];

const SEED_VIOLATIONS: [ViolationType; 5] = [
    ViolationType::Torture,
    ViolationType::ArbitraryArrest,
    ViolationType::ForcedDisplacement,
    ViolationType::UnlawfulKilling,
    ViolationType::EnforcedDisappearance,
];

/// Seeded incident days fall within this many days of 2024-01-01
const SEED_SPAN_DAYS: i64 = 150;

/// Day assigned to unparseable legacy dates unless overridden
pub fn default_fallback_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or(NaiveDate::MIN)
}

fn seed_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Build `count` synthetic reports; the same `seed` yields the same reports
pub fn synthetic_reports(count: usize, seed: Option<u64>) -> Vec<ReportDoc> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    (0..count)
        .map(|_| {
            let (country, city) = SEED_PLACES[rng.gen_range(0..SEED_PLACES.len())];
            let how_many = rng.gen_range(1..=3);
            let violations: Vec<ViolationType> = SEED_VIOLATIONS
                .choose_multiple(&mut rng, how_many)
                .copied()
                .collect();
            let day = seed_epoch() + Duration::days(rng.gen_range(0..=SEED_SPAN_DAYS));
            let headline = violations[rng.gen_range(0..violations.len())];

            let details = IncidentDetails {
                date: day_start(day),
                location: IncidentLocation {
                    country: country.to_string(),
                    city: city.to_string(),
                    coordinates: GeoPoint::new(
                        round4(rng.gen_range(30.0..40.0)),
                        round4(rng.gen_range(30.0..36.0)),
                    ),
                },
                description: format!("{} incident reported in {}.", headline.label(), city),
                violation_types: violations,
            };

            let reporter = if rng.gen_bool(0.5) {
                ReporterType::Individual
            } else {
                ReporterType::Organization
            };
            let anonymous = rng.gen_bool(0.5);
            let mut report = ReportDoc::new(
                reporter,
                anonymous,
                ReportContact::for_reporter(anonymous, None, None, None),
                details,
            );
            report.status = ReportStatus::ALL[rng.gen_range(0..ReportStatus::ALL.len())];
            report
        })
        .collect()
}

/// Insert synthetic reports; returns how many were written
pub async fn seed_reports(
    client: &MongoClient,
    count: usize,
    seed: Option<u64>,
) -> Result<usize, HrmError> {
    let reports = synthetic_reports(count, seed);
    if reports.is_empty() {
        return Ok(0);
    }

    let collection = client.collection::<ReportDoc>(REPORT_COLLECTION).await?;
    let result = collection.inner().insert_many(reports).await?;
    info!(inserted = result.inserted_ids.len(), "Seeded incident reports");
    Ok(result.inserted_ids.len())
}

/// How a report stores one of its date fields
#[derive(Debug, Clone, PartialEq)]
pub enum DateKind {
    Typed(DateTime),
    Legacy(String),
    Missing,
    /// Some other BSON type
    Unexpected(String),
}

impl DateKind {
    /// Kind of `incident_details.date`
    pub fn of(report: &Document) -> Self {
        Self::classify(
            report
                .get_document("incident_details")
                .ok()
                .and_then(|details| details.get("date")),
        )
    }

    /// Kind of the top-level `created_at`
    pub fn created_at(report: &Document) -> Self {
        Self::classify(report.get("created_at"))
    }

    fn classify(value: Option<&Bson>) -> Self {
        match value {
            Some(Bson::DateTime(date)) => Self::Typed(*date),
            Some(Bson::String(raw)) => Self::Legacy(raw.clone()),
            None | Some(Bson::Null) => Self::Missing,
            Some(other) => Self::Unexpected(format!("{:?}", other.element_type())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Typed(date) => format!("date      {}", date.to_chrono().to_rfc3339()),
            Self::Legacy(raw) => format!("string    {:?}", raw),
            Self::Missing => "missing".to_string(),
            Self::Unexpected(kind) => format!("unexpected {}", kind),
        }
    }
}

/// One report as seen by `check-dates`
#[derive(Debug, Clone)]
pub struct DateEntry {
    pub id: String,
    pub incident_date: DateKind,
    pub created_at: DateKind,
}

/// Counts of each [`DateKind`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTally {
    pub typed: usize,
    pub legacy: usize,
    pub missing: usize,
    pub unexpected: usize,
}

impl DateTally {
    pub fn from_kinds<'a>(kinds: impl IntoIterator<Item = &'a DateKind>) -> Self {
        let mut tally = Self::default();
        for kind in kinds {
            match kind {
                DateKind::Typed(_) => tally.typed += 1,
                DateKind::Legacy(_) => tally.legacy += 1,
                DateKind::Missing => tally.missing += 1,
                DateKind::Unexpected(_) => tally.unexpected += 1,
            }
        }
        tally
    }
}

fn display_id(report: &Document) -> String {
    match report.get("_id") {
        Some(Bson::ObjectId(id)) => id.to_hex(),
        Some(other) => other.to_string(),
        None => "<no id>".to_string(),
    }
}

/// Date fields of every report, in natural order
pub async fn check_dates(client: &MongoClient) -> Result<Vec<DateEntry>, HrmError> {
    let mut cursor = client
        .raw_collection(REPORT_COLLECTION)
        .find(doc! {})
        .projection(doc! { "incident_details.date": 1, "created_at": 1 })
        .await?;

    let mut entries = Vec::new();
    while let Some(report) = cursor.try_next().await? {
        entries.push(DateEntry {
            id: display_id(&report),
            incident_date: DateKind::of(&report),
            created_at: DateKind::created_at(&report),
        });
    }
    Ok(entries)
}

/// Parse the timestamp strings older tooling wrote
///
/// Offset-less values are taken as UTC. A bare day means its UTC midnight.
pub fn parse_legacy_timestamp(raw: &str) -> Option<DateTime> {
    let raw = raw.trim();
    if let Ok(at) = ChronoDateTime::parse_from_rfc3339(raw) {
        return Some(DateTime::from_chrono(at.with_timezone(&Utc)));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::from_chrono(Utc.from_utc_datetime(&at)));
        }
    }
    NaiveDate::parse_from_str(raw, DAY_FORMAT).ok().map(day_start)
}

/// Parse a legacy incident date; normalized to UTC midnight
pub fn parse_legacy_date(raw: &str) -> Option<DateTime> {
    parse_legacy_timestamp(raw).map(|at| day_start(at.to_chrono().date_naive()))
}

/// What `normalize-dates` does to one date field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizeAction {
    Converted(DateTime),
    Defaulted(DateTime),
    Unchanged,
}

impl NormalizeAction {
    /// Plan for `incident_details.date`; only strings are rewritten
    pub fn plan(kind: &DateKind, fallback: NaiveDate) -> Self {
        match kind {
            DateKind::Legacy(raw) => match parse_legacy_date(raw) {
                Some(date) => Self::Converted(date),
                None => Self::Defaulted(day_start(fallback)),
            },
            DateKind::Typed(_) | DateKind::Missing | DateKind::Unexpected(_) => Self::Unchanged,
        }
    }

    /// Plan for `created_at`, which every report must carry as a date
    pub fn plan_timestamp(kind: &DateKind, fallback: DateTime) -> Self {
        match kind {
            DateKind::Typed(_) => Self::Unchanged,
            DateKind::Legacy(raw) => match parse_legacy_timestamp(raw) {
                Some(at) => Self::Converted(at),
                None => Self::Defaulted(fallback),
            },
            DateKind::Missing | DateKind::Unexpected(_) => Self::Defaulted(fallback),
        }
    }

    fn new_date(&self) -> Option<DateTime> {
        match self {
            Self::Converted(date) | Self::Defaulted(date) => Some(*date),
            Self::Unchanged => None,
        }
    }
}

/// Violation types rewritten to wire names, when any entry is a label
///
/// Unknown values are kept verbatim. Arrays holding non-strings are left alone.
pub fn canonical_violations(report: &Document) -> Option<Vec<String>> {
    let raw = report
        .get_document("incident_details")
        .ok()?
        .get_array("violation_types")
        .ok()?;

    let mut changed = false;
    let mut wire_names = Vec::with_capacity(raw.len());
    for value in raw {
        let Bson::String(label) = value else {
            return None;
        };
        let wire = match label.parse::<ViolationType>() {
            Ok(violation) => violation.as_str().to_string(),
            Err(_) => {
                warn!(id = %display_id(report), value = %label, "Unknown violation type left as is");
                label.clone()
            }
        };
        changed |= wire != *label;
        wire_names.push(wire);
    }
    changed.then_some(wire_names)
}

/// Every change `normalize-dates` makes to one report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRepair {
    pub incident_date: NormalizeAction,
    pub created_at: NormalizeAction,
    pub violation_types: Option<Vec<String>>,
}

impl ReportRepair {
    /// A missing or unreadable `created_at` falls back to the ObjectId's
    /// creation time, then to `fallback`.
    pub fn plan(report: &Document, fallback: NaiveDate) -> Self {
        let created_fallback = report
            .get_object_id("_id")
            .map(|id| id.timestamp())
            .unwrap_or_else(|_| day_start(fallback));

        Self {
            incident_date: NormalizeAction::plan(&DateKind::of(report), fallback),
            created_at: NormalizeAction::plan_timestamp(&DateKind::created_at(report), created_fallback),
            violation_types: canonical_violations(report),
        }
    }

    /// `$set` body applying the repair; empty when nothing changes
    pub fn to_set(&self) -> Document {
        let mut set = Document::new();
        if let Some(date) = self.incident_date.new_date() {
            set.insert("incident_details.date", date);
        }
        if let Some(date) = self.created_at.new_date() {
            set.insert("created_at", date);
        }
        if let Some(ref wire_names) = self.violation_types {
            set.insert("incident_details.violation_types", wire_names.clone());
        }
        set
    }
}

/// Per-field totals from a `normalize-dates` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSummary {
    pub converted: usize,
    pub defaulted: usize,
    pub unchanged: usize,
}

impl FieldSummary {
    fn record(&mut self, action: &NormalizeAction) {
        match action {
            NormalizeAction::Converted(_) => self.converted += 1,
            NormalizeAction::Defaulted(_) => self.defaulted += 1,
            NormalizeAction::Unchanged => self.unchanged += 1,
        }
    }
}

/// Totals from a `normalize-dates` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub incident_date: FieldSummary,
    pub created_at: FieldSummary,
    pub violations_rewritten: usize,
    /// Reports with at least one change
    pub repaired: usize,
    /// Reports actually updated; zero on a dry run
    pub written: usize,
}

impl NormalizeSummary {
    fn record(&mut self, repair: &ReportRepair) {
        self.incident_date.record(&repair.incident_date);
        self.created_at.record(&repair.created_at);
        if repair.violation_types.is_some() {
            self.violations_rewritten += 1;
        }
    }
}

/// Rewrite legacy string dates as BSON dates and violation labels as wire names
///
/// With `dry_run` nothing is written; the summary reports what would change.
pub async fn normalize_dates(
    client: &MongoClient,
    fallback: NaiveDate,
    dry_run: bool,
) -> Result<NormalizeSummary, HrmError> {
    let collection = client.raw_collection(REPORT_COLLECTION);
    let mut cursor = collection
        .find(doc! {})
        .projection(doc! {
            "created_at": 1,
            "incident_details.date": 1,
            "incident_details.violation_types": 1,
        })
        .await?;

    let mut summary = NormalizeSummary::default();
    while let Some(report) = cursor.try_next().await? {
        let repair = ReportRepair::plan(&report, fallback);
        summary.record(&repair);

        let set = repair.to_set();
        if set.is_empty() {
            debug!(id = %display_id(&report), "Report left alone");
            continue;
        }
        summary.repaired += 1;
        info!(id = %display_id(&report), ?repair, dry_run, "Repairing report");

        if dry_run {
            continue;
        }
        let Ok(id) = report.get_object_id("_id") else {
            warn!(id = %display_id(&report), "Report without ObjectId skipped");
            continue;
        };
        update_report(&collection, id, set).await?;
        summary.written += 1;
    }

    Ok(summary)
}

async fn update_report(
    collection: &mongodb::Collection<Document>,
    id: ObjectId,
    set: Document,
) -> Result<(), HrmError> {
    collection
        .update_one(doc! { "_id": id }, doc! { "$set": set })
        .await?;
    Ok(())
}
