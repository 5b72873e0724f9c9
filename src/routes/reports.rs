//! Incident report endpoints
//!
//! - `POST /reports` - submit a report form, optionally with one file
//! - `GET /reports` - list with status / date / place filters
//! - `PATCH /reports/{id}` - change status

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;

use super::{content_type, json_response, parse_json, parse_query};
use crate::db::schemas::{
    Evidence, GeoPoint, IncidentDetails, IncidentLocation, ReportContact,
};
use crate::db::ReportDoc;
use crate::forms::FormData;
use crate::logging::{AuditEvent, EventType};
use crate::models::dates::{day_start, format_timestamp};
use crate::models::{
    lookup_object_id, parse_day, parse_violation_list, DayRange, ReportStatus, ReporterType,
    ViolationType,
};
use crate::server::AppState;
use crate::store::ReportFilter;
use crate::types::HrmError;

const REPORT_NOT_FOUND: &str = "Report not found";

/// Row of `GET /reports`
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub id: String,
    pub reporter_type: ReporterType,
    pub anonymous: bool,
    pub status: ReportStatus,
    pub city: String,
    pub country: String,
    pub description: String,
    pub violation_types: Vec<ViolationType>,
    pub created_at: String,
}

impl From<&ReportDoc> for ReportSummary {
    fn from(report: &ReportDoc) -> Self {
        let details = &report.incident_details;
        Self {
            id: report.id.map(|id| id.to_hex()).unwrap_or_default(),
            reporter_type: report.reporter_type,
            anonymous: report.anonymous,
            status: report.status,
            city: details.location.city.clone(),
            country: details.location.country.clone(),
            description: details.description.clone(),
            violation_types: details.violation_types.clone(),
            created_at: format_timestamp(report.created_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportQuery {
    status: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
    from: Option<String>,
    to: Option<String>,
    country: Option<String>,
    city: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ReportQuery {
    fn into_filter(self) -> Result<ReportFilter, HrmError> {
        let status = non_blank(self.status)
            .as_deref()
            .map(str::parse::<ReportStatus>)
            .transpose()?;
        let date = DayRange::parse(
            self.from_date.as_deref().or(self.from.as_deref()),
            self.to_date.as_deref().or(self.to.as_deref()),
        )?;

        Ok(ReportFilter {
            status,
            date,
            country: non_blank(self.country),
            city: non_blank(self.city),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

fn coordinate(form: &FormData, name: &str, limit: f64) -> Result<f64, HrmError> {
    let value = form.number(name)?;
    if !(-limit..=limit).contains(&value) {
        return Err(HrmError::BadRequest(format!(
            "{} must be between {} and {}",
            name, -limit, limit
        )));
    }
    Ok(value)
}

/// `POST /reports`
pub async fn create_report(
    state: &AppState,
    addr: SocketAddr,
    req: Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let declared = content_type(&req).map(str::to_string);
    let form = FormData::parse(declared.as_deref(), req.into_body()).await?;

    let reporter_type: ReporterType = form.required("reporter_type")?.parse()?;
    let anonymous = form.required_flag("anonymous")?;
    let contact = ReportContact::for_reporter(
        anonymous,
        form.owned("email"),
        form.owned("phone"),
        form.owned("preferred_contact"),
    );

    let latitude = coordinate(&form, "latitude", 90.0)?;
    let longitude = coordinate(&form, "longitude", 180.0)?;
    let details = IncidentDetails {
        date: day_start(parse_day(form.required("date")?)?),
        location: IncidentLocation {
            country: form.required("country")?.to_string(),
            city: form.required("city")?.to_string(),
            coordinates: GeoPoint::new(longitude, latitude),
        },
        description: form.required("description")?.to_string(),
        violation_types: parse_violation_list(form.required("violation_types")?)?,
    };

    let mut report = ReportDoc::new(reporter_type, anonymous, contact, details);

    if let Some(file) = form.file("file")? {
        let stored = state.evidence.store(file).await?;
        let kind = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        report = report.with_evidence(Evidence::uploaded(kind, stored.url));
    }

    let id = state.stores.reports.insert_report(report).await?;
    info!(report_id = %id, anonymous, "Report submitted");
    state
        .audit
        .log(AuditEvent::new(EventType::ReportSubmitted, id.to_hex()).with_remote(addr.to_string()))
        .await;

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": id.to_hex(), "message": "Report submitted" }),
    ))
}

/// `GET /reports`
pub async fn list_reports(
    state: &AppState,
    req: &Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let filter = parse_query::<ReportQuery>(req)?.into_filter()?;
    let reports = state.stores.reports.find_reports(&filter).await?;
    let summaries: Vec<ReportSummary> = reports.iter().map(ReportSummary::from).collect();
    Ok(json_response(StatusCode::OK, &summaries))
}

/// `PATCH /reports/{id}`
///
/// Setting the status a report already has succeeds with `changed: false`.
pub async fn update_report_status(
    state: &AppState,
    addr: SocketAddr,
    id: &str,
    req: &Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = lookup_object_id(id, REPORT_NOT_FOUND)?;
    let update: StatusUpdate = parse_json(req)?;
    let status: ReportStatus = update.status.parse()?;

    let outcome = state.stores.reports.set_report_status(id, status).await?;
    if !outcome.matched {
        return Err(HrmError::NotFound(REPORT_NOT_FOUND.to_string()));
    }

    let message = if outcome.modified {
        info!(report_id = %id, status = %status, "Report status updated");
        state
            .audit
            .log(
                AuditEvent::new(EventType::ReportStatusChanged, id.to_hex())
                    .with_value(status.as_str())
                    .with_remote(addr.to_string()),
            )
            .await;
        "Report status updated"
    } else {
        "Report status unchanged"
    };

    Ok(json_response(
        StatusCode::OK,
        &json!({ "message": message, "new_status": status, "changed": outcome.modified }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_filter() {
        let query = ReportQuery {
            status: Some(" resolved ".into()),
            city: Some("".into()),
            from_date: Some("2024-01-01".into()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(ReportStatus::Resolved));
        assert!(filter.city.is_none());
        assert!(filter.date.from.is_some());
        assert!(filter.date.to.is_none());
    }

    #[test]
    fn test_bad_status_filter() {
        let query = ReportQuery {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());
    }
}
