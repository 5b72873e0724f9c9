//! Case endpoints
//!
//! - `POST /cases` - create from a form, optionally with one evidence file
//! - `GET /cases` - list with violation / country / date filters
//! - `GET /cases/{id}` - full record
//! - `PATCH /cases/{id}` - change status and append to the status log
//! - `DELETE /cases/{id}` - hard delete
//! - `GET /cases/{id}/history` - status log in append order
//!
//! A malformed id can never match a case, so it answers 404 like an
//! unknown one.

use bson::DateTime;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;

use super::{content_type, json_response, parse_json, parse_query};
use crate::db::schemas::{CaseLocation, Evidence};
use crate::db::{CaseDoc, StatusHistoryDoc};
use crate::forms::FormData;
use crate::logging::{AuditEvent, EventType};
use crate::models::dates::{day_start, format_day, format_timestamp};
use crate::models::{
    lookup_object_id, parse_day, parse_violation_list, CaseStatus, DayRange, Priority,
    ViolationType,
};
use crate::server::AppState;
use crate::store::CaseFilter;
use crate::types::HrmError;

const CASE_NOT_FOUND: &str = "Case not found";

/// Row of `GET /cases`
#[derive(Debug, Serialize)]
pub struct CaseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: CaseStatus,
    pub priority: Priority,
    pub violation_types: Vec<ViolationType>,
    pub location: CaseLocation,
}

impl From<&CaseDoc> for CaseSummary {
    fn from(case: &CaseDoc) -> Self {
        Self {
            id: case.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: case.title.clone(),
            description: case.description.clone(),
            status: case.status,
            priority: case.priority,
            violation_types: case.violation_types.clone(),
            location: case.location.clone(),
        }
    }
}

/// Body of `GET /cases/{id}`
#[derive(Debug, Serialize)]
pub struct CaseDetail {
    #[serde(flatten)]
    pub summary: CaseSummary,
    pub date_occurred: String,
    pub date_reported: String,
    pub evidence: Vec<Evidence>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CaseDoc> for CaseDetail {
    fn from(case: &CaseDoc) -> Self {
        Self {
            summary: CaseSummary::from(case),
            date_occurred: format_day(case.date_occurred),
            date_reported: format_day(case.date_reported),
            evidence: case.evidence.clone(),
            created_at: format_timestamp(case.created_at),
            updated_at: format_timestamp(case.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub new_status: CaseStatus,
    pub timestamp: String,
}

#[derive(Debug, Default, Deserialize)]
struct CaseQuery {
    violation_type: Option<String>,
    country: Option<String>,
    from_date: Option<String>,
    to_date: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

impl CaseQuery {
    fn into_filter(self) -> Result<CaseFilter, HrmError> {
        let violation_type = self
            .violation_type
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .map(str::parse::<ViolationType>)
            .transpose()?;
        let country = self
            .country
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let occurred = DayRange::parse(
            self.from_date.as_deref().or(self.from.as_deref()),
            self.to_date.as_deref().or(self.to.as_deref()),
        )?;

        Ok(CaseFilter {
            violation_type,
            country,
            occurred,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
}

/// `POST /cases`
pub async fn create_case(
    state: &AppState,
    addr: SocketAddr,
    req: Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let declared = content_type(&req).map(str::to_string);
    let form = FormData::parse(declared.as_deref(), req.into_body()).await?;

    let title = form.required("title")?.to_string();
    let description = form.required("description")?.to_string();
    let violation_types = parse_violation_list(form.required("violation_types")?)?;
    let status = form
        .text("status")
        .map(str::parse::<CaseStatus>)
        .transpose()?
        .unwrap_or_default();
    let priority = form
        .text("priority")
        .map(str::parse::<Priority>)
        .transpose()?
        .unwrap_or_default();
    let location = CaseLocation {
        country: form.required("country")?.to_string(),
        region: form.required("region")?.to_string(),
    };
    let date_occurred = day_start(parse_day(form.required("date_occurred")?)?);
    let date_reported = day_start(parse_day(form.required("date_reported")?)?);

    let mut case = CaseDoc::new(
        title,
        description,
        violation_types,
        status,
        priority,
        location,
        date_occurred,
        date_reported,
    );

    if let Some(file) = form.file("file")? {
        let stored = state.evidence.store(file).await?;
        case = case.with_evidence(Evidence::uploaded("file", stored.url));
    }

    let id = state.stores.cases.insert_case(case).await?;
    info!(case_id = %id, status = %status, "Case created");
    state
        .audit
        .log(AuditEvent::new(EventType::CaseCreated, id.to_hex()).with_remote(addr.to_string()))
        .await;

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": id.to_hex(), "message": "Case created" }),
    ))
}

/// `GET /cases`
pub async fn list_cases(
    state: &AppState,
    req: &Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let filter = parse_query::<CaseQuery>(req)?.into_filter()?;
    let cases = state.stores.cases.find_cases(&filter).await?;
    let summaries: Vec<CaseSummary> = cases.iter().map(CaseSummary::from).collect();
    Ok(json_response(StatusCode::OK, &summaries))
}

/// `GET /cases/{id}`
pub async fn get_case(state: &AppState, id: &str) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = lookup_object_id(id, CASE_NOT_FOUND)?;
    let case = state
        .stores
        .cases
        .get_case(id)
        .await?
        .ok_or_else(|| HrmError::NotFound(CASE_NOT_FOUND.to_string()))?;
    Ok(json_response(StatusCode::OK, &CaseDetail::from(&case)))
}

/// `PATCH /cases/{id}`
pub async fn update_case_status(
    state: &AppState,
    addr: SocketAddr,
    id: &str,
    req: &Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = lookup_object_id(id, CASE_NOT_FOUND)?;
    let update: StatusUpdate = parse_json(req)?;
    let status: CaseStatus = update.status.parse()?;

    let now = DateTime::now();
    let outcome = state.stores.cases.set_case_status(id, status, now).await?;
    if !outcome.matched {
        return Err(HrmError::NotFound(CASE_NOT_FOUND.to_string()));
    }

    state
        .stores
        .cases
        .append_history(StatusHistoryDoc::new(id, status, now))
        .await?;

    info!(case_id = %id, status = %status, "Case status updated");
    state
        .audit
        .log(
            AuditEvent::new(EventType::CaseStatusChanged, id.to_hex())
                .with_value(status.as_str())
                .with_remote(addr.to_string()),
        )
        .await;

    Ok(json_response(
        StatusCode::OK,
        &json!({
            "message": "Case status updated",
            "new_status": status,
            "changed": outcome.modified,
        }),
    ))
}

/// `DELETE /cases/{id}`
pub async fn delete_case(
    state: &AppState,
    addr: SocketAddr,
    id: &str,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = lookup_object_id(id, CASE_NOT_FOUND)?;
    if !state.stores.cases.delete_case(id).await? {
        return Err(HrmError::NotFound(CASE_NOT_FOUND.to_string()));
    }

    info!(case_id = %id, "Case deleted");
    state
        .audit
        .log(AuditEvent::new(EventType::CaseDeleted, id.to_hex()).with_remote(addr.to_string()))
        .await;

    Ok(json_response(
        StatusCode::OK,
        &json!({ "message": "Case deleted successfully" }),
    ))
}

/// `GET /cases/{id}/history`
pub async fn case_history(state: &AppState, id: &str) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = lookup_object_id(id, CASE_NOT_FOUND)?;
    if state.stores.cases.get_case(id).await?.is_none() {
        return Err(HrmError::NotFound(CASE_NOT_FOUND.to_string()));
    }

    let entries: Vec<HistoryEntry> = state
        .stores
        .cases
        .case_history(id)
        .await?
        .into_iter()
        .map(|h| HistoryEntry {
            new_status: h.new_status,
            timestamp: format_timestamp(h.timestamp),
        })
        .collect();

    Ok(json_response(StatusCode::OK, &entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_prefers_explicit_date_names() {
        let query = CaseQuery {
            from_date: Some("2024-02-01".into()),
            from: Some("2023-01-01".into()),
            to: Some("2024-02-29".into()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.occurred.from, Some(parse_day("2024-02-01").unwrap()));
        assert_eq!(filter.occurred.to, Some(parse_day("2024-02-29").unwrap()));
    }

    #[test]
    fn test_query_rejects_unknown_violation() {
        let query = CaseQuery {
            violation_type: Some("looting".into()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(HrmError::BadRequest(_))));
    }

    #[test]
    fn test_detail_formats_days() {
        let day = day_start(parse_day("2024-03-09").unwrap());
        let mut case = CaseDoc::new(
            "t".into(),
            "d".into(),
            vec![ViolationType::Torture],
            CaseStatus::New,
            Priority::High,
            CaseLocation::default(),
            day,
            day,
        );
        case.id = Some(bson::oid::ObjectId::new());

        let value = serde_json::to_value(CaseDetail::from(&case)).unwrap();
        assert_eq!(value["date_occurred"], "2024-03-09");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["violation_types"][0], "torture");
        assert_eq!(value["id"].as_str().unwrap().len(), 24);
    }
}
