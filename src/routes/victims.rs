//! Victim and witness endpoints
//!
//! - `POST /victims` - add a record from JSON
//! - `GET /victims/{id}` - full record
//! - `PATCH /victims/{id}` - change risk level
//! - `GET /victims/case/{case_id}` - records linked to a case
//!
//! Unlike cases, a malformed id here is a 400.

use bson::oid::ObjectId;
use bson::DateTime;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tracing::info;

use super::{json_response, parse_json};
use crate::db::schemas::{Demographics, RiskAssessment, SupportService, VictimContact};
use crate::db::VictimDoc;
use crate::logging::{AuditEvent, EventType};
use crate::models::dates::format_timestamp;
use crate::models::{parse_object_id, PersonKind, RiskLevel};
use crate::server::AppState;
use crate::types::HrmError;

const INVALID_ID: &str = "Invalid ID format";
const INVALID_CASE_ID: &str = "Invalid case ID format";
const VICTIM_NOT_FOUND: &str = "Victim not found";

/// JSON body of `POST /victims`
#[derive(Debug, Deserialize)]
pub struct NewVictim {
    #[serde(rename = "type")]
    pub kind: PersonKind,
    #[serde(default)]
    pub anonymous: bool,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub ethnicity: Option<String>,
    pub occupation: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub secure_messaging: Option<String>,
    pub risk_assessment: RiskAssessment,
    #[serde(default)]
    pub support_services: Vec<SupportService>,
    #[serde(default)]
    pub cases_involved: Vec<String>,
}

impl NewVictim {
    fn into_doc(self, cases_involved: Vec<ObjectId>) -> VictimDoc {
        VictimDoc::new(
            self.kind,
            self.anonymous,
            Demographics {
                gender: self.gender,
                age: self.age,
                ethnicity: self.ethnicity,
                occupation: self.occupation,
            },
            VictimContact {
                email: self.email,
                phone: self.phone,
                secure_messaging: self.secure_messaging,
            },
            self.risk_assessment,
            self.support_services,
            cases_involved,
        )
    }
}

/// Body of `GET /victims/{id}`
#[derive(Debug, Serialize)]
pub struct VictimView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PersonKind,
    pub anonymous: bool,
    pub demographics: Demographics,
    pub contact_info: VictimContact,
    pub risk_assessment: RiskAssessment,
    pub support_services: Vec<SupportService>,
    pub cases_involved: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VictimDoc> for VictimView {
    fn from(victim: VictimDoc) -> Self {
        Self {
            id: victim.id.map(|id| id.to_hex()).unwrap_or_default(),
            kind: victim.kind,
            anonymous: victim.anonymous,
            demographics: victim.demographics,
            contact_info: victim.contact_info,
            risk_assessment: victim.risk_assessment,
            support_services: victim.support_services,
            cases_involved: victim.cases_involved.iter().map(|id| id.to_hex()).collect(),
            created_at: format_timestamp(victim.created_at),
            updated_at: format_timestamp(victim.updated_at),
        }
    }
}

/// Row of `GET /victims/case/{case_id}`
#[derive(Debug, Serialize)]
pub struct CaseVictim {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PersonKind,
    pub risk: RiskLevel,
}

#[derive(Debug, Deserialize)]
struct RiskUpdate {
    level: String,
}

/// `POST /victims`
pub async fn add_victim(
    state: &AppState,
    addr: SocketAddr,
    req: &Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let input: NewVictim = parse_json(req)?;

    if matches!(input.age, Some(age) if age < 0) {
        return Err(HrmError::BadRequest("age must not be negative".to_string()));
    }

    let mut cases = Vec::with_capacity(input.cases_involved.len());
    for raw in &input.cases_involved {
        let id = parse_object_id(raw, INVALID_CASE_ID)?;
        if !cases.contains(&id) {
            cases.push(id);
        }
    }

    if state.args.verify_case_references {
        for id in &cases {
            if state.stores.cases.get_case(*id).await?.is_none() {
                return Err(HrmError::BadRequest(format!(
                    "Referenced case does not exist: {}",
                    id.to_hex()
                )));
            }
        }
    }

    let victim = input.into_doc(cases);
    let kind = victim.kind;
    let id = state.stores.victims.insert_victim(victim).await?;
    info!(victim_id = %id, kind = %kind, "Victim added");
    state
        .audit
        .log(AuditEvent::new(EventType::VictimAdded, id.to_hex()).with_remote(addr.to_string()))
        .await;

    Ok(json_response(
        StatusCode::CREATED,
        &json!({ "id": id.to_hex(), "message": "Victim added successfully" }),
    ))
}

/// `GET /victims/{id}`
pub async fn get_victim(state: &AppState, id: &str) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = parse_object_id(id, INVALID_ID)?;
    let victim = state
        .stores
        .victims
        .get_victim(id)
        .await?
        .ok_or_else(|| HrmError::NotFound(VICTIM_NOT_FOUND.to_string()))?;
    Ok(json_response(StatusCode::OK, &VictimView::from(victim)))
}

/// `PATCH /victims/{id}`
///
/// Setting the level a record already has succeeds with `changed: false`.
pub async fn update_risk_level(
    state: &AppState,
    addr: SocketAddr,
    id: &str,
    req: &Request<Bytes>,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let id = parse_object_id(id, INVALID_ID)?;
    let update: RiskUpdate = parse_json(req)?;
    let level: RiskLevel = update.level.parse()?;

    let outcome = state
        .stores
        .victims
        .set_risk_level(id, level, DateTime::now())
        .await?;
    if !outcome.matched {
        return Err(HrmError::NotFound(VICTIM_NOT_FOUND.to_string()));
    }

    let message = if outcome.modified {
        info!(victim_id = %id, level = %level, "Risk level updated");
        state
            .audit
            .log(
                AuditEvent::new(EventType::VictimRiskChanged, id.to_hex())
                    .with_value(level.as_str())
                    .with_remote(addr.to_string()),
            )
            .await;
        "Risk level updated"
    } else {
        "Risk level unchanged"
    };

    Ok(json_response(
        StatusCode::OK,
        &json!({ "message": message, "level": level, "changed": outcome.modified }),
    ))
}

/// `GET /victims/case/{case_id}`
pub async fn list_victims_by_case(
    state: &AppState,
    case_id: &str,
) -> Result<Response<Full<Bytes>>, HrmError> {
    let case_id = parse_object_id(case_id, INVALID_CASE_ID)?;
    let rows: Vec<CaseVictim> = state
        .stores
        .victims
        .victims_for_case(case_id)
        .await?
        .into_iter()
        .map(|v| CaseVictim {
            id: v.id.map(|id| id.to_hex()).unwrap_or_default(),
            kind: v.kind,
            risk: v.risk_assessment.level,
        })
        .collect();
    Ok(json_response(StatusCode::OK, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_victim_from_json() {
        let input: NewVictim = serde_json::from_value(json!({
            "type": "Witness",
            "anonymous": true,
            "age": 34,
            "risk_assessment": { "level": "HIGH", "threats": ["surveillance"], "protection_needed": true },
            "cases_involved": ["65f0c0ffee0000000000beef"]
        }))
        .unwrap();
        assert_eq!(input.kind, PersonKind::Witness);
        assert_eq!(input.risk_assessment.level, RiskLevel::High);
        assert!(input.support_services.is_empty());
        assert!(input.gender.is_none());
    }

    #[test]
    fn test_unknown_risk_level_rejected() {
        let result: Result<NewVictim, _> = serde_json::from_value(json!({
            "type": "victim",
            "risk_assessment": { "level": "extreme" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_view_renders_hex_ids() {
        let case = ObjectId::new();
        let input: NewVictim = serde_json::from_value(json!({
            "type": "victim",
            "risk_assessment": { "level": "low" }
        }))
        .unwrap();
        let mut doc = input.into_doc(vec![case]);
        doc.id = Some(ObjectId::new());

        let value = serde_json::to_value(VictimView::from(doc)).unwrap();
        assert_eq!(value["cases_involved"][0], case.to_hex());
        assert_eq!(value["type"], "victim");
        assert_eq!(value["risk_assessment"]["level"], "low");
    }
}
