//! Victim / witness schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::models::{PersonKind, RiskLevel};

/// Collection name for victims and witnesses
pub const VICTIM_COLLECTION: &str = "victims";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Demographics {
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub ethnicity: Option<String>,
    pub occupation: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct VictimContact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub secure_messaging: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    #[serde(default)]
    pub threats: Vec<String>,
    #[serde(default)]
    pub protection_needed: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SupportService {
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: String,
    pub status: String,
}

/// Victim or witness document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct VictimDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "type")]
    pub kind: PersonKind,

    #[serde(default)]
    pub anonymous: bool,

    #[serde(default)]
    pub demographics: Demographics,

    #[serde(default)]
    pub contact_info: VictimContact,

    pub risk_assessment: RiskAssessment,

    #[serde(default)]
    pub support_services: Vec<SupportService>,

    /// Referenced case ids; existence is not enforced by the store
    #[serde(default)]
    pub cases_involved: Vec<ObjectId>,

    pub created_at: DateTime,

    pub updated_at: DateTime,
}

impl VictimDoc {
    pub fn new(
        kind: PersonKind,
        anonymous: bool,
        demographics: Demographics,
        contact_info: VictimContact,
        risk_assessment: RiskAssessment,
        support_services: Vec<SupportService>,
        cases_involved: Vec<ObjectId>,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            kind,
            anonymous,
            demographics,
            contact_info,
            risk_assessment,
            support_services,
            cases_involved,
            created_at: now,
            updated_at: now,
        }
    }
}

impl IntoIndexes for VictimDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "cases_involved": 1 },
            Some(IndexOptions::builder().name("cases_involved_index".to_string()).build()),
        )]
    }
}
