//! Case and case status history schemas

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Evidence;
use crate::models::{CaseStatus, Priority, ViolationType};

/// Collection name for cases
pub const CASE_COLLECTION: &str = "cases";

/// Collection name for the append-only status log
pub const CASE_HISTORY_COLLECTION: &str = "case_status_history";

/// Where a case took place
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CaseLocation {
    pub country: String,
    pub region: String,
}

/// Case document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CaseDoc {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub violation_types: Vec<ViolationType>,

    #[serde(default)]
    pub status: CaseStatus,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub location: CaseLocation,

    /// UTC midnight of the day the incident occurred
    pub date_occurred: DateTime,

    /// UTC midnight of the day the incident was reported
    pub date_reported: DateTime,

    #[serde(default)]
    pub evidence: Vec<Evidence>,

    pub created_at: DateTime,

    pub updated_at: DateTime,
}

impl CaseDoc {
    /// Create a new case with both timestamps set to now
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: String,
        description: String,
        violation_types: Vec<ViolationType>,
        status: CaseStatus,
        priority: Priority,
        location: CaseLocation,
        date_occurred: DateTime,
        date_reported: DateTime,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            title,
            description,
            violation_types,
            status,
            priority,
            location,
            date_occurred,
            date_reported,
            evidence: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach an evidence entry
    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }
}

impl IntoIndexes for CaseDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "location.country": 1 },
                Some(IndexOptions::builder().name("country_index".to_string()).build()),
            ),
            (
                doc! { "violation_types": 1 },
                Some(IndexOptions::builder().name("violation_types_index".to_string()).build()),
            ),
            (
                doc! { "date_occurred": -1 },
                Some(IndexOptions::builder().name("date_occurred_index".to_string()).build()),
            ),
        ]
    }
}

/// One entry of the case status log
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusHistoryDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub case_id: ObjectId,

    pub new_status: CaseStatus,

    pub timestamp: DateTime,
}

impl StatusHistoryDoc {
    pub fn new(case_id: ObjectId, new_status: CaseStatus, timestamp: DateTime) -> Self {
        Self {
            id: None,
            case_id,
            new_status,
            timestamp,
        }
    }
}

impl IntoIndexes for StatusHistoryDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "case_id": 1, "timestamp": 1 },
            Some(IndexOptions::builder().name("case_timeline_index".to_string()).build()),
        )]
    }
}
