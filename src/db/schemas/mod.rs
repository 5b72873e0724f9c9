//! Database schemas for hrm
//!
//! Defines MongoDB document structures for cases, reports and victims.

mod case;
mod report;
mod victim;

pub use case::{CaseDoc, CaseLocation, StatusHistoryDoc, CASE_COLLECTION, CASE_HISTORY_COLLECTION};
pub use report::{
    GeoPoint, IncidentDetails, IncidentLocation, ReportContact, ReportDoc, REPORT_COLLECTION,
};
pub use victim::{
    Demographics, RiskAssessment, SupportService, VictimContact, VictimDoc, VICTIM_COLLECTION,
};

use serde::{Deserialize, Serialize};

/// Evidence attached to a case or report
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Evidence {
    /// `"file"` for case uploads, the declared MIME type for report uploads
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub description: String,
}

impl Evidence {
    pub fn uploaded(kind: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: url.into(),
            description: "Uploaded evidence".to_string(),
        }
    }
}
