//! Incident report schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::schemas::Evidence;
use crate::models::{ReportStatus, ReporterType, ViolationType};

/// Collection name for incident reports
pub const REPORT_COLLECTION: &str = "incident_reports";

/// How to reach an identified reporter
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ReportContact {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub preferred_contact: Option<String>,
}

impl ReportContact {
    /// Contact details as stored; anonymous reporters keep nothing
    pub fn for_reporter(
        anonymous: bool,
        email: Option<String>,
        phone: Option<String>,
        preferred_contact: Option<String>,
    ) -> Self {
        if anonymous {
            return Self::default();
        }
        Self {
            email,
            phone,
            preferred_contact,
        }
    }
}

/// GeoJSON point, `[longitude, latitude]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![longitude, latitude],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IncidentLocation {
    pub country: String,
    pub city: String,
    pub coordinates: GeoPoint,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct IncidentDetails {
    /// UTC midnight of the incident day
    pub date: DateTime,
    pub location: IncidentLocation,
    pub description: String,
    #[serde(default)]
    pub violation_types: Vec<ViolationType>,
}

/// Incident report document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReportDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub reporter_type: ReporterType,

    #[serde(default)]
    pub anonymous: bool,

    #[serde(default)]
    pub contact_info: ReportContact,

    pub incident_details: IncidentDetails,

    #[serde(default)]
    pub evidence: Vec<Evidence>,

    #[serde(default)]
    pub status: ReportStatus,

    pub created_at: DateTime,
}

impl ReportDoc {
    /// Create a new report in status `new`
    pub fn new(
        reporter_type: ReporterType,
        anonymous: bool,
        contact_info: ReportContact,
        incident_details: IncidentDetails,
    ) -> Self {
        Self {
            id: None,
            reporter_type,
            anonymous,
            contact_info,
            incident_details,
            evidence: Vec::new(),
            status: ReportStatus::New,
            created_at: DateTime::now(),
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }
}

impl IntoIndexes for ReportDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "status": 1 },
                Some(IndexOptions::builder().name("status_index".to_string()).build()),
            ),
            (
                doc! { "incident_details.date": -1 },
                Some(IndexOptions::builder().name("incident_date_index".to_string()).build()),
            ),
            (
                doc! {
                    "incident_details.location.country": 1,
                    "incident_details.location.city": 1,
                },
                Some(IndexOptions::builder().name("place_index".to_string()).build()),
            ),
            (
                doc! { "incident_details.location.coordinates": "2dsphere" },
                Some(IndexOptions::builder().name("geo_index".to_string()).build()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_contact_is_empty() {
        let contact = ReportContact::for_reporter(
            true,
            Some("a@example.org".into()),
            Some("+100".into()),
            Some("email".into()),
        );
        assert_eq!(contact, ReportContact::default());

        let contact = ReportContact::for_reporter(false, Some("a@example.org".into()), None, None);
        assert_eq!(contact.email.as_deref(), Some("a@example.org"));
    }

    #[test]
    fn test_geo_point_is_lon_lat() {
        let point = GeoPoint::new(34.46, 31.5);
        let bson = bson::to_document(&point).unwrap();
        assert_eq!(bson.get_str("type").unwrap(), "Point");
        let coords = bson.get_array("coordinates").unwrap();
        assert_eq!(coords[0].as_f64(), Some(34.46));
        assert_eq!(coords[1].as_f64(), Some(31.5));
    }
}
