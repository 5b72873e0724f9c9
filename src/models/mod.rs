//! Domain vocabulary shared by the services, store and dashboard

pub mod dates;
pub mod enums;

pub use dates::{parse_day, DayRange};
pub use enums::{
    parse_violation_list, CaseStatus, PersonKind, Priority, ReportStatus, ReporterType, RiskLevel,
    ViolationType,
};

use bson::oid::ObjectId;

use crate::types::HrmError;

/// Parse a record id, treating a malformed id as a bad request
pub fn parse_object_id(raw: &str, message: &str) -> Result<ObjectId, HrmError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| HrmError::BadRequest(message.to_string()))
}

/// Parse a record id, treating a malformed id as a missing record
pub fn lookup_object_id(raw: &str, message: &str) -> Result<ObjectId, HrmError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| HrmError::NotFound(message.to_string()))
}
