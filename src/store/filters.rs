//! List filters for cases and reports
//!
//! Each filter renders to a MongoDB query document and also evaluates
//! directly against a decoded record, so the in-memory store answers the
//! same questions the database does.

use bson::{doc, Document};

use crate::db::{CaseDoc, ReportDoc};
use crate::models::{DayRange, ReportStatus, ViolationType};

/// Filter for `GET /cases`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseFilter {
    pub violation_type: Option<ViolationType>,
    pub country: Option<String>,
    pub occurred: DayRange,
}

impl CaseFilter {
    /// Convert to MongoDB filter document
    pub fn to_filter(&self) -> Document {
        let mut filter = Document::new();

        if let Some(violation) = self.violation_type {
            filter.insert("violation_types", violation.as_str());
        }
        if let Some(ref country) = self.country {
            filter.insert("location.country", country.as_str());
        }
        if let Some(cond) = self.occurred.to_condition() {
            filter.insert("date_occurred", cond);
        }

        filter
    }

    pub fn matches(&self, case: &CaseDoc) -> bool {
        if let Some(violation) = self.violation_type {
            if !case.violation_types.contains(&violation) {
                return false;
            }
        }
        if let Some(ref country) = self.country {
            if &case.location.country != country {
                return false;
            }
        }
        self.occurred.contains(case.date_occurred)
    }
}

/// Filter for `GET /reports`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub date: DayRange,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl ReportFilter {
    pub fn to_filter(&self) -> Document {
        let mut filter = Document::new();

        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        if let Some(cond) = self.date.to_condition() {
            filter.insert("incident_details.date", cond);
        }
        if let Some(ref country) = self.country {
            filter.insert("incident_details.location.country", country.as_str());
        }
        if let Some(ref city) = self.city {
            filter.insert("incident_details.location.city", city.as_str());
        }

        filter
    }

    pub fn matches(&self, report: &ReportDoc) -> bool {
        let details = &report.incident_details;

        if let Some(status) = self.status {
            if report.status != status {
                return false;
            }
        }
        if let Some(ref country) = self.country {
            if &details.location.country != country {
                return false;
            }
        }
        if let Some(ref city) = self.city {
            if &details.location.city != city {
                return false;
            }
        }
        self.date.contains(details.date)
    }
}

/// Sort used for case listings, newest incident first
pub fn case_sort() -> Document {
    doc! { "date_occurred": -1 }
}
