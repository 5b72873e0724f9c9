//! In-memory store
//!
//! Mirrors the MongoDB store's semantics with `DashMap` tables so the server
//! can run without a database in development and tests.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use dashmap::DashMap;

use crate::analytics::{self, AnalyticsFilter, CountBucket};
use crate::db::{CaseDoc, ReportDoc, StatusHistoryDoc, VictimDoc};
use crate::models::{CaseStatus, ReportStatus, RiskLevel};
use crate::types::HrmError;

use super::{CaseFilter, CaseStore, ReportFilter, ReportStore, UpdateOutcome, VictimStore};

#[derive(Default)]
pub struct MemoryStore {
    cases: DashMap<ObjectId, CaseDoc>,
    history: DashMap<ObjectId, Vec<StatusHistoryDoc>>,
    reports: DashMap<ObjectId, ReportDoc>,
    victims: DashMap<ObjectId, VictimDoc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot_reports(&self) -> Vec<ReportDoc> {
        self.reports.iter().map(|e| e.value().clone()).collect()
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn insert_case(&self, mut case: CaseDoc) -> Result<ObjectId, HrmError> {
        let id = ObjectId::new();
        case.id = Some(id);
        self.cases.insert(id, case);
        Ok(id)
    }

    async fn find_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseDoc>, HrmError> {
        let mut cases: Vec<CaseDoc> = self
            .cases
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        cases.sort_by(|a, b| b.date_occurred.cmp(&a.date_occurred));
        Ok(cases)
    }

    async fn get_case(&self, id: ObjectId) -> Result<Option<CaseDoc>, HrmError> {
        Ok(self.cases.get(&id).map(|e| e.value().clone()))
    }

    async fn set_case_status(
        &self,
        id: ObjectId,
        status: CaseStatus,
        at: DateTime,
    ) -> Result<UpdateOutcome, HrmError> {
        match self.cases.get_mut(&id) {
            Some(mut case) => {
                case.status = status;
                case.updated_at = at;
                Ok(UpdateOutcome::CHANGED)
            }
            None => Ok(UpdateOutcome::MISSING),
        }
    }

    async fn delete_case(&self, id: ObjectId) -> Result<bool, HrmError> {
        Ok(self.cases.remove(&id).is_some())
    }

    async fn append_history(&self, mut entry: StatusHistoryDoc) -> Result<(), HrmError> {
        entry.id = Some(ObjectId::new());
        self.history.entry(entry.case_id).or_default().push(entry);
        Ok(())
    }

    async fn case_history(&self, case_id: ObjectId) -> Result<Vec<StatusHistoryDoc>, HrmError> {
        Ok(self
            .history
            .get(&case_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert_report(&self, mut report: ReportDoc) -> Result<ObjectId, HrmError> {
        let id = ObjectId::new();
        report.id = Some(id);
        self.reports.insert(id, report);
        Ok(id)
    }

    async fn find_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportDoc>, HrmError> {
        let mut reports: Vec<ReportDoc> = self
            .reports
            .iter()
            .filter(|e| filter.matches(e.value()))
            .map(|e| e.value().clone())
            .collect();
        // ObjectIds grow with insertion time, matching natural order
        reports.sort_by_key(|r| r.id);
        Ok(reports)
    }

    async fn set_report_status(
        &self,
        id: ObjectId,
        status: ReportStatus,
    ) -> Result<UpdateOutcome, HrmError> {
        match self.reports.get_mut(&id) {
            Some(report) if report.status == status => Ok(UpdateOutcome::UNCHANGED),
            Some(mut report) => {
                report.status = status;
                Ok(UpdateOutcome::CHANGED)
            }
            None => Ok(UpdateOutcome::MISSING),
        }
    }

    async fn violation_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError> {
        Ok(analytics::tally_violations(&self.snapshot_reports(), filter))
    }

    async fn country_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError> {
        Ok(analytics::tally_countries(&self.snapshot_reports(), filter))
    }

    async fn daily_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError> {
        Ok(analytics::tally_days(&self.snapshot_reports(), filter))
    }
}

#[async_trait]
impl VictimStore for MemoryStore {
    async fn insert_victim(&self, mut victim: VictimDoc) -> Result<ObjectId, HrmError> {
        let id = ObjectId::new();
        victim.id = Some(id);
        self.victims.insert(id, victim);
        Ok(id)
    }

    async fn get_victim(&self, id: ObjectId) -> Result<Option<VictimDoc>, HrmError> {
        Ok(self.victims.get(&id).map(|e| e.value().clone()))
    }

    async fn set_risk_level(
        &self,
        id: ObjectId,
        level: RiskLevel,
        at: DateTime,
    ) -> Result<UpdateOutcome, HrmError> {
        let Some(mut victim) = self.victims.get_mut(&id) else {
            return Ok(UpdateOutcome::MISSING);
        };
        if victim.risk_assessment.level == level {
            return Ok(UpdateOutcome::UNCHANGED);
        }
        victim.risk_assessment.level = level;
        victim.updated_at = at;
        Ok(UpdateOutcome::CHANGED)
    }

    async fn victims_for_case(&self, case_id: ObjectId) -> Result<Vec<VictimDoc>, HrmError> {
        let mut victims: Vec<VictimDoc> = self
            .victims
            .iter()
            .filter(|e| e.value().cases_involved.contains(&case_id))
            .map(|e| e.value().clone())
            .collect();
        victims.sort_by_key(|v| v.id);
        Ok(victims)
    }
}
