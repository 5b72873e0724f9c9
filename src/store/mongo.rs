//! MongoDB-backed store

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::analytics::{self, AnalyticsFilter, CountBucket};
use crate::db::schemas::{
    CASE_COLLECTION, CASE_HISTORY_COLLECTION, REPORT_COLLECTION, VICTIM_COLLECTION,
};
use crate::db::{
    CaseDoc, IndexPolicy, IntoIndexes, MongoClient, MongoCollection, ReportDoc, StatusHistoryDoc,
    VictimDoc,
};
use crate::models::{CaseStatus, ReportStatus, RiskLevel};
use crate::types::HrmError;

use super::filters::case_sort;
use super::{CaseFilter, CaseStore, ReportFilter, ReportStore, UpdateOutcome, VictimStore};

/// Typed handles to every collection the services use
pub struct MongoStore {
    cases: MongoCollection<CaseDoc>,
    history: MongoCollection<StatusHistoryDoc>,
    reports: MongoCollection<ReportDoc>,
    victims: MongoCollection<VictimDoc>,
}

impl MongoStore {
    /// Open collections, creating their indexes under `IndexPolicy::Apply`
    pub async fn open(client: &MongoClient, policy: IndexPolicy) -> Result<Self, HrmError> {
        Ok(Self {
            cases: client.collection_with(CASE_COLLECTION, policy).await?,
            history: client.collection_with(CASE_HISTORY_COLLECTION, policy).await?,
            reports: client.collection_with(REPORT_COLLECTION, policy).await?,
            victims: client.collection_with(VICTIM_COLLECTION, policy).await?,
        })
    }

    async fn exists<T>(collection: &MongoCollection<T>, id: ObjectId) -> Result<bool, HrmError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        Ok(collection.count(doc! { "_id": id }).await? > 0)
    }
}

#[async_trait]
impl CaseStore for MongoStore {
    async fn insert_case(&self, case: CaseDoc) -> Result<ObjectId, HrmError> {
        self.cases.insert_one(case).await
    }

    async fn find_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseDoc>, HrmError> {
        let query = filter.to_filter();
        debug!(filter = %query, "Finding cases");
        self.cases.find_many(query, Some(case_sort())).await
    }

    async fn get_case(&self, id: ObjectId) -> Result<Option<CaseDoc>, HrmError> {
        self.cases.find_one(doc! { "_id": id }).await
    }

    async fn set_case_status(
        &self,
        id: ObjectId,
        status: CaseStatus,
        at: DateTime,
    ) -> Result<UpdateOutcome, HrmError> {
        let result = self
            .cases
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str(), "updated_at": at } },
            )
            .await?;

        Ok(if result.matched_count == 0 {
            UpdateOutcome::MISSING
        } else {
            UpdateOutcome::CHANGED
        })
    }

    async fn delete_case(&self, id: ObjectId) -> Result<bool, HrmError> {
        self.cases.delete_one(doc! { "_id": id }).await
    }

    async fn append_history(&self, entry: StatusHistoryDoc) -> Result<(), HrmError> {
        self.history.insert_one(entry).await?;
        Ok(())
    }

    async fn case_history(&self, case_id: ObjectId) -> Result<Vec<StatusHistoryDoc>, HrmError> {
        self.history
            .find_many(doc! { "case_id": case_id }, Some(doc! { "timestamp": 1, "_id": 1 }))
            .await
    }
}

#[async_trait]
impl ReportStore for MongoStore {
    async fn insert_report(&self, report: ReportDoc) -> Result<ObjectId, HrmError> {
        self.reports.insert_one(report).await
    }

    async fn find_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportDoc>, HrmError> {
        let query = filter.to_filter();
        debug!(filter = %query, "Finding reports");
        self.reports.find_many(query, None).await
    }

    async fn set_report_status(
        &self,
        id: ObjectId,
        status: ReportStatus,
    ) -> Result<UpdateOutcome, HrmError> {
        let result = self
            .reports
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .await?;

        Ok(match (result.matched_count, result.modified_count) {
            (0, _) => UpdateOutcome::MISSING,
            (_, 0) => UpdateOutcome::UNCHANGED,
            _ => UpdateOutcome::CHANGED,
        })
    }

    async fn violation_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError> {
        let docs = self.reports.aggregate(analytics::violation_pipeline(filter)).await?;
        Ok(analytics::buckets_from_documents(docs))
    }

    async fn country_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError> {
        let docs = self.reports.aggregate(analytics::country_pipeline(filter)).await?;
        Ok(analytics::buckets_from_documents(docs))
    }

    async fn daily_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError> {
        let docs = self.reports.aggregate(analytics::timeline_pipeline(filter)).await?;
        Ok(analytics::buckets_from_documents(docs))
    }
}

#[async_trait]
impl VictimStore for MongoStore {
    async fn insert_victim(&self, victim: VictimDoc) -> Result<ObjectId, HrmError> {
        self.victims.insert_one(victim).await
    }

    async fn get_victim(&self, id: ObjectId) -> Result<Option<VictimDoc>, HrmError> {
        self.victims.find_one(doc! { "_id": id }).await
    }

    async fn set_risk_level(
        &self,
        id: ObjectId,
        level: RiskLevel,
        at: DateTime,
    ) -> Result<UpdateOutcome, HrmError> {
        // Matches only when the level differs
        let result = self
            .victims
            .update_one(
                doc! { "_id": id, "risk_assessment.level": { "$ne": level.as_str() } },
                doc! { "$set": { "risk_assessment.level": level.as_str(), "updated_at": at } },
            )
            .await?;

        if result.matched_count > 0 {
            return Ok(UpdateOutcome::CHANGED);
        }
        if Self::exists(&self.victims, id).await? {
            Ok(UpdateOutcome::UNCHANGED)
        } else {
            Ok(UpdateOutcome::MISSING)
        }
    }

    async fn victims_for_case(&self, case_id: ObjectId) -> Result<Vec<VictimDoc>, HrmError> {
        self.victims
            .find_many(doc! { "cases_involved": case_id }, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1, so any server round trip fails.
    const UNREACHABLE: &str = "mongodb://127.0.0.1:1/";

    #[tokio::test]
    async fn test_skip_policy_opens_without_server() {
        let client = MongoClient::lazy(UNREACHABLE, "hrm_test").await.unwrap();
        assert!(MongoStore::open(&client, IndexPolicy::Skip).await.is_ok());
    }

    #[tokio::test]
    async fn test_apply_policy_needs_server() {
        let client = MongoClient::lazy(UNREACHABLE, "hrm_test").await.unwrap();
        let result = MongoStore::open(&client, IndexPolicy::Apply).await;
        assert!(matches!(result, Err(HrmError::Database(_))));
    }
}
