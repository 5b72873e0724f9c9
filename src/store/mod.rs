//! Record stores
//!
//! Services talk to three narrow traits, one per collection family. Two
//! backends implement all of them: [`MongoStore`] for deployments and
//! [`MemoryStore`] for development and tests. [`Stores`] is built once at
//! startup, handed to the server state, and closed on shutdown.

pub mod filters;
mod memory;
mod mongo;

pub use filters::{CaseFilter, ReportFilter};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime};
use tracing::{info, warn};

use crate::analytics::{AnalyticsFilter, CountBucket, DashboardData};
use crate::db::{CaseDoc, IndexPolicy, MongoClient, ReportDoc, StatusHistoryDoc, VictimDoc};
use crate::models::{CaseStatus, ReportStatus, RiskLevel};
use crate::types::HrmError;

/// Result of a single-record update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// A record with the id exists
    pub matched: bool,
    /// The stored value differed from the new one
    pub modified: bool,
}

impl UpdateOutcome {
    pub const MISSING: Self = Self {
        matched: false,
        modified: false,
    };
    pub const UNCHANGED: Self = Self {
        matched: true,
        modified: false,
    };
    pub const CHANGED: Self = Self {
        matched: true,
        modified: true,
    };
}

/// Storage for cases and their status log
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn insert_case(&self, case: CaseDoc) -> Result<ObjectId, HrmError>;

    /// Cases matching the filter, newest `date_occurred` first
    async fn find_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseDoc>, HrmError>;

    async fn get_case(&self, id: ObjectId) -> Result<Option<CaseDoc>, HrmError>;

    /// Set status and `updated_at`; always counts as modified when matched
    async fn set_case_status(
        &self,
        id: ObjectId,
        status: CaseStatus,
        at: DateTime,
    ) -> Result<UpdateOutcome, HrmError>;

    /// Hard delete; returns whether a record was removed
    async fn delete_case(&self, id: ObjectId) -> Result<bool, HrmError>;

    async fn append_history(&self, entry: StatusHistoryDoc) -> Result<(), HrmError>;

    /// Status log for a case in append order
    async fn case_history(&self, case_id: ObjectId) -> Result<Vec<StatusHistoryDoc>, HrmError>;
}

/// Storage and analytics for incident reports
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_report(&self, report: ReportDoc) -> Result<ObjectId, HrmError>;

    async fn find_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportDoc>, HrmError>;

    async fn set_report_status(
        &self,
        id: ObjectId,
        status: ReportStatus,
    ) -> Result<UpdateOutcome, HrmError>;

    async fn violation_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError>;

    async fn country_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError>;

    async fn daily_counts(&self, filter: &AnalyticsFilter) -> Result<Vec<CountBucket>, HrmError>;
}

/// Storage for victims and witnesses
#[async_trait]
pub trait VictimStore: Send + Sync {
    async fn insert_victim(&self, victim: VictimDoc) -> Result<ObjectId, HrmError>;

    async fn get_victim(&self, id: ObjectId) -> Result<Option<VictimDoc>, HrmError>;

    /// Set `risk_assessment.level`; `updated_at` moves only when the level changes
    async fn set_risk_level(
        &self,
        id: ObjectId,
        level: RiskLevel,
        at: DateTime,
    ) -> Result<UpdateOutcome, HrmError>;

    /// Victims whose `cases_involved` contains the case id
    async fn victims_for_case(&self, case_id: ObjectId) -> Result<Vec<VictimDoc>, HrmError>;
}

#[derive(Clone)]
enum Backend {
    Mongo(MongoClient),
    Memory,
}

/// The store handles shared by every request
#[derive(Clone)]
pub struct Stores {
    pub cases: Arc<dyn CaseStore>,
    pub reports: Arc<dyn ReportStore>,
    pub victims: Arc<dyn VictimStore>,
    backend: Backend,
}

impl Stores {
    /// Connect to MongoDB, verify it answers, and open every collection
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, HrmError> {
        let client = MongoClient::new(uri, db_name).await?;
        Self::open_mongo(client, IndexPolicy::Apply).await
    }

    /// Like [`Stores::connect`] but leaves indexes untouched, for readers
    pub async fn connect_read_only(uri: &str, db_name: &str) -> Result<Self, HrmError> {
        let client = MongoClient::new(uri, db_name).await?;
        Self::open_mongo(client, IndexPolicy::Skip).await
    }

    async fn open_mongo(client: MongoClient, policy: IndexPolicy) -> Result<Self, HrmError> {
        let store = Arc::new(MongoStore::open(&client, policy).await?);
        Ok(Self {
            cases: store.clone(),
            reports: store.clone(),
            victims: store,
            backend: Backend::Mongo(client),
        })
    }

    /// Process-local stores; contents are lost on exit
    pub fn memory() -> Self {
        warn!("Using in-memory store, records will not survive a restart");
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Wrap an existing in-memory store
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            cases: store.clone(),
            reports: store.clone(),
            victims: store,
            backend: Backend::Memory,
        }
    }

    /// Name of the active backend, for health output
    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Mongo(_) => "mongodb",
            Backend::Memory => "memory",
        }
    }

    /// Check the backend is reachable
    pub async fn ping(&self) -> Result<(), HrmError> {
        match &self.backend {
            Backend::Mongo(client) => client.ping().await,
            Backend::Memory => Ok(()),
        }
    }

    /// Run the three dashboard aggregations
    pub async fn dashboard(&self, filter: &AnalyticsFilter) -> Result<DashboardData, HrmError> {
        let (violations, countries, timeline) = tokio::try_join!(
            self.reports.violation_counts(filter),
            self.reports.country_counts(filter),
            self.reports.daily_counts(filter),
        )?;
        Ok(DashboardData {
            violations,
            countries,
            timeline,
        })
    }

    /// Release backend resources
    pub async fn close(self) {
        match self.backend {
            Backend::Mongo(client) => client.shutdown().await,
            Backend::Memory => info!("In-memory store dropped"),
        }
    }
}
