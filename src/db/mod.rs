//! Database layer for hrm
//!
//! Provides MongoDB storage for cases, reports and victims.

pub mod mongo;
pub mod schemas;

pub use mongo::{IndexPolicy, IntoIndexes, MongoClient, MongoCollection};
pub use schemas::{CaseDoc, Evidence, ReportDoc, StatusHistoryDoc, VictimDoc};
