//! hrm - human-rights case management backend
//!
//! Stores cases, incident reports and victim/witness records in MongoDB and
//! serves them over a JSON HTTP API. A separate dashboard binary aggregates
//! incident reports into charts and exports.
//!
//! ## Services
//!
//! - **Cases**: create, list, status updates with history, delete
//! - **Reports**: public incident submissions with optional evidence upload
//! - **Victims**: protected person records linked to cases
//! - **Dashboard**: violation, country and timeline aggregations
//! - **Maintenance**: synthetic seeding and legacy date repair

pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod evidence;
pub mod forms;
pub mod logging;
pub mod maintenance;
pub mod models;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{HrmError, Result};
