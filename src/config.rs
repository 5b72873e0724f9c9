//! Configuration for hrm
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// hrm - human-rights case management API
#[derive(Parser, Debug, Clone)]
#[command(name = "hrm")]
#[command(about = "Case, incident report and victim records API")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// MongoDB configuration
    #[command(flatten)]
    pub mongo: MongoArgs,

    /// Directory where uploaded evidence is stored
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    pub uploads_dir: PathBuf,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,

    /// Append a JSONL audit trail of mutations to this file
    #[arg(long, env = "AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Reject victims that reference case ids with no matching case
    #[arg(long, env = "VERIFY_CASE_REFERENCES", default_value = "false")]
    pub verify_case_references: bool,

    /// Enable development mode (falls back to the in-memory store)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// MongoDB connection configuration
#[derive(Parser, Debug, Clone)]
pub struct MongoArgs {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "hrm_database")]
    pub mongodb_db: String,
}

impl MongoArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.mongodb_db.trim().is_empty() {
            return Err("MONGODB_DB must not be empty".to_string());
        }
        Ok(())
    }
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        self.mongo.validate()?;

        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Filter directive for tracing-subscriber
    pub fn log_filter(&self) -> String {
        format!("hrm={},info", self.log_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["hrm"]);
        assert_eq!(args.listen.port(), 8000);
        assert_eq!(args.mongo.mongodb_db, "hrm_database");
        assert_eq!(args.max_upload_bytes, 10 * 1024 * 1024);
        assert!(!args.verify_case_references);
        assert!(args.audit_log.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let args = Args::parse_from(["hrm", "--max-upload-bytes", "0"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["hrm", "--mongodb-db", " "]);
        assert!(args.validate().is_err());
    }
}
