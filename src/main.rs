//! hrm - human-rights case management API

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrm::{
    config::Args,
    evidence::EvidenceVault,
    logging::AuditLogger,
    server::{self, AppState},
    store::Stores,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  hrm - Human Rights Case Management");
    info!("  version {}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongo.mongodb_uri, args.mongo.mongodb_db);
    info!("Uploads: {}", args.uploads_dir.display());
    info!("Max upload: {} bytes", args.max_upload_bytes);
    info!("Verify case references: {}", args.verify_case_references);
    info!("======================================");

    // Connect to MongoDB (in-memory fallback in dev mode)
    let stores = match Stores::connect(&args.mongo.mongodb_uri, &args.mongo.mongodb_db).await {
        Ok(stores) => {
            info!("MongoDB connected successfully");
            stores
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing in memory): {}", e);
                Stores::memory()
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let evidence = EvidenceVault::open(args.uploads_dir.clone()).await?;

    let audit = match args.audit_log {
        Some(ref path) => AuditLogger::to_file(path.clone())?,
        None => AuditLogger::disabled(),
    };

    let state = Arc::new(AppState::new(args, stores.clone(), evidence, audit));

    let result = server::run(state).await;

    stores.close().await;
    info!("hrm stopped");

    result.map_err(Into::into)
}
