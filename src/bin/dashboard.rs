//! hrm-dashboard - analytics over incident reports

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use hyper::Request;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrm::{
    config::MongoArgs,
    dashboard::{self, DashboardQuery},
    server,
    store::Stores,
};

/// hrm-dashboard - violation, country and timeline analytics
#[derive(Parser, Debug)]
#[command(name = "hrm-dashboard")]
#[command(about = "Human rights analytics dashboard")]
struct Cli {
    #[command(flatten)]
    mongo: MongoArgs,

    /// Fall back to an empty in-memory store when MongoDB is unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the interactive dashboard
    Serve {
        /// Address to listen on
        #[arg(long, env = "DASHBOARD_LISTEN", default_value = "127.0.0.1:8501")]
        listen: SocketAddr,
    },

    /// Write the page and every export for one filter
    Export {
        /// Output directory
        #[arg(long)]
        out: PathBuf,
        /// First day (YYYY-MM-DD, default 2024-01-01)
        #[arg(long)]
        from: Option<String>,
        /// Last day, inclusive (YYYY-MM-DD, default today)
        #[arg(long)]
        to: Option<String>,
        /// Only reports listing this violation type
        #[arg(long)]
        violation_type: Option<String>,
        /// Only reports from this country
        #[arg(long)]
        country: Option<String>,
    },
}

/// Dashboard page requests carry no upload
const MAX_REQUEST_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hrm={},info", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = cli.mongo.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let stores = match Stores::connect_read_only(&cli.mongo.mongodb_uri, &cli.mongo.mongodb_db).await {
        Ok(stores) => stores,
        Err(e) => {
            if cli.dev_mode {
                warn!("MongoDB connection failed (dev mode, continuing in memory): {}", e);
                Stores::memory()
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let outcome = match cli.command {
        Command::Serve { listen } => serve(stores.clone(), listen).await,
        Command::Export {
            out,
            from,
            to,
            violation_type,
            country,
        } => {
            let query = DashboardQuery {
                from,
                to,
                violation_type,
                country,
            };
            export(&stores, query, out).await
        }
    };

    stores.close().await;
    outcome
}

async fn serve(stores: Stores, listen: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("Cannot listen on {}", listen))?;
    info!("Dashboard at http://{}/ (store: {})", listen, stores.backend_name());

    let stores = Arc::new(stores);
    let handler = move |_addr: SocketAddr, req: Request<Bytes>| {
        dashboard::dispatch(Arc::clone(&stores), req)
    };

    server::serve(listener, MAX_REQUEST_BYTES, handler, server::shutdown_signal()).await?;
    Ok(())
}

async fn export(stores: &Stores, query: DashboardQuery, out: PathBuf) -> anyhow::Result<()> {
    let filter = query.into_filter()?;
    let data = stores.dashboard(&filter).await?;
    let written = dashboard::write_all(&out, &filter, &data).await?;

    for path in &written {
        println!("{}", path.display());
    }
    if data.is_empty() {
        warn!("No reports matched the filter; exports contain headers only");
    }
    Ok(())
}
