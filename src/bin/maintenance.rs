//! hrm-maintenance - seed and repair incident report data

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hrm::{
    config::MongoArgs,
    db::MongoClient,
    maintenance::{self, DateTally, FieldSummary},
    models::parse_day,
};

/// hrm-maintenance - seed and repair incident reports
#[derive(Parser, Debug)]
#[command(name = "hrm-maintenance")]
#[command(about = "Seed synthetic incident reports and repair legacy records")]
struct Cli {
    #[command(flatten)]
    mongo: MongoArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert synthetic incident reports spread over Jan-May 2024
    Seed {
        /// Number of reports to insert
        #[arg(short, long, default_value = "10")]
        count: usize,
        /// RNG seed for repeatable data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print each report's incident date and created_at and how they are stored
    CheckDates,

    /// Rewrite string dates as BSON dates and violation labels as wire names
    NormalizeDates {
        /// Day used for incident dates that cannot be parsed (YYYY-MM-DD, default 2024-03-01)
        #[arg(long)]
        fallback: Option<String>,
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hrm={},warn", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = cli.mongo.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let client = MongoClient::new(&cli.mongo.mongodb_uri, &cli.mongo.mongodb_db)
        .await
        .context("MongoDB connection failed")?;

    let outcome = run(&client, cli.command).await;
    client.shutdown().await;
    outcome
}

async fn run(client: &MongoClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Seed { count, seed } => {
            let inserted = maintenance::seed_reports(client, count, seed).await?;
            println!("Inserted {} reports into {}.", inserted, client.db_name());
        }

        Command::CheckDates => {
            let entries = maintenance::check_dates(client).await?;
            println!("incident_details.date / created_at values:");
            for entry in &entries {
                println!(
                    "  {}  {}  |  {}",
                    entry.id,
                    entry.incident_date.describe(),
                    entry.created_at.describe()
                );
            }
            print_tally(
                "incident_details.date",
                DateTally::from_kinds(entries.iter().map(|e| &e.incident_date)),
            );
            print_tally(
                "created_at",
                DateTally::from_kinds(entries.iter().map(|e| &e.created_at)),
            );
        }

        Command::NormalizeDates { fallback, dry_run } => {
            let fallback = match fallback {
                Some(raw) => parse_day(&raw).map_err(|e| anyhow::anyhow!("--fallback: {}", e))?,
                None => maintenance::default_fallback_day(),
            };
            info!(%fallback, dry_run, "Normalizing report dates and violation types");

            let summary = maintenance::normalize_dates(client, fallback, dry_run).await?;
            print_field("incident_details.date", &summary.incident_date, fallback);
            print_field("created_at", &summary.created_at, fallback);
            println!("violation_types: {} rewritten to wire names", summary.violations_rewritten);
            println!(
                "{} reports need repair, {} written",
                summary.repaired, summary.written
            );
            if dry_run {
                println!("Dry run: nothing was written.");
            }
        }
    }
    Ok(())
}

fn print_tally(field: &str, tally: DateTally) {
    println!(
        "{}: {} typed, {} string, {} missing, {} unexpected",
        field, tally.typed, tally.legacy, tally.missing, tally.unexpected
    );
}

fn print_field(field: &str, summary: &FieldSummary, fallback: NaiveDate) {
    println!(
        "{}: {} converted, {} defaulted (fallback {}), {} left alone",
        field, summary.converted, summary.defaulted, fallback, summary.unchanged
    );
}
