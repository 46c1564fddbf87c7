//! One-shot CSV ingestion.
//!
//! Runs the same pipeline as `POST /index-data/:collectionName/:excludeColumn` without starting
//! the HTTP server. Configuration comes from the environment (and `.env`); the flags below
//! override the CSV path and write concurrency for this run only.
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use employee_search::{config, logging, processing::EmployeeService};

#[derive(Parser)]
#[command(
    name = "ingest-csv",
    about = "Index every row of a CSV file into an Elasticsearch collection"
)]
struct Cli {
    /// Target collection (index) name.
    #[arg(long)]
    collection: String,
    /// Column dropped from every document before indexing.
    #[arg(long, default_value = "")]
    exclude: String,
    /// CSV file to read instead of `EMPLOYEES_CSV_PATH`.
    #[arg(long)]
    path: Option<PathBuf>,
    /// Maximum number of in-flight index writes.
    #[arg(long)]
    concurrency: Option<usize>,
    /// Create the collection before indexing.
    #[arg(long)]
    create: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::init_config()
        .context("failed to load configuration")?
        .clone();
    logging::init_tracing(&config);

    if let Some(path) = cli.path {
        config.csv_path = path;
    }
    if let Some(concurrency) = cli.concurrency {
        if concurrency == 0 {
            bail!("--concurrency must be at least 1");
        }
        config.ingest_concurrency = concurrency;
    }
    config.log_summary();

    let service =
        EmployeeService::new(&config).context("failed to initialize Elasticsearch client")?;
    if cli.create {
        service
            .create_collection(&cli.collection)
            .await
            .with_context(|| format!("failed to create collection {}", cli.collection))?;
    }

    let outcome = service
        .ingest_csv(&cli.collection, &cli.exclude)
        .await
        .with_context(|| {
            format!(
                "failed to index {} into {}",
                config.csv_path.display(),
                cli.collection
            )
        })?;

    println!(
        "Indexed {} documents into {} excluding {:?}",
        outcome.documents_indexed, cli.collection, cli.exclude
    );
    Ok(())
}
