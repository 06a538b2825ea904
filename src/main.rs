//! # Job Feed
//!
//! A batch job aggregator that reads a roster of organizations and their
//! career page URLs from a spreadsheet, scrapes each page with the extractor
//! matching its hosting platform, and writes one normalized, deduplicated,
//! newest-first JSON feed of job postings.
//!
//! ## Features
//!
//! - Tolerant roster ingestion (finds the header row under metadata rows)
//! - Platform extractors for iCIMS, BambooHR, Workday and the AIER careers page
//! - A placeholder "View Jobs" entry for any organization that yields nothing
//! - Retry with exponential backoff on transient HTTP failures
//! - Atomic replacement of the output file
//!
//! ## Usage
//!
//! ```sh
//! job_feed -s "Job boards list.xlsx" -o jobs.json
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Ingestion**: Load `(organization, career_url)` pairs from the roster
//! 2. **Dispatch**: Classify each URL and run the matching extractor
//! 3. **Normalization**: Coerce raw entries into fixed-schema records
//! 4. **Output**: Deduplicate, sort by posting date and write JSON

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod dispatch;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod platform;
mod scrapers;
mod sources;
mod utils;

use aggregate::RunError;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let summary = match aggregate::run(&args.run_config()).await {
        Ok(summary) => summary,
        Err(e) => {
            match &e {
                RunError::Ingest(_) => error!(
                    path = %args.sources.display(),
                    error = %e,
                    "Could not read the organization roster (check the file name, sheet and header row)"
                ),
                RunError::OutputDir { .. } => error!(
                    path = %args.output.display(),
                    error = %e,
                    "Output location is not writable (fix perms or choose a different path)"
                ),
                _ => error!(error = %e, "Run failed"),
            }
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        jobs = summary.total,
        organizations = summary.per_org.len(),
        "Execution complete"
    );

    Ok(())
}
