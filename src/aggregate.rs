//! The batch run: roster in, job feed out.
//!
//! # Pipeline
//!
//! 1. **Ingestion**: load organizations from the roster spreadsheet (fatal on failure)
//! 2. **Scraping**: for each organization, in order, dispatch and normalize,
//!    pausing between organizations
//! 3. **Post-processing**: drop duplicate `(title, link)` pairs (first wins),
//!    sort newest first
//! 4. **Output**: atomically replace the feed file, log a summary
//!
//! Organizations are processed one at a time. Per-organization trouble only
//! shows up in the log; the run itself fails only on ingestion or output errors.

use crate::dispatch::Dispatcher;
use crate::fetch::{FetchConfig, FetchError, Fetcher};
use crate::models::{JobRecord, OrgSource, SENTINEL_NA};
use crate::normalize::{infer_category, normalize};
use crate::outputs::json::{OutputError, write_feed};
use crate::sources::{IngestError, load_sources};
use crate::utils::{ensure_writable_parent, today_utc};
use chrono::NaiveDate;
use itertools::Itertools;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Organizations listed in the end-of-run summary.
const TOP_ORGS: usize = 10;

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Roster spreadsheet.
    pub sources: PathBuf,
    /// Feed destination.
    pub output: PathBuf,
    /// Pause between organizations.
    pub politeness_delay: Duration,
    /// Fill unknown `type` from the title heuristic.
    pub infer_type: bool,
    pub fetch: FetchConfig,
}

/// Fatal run failures.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Client(#[from] FetchError),

    #[error("output location {path} is not usable: {reason}")]
    OutputDir { path: String, reason: String },

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Job counts for the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    /// `(organization, count)`, most jobs first, ties by name.
    pub per_org: Vec<(String, usize)>,
}

/// Execute one full run.
#[instrument(level = "info", skip_all, fields(sources = %config.sources.display(), output = %config.output.display()))]
pub async fn run(config: &RunConfig) -> Result<RunSummary, RunError> {
    ensure_writable_parent(&config.output)
        .await
        .map_err(|e| RunError::OutputDir {
            path: config.output.display().to_string(),
            reason: e.to_string(),
        })?;

    let sources = load_sources(&config.sources)?;
    info!(count = sources.len(), "Loaded organizations from roster");

    let dispatcher = Dispatcher::new(Fetcher::new(config.fetch.clone())?);
    let records = collect(
        &dispatcher,
        &sources,
        config.politeness_delay,
        config.infer_type,
    )
    .await;

    let feed = finalize(records);
    if let Err(e) = write_feed(&feed, &config.output).await {
        error!(error = %e, "Failed to write job feed");
        return Err(e.into());
    }

    let summary = summarize(&feed);
    log_summary(&summary);
    Ok(summary)
}

/// Scrape and normalize every organization, in roster order.
pub async fn collect(
    dispatcher: &Dispatcher,
    sources: &[OrgSource],
    politeness_delay: Duration,
    infer_type: bool,
) -> Vec<JobRecord> {
    let mut records = Vec::new();

    for (idx, source) in sources.iter().enumerate() {
        info!(
            n = idx + 1,
            of = sources.len(),
            org = %source.organization,
            url = %source.career_url,
            "Scraping organization"
        );
        let raw = dispatcher
            .scrape(&source.organization, &source.career_url)
            .await;

        records.extend(raw.iter().map(|entry| {
            let mut record = normalize(entry, &source.organization, &source.career_url);
            if infer_type && record.job_type == SENTINEL_NA {
                record.job_type = infer_category(&record.title).to_string();
            }
            record
        }));

        if idx + 1 < sources.len() && !politeness_delay.is_zero() {
            sleep(politeness_delay).await;
        }
    }

    records
}

/// Deduplicate by `(title, link)` keeping the first, then sort by
/// `date_posted` descending. The sort is stable, so equal dates keep their
/// collection order. A date that does not parse sorts as today.
pub fn finalize(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let today = today_utc();
    let sort_key = |r: &JobRecord| {
        NaiveDate::parse_from_str(&r.date_posted, "%Y-%m-%d").unwrap_or(today)
    };

    let mut unique: Vec<JobRecord> = records
        .into_iter()
        .unique_by(|r| (r.title.clone(), r.link.clone()))
        .collect();
    unique.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    unique
}

pub fn summarize(records: &[JobRecord]) -> RunSummary {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *counts.entry(r.organization.as_str()).or_default() += 1;
    }
    let per_org = counts
        .into_iter()
        .map(|(org, n)| (org.to_string(), n))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect();

    RunSummary {
        total: records.len(),
        per_org,
    }
}

fn log_summary(summary: &RunSummary) {
    info!(
        total = summary.total,
        organizations = summary.per_org.len(),
        "Saved job feed"
    );
    for (org, n) in &summary.per_org {
        info!(%org, jobs = n, "Organization count");
    }
    for (rank, (org, n)) in summary.per_org.iter().take(TOP_ORGS).enumerate() {
        info!(rank = rank + 1, %org, jobs = n, "Top organization by jobs");
    }
}
