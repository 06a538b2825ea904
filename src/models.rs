//! Data models for organizations, raw scraped entries, and normalized job records.
//!
//! This module defines the core data structures used throughout the application:
//! - [`OrgSource`]: One roster row (organization name + career page URL)
//! - [`RawJob`]: Extractor output before normalization; keys vary by platform
//! - [`JobRecord`]: The canonical, fully populated record written to the feed
//!
//! Sentinel values for missing data live here too, so every component agrees
//! on what "unknown" looks like.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when no specific posting could be extracted.
pub const SENTINEL_TITLE: &str = "View Jobs";

/// Placeholder for unknown location or employment type.
pub const SENTINEL_NA: &str = "N/A";

/// One organization from the roster spreadsheet.
///
/// Both fields are trimmed and non-empty; rows that fail this are dropped
/// during ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgSource {
    /// Display name of the employer.
    pub organization: String,
    /// Human-facing career listing page.
    pub career_url: String,
}

impl OrgSource {
    pub fn new(organization: impl Into<String>, career_url: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            career_url: career_url.into(),
        }
    }
}

/// A job entry as returned by an extractor, before normalization.
///
/// The shape is deliberately loose: values may be strings, numbers, arrays
/// (Workday locations) or be missing entirely. The normalizer is the only
/// place that turns this into a [`JobRecord`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawJob(Map<String, Value>);

impl RawJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. `Value::Null` is stored as-is and later treated
    /// as missing.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<JobRecord> for RawJob {
    fn from(record: JobRecord) -> Self {
        RawJob::new()
            .with("title", record.title)
            .with("organization", record.organization)
            .with("location", record.location)
            .with("type", record.job_type)
            .with("date_posted", record.date_posted)
            .with("link", record.link)
    }
}

/// A normalized job posting, the unit of the output feed.
///
/// Every field is always present and always a non-empty string. Field order
/// is the serialization order, which keeps the feed stable and diffable.
///
/// # JSON Schema
///
/// ```json
/// {
///   "title": "Policy Analyst",
///   "organization": "Example Institute",
///   "location": "Washington, DC",
///   "type": "Full-Time",
///   "date_posted": "2024-03-03",
///   "link": "https://example.org/jobs/42"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobRecord {
    /// Posting title, or [`SENTINEL_TITLE`].
    pub title: String,
    /// Employer name, normally the roster value.
    pub organization: String,
    /// Free-text location, or [`SENTINEL_NA`].
    pub location: String,
    /// Employment category, or [`SENTINEL_NA`].
    #[serde(rename = "type")]
    pub job_type: String,
    /// `YYYY-MM-DD`; today (UTC) when the source had no usable date.
    pub date_posted: String,
    /// Absolute posting URL, or the career page URL.
    pub link: String,
}
