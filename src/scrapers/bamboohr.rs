//! BambooHR job list scraper.
//!
//! Every BambooHR tenant exposes its open positions as JSON at
//! `https://{subdomain}.bamboohr.com/careers/list?format=json`, so no HTML is
//! parsed here. Response entries look roughly like:
//!
//! ```json
//! {"result": [{
//!     "id": "42",
//!     "jobOpeningName": "Policy Analyst",
//!     "location": {"city": "Austin", "state": "Texas"},
//!     "employmentStatusLabel": "Full-Time",
//!     "datePosted": "2024-03-03"
//! }]}
//! ```
//!
//! Older tenants send `location` as a string, `jobOpeningType`,
//! `publishedDate` and a ready-made `jobOpeningUrl`; both shapes are handled.

use super::{ExtractError, Extractor};
use crate::fetch::Fetcher;
use crate::models::RawJob;
use crate::normalize::coerce_text;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{info, instrument};

static SUBDOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://([a-z0-9\-_.]+)\.bamboohr\.com").expect("valid subdomain regex")
});

/// Tenant subdomain of a BambooHR URL, lowercased.
pub fn subdomain(career_url: &str) -> Option<String> {
    SUBDOMAIN_RE
        .captures(&career_url.to_lowercase())
        .map(|c| c[1].to_string())
}

/// Scraper for `*.bamboohr.com` career pages.
#[derive(Debug, Clone)]
pub struct BambooHrExtractor {
    fetcher: Fetcher,
    /// Replaces `https://{subdomain}.bamboohr.com` when set.
    origin: Option<String>,
}

impl BambooHrExtractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            origin: None,
        }
    }

    #[cfg(test)]
    fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// JSON list endpoint for a tenant.
    pub fn list_endpoint(&self, subdomain: &str) -> String {
        match &self.origin {
            Some(origin) => format!("{}/careers/list?format=json", origin.trim_end_matches('/')),
            None => format!("https://{subdomain}.bamboohr.com/careers/list?format=json"),
        }
    }
}

impl Extractor for BambooHrExtractor {
    fn name(&self) -> &'static str {
        "bamboohr"
    }

    #[instrument(level = "info", skip_all, fields(org = %organization, url = %career_url))]
    async fn try_extract(
        &self,
        organization: &str,
        career_url: &str,
    ) -> Result<Vec<RawJob>, ExtractError> {
        let sub = subdomain(career_url)
            .ok_or_else(|| ExtractError::NoEndpoint(career_url.to_string()))?;
        let api = self.list_endpoint(&sub);

        let page = self.fetcher.get(&api).await?;
        let data = page.json().map_err(|source| ExtractError::Json {
            url: api.clone(),
            source,
        })?;

        let entries = parse_list(&data, &sub);
        info!(count = entries.len(), %api, "Parsed BambooHR job list");
        Ok(entries)
    }
}

/// Convert a BambooHR list response into raw entries.
///
/// A response without a `result` array yields no entries.
pub fn parse_list(data: &Value, subdomain: &str) -> Vec<RawJob> {
    let Some(results) = data.get("result").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .map(|job| {
            let text = |key: &str| job.get(key).and_then(coerce_text);

            let link = text("jobOpeningUrl").or_else(|| {
                text("id").map(|id| format!("https://{subdomain}.bamboohr.com/careers/{id}"))
            });

            RawJob::new()
                .with("title", text("jobOpeningName"))
                .with("location", job.get("location").and_then(location_text))
                .with(
                    "type",
                    text("jobOpeningType").or_else(|| text("employmentStatusLabel")),
                )
                .with(
                    "date_posted",
                    text("publishedDate").or_else(|| text("datePosted")),
                )
                .with("link", link)
        })
        .collect()
}

/// Location as text; object locations are joined from city, state and country.
fn location_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => {
            let parts: Vec<String> = ["city", "state", "addressCountry"]
                .iter()
                .filter_map(|k| obj.get(*k).and_then(coerce_text))
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        other => coerce_text(other),
    }
}
