//! Per-platform job extractors.
//!
//! Each platform tag from [`crate::platform`] has one extractor implementing
//! [`Extractor`]. Extractors only produce *raw* entries with best-effort
//! fields; turning them into [`crate::models::JobRecord`]s is the
//! normalizer's job.
//!
//! # Supported Platforms
//!
//! | Platform | Module | Method | Notes |
//! |----------|--------|--------|-------|
//! | iCIMS | [`icims`] | HTML scraping | Regex heuristics for location and type |
//! | BambooHR | [`bamboohr`] | JSON list API | Endpoint derived from the subdomain |
//! | Workday | [`workday`] | Search API (POST) | Two-step: find embedded tenant link, then query |
//! | AIER | [`aier`] | HTML scraping | WordPress content links |
//! | anything else | [`fallback`] | none | Single "View Jobs" record |
//!
//! # Failure Contract
//!
//! [`Extractor::extract`] is total: every recoverable problem surfaces from
//! [`Extractor::try_extract`] as an [`ExtractError`], is logged, and becomes
//! an empty list. The dispatcher decides what to do with an empty list.

use crate::fetch::FetchError;
use crate::models::RawJob;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub mod aier;
pub mod bamboohr;
pub mod fallback;
pub mod icims;
pub mod workday;

/// Why an extractor produced nothing.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("response from {url} is not valid JSON: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot derive an API endpoint from {0}")]
    NoEndpoint(String),

    #[error("no embedded job board link found on {0}")]
    NoEmbeddedEndpoint(String),
}

/// One extraction strategy per platform.
pub trait Extractor {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch and parse postings, reporting why nothing could be extracted.
    async fn try_extract(
        &self,
        organization: &str,
        career_url: &str,
    ) -> Result<Vec<RawJob>, ExtractError>;

    /// Fetch and parse postings; errors are logged and collapse to `vec![]`.
    async fn extract(&self, organization: &str, career_url: &str) -> Vec<RawJob> {
        match self.try_extract(organization, career_url).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    extractor = self.name(),
                    org = %organization,
                    url = %career_url,
                    error = %e,
                    "Extraction failed"
                );
                Vec::new()
            }
        }
    }
}

/// Resolve `href` against the page it was found on.
///
/// Absolute links pass through unchanged. Fragment-only and `javascript:`
/// links are not postings and resolve to `None`.
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    if let Ok(abs) = Url::parse(href) {
        return Some(abs.to_string());
    }
    Url::parse(base)
        .ok()
        .and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
}
