//! Workday job search scraper.
//!
//! Workday boards are rendered client-side from a JSON search endpoint:
//!
//! ```text
//! https://{host}.myworkdayjobs.com/{tenant}/{site}
//!   -> POST https://{host}.myworkdayjobs.com/wday/cxs/{tenant}/{site}/jobs
//! ```
//!
//! Discovery takes two steps and fails closed at each:
//! 1. If the career URL is not on `myworkdayjobs.com`, fetch it and look for
//!    an embedded `myworkdayjobs.com/{tenant}/{site}` link. None found: no entries.
//! 2. Page through the search endpoint. A failed first page: no entries.
//!
//! Only the first two path segments are read as tenant and site. Boards
//! whose tenant/site live deeper in the path are not understood; they are
//! logged and queried with the first two segments anyway.

use super::{ExtractError, Extractor};
use crate::fetch::Fetcher;
use crate::models::RawJob;
use crate::normalize::coerce_text;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Postings requested per search call.
pub const PAGE_SIZE: usize = 20;

/// Upper bound on postings collected from one board.
pub const MAX_POSTINGS: usize = 200;

static EMBEDDED_BASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https://[a-z0-9\-.]+\.myworkdayjobs\.com/[^"'\s<>]+"#)
        .expect("valid workday link regex")
});

/// A resolved `wday/cxs` search endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CxsEndpoint {
    /// Scheme and host, e.g. `https://acme.wd5.myworkdayjobs.com`.
    pub origin: String,
    pub tenant: String,
    pub site: String,
}

impl CxsEndpoint {
    pub fn jobs_url(&self) -> String {
        format!("{}/wday/cxs/{}/{}/jobs", self.origin, self.tenant, self.site)
    }

    /// Human-facing posting URL for a search result's `externalPath`.
    pub fn posting_link(&self, external_path: &str) -> String {
        let path = external_path.trim_start_matches('/');
        if path.starts_with("job/") {
            format!("{}/{}/{}/{}", self.origin, self.tenant, self.site, path)
        } else {
            format!("{}/{}/{}/job/{}", self.origin, self.tenant, self.site, path)
        }
    }
}

/// First `myworkdayjobs.com` board link embedded in a page.
pub fn find_workday_base(html: &str) -> Option<String> {
    EMBEDDED_BASE_RE.find(html).map(|m| m.as_str().to_string())
}

/// Build the search endpoint from a board URL.
///
/// Returns `None` unless the host is on `myworkdayjobs.com` and the path has
/// at least tenant and site segments.
pub fn build_cxs_endpoint(base: &str) -> Option<CxsEndpoint> {
    let url = Url::parse(base).ok()?;
    let host = url.host_str()?.to_lowercase();
    if !host.ends_with("myworkdayjobs.com") {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    if segments.len() > 2 && segments[2] != "job" {
        warn!(
            %base,
            depth = segments.len(),
            "Workday path deeper than tenant/site; using the first two segments"
        );
    }

    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Some(CxsEndpoint {
        origin,
        tenant: segments[0].to_string(),
        site: segments[1].to_string(),
    })
}

/// Scraper for Workday-backed career pages.
#[derive(Debug, Clone)]
pub struct WorkdayExtractor {
    fetcher: Fetcher,
    max_postings: usize,
}

impl WorkdayExtractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            max_postings: MAX_POSTINGS,
        }
    }

    /// Step 1: the board URL, either given directly or found in the page.
    async fn discover_base(&self, career_url: &str) -> Result<String, ExtractError> {
        if career_url.to_lowercase().contains("myworkdayjobs.com") {
            return Ok(career_url.to_string());
        }
        let page = self.fetcher.get(career_url).await?;
        find_workday_base(&page.body)
            .ok_or_else(|| ExtractError::NoEmbeddedEndpoint(career_url.to_string()))
    }

    /// Step 2: page through the search endpoint.
    ///
    /// A failure on the first page is an error; on later pages the postings
    /// collected so far are kept.
    pub async fn query_postings(
        &self,
        endpoint: &CxsEndpoint,
        career_url: &str,
    ) -> Result<Vec<RawJob>, ExtractError> {
        let jobs_url = endpoint.jobs_url();
        let mut entries = Vec::new();
        let mut total: Option<usize> = None;
        let mut offset = 0usize;

        while offset < self.max_postings {
            let payload = json!({
                "appliedFacets": {},
                "limit": PAGE_SIZE,
                "offset": offset,
                "searchText": ""
            });

            let data = match self.fetch_page(&jobs_url, &payload).await {
                Ok(data) => data,
                Err(e) if offset == 0 => return Err(e),
                Err(e) => {
                    warn!(offset, error = %e, "Workday page failed; keeping earlier pages");
                    break;
                }
            };

            if total.is_none() {
                total = data
                    .get("total")
                    .and_then(Value::as_u64)
                    .map(|t| t as usize)
                    .filter(|t| *t > 0);
            }

            let postings = parse_postings(&data, endpoint, career_url);
            if postings.is_empty() {
                break;
            }
            offset += postings.len();
            entries.extend(postings);
            debug!(offset, ?total, "Fetched Workday page");

            if total.is_some_and(|t| offset >= t) {
                break;
            }
        }

        entries.truncate(self.max_postings);
        Ok(entries)
    }

    async fn fetch_page(&self, jobs_url: &str, payload: &Value) -> Result<Value, ExtractError> {
        let page = self.fetcher.post_json(jobs_url, payload).await?;
        page.json().map_err(|source| ExtractError::Json {
            url: jobs_url.to_string(),
            source,
        })
    }
}

impl Extractor for WorkdayExtractor {
    fn name(&self) -> &'static str {
        "workday"
    }

    #[instrument(level = "info", skip_all, fields(org = %organization, url = %career_url))]
    async fn try_extract(
        &self,
        organization: &str,
        career_url: &str,
    ) -> Result<Vec<RawJob>, ExtractError> {
        let base = self.discover_base(career_url).await?;
        let endpoint =
            build_cxs_endpoint(&base).ok_or_else(|| ExtractError::NoEndpoint(base.clone()))?;

        let entries = self.query_postings(&endpoint, career_url).await?;
        info!(count = entries.len(), jobs_url = %endpoint.jobs_url(), "Parsed Workday postings");
        Ok(entries)
    }
}

/// Convert one search response into raw entries.
///
/// `type` is left unset; Workday search results carry no standard
/// employment category.
pub fn parse_postings(data: &Value, endpoint: &CxsEndpoint, career_url: &str) -> Vec<RawJob> {
    let Some(postings) = data.get("jobPostings").and_then(Value::as_array) else {
        return Vec::new();
    };

    postings
        .iter()
        .map(|item| {
            let text = |key: &str| item.get(key).and_then(coerce_text);

            let link = match text("externalPath") {
                Some(path) => endpoint.posting_link(&path),
                None => text("externalUrl").unwrap_or_else(|| career_url.to_string()),
            };

            let location = item
                .get("locations")
                .filter(|v| v.as_array().is_some_and(|a| !a.is_empty()))
                .cloned()
                .or_else(|| item.get("locationsText").cloned())
                .unwrap_or(Value::Null);

            RawJob::new()
                .with("title", text("title"))
                .with("location", location)
                .with("date_posted", text("postedOn").or_else(|| text("startDate")))
                .with("link", link)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::fast_fetcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn acme() -> CxsEndpoint {
        CxsEndpoint {
            origin: "https://acme.wd5.myworkdayjobs.com".into(),
            tenant: "acme".into(),
            site: "External".into(),
        }
    }

    #[test]
    fn test_find_embedded_base() {
        let html = r#"<a class="btn" href="https://acme.wd5.myworkdayjobs.com/acme/External">Open roles</a>"#;
        assert_eq!(
            find_workday_base(html).as_deref(),
            Some("https://acme.wd5.myworkdayjobs.com/acme/External")
        );
        assert_eq!(find_workday_base("<p>no board here</p>"), None);
    }

    #[test]
    fn test_build_cxs_endpoint() {
        let ep = build_cxs_endpoint("https://acme.wd5.myworkdayjobs.com/acme/External?q=1").unwrap();
        assert_eq!(ep, acme());
        assert_eq!(
            ep.jobs_url(),
            "https://acme.wd5.myworkdayjobs.com/wday/cxs/acme/External/jobs"
        );
    }

    #[test]
    fn test_build_cxs_endpoint_rejects_short_or_foreign_paths() {
        assert_eq!(build_cxs_endpoint("https://acme.wd5.myworkdayjobs.com/External"), None);
        assert_eq!(build_cxs_endpoint("https://example.org/acme/External"), None);
        assert_eq!(build_cxs_endpoint("not a url"), None);
    }

    #[test]
    fn test_deeper_paths_use_first_two_segments() {
        let ep = build_cxs_endpoint("https://acme.wd1.myworkdayjobs.com/en-US/acme/External")
            .unwrap();
        assert_eq!(ep.tenant, "en-US");
        assert_eq!(ep.site, "acme");
    }

    #[test]
    fn test_posting_link() {
        let ep = acme();
        assert_eq!(
            ep.posting_link("/job/Austin-TX/Analyst_R123"),
            "https://acme.wd5.myworkdayjobs.com/acme/External/job/Austin-TX/Analyst_R123"
        );
        assert_eq!(
            ep.posting_link("Analyst_R123"),
            "https://acme.wd5.myworkdayjobs.com/acme/External/job/Analyst_R123"
        );
    }

    #[test]
    fn test_parse_postings() {
        let data = json!({
            "total": 2,
            "jobPostings": [
                {
                    "title": "Economist",
                    "externalPath": "/job/DC/Economist_R1",
                    "locations": ["Washington, DC", "Remote"],
                    "postedOn": "Posted 3 Days Ago"
                },
                {
                    "title": "Intern",
                    "locationsText": "2 Locations"
                }
            ]
        });
        let entries = parse_postings(&data, &acme(), "https://careers.acme.org");
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].get("link").unwrap(),
            "https://acme.wd5.myworkdayjobs.com/acme/External/job/DC/Economist_R1"
        );
        assert_eq!(entries[0].get("location").unwrap(), &json!(["Washington, DC", "Remote"]));
        assert_eq!(entries[0].get("date_posted").unwrap(), "Posted 3 Days Ago");
        assert_eq!(entries[1].get("link").unwrap(), "https://careers.acme.org");
        assert_eq!(entries[1].get("location").unwrap(), "2 Locations");
        assert!(entries[1].get("type").is_none());
    }

    fn local_endpoint(server: &MockServer) -> CxsEndpoint {
        CxsEndpoint {
            origin: server.uri(),
            tenant: "acme".into(),
            site: "External".into(),
        }
    }

    #[tokio::test]
    async fn test_query_pages_until_total() {
        let server = MockServer::start().await;
        let page = |n: usize, offset: usize| {
            let postings: Vec<Value> = (0..n)
                .map(|i| json!({"title": format!("Job {}", offset + i), "externalPath": format!("/job/{}", offset + i)}))
                .collect();
            json!({"total": 25, "jobPostings": postings})
        };
        Mock::given(method("POST"))
            .and(path("/wday/cxs/acme/External/jobs"))
            .and(wiremock::matchers::body_partial_json(json!({"offset": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(20, 0)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/wday/cxs/acme/External/jobs"))
            .and(wiremock::matchers::body_partial_json(json!({"offset": 20})))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(5, 20)))
            .expect(1)
            .mount(&server)
            .await;

        let extractor = WorkdayExtractor::new(fast_fetcher());
        let entries = extractor
            .query_postings(&local_endpoint(&server), "https://careers.acme.org")
            .await
            .unwrap();
        assert_eq!(entries.len(), 25);
        assert_eq!(entries[24].get("title").unwrap(), "Job 24");
    }

    #[tokio::test]
    async fn test_query_failure_on_first_page_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let extractor = WorkdayExtractor::new(fast_fetcher());
        let result = extractor
            .query_postings(&local_endpoint(&server), "https://careers.acme.org")
            .await;
        assert!(matches!(result, Err(ExtractError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_non_json_search_response_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let extractor = WorkdayExtractor::new(fast_fetcher());
        let result = extractor
            .query_postings(&local_endpoint(&server), "https://careers.acme.org")
            .await;
        assert!(matches!(result, Err(ExtractError::Json { .. })));
    }

    #[tokio::test]
    async fn test_missing_embedded_link_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Careers</html>"))
            .mount(&server)
            .await;

        let extractor = WorkdayExtractor::new(fast_fetcher());
        let url = format!("{}/careers", server.uri());
        let result = extractor.try_extract("Acme", &url).await;
        assert!(matches!(result, Err(ExtractError::NoEmbeddedEndpoint(_))));
        assert!(extractor.extract("Acme", &url).await.is_empty());
    }
}
