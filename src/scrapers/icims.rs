//! iCIMS hosted career page scraper.
//!
//! iCIMS listing pages vary a lot between tenants and template versions, so
//! this scraper works from a broad set of card selectors and then applies
//! text heuristics to each card for location and employment type. List pages
//! rarely carry a posting date; the normalizer fills in today.
//!
//! # Text Heuristics
//!
//! Card text nodes are joined with a double space, so `Location: X` captures
//! up to the end of its own text node.

use super::{ExtractError, Extractor, resolve_link};
use crate::fetch::Fetcher;
use crate::models::RawJob;
use crate::utils::{collapse_whitespace, title_case};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "div.iCIMS_JobListing, div.row, li[class*='job'], div[class*='search-result']",
    )
    .expect("valid card selector")
});

static ANCHOR_FALLBACK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.iCIMS_Anchor, .iCIMS_Listings a, .search-results a")
        .expect("valid anchor selector")
});

static HREF_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid href selector"));

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Location[:\s]+(.+?)(?:\s{2,}|$)").expect("valid location regex")
});

static JOB_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(Full[-\s]?time|Part[-\s]?time|Internship|Fellowship|Contract)")
        .expect("valid job type regex")
});

/// Scraper for `*.icims.com` listings.
#[derive(Debug, Clone)]
pub struct IcimsExtractor {
    fetcher: Fetcher,
}

impl IcimsExtractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

impl Extractor for IcimsExtractor {
    fn name(&self) -> &'static str {
        "icims"
    }

    #[instrument(level = "info", skip_all, fields(org = %organization, url = %career_url))]
    async fn try_extract(
        &self,
        organization: &str,
        career_url: &str,
    ) -> Result<Vec<RawJob>, ExtractError> {
        let page = self.fetcher.get(career_url).await?;
        let entries = parse_listings(&page.body, &page.final_url);
        info!(count = entries.len(), status = page.status, "Parsed iCIMS listings");
        Ok(entries)
    }
}

/// Extract raw entries from an iCIMS listing page.
pub fn parse_listings(html: &str, page_url: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);

    let mut cards: Vec<ElementRef> = document.select(&CARD_SELECTOR).collect();
    if cards.is_empty() {
        debug!("No listing cards; falling back to bare anchors");
        cards = document.select(&ANCHOR_FALLBACK_SELECTOR).collect();
    }

    let mut entries = Vec::new();
    for card in cards {
        let anchor = if card.value().name() == "a" && card.value().attr("href").is_some() {
            Some(card)
        } else {
            card.select(&HREF_SELECTOR).next()
        };
        let Some(anchor) = anchor else {
            continue;
        };
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| resolve_link(page_url, href))
        else {
            continue;
        };

        let title = collapse_whitespace(&anchor.text().collect::<String>());
        let title = if title.is_empty() {
            "Untitled".to_string()
        } else {
            title
        };

        let text = card_text(card);
        let mut entry = RawJob::new().with("title", title).with("link", link);
        if let Some(location) = find_location(&text) {
            entry = entry.with("location", location);
        }
        if let Some(job_type) = find_job_type(&text) {
            entry = entry.with("type", job_type);
        }
        entries.push(entry);
    }
    entries
}

/// Card text with each text node trimmed and nodes separated by two spaces.
fn card_text(card: ElementRef) -> String {
    card.text()
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn find_location(text: &str) -> Option<String> {
    LOCATION_RE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn find_job_type(text: &str) -> Option<String> {
    JOB_TYPE_RE.captures(text).map(|c| title_case(c[1].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::fast_fetcher;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING: &str = r#"
        <html><body>
          <div class="iCIMS_JobListing">
            <a href="/jobs/101/policy-analyst/job">Policy Analyst</a>
            <span>Location: Washington, DC</span>
            <span>Full-time</span>
          </div>
          <div class="iCIMS_JobListing">
            <a href="https://careers-acme.icims.com/jobs/102/intern/job">  Summer
               Intern </a>
            <p>Internship</p>
          </div>
          <div class="iCIMS_JobListing"><span>No link here</span></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_listing_cards() {
        let entries = parse_listings(LISTING, "https://careers-acme.icims.com/jobs/search");
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.get("title").unwrap(), "Policy Analyst");
        assert_eq!(
            first.get("link").unwrap(),
            "https://careers-acme.icims.com/jobs/101/policy-analyst/job"
        );
        assert_eq!(first.get("location").unwrap(), "Washington, DC");
        assert_eq!(first.get("type").unwrap(), "Full-Time");

        let second = &entries[1];
        assert_eq!(second.get("title").unwrap(), "Summer Intern");
        assert_eq!(second.get("type").unwrap(), "Internship");
        assert!(second.get("location").is_none());
    }

    #[test]
    fn test_falls_back_to_bare_anchors() {
        let html = r#"<ul class="iCIMS_Listings"><a href="/jobs/7/job">Editor</a></ul>"#;
        let entries = parse_listings(html, "https://x.icims.com/jobs/search");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].get("title").unwrap(), "Editor");
        assert_eq!(entries[0].get("link").unwrap(), "https://x.icims.com/jobs/7/job");
    }

    #[test]
    fn test_heuristics_default_to_none() {
        assert_eq!(find_location("Policy Analyst  Apply now"), None);
        assert_eq!(find_job_type("Policy Analyst"), None);
        assert_eq!(find_job_type("part time role").as_deref(), Some("Part Time"));
    }

    #[tokio::test]
    async fn test_extract_from_served_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .mount(&server)
            .await;

        let extractor = IcimsExtractor::new(fast_fetcher());
        let entries = extractor.extract("Acme", &server.uri()).await;
        assert_eq!(entries.len(), 2);
        assert!(
            entries[0]
                .get("link")
                .unwrap()
                .as_str()
                .unwrap()
                .starts_with(&server.uri())
        );
    }

    #[tokio::test]
    async fn test_extract_is_empty_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let extractor = IcimsExtractor::new(fast_fetcher());
        assert!(extractor.extract("Acme", &server.uri()).await.is_empty());
    }
}
