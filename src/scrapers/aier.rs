//! AIER careers page scraper.
//!
//! The page is a plain WordPress template with no job board behind it, so
//! postings are the content links that point back into `aier.org` and are
//! not obvious navigation (apply, donate, contact, legal).

use super::{ExtractError, Extractor};
use crate::fetch::Fetcher;
use crate::models::RawJob;
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{info, instrument};

static CONTENT_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("main a, article a, .entry-content a").expect("valid content selector")
});

static NAV_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(apply|donate|contact|privacy|terms)").expect("valid nav regex")
});

/// Link text shorter than this is treated as an icon or a stray word.
const MIN_TITLE_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct AierExtractor {
    fetcher: Fetcher,
}

impl AierExtractor {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

impl Extractor for AierExtractor {
    fn name(&self) -> &'static str {
        "aier"
    }

    #[instrument(level = "info", skip_all, fields(org = %organization, url = %career_url))]
    async fn try_extract(
        &self,
        organization: &str,
        career_url: &str,
    ) -> Result<Vec<RawJob>, ExtractError> {
        let page = self.fetcher.get(career_url).await?;
        let entries = parse_content_links(&page.body, career_url);
        info!(count = entries.len(), "Parsed AIER career links");
        Ok(entries)
    }
}

/// Posting-like links from the page content, first occurrence of each
/// (text, href) pair only.
pub fn parse_content_links(html: &str, career_url: &str) -> Vec<RawJob> {
    let document = Html::parse_document(html);
    let own_page = career_url.trim_end_matches('/');
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for anchor in document.select(&CONTENT_LINK_SELECTOR) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let text = collapse_whitespace(&anchor.text().collect::<String>());
        if href.is_empty() || text.chars().count() < MIN_TITLE_LEN {
            continue;
        }
        if NAV_TEXT_RE.is_match(&text) {
            continue;
        }
        if !href.contains("aier.org") || href.trim_end_matches('/') == own_page {
            continue;
        }
        if !seen.insert((text.clone(), href.to_string())) {
            continue;
        }
        entries.push(RawJob::new().with("title", text).with("link", href));
    }
    entries
}
