//! Routes an organization's career URL to the matching extractor.
//!
//! [`Dispatcher::scrape`] is the single failure boundary of the pipeline.
//! Whatever an extractor does (returns nothing, fails every request, or
//! panics), the caller gets at least one entry back and the batch carries on.

use crate::fetch::Fetcher;
use crate::models::RawJob;
use crate::platform::{KnownSite, Platform, classify};
use crate::scrapers::Extractor;
use crate::scrapers::aier::AierExtractor;
use crate::scrapers::bamboohr::BambooHrExtractor;
use crate::scrapers::fallback::fallback_entries;
use crate::scrapers::icims::IcimsExtractor;
use crate::scrapers::workday::WorkdayExtractor;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, instrument, warn};

/// Holds one extractor per platform.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    icims: IcimsExtractor,
    bamboohr: BambooHrExtractor,
    workday: WorkdayExtractor,
    aier: AierExtractor,
}

impl Dispatcher {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            icims: IcimsExtractor::new(fetcher.clone()),
            bamboohr: BambooHrExtractor::new(fetcher.clone()),
            workday: WorkdayExtractor::new(fetcher.clone()),
            aier: AierExtractor::new(fetcher),
        }
    }

    /// Classify `url` and extract its postings. Never fails, never empty.
    #[instrument(level = "info", skip_all, fields(org = %organization, %url))]
    pub async fn scrape(&self, organization: &str, url: &str) -> Vec<RawJob> {
        let platform = classify(url);
        info!(%platform, "Classified career page");
        self.scrape_as(platform, organization, url).await
    }

    /// Extract with an already known platform.
    pub async fn scrape_as(&self, platform: Platform, organization: &str, url: &str) -> Vec<RawJob> {
        match platform {
            Platform::Icims => {
                guarded(platform, organization, url, self.icims.extract(organization, url)).await
            }
            Platform::BambooHr => {
                guarded(platform, organization, url, self.bamboohr.extract(organization, url)).await
            }
            Platform::Workday => {
                guarded(platform, organization, url, self.workday.extract(organization, url)).await
            }
            Platform::CustomKnownSite(KnownSite::Aier) => {
                guarded(platform, organization, url, self.aier.extract(organization, url)).await
            }
            Platform::GenericFallback => fallback_entries(organization, url),
        }
    }
}

/// Run an extraction, substituting the fallback entry if it panics or
/// yields nothing.
pub async fn guarded<F>(platform: Platform, organization: &str, url: &str, extraction: F) -> Vec<RawJob>
where
    F: Future<Output = Vec<RawJob>>,
{
    match AssertUnwindSafe(extraction).catch_unwind().await {
        Ok(entries) if !entries.is_empty() => {
            info!(%platform, count = entries.len(), "Extracted entries");
            entries
        }
        Ok(_) => {
            warn!(%platform, org = %organization, %url, "No entries extracted; using fallback");
            fallback_entries(organization, url)
        }
        Err(payload) => {
            error!(
                %platform,
                org = %organization,
                %url,
                reason = %panic_message(payload.as_ref()),
                "Extractor panicked; using fallback"
            );
            fallback_entries(organization, url)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
