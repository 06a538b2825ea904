//! The placeholder record emitted when nothing structured can be extracted.

use crate::models::{JobRecord, RawJob, SENTINEL_NA, SENTINEL_TITLE};
use crate::utils::today_utc;

/// A single "View Jobs" record pointing at the career page itself.
pub fn fallback(organization: &str, url: &str) -> Vec<JobRecord> {
    vec![JobRecord {
        title: SENTINEL_TITLE.to_string(),
        organization: organization.to_string(),
        location: SENTINEL_NA.to_string(),
        job_type: SENTINEL_NA.to_string(),
        date_posted: today_utc().format("%Y-%m-%d").to_string(),
        link: url.to_string(),
    }]
}

/// [`fallback`] in raw-entry form, for the dispatcher's output.
pub fn fallback_entries(organization: &str, url: &str) -> Vec<RawJob> {
    fallback(organization, url)
        .into_iter()
        .map(RawJob::from)
        .collect()
}
