//! Coercion of raw extractor output into [`JobRecord`]s.
//!
//! Normalization never fails. Missing, null, or blank values collapse to the
//! sentinels in [`crate::models`]; unparseable dates collapse to today (UTC).
//! That loses provenance for some dates, but keeps the feed complete and
//! sortable.
//!
//! # Accepted Date Shapes
//!
//! | Example | Notes |
//! |---------|-------|
//! | `2024-03-03`, `2024/03/03` | plain dates |
//! | `2024-03-03T10:00:00Z`, `2024-03-03T10:00:00.000-05:00` | RFC 3339, converted to UTC |
//! | `2024-03-03 10:00:00`, `2024-03-03T10:00:00` | naive date-times |
//! | `March 3, 2024`, `Mar 3rd, 2024`, `3 March 2024` | long-form |
//! | `03/03/2024` | US month/day/year |
//! | `Sun, 03 Mar 2024 10:00:00 GMT` | RFC 2822 |
//! | `Posted Today`, `Posted 3 Days Ago`, `Posted 30+ Days Ago` | relative (Workday) |

use crate::models::{JobRecord, RawJob, SENTINEL_NA, SENTINEL_TITLE};
use crate::utils::{collapse_whitespace, today_utc};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
    "%m-%d-%Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"));

static POSTED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(posted|published|date posted)\s*(on)?\s*:?\s*").expect("valid prefix regex"));

static DAYS_AGO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)\+?\s+days?\s+ago$").expect("valid days-ago regex"));

/// Normalize a raw entry against today's UTC date.
pub fn normalize(raw: &RawJob, organization: &str, career_url: &str) -> JobRecord {
    normalize_at(raw, organization, career_url, today_utc())
}

/// Normalize a raw entry, using `today` as the date sentinel.
pub fn normalize_at(
    raw: &RawJob,
    organization: &str,
    career_url: &str,
    today: NaiveDate,
) -> JobRecord {
    let field = |key: &str| raw.get(key).and_then(coerce_text);

    let date = field("date_posted")
        .and_then(|s| parse_date(&s, today))
        .unwrap_or(today);

    JobRecord {
        title: field("title").unwrap_or_else(|| SENTINEL_TITLE.to_string()),
        organization: field("organization")
            .or_else(|| non_blank(organization))
            .unwrap_or_else(|| SENTINEL_NA.to_string()),
        location: field("location").unwrap_or_else(|| SENTINEL_NA.to_string()),
        job_type: field("type").unwrap_or_else(|| SENTINEL_NA.to_string()),
        date_posted: date.format("%Y-%m-%d").to_string(),
        link: field("link")
            .or_else(|| non_blank(career_url))
            .unwrap_or_else(|| SENTINEL_NA.to_string()),
    }
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Render a JSON value as display text. `None` means "treat as missing".
///
/// Arrays are joined with `", "` after dropping missing elements; objects
/// have no sensible text form and count as missing.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::String(s) => {
            let s = collapse_whitespace(s);
            (!s.is_empty()).then_some(s)
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(coerce_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
    }
}

/// Parse a posting date in any of the accepted shapes.
///
/// Relative phrases are resolved against `today`. Returns `None` when
/// nothing matches; callers substitute the sentinel.
pub fn parse_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = collapse_whitespace(input);
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, fmt) {
            return Some(dt.date());
        }
    }

    let s = POSTED_PREFIX.replace(&s, "");
    let s = ORDINAL_SUFFIX.replace_all(&s, "$1");
    let s = s.trim();

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    parse_relative(s, today)
}

fn parse_relative(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = s.to_lowercase();
    match lower.as_str() {
        "today" | "just posted" => return Some(today),
        "yesterday" => return today.checked_sub_signed(Duration::days(1)),
        _ => {}
    }
    let caps = DAYS_AGO.captures(&lower)?;
    let days: i64 = caps[1].parse().ok()?;
    today.checked_sub_signed(Duration::try_days(days)?)
}

/// Best-effort job category from title keywords.
///
/// This is a heuristic, not a taxonomy; anything unmatched is `"Other"`.
pub fn infer_category(title: &str) -> &'static str {
    let t = title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));

    if has(&["policy", "analyst", "research", "fellow"]) {
        "Policy"
    } else if has(&["communications", "writer", "editor"]) {
        "Communications"
    } else if has(&["legal", "attorney", "counsel"]) {
        "Legal"
    } else if has(&["media"]) {
        "Media"
    } else if has(&["development", "manager", "coordinator"]) {
        "Operations"
    } else {
        "Other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_long_form_date() {
        let today = day(2025, 1, 1);
        assert_eq!(parse_date("March 3, 2024", today), Some(day(2024, 3, 3)));
        assert_eq!(parse_date("Mar 3rd, 2024", today), Some(day(2024, 3, 3)));
        assert_eq!(parse_date("3 March 2024", today), Some(day(2024, 3, 3)));
        assert_eq!(parse_date("Posted on March 3, 2024", today), Some(day(2024, 3, 3)));
    }

    #[test]
    fn test_iso_and_numeric_dates() {
        let today = day(2025, 1, 1);
        assert_eq!(parse_date("2024-03-03", today), Some(day(2024, 3, 3)));
        assert_eq!(parse_date("2024-03-03T23:30:00Z", today), Some(day(2024, 3, 3)));
        // Offset is converted to UTC before taking the date.
        assert_eq!(
            parse_date("2024-03-03T22:00:00-05:00", today),
            Some(day(2024, 3, 4))
        );
        assert_eq!(parse_date("2024-03-03 08:15:00", today), Some(day(2024, 3, 3)));
        assert_eq!(parse_date("03/15/2024", today), Some(day(2024, 3, 15)));
    }

    #[test]
    fn test_relative_dates() {
        let today = day(2024, 3, 10);
        assert_eq!(parse_date("Posted Today", today), Some(today));
        assert_eq!(parse_date("Posted Yesterday", today), Some(day(2024, 3, 9)));
        assert_eq!(parse_date("Posted 3 Days Ago", today), Some(day(2024, 3, 7)));
        assert_eq!(parse_date("Posted 30+ Days Ago", today), Some(day(2024, 2, 9)));
    }

    #[test]
    fn test_out_of_range_days_ago_is_none() {
        let today = day(2024, 3, 10);
        assert_eq!(parse_date("Posted 200000000000000 Days Ago", today), None);
        assert_eq!(parse_date("Posted 5000000 Days Ago", today), None);
        assert_eq!(parse_date("Posted 99999999999999999999 Days Ago", today), None);
    }

    #[test]
    fn test_normalize_out_of_range_days_ago_is_today() {
        let raw = RawJob::new().with("date_posted", "Posted 200000000000000 Days Ago");
        let record = normalize_at(&raw, "Acme", "https://a.org", day(2024, 3, 10));
        assert_eq!(record.date_posted, "2024-03-10");
    }

    #[test]
    fn test_garbage_date_is_none() {
        let today = day(2024, 3, 10);
        assert_eq!(parse_date("sometime soon", today), None);
        assert_eq!(parse_date("", today), None);
    }

    #[test]
    fn test_normalize_fills_sentinels() {
        let today = day(2024, 5, 1);
        let record = normalize_at(&RawJob::new(), "Acme", "https://acme.org/jobs", today);
        assert_eq!(record.title, "View Jobs");
        assert_eq!(record.organization, "Acme");
        assert_eq!(record.location, "N/A");
        assert_eq!(record.job_type, "N/A");
        assert_eq!(record.date_posted, "2024-05-01");
        assert_eq!(record.link, "https://acme.org/jobs");
    }

    #[test]
    fn test_normalize_missing_date_is_today_utc() {
        let record = normalize(&RawJob::new().with("title", "X"), "Acme", "https://a.org");
        assert_eq!(record.date_posted, today_utc().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_normalize_long_form_date() {
        let raw = RawJob::new().with("date_posted", "March 3, 2024");
        let record = normalize_at(&raw, "Acme", "https://a.org", day(2025, 1, 1));
        assert_eq!(record.date_posted, "2024-03-03");
    }

    #[test]
    fn test_normalize_coerces_odd_values() {
        let raw = RawJob::new()
            .with("title", "  Senior\n  Editor ")
            .with("location", json!(["Washington, DC", null, "Remote"]))
            .with("type", Value::Null)
            .with("link", "")
            .with("organization", json!({"name": "ignored"}))
            .with("date_posted", 20240303);
        let record = normalize_at(&raw, "Acme", "https://a.org/careers", day(2025, 1, 1));
        assert_eq!(record.title, "Senior Editor");
        assert_eq!(record.location, "Washington, DC, Remote");
        assert_eq!(record.job_type, "N/A");
        assert_eq!(record.link, "https://a.org/careers");
        assert_eq!(record.organization, "Acme");
        // Bare integers are not a recognized date shape.
        assert_eq!(record.date_posted, "2025-01-01");
    }

    #[test]
    fn test_normalize_keeps_extracted_organization() {
        let raw = RawJob::new().with("organization", "Partner Org");
        let record = normalize_at(&raw, "Job Board", "https://board.org", day(2025, 1, 1));
        assert_eq!(record.organization, "Partner Org");
    }

    #[test]
    fn test_every_field_non_empty() {
        let raws = [
            RawJob::new(),
            RawJob::new().with("title", "   "),
            RawJob::new().with("location", json!([])),
            RawJob::new().with("date_posted", "not a date"),
        ];
        for raw in &raws {
            let r = normalize_at(raw, "Acme", "https://a.org", day(2025, 1, 1));
            for value in [&r.title, &r.organization, &r.location, &r.job_type, &r.date_posted, &r.link] {
                assert!(!value.is_empty());
            }
        }
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category("Senior Policy Analyst"), "Policy");
        assert_eq!(infer_category("Communications Director"), "Communications");
        assert_eq!(infer_category("Staff Attorney"), "Legal");
        assert_eq!(infer_category("Social Media Associate"), "Media");
        assert_eq!(infer_category("Events Coordinator"), "Operations");
        assert_eq!(infer_category("Receptionist"), "Other");
    }
}
