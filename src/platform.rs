//! Career page platform detection.
//!
//! [`classify`] is a pure, total function of the URL string. Checks run in a
//! fixed priority order, vendor domains first, so a URL that mentions more
//! than one platform always resolves the same way.

use std::fmt;

/// Individually supported sites that run a custom template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownSite {
    /// WordPress careers page at `aier.org/careers`.
    Aier,
}

/// Publishing technology behind a career URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// iCIMS hosted listings (markup only).
    Icims,
    /// BambooHR, which exposes a JSON job list per subdomain.
    BambooHr,
    /// Workday, queried through its `wday/cxs` search endpoint.
    Workday,
    CustomKnownSite(KnownSite),
    /// Nothing recognized; emit the fallback record.
    GenericFallback,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Icims => f.write_str("iCIMS"),
            Platform::BambooHr => f.write_str("BambooHR"),
            Platform::Workday => f.write_str("Workday"),
            Platform::CustomKnownSite(KnownSite::Aier) => f.write_str("AIER (custom)"),
            Platform::GenericFallback => f.write_str("generic"),
        }
    }
}

/// Substrings that mark a Workday-hosted page. `wd1`/`wd3`/`wd5` are the
/// Workday data center prefixes seen in tenant hostnames.
const WORKDAY_MARKERS: [&str; 5] = ["myworkdayjobs.com", "workday", "wd5", "wd1", "wd3"];

/// Career domains known to front a Workday tenant without saying so.
const WORKDAY_FRONTED_DOMAINS: [&str; 1] = ["careers.nfib.com"];

/// Classify a career URL. Case-insensitive; never fails.
pub fn classify(url: &str) -> Platform {
    let u = url.to_lowercase();

    if u.contains("icims.com") {
        return Platform::Icims;
    }
    if u.contains("bamboohr.com") {
        return Platform::BambooHr;
    }
    if WORKDAY_MARKERS.iter().any(|m| u.contains(m))
        || WORKDAY_FRONTED_DOMAINS.iter().any(|d| u.contains(d))
    {
        return Platform::Workday;
    }
    if u.contains("aier.org/careers") {
        return Platform::CustomKnownSite(KnownSite::Aier);
    }
    Platform::GenericFallback
}
