//! Output generation for the job feed.
//!
//! # Submodules
//!
//! - [`json`]: Writes the deduplicated, sorted feed as pretty-printed JSON
//!
//! # Output Structure
//!
//! ```text
//! jobs.json        # [ {title, organization, location, type, date_posted, link}, ... ]
//! ```

pub mod json;
