//! JSON feed output.
//!
//! The feed is a pretty-printed JSON array of [`JobRecord`]s, UTF-8, with the
//! record's field order preserved. It is rewritten wholesale on every run.
//!
//! # Atomic Replace
//!
//! The feed is first written to `<output>.tmp` next to the destination and
//! then renamed over it, so readers never observe a half-written file.

use crate::models::JobRecord;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("could not serialize feed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Temporary sibling path used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "feed.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `records` and atomically replace `path` with them.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_feed(records: &[JobRecord], path: &Path) -> Result<(), OutputError> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');

    let tmp = temp_path(path);
    fs::write(&tmp, json)
        .await
        .map_err(|source| OutputError::Io {
            path: tmp.display().to_string(),
            source,
        })?;

    if let Err(source) = fs::rename(&tmp, path).await {
        error!(tmp = %tmp.display(), error = %source, "Failed to move feed into place");
        let _ = fs::remove_file(&tmp).await;
        return Err(OutputError::Io {
            path: path.display().to_string(),
            source,
        });
    }

    info!("Wrote job feed");
    Ok(())
}
