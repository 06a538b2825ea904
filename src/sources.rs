//! Loading the organization roster from a spreadsheet of unknown layout.
//!
//! Roster exports often carry title or metadata rows above the real header,
//! and the column names differ from file to file. Ingestion works on a
//! pre-parsed grid of cell strings ([`Grid`]) so the layout heuristics can be
//! exercised without any file I/O:
//!
//! 1. The header is the first row whose combined text mentions both an
//!    organization keyword and a link keyword ([`ORG_KEYWORDS`], [`LINK_KEYWORDS`]).
//! 2. Columns are picked by keyword, in keyword priority order.
//! 3. If no row qualifies, a secondary pass skips [`FALLBACK_SKIP_ROWS`] rows,
//!    takes the next non-blank row as header, and may pick columns by content.
//! 4. Data rows missing either value are dropped.

use crate::models::OrgSource;
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Keywords that mark the organization column, highest priority first.
pub const ORG_KEYWORDS: [&str; 4] = ["employer", "organization", "company", "org"];

/// Keywords that mark the career link column, highest priority first.
pub const LINK_KEYWORDS: [&str; 4] = ["url", "link", "career", "job"];

/// Rows skipped by the secondary header search.
pub const FALLBACK_SKIP_ROWS: usize = 10;

/// Rows of trimmed cell text, top to bottom.
pub type Grid = Vec<Vec<String>>;

/// Roster problems that stop the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not open spreadsheet {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {path} has no worksheets")]
    NoSheet { path: String },

    #[error(
        "could not detect a header row with an organization column and a career link column; \
         remove the metadata rows above the header and re-save the spreadsheet"
    )]
    NoHeaderRow,

    #[error(
        "could not find organization/URL columns in header {found:?}; \
         name them e.g. \"Employer\" and \"Careers Page\""
    )]
    NoColumns { found: Vec<String> },

    #[error("no organizations with both a name and a career URL in {path}")]
    Empty { path: String },
}

/// Read the first worksheet of `path` and extract the roster.
///
/// # Errors
///
/// Fails if the file cannot be opened, has no header row, or yields no
/// usable organization.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_sources(path: &Path) -> Result<Vec<OrgSource>, IngestError> {
    let grid = read_grid(path)?;
    debug!(rows = grid.len(), "Read spreadsheet grid");
    let sources = sources_from_grid(&grid)?;
    if sources.is_empty() {
        return Err(IngestError::Empty {
            path: path.display().to_string(),
        });
    }
    info!(count = sources.len(), "Loaded organizations");
    Ok(sources)
}

/// Load the first worksheet as a grid of strings.
///
/// Leading empty rows and columns that the workbook omits are padded back in,
/// so row indexes match what a spreadsheet viewer shows (0-based).
pub fn read_grid(path: &Path) -> Result<Grid, IngestError> {
    let display = path.display().to_string();
    let mut workbook = open_workbook_auto(path).map_err(|source| IngestError::Open {
        path: display.clone(),
        source,
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::NoSheet {
            path: display.clone(),
        })?
        .map_err(|source| IngestError::Open {
            path: display.clone(),
            source,
        })?;
    Ok(grid_from_range(&range))
}

/// Cell text of a worksheet range, padded so `grid[r][c]` is sheet cell `(r, c)`.
fn grid_from_range(range: &Range<Data>) -> Grid {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Grid = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![String::new(); col_offset];
        cells.extend(row.iter().map(cell_text));
        grid.push(cells);
    }
    grid
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Extract the roster from a grid.
pub fn sources_from_grid(grid: &[Vec<String>]) -> Result<Vec<OrgSource>, IngestError> {
    if let Some(header_idx) = detect_header(grid) {
        info!(row = header_idx, "Detected header row");
        let (org_col, url_col) = select_columns(&grid[header_idx])
            .ok_or_else(|| no_columns(&grid[header_idx]))?;
        return Ok(collect_rows(&grid[header_idx + 1..], org_col, url_col));
    }

    let header_idx = grid
        .iter()
        .enumerate()
        .skip(FALLBACK_SKIP_ROWS)
        .find(|(_, row)| !is_blank_row(row))
        .map(|(i, _)| i)
        .ok_or(IngestError::NoHeaderRow)?;
    warn!(
        row = header_idx,
        skipped = FALLBACK_SKIP_ROWS,
        "No keyword header found; assuming first non-blank row after skipped rows"
    );

    let data = &grid[header_idx + 1..];
    let (org_col, url_col) = select_columns(&grid[header_idx])
        .or_else(|| columns_by_content(data))
        .ok_or_else(|| no_columns(&grid[header_idx]))?;
    Ok(collect_rows(data, org_col, url_col))
}

/// Index of the first row mentioning both keyword families.
pub fn detect_header(grid: &[Vec<String>]) -> Option<usize> {
    grid.iter().position(|row| {
        let text = row
            .iter()
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        contains_any(&text, &ORG_KEYWORDS) && contains_any(&text, &LINK_KEYWORDS)
    })
}

/// `(organization column, url column)` chosen from header names.
///
/// Keywords are tried in priority order. A column that also names a link
/// ("Organization URL") is only used for the organization as a last resort,
/// and the URL column is never the organization column.
pub fn select_columns(header: &[String]) -> Option<(usize, usize)> {
    let lowered: Vec<String> = header.iter().map(|c| c.trim().to_lowercase()).collect();
    let find = |keywords: &[&str], accept: &dyn Fn(usize, &str) -> bool| {
        keywords.iter().find_map(|kw| {
            lowered
                .iter()
                .enumerate()
                .find(|(i, name)| name.contains(kw) && accept(*i, name.as_str()))
                .map(|(i, _)| i)
        })
    };

    let org_col = find(&ORG_KEYWORDS, &|_, name| !contains_any(name, &LINK_KEYWORDS))
        .or_else(|| find(&ORG_KEYWORDS, &|_, _| true))?;
    let url_col = find(&LINK_KEYWORDS, &|i, _| i != org_col)?;
    Some((org_col, url_col))
}

/// Columns picked from data: the URL column is the one where most values
/// look like web links; the organization column is the first other column
/// with any non-numeric text.
pub fn columns_by_content(rows: &[Vec<String>]) -> Option<(usize, usize)> {
    let width = rows.iter().map(Vec::len).max()?;
    let url_col = (0..width)
        .filter_map(|col| {
            let filled: Vec<&str> = rows
                .iter()
                .map(|r| cell(r, col))
                .filter(|s| !s.is_empty())
                .collect();
            let links = filled.iter().filter(|s| looks_like_url(s)).count();
            (links > 0 && links * 2 >= filled.len()).then_some((col, links))
        })
        .max_by_key(|(col, links)| (*links, std::cmp::Reverse(*col)))
        .map(|(col, _)| col)?;

    let org_col = (0..width)
        .filter(|col| *col != url_col)
        .find(|col| {
            rows.iter().any(|r| {
                let v = cell(r, *col);
                !v.is_empty() && v.parse::<f64>().is_err()
            })
        })?;

    Some((org_col, url_col))
}

fn collect_rows(rows: &[Vec<String>], org_col: usize, url_col: usize) -> Vec<OrgSource> {
    let mut dropped = 0usize;
    let sources: Vec<OrgSource> = rows
        .iter()
        .filter_map(|row| {
            let org = cell(row, org_col);
            let url = cell(row, url_col);
            if org.is_empty() || url.is_empty() || url.eq_ignore_ascii_case("nan") {
                if !is_blank_row(row) {
                    dropped += 1;
                }
                return None;
            }
            Some(OrgSource::new(org, url))
        })
        .collect();
    if dropped > 0 {
        debug!(dropped, "Dropped rows missing organization or URL");
    }
    sources
}

fn no_columns(header: &[String]) -> IngestError {
    IngestError::NoColumns {
        found: header.iter().filter(|c| !c.is_empty()).cloned().collect(),
    }
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.trim()).unwrap_or("")
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("www.")
}
