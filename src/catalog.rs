//! Catalog loading from a JSON Lines file.
//!
//! Each non-blank line is one `{"id", "title", "description"}` object.
//! Loading never fails: a missing or unreadable file gives an empty
//! catalog, and malformed lines are skipped, each with a warning.

use std::path::Path;

use tracing::{info, warn};

use coursebot_core::catalog::Catalog;
use coursebot_core::models::Course;

/// Load the course catalog from `path`.
pub fn load_catalog(path: &Path) -> Catalog {
    let content = match std::fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            let reason = if e.kind() == std::io::ErrorKind::NotFound {
                "catalog not found; continuing with no courses"
            } else {
                "catalog unreadable; continuing with no courses"
            };
            warn!(path = %path.display(), error = %e, "{reason}");
            return Catalog::empty();
        }
    };

    let catalog = Catalog::from_courses(parse_records(&content, path));
    info!(path = %path.display(), courses = catalog.len(), "catalog loaded");
    catalog
}

/// Lines are decoded one at a time so a bad byte sequence only costs its
/// own record.
fn parse_records(content: &[u8], path: &Path) -> Vec<Course> {
    content
        .split(|b| *b == b'\n')
        .enumerate()
        .filter_map(|(idx, raw)| {
            let parsed = std::str::from_utf8(raw)
                .map_err(|e| e.to_string())
                .and_then(|line| {
                    let line = line.trim();
                    if line.is_empty() {
                        return Ok(None);
                    }
                    serde_json::from_str::<Course>(line)
                        .map(Some)
                        .map_err(|e| e.to_string())
                });
            match parsed {
                Ok(course) => course,
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        line = idx + 1,
                        error = %error,
                        "skipping malformed catalog record"
                    );
                    None
                }
            }
        })
        .collect()
}
