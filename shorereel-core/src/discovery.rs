//! File discovery module for finding intake video files to process.
//!
//! Scans the top level of the intake directory for recognized media
//! extensions. Subdirectories (the holding areas live there) are never
//! descended into.

use std::path::{Path, PathBuf};

use crate::error::CoreResult;

/// File extensions recognized as intake media (case-insensitive).
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "avi"];

/// Finds video files eligible for ingestion in the intake directory.
///
/// Returns the matching paths sorted by file name so batch runs are
/// deterministic. An empty intake directory yields an empty vector,
/// not an error.
pub fn find_intake_files(intake_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(intake_dir)?;
    let mut files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();

            if !path.is_file() {
                return None;
            }

            path.extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| {
                    MEDIA_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
                .map(|_| path.clone())
        })
        .collect();

    files.sort();
    Ok(files)
}
