//! Locating the PDF files to merge

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use tracing::{error, info, warn};

use crate::error::{Error, Result};

/// File name pattern for merge inputs
pub const PDF_PATTERN: &str = "*.pdf";

/// List the PDF file names directly inside `folder`, sorted lexicographically
///
/// Only regular files (or links to them) whose name matches [`PDF_PATTERN`]
/// are returned. Matching is case-sensitive and does not descend into
/// subdirectories. Names are kept as the OS reports them, so a file whose
/// name is not valid UTF-8 is still found.
pub fn read_pdf_file_names(folder: &Path) -> Result<Vec<OsString>> {
    let pattern = Pattern::new(PDF_PATTERN).map_err(|e| Error::General(e.to_string()))?;
    let match_options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let read_error = |source| Error::DirectoryRead {
        path: folder.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;

        let name = entry.file_name();

        // Invalid sequences decode to U+FFFD and leave the ASCII suffix intact
        let lossy = name.to_string_lossy();
        if !pattern.matches_with(&lossy, match_options) || !entry.path().is_file() {
            continue;
        }
        if name.to_str().is_none() {
            warn!("File name is not valid UTF-8, shown as {}", lossy);
        }
        names.push(name);
    }

    names.sort();
    Ok(names)
}

/// Find the PDF files to merge, logging the outcome
///
/// A folder that cannot be read is reported and yields no files; the caller
/// decides what an empty result means.
pub fn find_pdf_files(folder: &Path) -> Vec<OsString> {
    match read_pdf_file_names(folder) {
        Ok(names) => {
            info!("Found {} PDF files in {}", names.len(), folder.display());
            names
        }
        Err(e) => {
            error!("{}", e);
            Vec::new()
        }
    }
}
