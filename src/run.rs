//! The scan → annotate → merge → cleanup pipeline

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::pdf::{annotate_pdf, merge_pdfs, AnnotatedPdf, MergeOptions, DEFAULT_LABEL};
use crate::scan::find_pdf_files;

/// Output file name used when none is given
pub const DEFAULT_OUTPUT_NAME: &str = "merged_output.pdf";

/// What to merge and where to put it
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Folder holding the PDFs; the output is written here too
    pub folder: PathBuf,
    /// File name of the merged PDF inside `folder`
    pub output_name: String,
    /// Label stamped in front of each file name
    pub label: String,
}

impl RunOptions {
    /// Options for `folder` with the default output name and label
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            ..Self::default()
        }
    }

    /// Where the merged PDF is written
    pub fn output_path(&self) -> PathBuf {
        self.folder.join(&self.output_name)
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            label: DEFAULT_LABEL.to_string(),
        }
    }
}

/// Annotation result for one source file
#[derive(Debug)]
pub struct FileOutcome {
    /// Source file name as found in the folder
    pub name: OsString,
    pub result: Result<AnnotatedPdf>,
}

/// A source file left out of the merge
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub name: String,
    pub reason: String,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    /// Pages in the merged PDF
    pub page_count: usize,
    /// Source files merged, in output order
    pub merged_files: Vec<String>,
    pub skipped_files: Vec<SkippedFile>,
}

/// Annotate every PDF in the folder and merge them into one file
///
/// Files that fail to annotate are logged and left out. The temporary
/// annotated copies are deleted before this returns, on success and on
/// error alike.
///
/// # Example
///
/// ```no_run
/// use pdf_annotate_merge::{run, RunOptions};
///
/// let report = run(&RunOptions::new("handouts")).expect("Failed to merge");
/// println!("{} pages in {}", report.page_count, report.output_path.display());
/// ```
pub fn run(options: &RunOptions) -> Result<RunReport> {
    let folder = &options.folder;

    let names = find_pdf_files(folder);
    if names.is_empty() {
        error!("No PDF files found in {}. Exiting.", folder.display());
        return Err(Error::NoPdfFiles(folder.clone()));
    }

    let mut annotated = Vec::new();
    let mut skipped_files = Vec::new();
    for outcome in annotate_files(folder, &names, options) {
        match outcome.result {
            Ok(pdf) => annotated.push(pdf),
            Err(e) => skipped_files.push(SkippedFile {
                name: outcome.name.to_string_lossy().into_owned(),
                reason: e.to_string(),
            }),
        }
    }

    if annotated.is_empty() {
        error!("No PDF files in {} could be annotated. Exiting.", folder.display());
        return Err(Error::NothingToMerge(folder.clone()));
    }

    let output_path = options.output_path();
    let merge_options = MergeOptions {
        input_paths: annotated.iter().map(|pdf| pdf.path().to_path_buf()).collect(),
        output_path: output_path.clone(),
    };
    let page_count = merge_pdfs(&merge_options)?;
    info!("Combined PDF created at {}", output_path.display());

    let merged_files = annotated.iter().map(AnnotatedPdf::file_name).collect();

    // Removes the temporary files
    drop(annotated);

    Ok(RunReport {
        output_path,
        page_count,
        merged_files,
        skipped_files,
    })
}

/// Annotate each named file in order, one outcome per file
///
/// A file named like the output is skipped, so a rerun does not merge the
/// previous result into the new one.
pub fn annotate_files(
    folder: &Path,
    names: &[OsString],
    options: &RunOptions,
) -> Vec<FileOutcome> {
    let output_name = OsStr::new(&options.output_name);
    names
        .iter()
        .filter(|name| {
            if name.as_os_str() == output_name {
                warn!("Skipping {}: it is the output file", name.to_string_lossy());
                return false;
            }
            true
        })
        .map(|name| {
            let path = folder.join(name);
            let result = annotate_pdf(&path, &options.label);
            if let Err(e) = &result {
                error!("Error processing {}: {}", path.display(), e);
            }
            FileOutcome {
                name: name.clone(),
                result,
            }
        })
        .collect()
}
