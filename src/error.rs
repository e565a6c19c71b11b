//! Error types for the annotate-and-merge pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input folder could not be listed
    #[error("Error reading directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid PDF (no pages)
    #[error("PDF has no pages: {}", .0.display())]
    EmptyPdf(PathBuf),

    /// Encrypted PDFs cannot be rewritten
    #[error("PDF is encrypted: {}", .0.display())]
    Encrypted(PathBuf),

    /// Folder holds no PDF files
    #[error("No PDF files found in {}", .0.display())]
    NoPdfFiles(PathBuf),

    /// Every PDF in the folder failed to annotate
    #[error("None of the PDF files in {} could be annotated", .0.display())]
    NothingToMerge(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}
