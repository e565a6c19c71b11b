//! PDF Annotate & Merge Library
//!
//! Merges every PDF in a folder into one document, stamping each page with
//! the name of the file it came from. This library provides functionality to:
//! - List the PDF files of a folder in a stable order
//! - Stamp a text label on every page of a PDF (into a temporary copy)
//! - Merge multiple PDF files
//! - Read back page counts and shown text
//!
//! Logging goes through `tracing`; nothing here installs a subscriber.
//!
//! # Example
//!
//! ```no_run
//! use pdf_annotate_merge::{run, RunOptions};
//!
//! let options = RunOptions {
//!     output_name: "handout.pdf".to_string(),
//!     ..RunOptions::new("handouts")
//! };
//!
//! let report = run(&options).expect("Failed to merge PDFs");
//! println!("Merged {} files", report.merged_files.len());
//! ```

pub mod error;
pub mod pdf;
pub mod run;
pub mod scan;

// Re-export commonly used items
pub use error::{Error, Result};
pub use run::{run, RunOptions, RunReport, DEFAULT_OUTPUT_NAME};
