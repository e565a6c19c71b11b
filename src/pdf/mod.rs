//! PDF manipulation module

pub mod annotate;
pub mod merge;
pub mod metadata;
pub mod page;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used items
pub use annotate::{annotate_pdf, annotation_text, AnnotatedPdf, DEFAULT_LABEL};
pub use merge::{merge_pdfs, MergeOptions};
pub use metadata::{count_pages, page_text_runs};
