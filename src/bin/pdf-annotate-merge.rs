//! PDF Annotate & Merge CLI tool
//!
//! Stamps every page of the PDFs in a folder with their file name and merges
//! them into one PDF in the same folder.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use pdf_annotate_merge::{run, RunOptions, DEFAULT_OUTPUT_NAME};

/// Merge and annotate PDF files
#[derive(Parser)]
#[command(name = "pdf-annotate-merge")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge every PDF in ./handouts into ./handouts/merged_output.pdf
    pdf-annotate-merge handouts

    # Choose the output file name
    pdf-annotate-merge handouts --output week1.pdf")]
struct Cli {
    /// Path to the folder containing PDF files
    folder_path: PathBuf,

    /// Name of the output merged PDF
    #[arg(long, default_value = DEFAULT_OUTPUT_NAME)]
    output: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let options = RunOptions {
        output_name: cli.output,
        ..RunOptions::new(cli.folder_path)
    };

    let report = run(&options)
        .with_context(|| format!("Failed to merge PDFs in {}", options.folder.display()))?;

    info!(
        "Merged {} files ({} pages)",
        report.merged_files.len(),
        report.page_count
    );
    for skipped in &report.skipped_files {
        warn!("Left out {}: {}", skipped.name, skipped.reason);
    }

    Ok(())
}
