//! Command-line interface

pub mod output;
pub mod signals;
pub mod terminal_output;

use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Built-in pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineKind {
    /// Broker, crawler, then PDF processing
    Crawl,
    /// Multi-state document processing
    MultiState,
}

/// Runs the corpus ingestion pipeline end to end
#[derive(Debug, Parser, Clone)]
#[command(name = "corpus-pipeline")]
#[command(version)]
#[command(about = "Crawl, extract and index the document corpus", long_about = None)]
pub struct Cli {
    /// Built-in pipeline to run
    #[arg(short, long, value_enum, default_value_t = PipelineKind::Crawl)]
    pub pipeline: PipelineKind,

    /// Run a pipeline defined in a YAML file instead
    #[arg(short, long, conflicts_with = "pipeline")]
    pub file: Option<PathBuf>,

    /// Path to orchestrator configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip the post-run index summary
    #[arg(long)]
    pub no_report: bool,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
