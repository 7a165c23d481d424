//! Scrape Engine: asynchronous crawl-and-extract jobs
//!
//! This crate runs long-lived scrape jobs that follow pagination links from an
//! entry page, accumulate the fetched content, pull typed fields out of it with
//! a catalog of pattern extractors, and export the deduplicated results as CSV.
//! Jobs run concurrently on a bounded worker pool and are polled by identifier.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod jobs;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for scrape engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] extract::ExtractionError),

    #[error("Export failed: {0}")]
    Export(#[from] output::ExportError),

    #[error("Job worker failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid extractor '{name}': {message}")]
    InvalidExtractor { name: String, message: String },
}

/// Rejected job submissions
///
/// These are reported synchronously to the submitter; no job is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A website URL is required")]
    MissingLocation,

    #[error("At least one data type is required")]
    MissingFieldTypes,
}

/// Result type alias for scrape engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Credentials, ScrapeRequest};
pub use extract::{ExtractorRegistry, FieldResultSet};
pub use jobs::{JobId, JobManager, SubmitRequest};
pub use state::JobStatus;
