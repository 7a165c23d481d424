//! Configuration module for the scrape engine
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use scrape_engine::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("engine.toml")).unwrap();
//! println!("Jobs stop after {} pages", config.engine.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CustomExtractor, EngineConfig, FetcherConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
