//! Configuration module for Job-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use job_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Pages in flight: {}", config.scraper.max_concurrent_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, MissingPagination, OutputConfig, ScraperConfig, SelectorConfig, SiteConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
