//! Configuration module for Admit-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use admit_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Target entries: {}", config.scrape.max_entries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, EndpointConfig, OutputConfig, ScrapeConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
