//! Admit-Harvest: a polite admission-results scraper
//!
//! This crate collects admission-outcome records from a paginated public
//! results listing and per-record detail pages, normalizes inconsistent
//! applicant fields (GPA, GRE subscores, citizenship, term), and writes the
//! accumulated records as a JSON array for downstream loading.

pub mod aggregate;
pub mod checkpoint;
pub mod config;
pub mod output;
pub mod record;
pub mod robots;
pub mod scrape;
pub mod state;

use thiserror::Error;

/// Main error type for Admit-Harvest operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawling {path} is disallowed by robots.txt")]
    PolicyDenied { path: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
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
}

/// Result type alias for Admit-Harvest operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{Citizenship, DetailFields, ResultRecord, Status};
pub use state::RunState;
