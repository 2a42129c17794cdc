use serde::Deserialize;

/// Main configuration structure for Admit-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub endpoints: EndpointConfig,
    pub output: OutputConfig,
}

/// Scrape pacing and sizing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Maximum number of records to collect
    #[serde(rename = "max-entries", default = "default_max_entries")]
    pub max_entries: usize,

    /// Listing page to start from (1-based)
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Bounded worker count for concurrent detail fetches
    #[serde(rename = "worker-count", default = "default_worker_count")]
    pub worker_count: usize,

    /// Polite delay between listing page fetches, in seconds
    #[serde(rename = "page-delay-seconds", default = "default_page_delay")]
    pub page_delay_seconds: f64,

    /// Minimal per-request delay inside each detail worker, in seconds
    #[serde(rename = "detail-delay-seconds", default = "default_detail_delay")]
    pub detail_delay_seconds: f64,

    /// Checkpoint after every N listing pages
    #[serde(
        rename = "checkpoint-interval-pages",
        default = "default_checkpoint_interval"
    )]
    pub checkpoint_interval_pages: u32,

    /// Permit crawling when robots.txt cannot be fetched or parsed.
    /// Defaults to false (fail-closed).
    #[serde(rename = "fail-open", default)]
    pub fail_open: bool,
}

fn default_max_entries() -> usize {
    1000
}

fn default_start_page() -> u32 {
    1
}

fn default_worker_count() -> usize {
    10
}

fn default_page_delay() -> f64 {
    1.0
}

fn default_detail_delay() -> f64 {
    0.1
}

fn default_checkpoint_interval() -> u32 {
    5
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            start_page: default_start_page(),
            worker_count: default_worker_count(),
            page_delay_seconds: default_page_delay(),
            detail_delay_seconds: default_detail_delay(),
            checkpoint_interval_pages: default_checkpoint_interval(),
            fail_open: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the scraper
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the scraper
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the scraper
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for scraper-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Target site endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Site root, e.g. "https://results.example.com/"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Listing path relative to the site root, e.g. "survey/"
    #[serde(rename = "listing-path")]
    pub listing_path: String,
}

/// Output artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path for the final JSON array of records
    #[serde(rename = "data-path")]
    pub data_path: String,

    /// Path for periodic checkpoint snapshots
    #[serde(rename = "checkpoint-path")]
    pub checkpoint_path: String,
}
