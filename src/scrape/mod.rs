//! Scrape pipeline: fetching, row parsing, field extraction, coordination
//!
//! The listing crawler walks pages sequentially and yields one partial
//! record per qualifying row; the detail pool then enriches the whole batch
//! concurrently. The coordinator wires the phases together behind the
//! crawl-policy gate.

pub mod coordinator;
pub mod detail;
pub mod extract;
pub mod fetcher;
pub mod listing;
pub mod row;

pub use coordinator::{run_scrape, Coordinator, ScrapeSummary};
pub use detail::{fetch_details, DetailCache};
pub use extract::FieldExtractor;
pub use fetcher::{build_http_client, fetch_page, format_user_agent, FetchOutcome};
pub use listing::{CrawlEnd, CrawlOutcome, ListingCrawler};
