//! Sequential listing crawler
//!
//! Drives the paginated results listing one page at a time with a polite
//! delay between fetches. This loop is the single serialization point for
//! crawl politeness: no listing page is ever fetched concurrently, and there
//! is no retry or backoff. A transport error stops the loop and keeps the
//! partial results.

use crate::checkpoint::Checkpointer;
use crate::config::{EndpointConfig, ScrapeConfig};
use crate::record::ResultRecord;
use crate::scrape::fetcher::{fetch_page, FetchOutcome};
use crate::scrape::row::parse_row;
use crate::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// Why the page loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlEnd {
    /// A page yielded zero parsed rows
    Exhausted,

    /// The accumulated record count reached `max-entries`
    TargetReached,

    /// A listing page fetch failed; partial results are kept
    TransportError,

    /// Operator interrupt
    Interrupted,
}

/// What the page loop produced
#[derive(Debug)]
pub struct CrawlOutcome {
    pub records: Vec<ResultRecord>,
    pub end: CrawlEnd,
    /// Last fully processed page, or `start_page - 1` when none completed
    pub last_page: u32,
}

/// Sequential paginator over the results listing
pub struct ListingCrawler<'a> {
    client: &'a Client,
    config: &'a ScrapeConfig,
    listing_url: Url,
    shutdown: watch::Receiver<bool>,
}

impl<'a> ListingCrawler<'a> {
    pub fn new(
        client: &'a Client,
        config: &'a ScrapeConfig,
        endpoints: &EndpointConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let base = Url::parse(&endpoints.base_url)?;
        let listing_url = base.join(&endpoints.listing_path)?;
        Ok(Self {
            client,
            config,
            listing_url,
            shutdown,
        })
    }

    /// Crawls listing pages until a stop condition fires
    ///
    /// Per page: build the URL, fetch, parse rows, snapshot via the
    /// checkpointer, sleep the polite delay. Stop conditions checked per
    /// page: exhaustion, target count reached, transport error, interrupt.
    ///
    /// `seed` pre-fills the accumulator with entries carried over from a
    /// resumed checkpoint, so every interval snapshot (not just the final
    /// flush) contains them and they count toward the entry target.
    pub async fn crawl(
        &mut self,
        checkpointer: &mut Checkpointer,
        seed: Vec<ResultRecord>,
    ) -> Result<CrawlOutcome> {
        let mut records: Vec<ResultRecord> = seed;
        let mut page = self.config.start_page;
        let delay = Duration::from_secs_f64(self.config.page_delay_seconds);

        let end = loop {
            if *self.shutdown.borrow() {
                tracing::info!("Interrupt received, stopping page loop");
                break CrawlEnd::Interrupted;
            }

            if records.len() >= self.config.max_entries {
                tracing::info!("Collected {} records, target reached", records.len());
                break CrawlEnd::TargetReached;
            }

            let url = self.page_url(page);
            tracing::debug!("Fetching listing page {}: {}", page, url);

            let body = match fetch_page(self.client, url.as_str()).await {
                FetchOutcome::Success { body } => body,
                FetchOutcome::HttpError { status_code } => {
                    tracing::warn!(
                        "Listing page {} returned HTTP {}, stopping with partial results",
                        page,
                        status_code
                    );
                    break CrawlEnd::TransportError;
                }
                FetchOutcome::NetworkError { error } => {
                    tracing::warn!(
                        "Listing page {} failed ({}), stopping with partial results",
                        page,
                        error
                    );
                    break CrawlEnd::TransportError;
                }
            };

            let rows = parse_listing_page(&body, &url);
            if rows.is_empty() {
                tracing::info!("Page {} yielded no rows, listing exhausted", page);
                break CrawlEnd::Exhausted;
            }

            let new_count = rows.len();
            records.extend(rows);
            tracing::info!(
                "Page {}: {} rows parsed, {} records total",
                page,
                new_count,
                records.len()
            );

            checkpointer.page_done(&records, page)?;
            page += 1;

            // Polite delay, cut short by an interrupt
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.changed() => {}
            }
        };

        let last_page = page.saturating_sub(1);
        Ok(CrawlOutcome {
            records,
            end,
            last_page,
        })
    }

    /// Builds the listing URL for a page index
    fn page_url(&self, page: u32) -> Url {
        let mut url = self.listing_url.clone();
        url.set_query(Some(&format!("page={}", page)));
        url
    }
}

/// Parses one listing page into candidate records
///
/// Rows that the row parser discards (no detail link, too few columns) are
/// skipped; header rows without `<td>` cells never reach the parser.
pub fn parse_listing_page(html: &str, base_url: &Url) -> Vec<ResultRecord> {
    let doc = Html::parse_document(html);

    let row_selector = match Selector::parse("table tr") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };
    let td_selector = match Selector::parse("td") {
        Ok(sel) => sel,
        Err(_) => return Vec::new(),
    };

    doc.select(&row_selector)
        .filter(|row| row.select(&td_selector).next().is_some())
        .filter_map(|row| parse_row(row, base_url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;

    fn base_url() -> Url {
        Url::parse("https://results.example.com/survey/?page=1").unwrap()
    }

    const THREE_ROW_PAGE: &str = r#"
        <html><body><table>
            <tr><th>School</th><th>Program</th><th>Added</th><th>Decision</th><th></th></tr>
            <tr>
                <td><div class="tw-font-medium">Alpha University</div></td>
                <td><div><span>Biology</span><span>PhD</span></div></td>
                <td>Jan 2, 2026</td>
                <td>Accepted on 1 Jan</td>
                <td><a href="/result/1">See more</a></td>
            </tr>
            <tr>
                <td><div class="tw-font-medium">Beta College</div></td>
                <td><div><span>Chemistry</span><span>MS</span></div></td>
                <td>Jan 3, 2026</td>
                <td>Rejected on 2 Jan</td>
                <td>No link here</td>
            </tr>
            <tr>
                <td><div class="tw-font-medium">Gamma Institute</div></td>
                <td><div><span>Physics</span><span>PhD</span></div></td>
                <td>Jan 4, 2026</td>
                <td>Wait listed on 3 Jan</td>
                <td><a href="/result/3">See more</a></td>
            </tr>
        </table></body></html>
    "#;

    #[test]
    fn test_link_less_row_is_dropped() {
        // Three rows, one without a detail link: exactly two records
        let records = parse_listing_page(THREE_ROW_PAGE, &base_url());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].university, Some("Alpha University".to_string()));
        assert_eq!(records[1].university, Some("Gamma Institute".to_string()));
    }

    #[test]
    fn test_empty_page_yields_no_rows() {
        let records = parse_listing_page("<html><body><p>No results</p></body></html>", &base_url());
        assert!(records.is_empty());
    }

    #[test]
    fn test_header_only_table_yields_no_rows() {
        let html = r#"
            <html><body><table>
                <tr><th>School</th><th>Program</th><th>Added</th><th>Decision</th></tr>
            </table></body></html>
        "#;
        assert!(parse_listing_page(html, &base_url()).is_empty());
    }

    #[test]
    fn test_page_url_sets_page_query() {
        let client = Client::new();
        let config = ScrapeConfig::default();
        let endpoints = EndpointConfig {
            base_url: "https://results.example.com/".to_string(),
            listing_path: "survey/".to_string(),
        };
        let (_tx, rx) = watch::channel(false);
        let crawler = ListingCrawler::new(&client, &config, &endpoints, rx).unwrap();

        assert_eq!(
            crawler.page_url(7).as_str(),
            "https://results.example.com/survey/?page=7"
        );
    }
}
