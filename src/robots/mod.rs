//! Crawl policy gate
//!
//! Fetches the target site's robots.txt once and decides whether the
//! configured client identity may crawl the listing path. A denial is fatal
//! to the run; it is never retried.

mod parser;

pub use parser::ParsedRobots;

use crate::Result;
use reqwest::Client;
use url::Url;

/// Evaluates the site's crawl-exclusion policy for one target path prefix
///
/// Fetches `robots.txt` from the site root and checks `listing_path` for the
/// given user agent. When the policy document cannot be fetched or read, the
/// decision falls back to `fail_open`: `false` (the default) denies the run,
/// `true` permits it.
///
/// # Returns
///
/// * `Ok(true)` - crawling the listing path is permitted
/// * `Ok(false)` - the policy denies the path (or fetch failed fail-closed)
/// * `Err(ScrapeError)` - the site root URL could not be constructed
pub async fn check_crawl_allowed(
    client: &Client,
    base_url: &Url,
    listing_path: &str,
    user_agent: &str,
    fail_open: bool,
) -> Result<bool> {
    let robots_url = base_url.join("robots.txt")?;
    let target = base_url.join(listing_path)?;

    let robots = match fetch_robots(client, &robots_url).await {
        Ok(robots) => robots,
        Err(e) => {
            if fail_open {
                tracing::warn!(
                    "Could not read {} ({}); fail-open is set, permitting crawl",
                    robots_url,
                    e
                );
                ParsedRobots::allow_all()
            } else {
                tracing::error!(
                    "Could not read {} ({}); denying crawl (set fail-open to override)",
                    robots_url,
                    e
                );
                return Ok(false);
            }
        }
    };

    Ok(robots.is_allowed(target.path(), user_agent))
}

/// Fetches and parses robots.txt from the given URL
///
/// A 404 (or any other non-success status) is treated as an empty policy,
/// which allows everything; only transport failures surface as errors.
async fn fetch_robots(client: &Client, robots_url: &Url) -> Result<ParsedRobots> {
    let response = client.get(robots_url.as_str()).send().await?;

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt returned HTTP {}, treating as empty policy",
            response.status()
        );
        return Ok(ParsedRobots::from_content(""));
    }

    let content = response.text().await?;
    Ok(ParsedRobots::from_content(&content))
}
