//! HTTP fetcher
//!
//! Builds the shared HTTP client with a proper user agent string and fetches
//! page bodies. The client is connection-pooled and cheap to clone, so detail
//! workers share it instead of mutating one client across tasks.

use crate::config::UserAgentConfig;
use reqwest::Client;
use std::time::Duration;

/// Result of a page fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the page body
    Success { body: String },

    /// The server answered with a non-success status
    HttpError { status_code: u16 },

    /// Network-level failure (timeout, connection refused, TLS, ...)
    NetworkError { error: String },
}

/// Formats the user agent string from the identification config
///
/// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
pub fn format_user_agent(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    )
}

/// Builds the HTTP client used for every request in a run
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format_user_agent(config))
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// Transport failures and HTTP errors are returned as outcomes, never as
/// errors: the callers decide locally whether a failed page stops the crawl
/// loop (listing) or merely leaves one record unenriched (detail).
pub async fn fetch_page(client: &Client, url: &str) -> FetchOutcome {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            if !status.is_success() {
                return FetchOutcome::HttpError {
                    status_code: status.as_u16(),
                };
            }
            match response.text().await {
                Ok(body) => FetchOutcome::Success { body },
                Err(e) => FetchOutcome::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                "Connection refused".to_string()
            } else {
                e.to_string()
            };
            FetchOutcome::NetworkError { error }
        }
    }
}
