//! Bounded concurrent detail-page fetching
//!
//! Each record with an entry URL becomes one unit of work: fetch the detail
//! page, run the field extractor, and hand the result back for merging. Units
//! run under a bounded worker count with no ordering guarantee; merging is
//! keyed by record index and performed by a single consumer loop, so the
//! growing result collection is never touched from multiple tasks. Per-unit
//! failures leave that record's detail fields unchanged.

use crate::config::ScrapeConfig;
use crate::record::{DetailFields, ResultRecord};
use crate::scrape::extract::FieldExtractor;
use crate::scrape::fetcher::{fetch_page, FetchOutcome};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Progress is logged after this many completed units
const PROGRESS_EVERY: usize = 50;

/// Cache of extracted detail fields, keyed by entry URL
///
/// Owned by the run and passed into the fetch pool; repeated runs over the
/// same batch (or duplicate links within one) skip the network entirely.
#[derive(Debug, Default)]
pub struct DetailCache {
    inner: Mutex<HashMap<String, DetailFields>>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<DetailFields> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    pub fn put(&self, key: String, fields: DetailFields) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(key, fields);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fetches detail pages for every record with an entry URL and merges the
/// extracted fields in
///
/// Runs at most `worker_count` units concurrently over the shared pooled
/// client. Completion order is irrelevant: each unit carries its record's
/// index, and a non-null extracted field overwrites the record's field while
/// null never erases an existing value.
///
/// An interrupt on the shutdown watch stops the pool: no further units are
/// pulled, fields already fetched stay merged, and the remaining records keep
/// their listing-only values. A watch already flipped on entry launches no
/// units at all.
pub async fn fetch_details(
    client: &Client,
    extractor: &FieldExtractor,
    cache: &DetailCache,
    records: &mut [ResultRecord],
    config: &ScrapeConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    if *shutdown.borrow() {
        tracing::info!("Interrupt received, skipping detail fetch");
        return;
    }

    let jobs: Vec<(usize, String)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.entry_url.clone().map(|url| (i, url)))
        .collect();

    let total = jobs.len();
    if total == 0 {
        return;
    }

    tracing::info!(
        "Fetching {} detail pages with {} workers",
        total,
        config.worker_count
    );

    let delay = Duration::from_secs_f64(config.detail_delay_seconds);

    let mut results = stream::iter(jobs)
        .map(|(index, url)| {
            let client = client.clone();
            async move {
                let fields = fetch_one(&client, extractor, cache, &url, delay).await;
                (index, fields)
            }
        })
        .buffer_unordered(config.worker_count);

    let mut completed = 0usize;
    let mut watch_open = true;
    loop {
        tokio::select! {
            next = results.next() => {
                let Some((index, fields)) = next else { break };
                records[index].merge_detail(&fields);
                completed += 1;
                if completed % PROGRESS_EVERY == 0 {
                    tracing::info!("{}/{} detail pages fetched", completed, total);
                }
            }
            changed = shutdown.changed(), if watch_open => {
                // A closed sender means no interrupt can arrive anymore
                watch_open = changed.is_ok();
                if watch_open && *shutdown.borrow() {
                    tracing::info!(
                        "Interrupt received, stopping detail fetch after {}/{} pages",
                        completed,
                        total
                    );
                    break;
                }
            }
        }
    }

    tracing::info!("Completed {}/{} detail pages", completed, total);
}

/// One unit of work: cache lookup, fetch, extract, cache store
///
/// Any failure yields all-null fields so the record keeps its pre-fetch
/// values; the batch always continues.
async fn fetch_one(
    client: &Client,
    extractor: &FieldExtractor,
    cache: &DetailCache,
    url: &str,
    delay: Duration,
) -> DetailFields {
    if let Some(cached) = cache.get(url) {
        tracing::debug!("Detail cache hit for {}", url);
        return cached;
    }

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match fetch_page(client, url).await {
        FetchOutcome::Success { body } => {
            let fields = extractor.extract(&body);
            cache.put(url.to_string(), fields.clone());
            fields
        }
        FetchOutcome::HttpError { status_code } => {
            tracing::warn!("Detail page {} returned HTTP {}", url, status_code);
            DetailFields::default()
        }
        FetchOutcome::NetworkError { error } => {
            tracing::warn!("Detail page {} unreachable: {}", url, error);
            DetailFields::default()
        }
    }
}
