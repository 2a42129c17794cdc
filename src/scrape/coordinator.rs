//! Scrape coordinator - main pipeline orchestration
//!
//! Drives one run through its phases: policy gate, sequential listing crawl,
//! concurrent detail fetch, aggregation, output. Owns the run-scoped detail
//! cache and the shutdown watch; an operator interrupt stops further page
//! fetching, halts the detail pool, and flushes a final checkpoint before
//! exit.

use crate::aggregate::finalize;
use crate::checkpoint::Checkpointer;
use crate::config::Config;
use crate::output::{compute_coverage, write_records};
use crate::record::ResultRecord;
use crate::robots::check_crawl_allowed;
use crate::scrape::detail::{fetch_details, DetailCache};
use crate::scrape::extract::FieldExtractor;
use crate::scrape::fetcher::{build_http_client, format_user_agent};
use crate::scrape::listing::{CrawlEnd, ListingCrawler};
use crate::state::{RunState, RunTracker};
use crate::{Result, ScrapeError};
use reqwest::Client;
use std::path::Path;
use tokio::sync::watch;
use url::Url;

/// What a completed run produced
#[derive(Debug)]
pub struct ScrapeSummary {
    pub records_written: usize,
    pub end: CrawlEnd,
}

/// Main pipeline coordinator
pub struct Coordinator {
    config: Config,
    client: Client,
    cache: DetailCache,
    tracker: RunTracker,
    /// Records carried over from a checkpoint the operator chose to resume
    seed: Vec<ResultRecord>,
}

impl Coordinator {
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self {
            config,
            client,
            cache: DetailCache::new(),
            tracker: RunTracker::new(),
            seed: Vec::new(),
        })
    }

    /// Seeds the run with entries from a manually resumed checkpoint
    pub fn with_seed(mut self, entries: Vec<ResultRecord>) -> Self {
        self.seed = entries;
        self
    }

    /// Runs the pipeline to completion
    pub async fn run(&mut self) -> Result<ScrapeSummary> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, finishing current work");
                let _ = shutdown_tx.send(true);
            }
        });

        // Policy gate: a denial aborts before any page fetch
        self.tracker.advance(RunState::CheckPolicy)?;
        let base_url = Url::parse(&self.config.endpoints.base_url)?;
        let user_agent = format_user_agent(&self.config.user_agent);
        let allowed = check_crawl_allowed(
            &self.client,
            &base_url,
            &self.config.endpoints.listing_path,
            &user_agent,
            self.config.scrape.fail_open,
        )
        .await?;

        if !allowed {
            self.tracker.advance(RunState::Aborted)?;
            return Err(ScrapeError::PolicyDenied {
                path: self.config.endpoints.listing_path.clone(),
            });
        }

        // Sequential listing crawl
        self.tracker.advance(RunState::Crawling)?;
        let mut checkpointer = Checkpointer::new(
            &self.config.output.checkpoint_path,
            self.config.scrape.checkpoint_interval_pages,
        );
        let mut crawler = ListingCrawler::new(
            &self.client,
            &self.config.scrape,
            &self.config.endpoints,
            shutdown_rx.clone(),
        )?;
        // Seeding the crawler keeps resumed entries in every snapshot
        let seed = std::mem::take(&mut self.seed);
        let outcome = crawler.crawl(&mut checkpointer, seed).await?;
        let mut records = outcome.records;

        match outcome.end {
            CrawlEnd::TargetReached => {}
            CrawlEnd::Exhausted | CrawlEnd::TransportError | CrawlEnd::Interrupted => {
                self.tracker.advance(RunState::Stopped)?;
            }
        }
        tracing::info!(
            "Listing crawl ended ({:?}) with {} records through page {}",
            outcome.end,
            records.len(),
            outcome.last_page
        );

        // Concurrent detail fetch over the collected batch
        self.tracker.advance(RunState::DetailFetching)?;
        let extractor = FieldExtractor::new();
        fetch_details(
            &self.client,
            &extractor,
            &self.cache,
            &mut records,
            &self.config.scrape,
            shutdown_rx,
        )
        .await;

        // Final checkpoint flush: clean-shutdown guarantee, not a rollback
        checkpointer.snapshot(&records, outcome.last_page)?;

        // Aggregate and write the output artifact
        self.tracker.advance(RunState::Aggregating)?;
        let final_records = finalize(records, self.config.scrape.max_entries);
        write_records(Path::new(&self.config.output.data_path), &final_records)?;

        let coverage = compute_coverage(&final_records);
        tracing::info!(
            "Field coverage: status {}%, term {}%, citizenship {}%, gpa {}%, gre {}%, comments {}%",
            coverage.percent(coverage.status),
            coverage.percent(coverage.term),
            coverage.percent(coverage.citizenship),
            coverage.percent(coverage.gpa),
            coverage.percent(coverage.gre_total),
            coverage.percent(coverage.comments),
        );

        self.tracker.advance(RunState::Done)?;
        Ok(ScrapeSummary {
            records_written: final_records.len(),
            end: outcome.end,
        })
    }

    /// Current run phase, for observability
    pub fn state(&self) -> RunState {
        self.tracker.current()
    }
}

/// Runs one scrape with the given configuration
pub async fn run_scrape(config: Config) -> Result<ScrapeSummary> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
