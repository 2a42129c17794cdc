//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full scrape cycle end-to-end: policy gate, listing pagination,
//! detail enrichment, aggregation, and output.

use admit_harvest::config::{
    Config, EndpointConfig, OutputConfig, ScrapeConfig, UserAgentConfig,
};
use admit_harvest::checkpoint::{load_checkpoint, Checkpointer};
use admit_harvest::output::read_records;
use admit_harvest::scrape::{
    build_http_client, fetch_details, CrawlEnd, Coordinator, DetailCache, FieldExtractor,
    ListingCrawler,
};
use admit_harvest::{ResultRecord, ScrapeError, Status};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the given mock server
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        scrape: ScrapeConfig {
            max_entries: 100,
            start_page: 1,
            worker_count: 4,
            page_delay_seconds: 0.0, // No pacing in tests
            detail_delay_seconds: 0.0,
            checkpoint_interval_pages: 1,
            fail_open: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        endpoints: EndpointConfig {
            base_url: base_url.to_string(),
            listing_path: "/survey/".to_string(),
        },
        output: OutputConfig {
            data_path: dir
                .path()
                .join("results.json")
                .to_string_lossy()
                .to_string(),
            checkpoint_path: dir
                .path()
                .join("checkpoint.json")
                .to_string_lossy()
                .to_string(),
        },
    }
}

/// One listing row with a detail link, parameterized by entry id
fn listing_row(id: u32, university: &str, program: &str, status: &str) -> String {
    format!(
        r#"<tr>
            <td><div class="tw-font-medium">{}</div></td>
            <td><div><span>{}</span><span>PhD</span></div></td>
            <td>January 15, 2026</td>
            <td>{} on 12 Jan</td>
            <td><a href="/result/{}">See more</a></td>
        </tr>"#,
        university, program, status, id
    )
}

fn listing_page(rows: &[String]) -> String {
    format!(
        "<html><body><table><tbody>{}</tbody></table></body></html>",
        rows.join("\n")
    )
}

const EMPTY_PAGE: &str = "<html><body><table><tbody></tbody></table></body></html>";

/// A detail page carrying a structured table plus a comment paragraph
fn detail_page(gpa: &str, term: &str) -> String {
    format!(
        r#"<html><body><main>
        <table>
            <tr><td>Undergrad GPA</td><td>{}</td></tr>
            <tr><td>GRE Verbal</td><td>162</td></tr>
            <tr><td>GRE Quant</td><td>168</td></tr>
            <tr><td>Term</td><td>{}</td></tr>
            <tr><td>Citizenship</td><td>International</td></tr>
        </table>
        <p>Got the email this morning after three months of waiting. Strong
        letters seemed to matter more than the test scores in my case.</p>
        </main></body></html>"#,
        gpa, term
    )
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

async fn mount_listing_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/survey/"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_scrape_two_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let page1 = listing_page(&[
        listing_row(1, "Example University", "Computer Science", "Accepted"),
        listing_row(2, "Other University", "Mathematics", "Rejected"),
    ]);
    let page2 = listing_page(&[listing_row(
        3,
        "Third University",
        "Physics",
        "Wait listed",
    )]);
    mount_listing_page(&mock_server, 1, page1).await;
    mount_listing_page(&mock_server, 2, page2).await;
    mount_listing_page(&mock_server, 3, EMPTY_PAGE.to_string()).await;

    for id in 1..=3 {
        Mock::given(method("GET"))
            .and(path(format!("/result/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("3.85", "Fall 2026")))
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let data_path = config.output.data_path.clone();

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let summary = coordinator.run().await.expect("scrape failed");

    assert_eq!(summary.records_written, 3);
    assert_eq!(summary.end, CrawlEnd::Exhausted);

    let records = read_records(Path::new(&data_path)).expect("read output");
    assert_eq!(records.len(), 3);

    let first = &records[0];
    assert_eq!(first.university.as_deref(), Some("Example University"));
    assert_eq!(first.status, Some(Status::Accepted));
    assert_eq!(first.gpa, Some(3.85));
    assert_eq!(first.gre_verbal, Some(162));
    assert_eq!(first.gre_quant, Some(168));
    // Derived from the subscores
    assert_eq!(first.gre_total, Some(330));
    assert_eq!(first.term.as_deref(), Some("Fall 2026"));
    assert!(first.comments.as_deref().unwrap().contains("Strong"));

    // Listing-level status normalization
    assert_eq!(records[2].status, Some(Status::Waitlisted));
}

#[tokio::test]
async fn test_robots_denial_aborts_before_listing_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nDisallow: /survey/").await;

    // No listing mock mounted: a fetch attempt would 404, but the point is
    // the request must never happen. Expect zero requests besides robots.txt.
    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let data_path = config.output.data_path.clone();

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let result = coordinator.run().await;

    match result {
        Err(ScrapeError::PolicyDenied { path }) => assert_eq!(path, "/survey/"),
        other => panic!("expected PolicyDenied, got {:?}", other),
    }

    // No output artifact on an aborted run
    assert!(!Path::new(&data_path).exists());

    let requests = mock_server
        .received_requests()
        .await
        .expect("request recording");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/robots.txt");
}

#[tokio::test]
async fn test_robots_fetch_failure_denies_by_default() {
    // Nothing listens here, so the robots fetch fails outright
    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config("http://127.0.0.1:1", &dir);

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let result = coordinator.run().await;
    assert!(matches!(result, Err(ScrapeError::PolicyDenied { .. })));
}

#[tokio::test]
async fn test_max_entries_truncates_output() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    // Page one already overshoots a target of 2
    let page1 = listing_page(&[
        listing_row(1, "U1", "CS", "Accepted"),
        listing_row(2, "U2", "CS", "Accepted"),
        listing_row(3, "U3", "CS", "Accepted"),
    ]);
    mount_listing_page(&mock_server, 1, page1).await;

    for id in 1..=3 {
        Mock::given(method("GET"))
            .and(path(format!("/result/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("3.5", "F26")))
            .mount(&mock_server)
            .await;
    }

    let dir = TempDir::new().expect("tempdir");
    let mut config = create_test_config(&base_url, &dir);
    config.scrape.max_entries = 2;
    let data_path = config.output.data_path.clone();

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let summary = coordinator.run().await.expect("scrape failed");

    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.end, CrawlEnd::TargetReached);

    let records = read_records(Path::new(&data_path)).expect("read output");
    assert_eq!(records.len(), 2);
    // Listing order is preserved through truncation
    assert_eq!(records[0].university.as_deref(), Some("U1"));
    assert_eq!(records[1].university.as_deref(), Some("U2"));
    // Short term form expands
    assert_eq!(records[0].term.as_deref(), Some("Fall 2026"));
}

#[tokio::test]
async fn test_failed_detail_fetch_leaves_fields_null() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let page1 = listing_page(&[
        listing_row(1, "Good Detail U", "CS", "Accepted"),
        listing_row(2, "Broken Detail U", "CS", "Rejected"),
    ]);
    mount_listing_page(&mock_server, 1, page1).await;
    mount_listing_page(&mock_server, 2, EMPTY_PAGE.to_string()).await;

    Mock::given(method("GET"))
        .and(path("/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("3.9", "Fall 2026")))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let data_path = config.output.data_path.clone();

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let summary = coordinator.run().await.expect("scrape failed");

    // The failed unit never takes the batch down
    assert_eq!(summary.records_written, 2);

    let records = read_records(Path::new(&data_path)).expect("read output");
    let good = records
        .iter()
        .find(|r| r.university.as_deref() == Some("Good Detail U"))
        .expect("good record present");
    let broken = records
        .iter()
        .find(|r| r.university.as_deref() == Some("Broken Detail U"))
        .expect("broken record present");

    assert_eq!(good.gpa, Some(3.9));
    // Listing fields survive, detail fields stay null
    assert_eq!(broken.status, Some(Status::Rejected));
    assert!(broken.gpa.is_none());
    assert!(broken.term.is_none());
    assert!(broken.comments.is_none());
}

#[tokio::test]
async fn test_listing_transport_error_keeps_partial_results() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let page1 = listing_page(&[listing_row(1, "Partial U", "CS", "Accepted")]);
    mount_listing_page(&mock_server, 1, page1).await;
    Mock::given(method("GET"))
        .and(path("/survey/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("3.7", "Fall 2026")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let data_path = config.output.data_path.clone();
    let checkpoint_path = config.output.checkpoint_path.clone();

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let summary = coordinator.run().await.expect("scrape failed");

    assert_eq!(summary.end, CrawlEnd::TransportError);
    assert_eq!(summary.records_written, 1);

    let records = read_records(Path::new(&data_path)).expect("read output");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].university.as_deref(), Some("Partial U"));
    assert_eq!(records[0].gpa, Some(3.7));

    // The final flush leaves a checkpoint through the last good page
    let state =
        load_checkpoint(Path::new(&checkpoint_path)).expect("checkpoint readable");
    assert_eq!(state.last_page, 1);
    assert_eq!(state.entries.len(), 1);
}

#[tokio::test]
async fn test_empty_listing_writes_empty_array() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;
    mount_listing_page(&mock_server, 1, EMPTY_PAGE.to_string()).await;

    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let data_path = config.output.data_path.clone();

    let mut coordinator = Coordinator::new(config).expect("coordinator");
    let summary = coordinator.run().await.expect("scrape failed");

    assert_eq!(summary.records_written, 0);
    assert_eq!(summary.end, CrawlEnd::Exhausted);

    let content = std::fs::read_to_string(&data_path).expect("output exists");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(parsed, serde_json::json!([]));
}

#[tokio::test]
async fn test_interrupted_run_skips_detail_fetch() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/result/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("3.9", "Fall 2026")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let client = build_http_client(&config.user_agent).expect("client");

    let mut records = vec![ResultRecord::from_listing(
        Some("CS".to_string()),
        Some("Interrupted U".to_string()),
        Some("January 15, 2026".to_string()),
        Some(format!("{}/result/1", base_url)),
        Some(Status::Accepted),
        None,
        None,
    )];

    // The interrupt fired before the detail phase started
    let (shutdown_tx, shutdown_rx) = watch::channel(true);
    let extractor = FieldExtractor::new();
    let cache = DetailCache::new();
    fetch_details(
        &client,
        &extractor,
        &cache,
        &mut records,
        &config.scrape,
        shutdown_rx,
    )
    .await;
    drop(shutdown_tx);

    // Listing fields survive, no detail request went out
    assert_eq!(records[0].status, Some(Status::Accepted));
    assert!(records[0].gpa.is_none());
    assert!(cache.is_empty());

    let requests = mock_server
        .received_requests()
        .await
        .expect("request recording");
    assert!(requests.is_empty(), "expected no detail fetches");
}

#[tokio::test]
async fn test_resumed_entries_kept_in_interval_snapshots() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let page1 = listing_page(&[listing_row(1, "Fresh U", "CS", "Accepted")]);
    mount_listing_page(&mock_server, 1, page1).await;
    Mock::given(method("GET"))
        .and(path("/survey/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("tempdir");
    let config = create_test_config(&base_url, &dir);
    let client = build_http_client(&config.user_agent).expect("client");
    let checkpoint_path = config.output.checkpoint_path.clone();

    let seed = vec![ResultRecord::from_listing(
        Some("Physics".to_string()),
        Some("Seeded U".to_string()),
        Some("January 2, 2026".to_string()),
        Some(format!("{}/result/99", base_url)),
        Some(Status::Rejected),
        None,
        None,
    )];

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut checkpointer = Checkpointer::new(&checkpoint_path, 1);
    let mut crawler =
        ListingCrawler::new(&client, &config.scrape, &config.endpoints, shutdown_rx)
            .expect("crawler");
    let outcome = crawler
        .crawl(&mut checkpointer, seed)
        .await
        .expect("crawl failed");

    assert_eq!(outcome.end, CrawlEnd::TransportError);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0].university.as_deref(), Some("Seeded U"));

    // The page-1 interval snapshot already carries the seeded entry, so a
    // crash before any final flush cannot lose it
    let state = load_checkpoint(Path::new(&checkpoint_path)).expect("checkpoint readable");
    assert_eq!(state.last_page, 1);
    assert_eq!(state.entries.len(), 2);
    assert_eq!(state.entries[0].university.as_deref(), Some("Seeded U"));
    assert_eq!(state.entries[1].university.as_deref(), Some("Fresh U"));
}
