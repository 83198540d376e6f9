//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive full runs
//! through the real HTTP renderer, the 429 guard and the control surface.

use rst_crawler::config::{
    Config, CrawlerConfig, DiscoveryPolicy, OutputConfig, RateLimitConfig, UserAgentConfig,
};
use rst_crawler::storage::{JsonLedgerStore, LedgerStore, RecordFile, StatusLog};
use rst_crawler::{run_crawl, CrawlService, StartRequest, StartResponse};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with zero backoff waits
fn create_test_config(base_url: &str, target_count: usize, resume: bool, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            base_url: base_url.to_string(),
            extra_seeds: vec![],
            target_count,
            resume,
            discovery_policy: DiscoveryPolicy::Full,
            allowed_domains: vec!["127.0.0.1".to_string()],
            page_timeout_secs: 5,
            ready_timeout_secs: 1,
            run_timeout_secs: 60,
            max_listing_pages: 0,
        },
        rate_limit: RateLimitConfig {
            min_wait_ms: 0,
            max_wait_ms: 0,
            max_retries: 3,
            crawl_retry_wait_ms: 0,
            crawl_retries: 1,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: dir.to_path_buf(),
            ledger_file: "crawl_progress.json".to_string(),
            log_file: "crawl_status.log".to_string(),
            records_file: "restaurants.json".to_string(),
        },
        selectors: Default::default(),
    }
}

fn listing_page(details: &[&str], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><div class=\"list-rst\">");
    for href in details {
        html.push_str(&format!(
            r#"<a class="list-rst__rst-name-target" href="{}">Restaurant</a>"#,
            href
        ));
    }
    if let Some(next) = next {
        html.push_str(&format!(
            r#"<a class="c-pagination__arrow c-pagination__arrow--next" href="{}">Next</a>"#,
            next
        ));
    }
    html.push_str("</div></body></html>");
    html
}

fn detail_page(name: &str) -> String {
    format!(
        r#"<html><body>
        <h3 class="pr-comment-title js-pr-title">{name}</h3>
        <table class="rstinfo-table__table"><tr><th>Name</th><td>{name}</td></tr></table>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Mounts a one-page listing with detail pages at the given paths
async fn mount_site(server: &MockServer, details: &[&str]) {
    mount_page(server, "/list/", listing_page(details, None)).await;
    for detail in details {
        mount_page(server, detail, detail_page(detail)).await;
    }
}

async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}

fn ledger_of(dir: &Path) -> rst_crawler::CrawlLedger {
    JsonLedgerStore::new(dir.join("crawl_progress.json")).load()
}

fn log_of(dir: &Path) -> Vec<String> {
    StatusLog::new(dir.join("crawl_status.log")).tail(100)
}

#[tokio::test]
async fn test_discovery_merges_paginated_duplicates() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/list/", listing_page(&["/r/x/", "/r/y/"], Some("/list/2/"))).await;
    mount_page(&server, "/list/2/", listing_page(&["/r/y/", "/r/z/"], None)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/list/", base), 0, false, dir.path());

    let summary = run_crawl(config).await.expect("crawl failed");

    assert_eq!(summary.discovery.pages_visited, 2);
    assert_eq!(summary.discovery.newly_added, 3);
    assert_eq!(summary.fetch.attempted, 0);

    let ledger = ledger_of(dir.path());
    let expected: Vec<String> = ["/r/x/", "/r/y/", "/r/z/"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    assert_eq!(ledger.pending(), expected.as_slice());
    assert!(ledger.scraped().is_empty());
    assert!(log_of(dir.path()).is_empty());
}

#[tokio::test]
async fn test_target_count_stops_fetching() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server, &["/r/a/", "/r/b/", "/r/c/"]).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/list/", base), 2, false, dir.path());

    let summary = run_crawl(config).await.expect("crawl failed");

    assert_eq!(summary.fetch.scraped, 2);
    let ledger = ledger_of(dir.path());
    assert_eq!(
        ledger.scraped(),
        &[format!("{}/r/a/", base), format!("{}/r/b/", base)]
    );
    assert_eq!(ledger.pending(), &[format!("{}/r/c/", base)]);
    assert_eq!(request_count(&server, "/r/c/").await, 0);

    let lines = log_of(dir.path());
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("SUCCESS: {}/r/a/ | Time: ", base)));
    assert!(lines[1].starts_with(&format!("SUCCESS: {}/r/b/ | Time: ", base)));

    let records = RecordFile::new(dir.path().join("restaurants.json")).load_all();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].restaurant_information.get("Name").map(String::as_str),
        Some("/r/a/")
    );
}

#[tokio::test]
async fn test_rate_limited_detail_is_retried_transparently() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/list/", listing_page(&["/r/q/"], None)).await;
    Mock::given(method("GET"))
        .and(path("/r/q/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/r/q/", detail_page("Q")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/list/", base), 1, false, dir.path());

    let summary = run_crawl(config).await.expect("crawl failed");

    assert_eq!(summary.fetch.scraped, 1);
    assert_eq!(summary.fetch.crawl_retries, 0);
    assert_eq!(request_count(&server, "/r/q/").await, 2);

    let ledger = ledger_of(dir.path());
    assert_eq!(ledger.scraped(), &[format!("{}/r/q/", base)]);
    assert!(ledger.failed().is_empty());
    let lines = log_of(dir.path());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("SUCCESS:"));
}

#[tokio::test]
async fn test_exhausted_rate_limit_fails_the_url() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/list/", listing_page(&["/r/q/", "/r/ok/"], None)).await;
    Mock::given(method("GET"))
        .and(path("/r/q/"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_page(&server, "/r/ok/", detail_page("OK")).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&format!("{}/list/", base), 5, false, dir.path());
    config.rate_limit.max_retries = 1;

    let summary = run_crawl(config).await.expect("crawl failed");

    assert_eq!(summary.fetch.failed, 1);
    assert_eq!(summary.fetch.scraped, 1);
    assert_eq!(summary.fetch.crawl_retries, 1);
    // two guarded requests per attempt, plus one crawl-level retry
    assert_eq!(request_count(&server, "/r/q/").await, 4);

    let ledger = ledger_of(dir.path());
    assert_eq!(ledger.failed(), &[format!("{}/r/q/", base)]);
    assert_eq!(ledger.scraped(), &[format!("{}/r/ok/", base)]);

    let lines = log_of(dir.path());
    assert!(lines[0].starts_with(&format!("FAILED: {}/r/q/ | Time: ", base)));
    assert!(lines[0].contains("| Error: "));
}

#[tokio::test]
async fn test_ratings_sub_page_is_rendered() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/list/", listing_page(&["/r/a/"], None)).await;
    mount_page(
        &server,
        "/r/a/",
        r#"<html><body>
        <h3 class="pr-comment-title js-pr-title">A</h3>
        <a id="rating" href="/r/a/dtlratings/">Ratings</a>
        <a id="menu" href="/r/a/dtlmenu/">Menu</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/r/a/dtlratings/",
        r#"<html><body><div class="ratings-contents">
        <dl class="ratings-contents__table">
          <dt class="ratings-contents__table-txt">Dinner</dt>
          <dd class="ratings-contents__table-score">3.58</dd>
        </dl>
        </div></body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/r/a/dtlmenu/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&format!("{}/list/", base), 1, false, dir.path());

    let summary = run_crawl(config).await.expect("crawl failed");
    assert_eq!(summary.fetch.scraped, 1);

    let records = RecordFile::new(dir.path().join("restaurants.json")).load_all();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].review_rating.average_ratings.get("Dinner"),
        Some(&3.58)
    );
    assert!(records[0].menu.is_empty());
    assert!(records[0].photos.is_empty());
}

#[tokio::test]
async fn test_resume_continues_where_previous_run_stopped() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server, &["/r/a/", "/r/b/", "/r/c/"]).await;

    let dir = TempDir::new().unwrap();
    let list = format!("{}/list/", base);

    run_crawl(create_test_config(&list, 1, false, dir.path()))
        .await
        .expect("first run failed");
    let summary = run_crawl(create_test_config(&list, 5, true, dir.path()))
        .await
        .expect("resumed run failed");

    assert_eq!(summary.discovery.newly_added, 0);
    assert_eq!(summary.fetch.attempted, 2);
    assert_eq!(request_count(&server, "/r/a/").await, 1);

    let ledger = ledger_of(dir.path());
    assert_eq!(ledger.scraped().len(), 3);
    assert!(ledger.pending().is_empty());
    assert_eq!(log_of(dir.path()).len(), 3);
}

#[tokio::test]
async fn test_fresh_run_discards_previous_progress() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_site(&server, &["/r/a/", "/r/b/"]).await;

    let dir = TempDir::new().unwrap();
    let list = format!("{}/list/", base);

    run_crawl(create_test_config(&list, 2, false, dir.path()))
        .await
        .expect("first run failed");
    assert_eq!(ledger_of(dir.path()).scraped().len(), 2);

    run_crawl(create_test_config(&list, 0, false, dir.path()))
        .await
        .expect("fresh run failed");

    let ledger = ledger_of(dir.path());
    assert!(ledger.scraped().is_empty());
    assert_eq!(ledger.pending().len(), 2);
    assert!(log_of(dir.path()).is_empty());
    assert!(!dir.path().join("restaurants.json").exists());
}

#[tokio::test]
async fn test_service_rejects_second_start_and_serves_output() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/list/"))
        .respond_with(
            html(listing_page(&["/r/a/"], None)).set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/r/a/", detail_page("A")).await;

    let dir = TempDir::new().unwrap();
    let list = format!("{}/list/", base);
    let service = CrawlService::http(create_test_config(&list, 1, false, dir.path()));

    let request = StartRequest {
        base_url: list.clone(),
        target_count: 1,
        resume: false,
        run_in_background: true,
        retry_failed: false,
    };
    assert!(service.start(request.clone()).await.unwrap().is_accepted());

    let second = service
        .start(StartRequest {
            target_count: 50,
            resume: true,
            ..request
        })
        .await
        .unwrap();
    assert!(matches!(
        second,
        StartResponse::Rejected { ref reason } if reason == "already running"
    ));
    let running = service.status();
    assert!(running.task.is_running);
    assert_eq!(running.target_count, 1);

    let summary = service
        .wait()
        .await
        .expect("no background run")
        .expect("background run failed");
    assert_eq!(summary.fetch.scraped, 1);

    let status = service.status();
    assert!(!status.task.is_running);
    assert_eq!(status.counts.scraped, 1);
    assert_eq!(status.progress_percentage, 100.0);
    assert_eq!(status.eta_secs, None);
    assert_eq!(status.recent_log_lines.len(), 1);
    assert_eq!(status.output_file.map(|f| f.record_count), Some(1));

    let bytes = service
        .download("restaurants.json")
        .await
        .expect("record file missing");
    let records: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(records.len(), 1);
    assert!(service.download("../restaurants.json").await.is_none());
}
