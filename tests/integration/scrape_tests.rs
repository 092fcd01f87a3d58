//! Integration tests for the scraper
//!
//! These tests use wiremock to stand in for the job search site and run the
//! full count -> fetch -> extract -> write pipeline end-to-end.

use job_harvest::config::{Config, MissingPagination};
use job_harvest::crawler::Harvester;
use job_harvest::posting::{Posting, HEADER};
use job_harvest::{scrape, HarvestError};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.search_url = format!("{}/jobs", base_url);
    config.site.view_url = format!("{}/viewjob", base_url);
    config.scraper.max_concurrent_pages = 2;
    config.scraper.max_concurrent_tasks = 4;
    config.scraper.request_timeout_secs = 5;
    config
}

/// Renders a result card; `None` fields are left out of the markup
fn card(key: Option<&str>, title: &str, salary: Option<&str>) -> String {
    let href = match key {
        Some(key) => format!("/rc/clk?jk={}&fccid=abc", key),
        None => "/pagead/clk?ad=1".to_string(),
    };
    let salary = salary
        .map(|s| format!(r#"<div class="salary-snippet">{}</div>"#, s))
        .unwrap_or_default();

    format!(
        r#"<a class="tapItem" href="{}">
             <h2 class="jobTitle"><span>{}</span></h2>
             <span class="companyLocation">Seoul</span>
             {}
             <div class="job-snippet"><li>Work   on  things</li></div>
           </a>"#,
        href, title, salary
    )
}

/// Renders a results page with the given cards and page-link count
fn results_page(cards: &[String], page_links: usize) -> String {
    let pagination = if page_links > 0 {
        let links: String = (0..page_links)
            .map(|i| format!(r#"<a href="?start={}">{}</a>"#, i * 50, i + 1))
            .collect();
        format!(r#"<nav><div class="pagination">{}</div></nav>"#, links)
    } else {
        String::new()
    };

    format!(
        "<html><body><div id=\"results\">{}</div>{}</body></html>",
        cards.join("\n"),
        pagination
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts a results page at `start`
async fn mount_page(server: &MockServer, start: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", start.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Mounts the page-count response; must be mounted after the page mocks
async fn mount_first_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("q", "python"))
        .and(query_param("limit", "50"))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Posting>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open output");
    let headers = reader
        .headers()
        .expect("Missing header row")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<Posting>, _>>()
        .expect("Failed to parse rows");
    (headers, rows)
}

#[tokio::test]
async fn test_two_page_scrape_writes_every_posting() {
    let server = MockServer::start().await;

    let page0 = results_page(
        &[
            card(Some("a1"), "Python Developer", Some("연봉 4,000만원")),
            card(Some("a2"), "Backend   Engineer", None),
            card(None, "Data Analyst", Some("월 300만원")),
        ],
        2,
    );
    let page1 = results_page(
        &[
            card(Some("b1"), "ML Engineer", Some("협의")),
            card(Some("b2"), "Django Developer", Some("연봉 5,000만원")),
        ],
        2,
    );

    mount_page(&server, 0, page0.clone()).await;
    mount_page(&server, 50, page1).await;
    mount_first_page(&server, page0).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("jobs.csv");
    let harvester = Harvester::new(create_test_config(&server.uri())).unwrap();

    let report = harvester
        .run_to("python", &output, CancellationToken::new())
        .await
        .expect("Scrape failed");

    assert_eq!(report.pages, 2);
    assert_eq!(report.postings, 5);

    let (headers, rows) = read_csv(&output);
    assert_eq!(headers, HEADER);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|p| !p.link().is_empty()));

    let backend = rows
        .iter()
        .find(|p| p.title() == "Backend Engineer")
        .expect("Backend posting missing");
    assert_eq!(backend.salary(), "");
    assert_eq!(
        backend.link(),
        format!("{}/viewjob?jk=a2", server.uri())
    );
    assert_eq!(backend.summary(), "Work on things");

    let analyst = rows.iter().find(|p| p.title() == "Data Analyst").unwrap();
    assert_eq!(analyst.link(), "Couldn't extract link");

    // Default configuration keeps document order
    let titles: Vec<&str> = rows.iter().map(Posting::title).collect();
    assert_eq!(
        titles,
        [
            "Python Developer",
            "Backend Engineer",
            "Data Analyst",
            "ML Engineer",
            "Django Developer"
        ]
    );
}

#[tokio::test]
async fn test_posting_count_is_sum_of_page_cards() {
    let server = MockServer::start().await;
    let counts = [4usize, 0, 2];

    for (page, count) in counts.iter().enumerate() {
        let cards: Vec<String> = (0..*count)
            .map(|i| {
                let key = format!("p{}c{}", page, i);
                card(Some(key.as_str()), "Engineer", None)
            })
            .collect();
        mount_page(&server, page as u32 * 50, results_page(&cards, 3)).await;
    }
    mount_first_page(&server, results_page(&[], 3)).await;

    let mut config = create_test_config(&server.uri());
    config.scraper.preserve_order = false;
    let harvester = Harvester::new(config).unwrap();

    let (pages, jobs) = harvester
        .collect("python", CancellationToken::new())
        .await
        .expect("Scrape failed");

    assert_eq!(pages, 3);
    assert_eq!(jobs.len(), counts.iter().sum::<usize>());
}

#[tokio::test]
async fn test_missing_pagination_writes_header_only() {
    let server = MockServer::start().await;
    let body = results_page(&[card(Some("x"), "Lonely Job", None)], 0);
    mount_page(&server, 0, body.clone()).await;
    mount_first_page(&server, body).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("jobs.csv");
    let harvester = Harvester::new(create_test_config(&server.uri())).unwrap();

    let report = harvester
        .run_to("python", &output, CancellationToken::new())
        .await
        .expect("Scrape failed");

    assert_eq!(report.pages, 0);
    assert_eq!(report.postings, 0);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "Link,Title,Location,Salary,Summary\n");
}

#[tokio::test]
async fn test_missing_pagination_as_single_page() {
    let server = MockServer::start().await;
    let body = results_page(&[card(Some("x"), "Lonely Job", None)], 0);
    mount_page(&server, 0, body.clone()).await;
    mount_first_page(&server, body).await;

    let mut config = create_test_config(&server.uri());
    config.scraper.missing_pagination = MissingPagination::SinglePage;
    let harvester = Harvester::new(config).unwrap();

    let (pages, jobs) = harvester
        .collect("python", CancellationToken::new())
        .await
        .expect("Scrape failed");

    assert_eq!(pages, 1);
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title(), "Lonely Job");
}

#[tokio::test]
async fn test_page_count_status_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(&server.uri())).unwrap();
    let result = harvester.collect("python", CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(HarvestError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_failing_page_aborts_scrape() {
    let server = MockServer::start().await;
    let cards = vec![card(Some("ok"), "Engineer", None)];

    mount_page(&server, 0, results_page(&cards, 3)).await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("start", "50"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, 100, results_page(&cards, 3)).await;
    mount_first_page(&server, results_page(&cards, 3)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("jobs.csv");
    let harvester = Harvester::new(create_test_config(&server.uri())).unwrap();

    let result = harvester
        .run_to("python", &output, CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(HarvestError::Status { status: 503, .. })
    ));
    assert!(!output.exists(), "No file should be written when fetching fails");
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(html(results_page(&[], 1)).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri());
    config.scraper.request_timeout_secs = 1;
    let harvester = Harvester::new(config).unwrap();

    let result = harvester.collect("python", CancellationToken::new()).await;
    assert!(matches!(result, Err(HarvestError::Timeout { .. })));
}

#[tokio::test]
async fn test_cancelled_scrape_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(html(results_page(&[], 1)).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let harvester = Harvester::new(create_test_config(&server.uri())).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = harvester.collect("python", cancel).await;
    assert!(matches!(result, Err(HarvestError::Cancelled)));
}

#[tokio::test]
async fn test_scrape_writes_configured_output() {
    let server = MockServer::start().await;
    let body = results_page(
        &[
            card(Some("k1"), "Rust Developer", Some("협의")),
            card(Some("k2"), "Go Developer", None),
        ],
        1,
    );
    mount_page(&server, 0, body.clone()).await;
    mount_first_page(&server, body).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("jobs.csv");
    let mut config = create_test_config(&server.uri());
    config.output.path = output.to_string_lossy().into_owned();

    let report = scrape(config, "python", CancellationToken::new())
        .await
        .expect("Scrape failed");

    assert_eq!(report.term, "python");
    assert_eq!(report.pages, 1);
    assert_eq!(report.postings, 2);
    assert_eq!(report.output, output);

    let (headers, rows) = read_csv(&output);
    assert_eq!(headers, HEADER);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].link(), format!("{}/viewjob?jk=k2", server.uri()));
}

#[tokio::test]
async fn test_cancel_during_page_fetches() {
    let server = MockServer::start().await;
    let cards = vec![card(Some("slow"), "Engineer", None)];

    for start in [0u32, 50, 100] {
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(query_param("start", start.to_string()))
            .respond_with(html(results_page(&cards, 3)).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;
    }
    mount_first_page(&server, results_page(&cards, 3)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("jobs.csv");
    let harvester = Harvester::new(create_test_config(&server.uri())).unwrap();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let result = harvester.run_to("python", &output, cancel).await;

    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!output.exists());
}
