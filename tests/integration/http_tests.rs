//! End-to-end crawls against a wiremock server through the real HTTP fetcher

use deepcrawl::config::{parse_config, UserAgentConfig};
use deepcrawl::crawler::{build_http_client, HtmlLinkExtractor, HttpFetcher};
use deepcrawl::filter::{ContentTypeFilter, FilterChain};
use deepcrawl::{CrawlSettings, DeepCrawler, StrategyKind};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn http_crawler(settings: CrawlSettings, user_agent: &UserAgentConfig) -> DeepCrawler {
    let fetcher = HttpFetcher::new(user_agent, settings.per_page_timeout())
        .expect("Failed to build HTTP client");
    DeepCrawler::new(settings, fetcher, HtmlLinkExtractor::new())
}

#[tokio::test]
async fn test_http_crawl_follows_links_and_reports_failures() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/",
        html(&format!(
            r#"<a href="/docs">Docs</a>
            <a href="{}/missing">Missing</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a href="https://elsewhere.example.org/">Elsewhere</a>"#,
            base
        )),
    )
    .await;
    mount_get(&server, "/docs", html(r#"<a href="docs/intro">Intro</a>"#)).await;
    mount_get(&server, "/docs/intro", html("no links")).await;
    mount_get(&server, "/missing", ResponseTemplate::new(404)).await;

    let settings = CrawlSettings::new(StrategyKind::Bfs, 2).with_fetch_concurrency(2);
    let (results, summary) = http_crawler(settings, &UserAgentConfig::default())
        .crawl_with_summary(&base)
        .await
        .expect("Crawl failed");

    let urls: Vec<_> = results.iter().map(|r| r.url.clone()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/docs", base),
            format!("{}/missing", base),
            format!("{}/docs/intro", base),
        ]
    );

    let root = &results[0];
    assert!(root.success);
    let content = root.content.as_ref().expect("root has content");
    assert_eq!(content.status_code, 200);
    assert!(content.content_type.as_deref().unwrap().starts_with("text/html"));
    assert!(content.body.contains("Docs"));

    let missing = &results[2];
    assert!(!missing.success);
    assert!(missing.error_message.as_deref().unwrap().contains("404"));

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.max_depth_reached, 2);
}

#[tokio::test]
async fn test_http_crawl_sends_configured_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0 (+https://example.com/bot)"))
        .respond_with(html("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: Some("https://example.com/bot".to_string()),
        contact_email: None,
    };

    let client = build_http_client(&user_agent, Duration::from_secs(5))
        .expect("Failed to build HTTP client");
    let crawler = DeepCrawler::new(
        CrawlSettings::new(StrategyKind::Dfs, 0),
        HttpFetcher::with_client(client),
        HtmlLinkExtractor::new(),
    );

    let results = crawler
        .crawl(&server.uri())
        .await
        .expect("Crawl failed");

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
}

#[tokio::test]
async fn test_http_crawl_does_not_follow_links_from_non_html() {
    let server = MockServer::start().await;

    mount_get(&server, "/", html(r#"<a href="/data.json">Data</a>"#)).await;
    mount_get(
        &server,
        "/data.json",
        ResponseTemplate::new(200).set_body_raw(
            r#"{"link": "<a href=\"/secret\">x</a>"}"#,
            "application/json",
        ),
    )
    .await;
    mount_get(&server, "/secret", html("secret")).await;

    let crawler = http_crawler(
        CrawlSettings::new(StrategyKind::Bfs, 3),
        &UserAgentConfig::default(),
    )
    .with_filter_chain(FilterChain::new().with_filter(ContentTypeFilter::html_only()));

    let results = crawler.crawl(&server.uri()).await.expect("Crawl failed");

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| !r.url.ends_with("/secret")));
}

#[tokio::test]
async fn test_crawl_from_toml_config() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "/",
        html(
            r#"<a href="/guide/rust">Rust guide</a>
            <a href="/admin/panel">Admin</a>
            <a href="/blog/cooking">Cooking</a>"#,
        ),
    )
    .await;
    mount_get(&server, "/guide/rust", html("rust")).await;
    mount_get(&server, "/blog/cooking", html("food")).await;

    let config = parse_config(
        r#"
        [crawl]
        strategy = "best-first"
        max-depth = 1
        fetch-concurrency = 1
        per-page-timeout-ms = 2000

        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "1.0.0"

        [[filters]]
        kind = "url-pattern"
        patterns = ["/admin/*"]
        reverse = true

        [scorer]
        keywords = ["rust"]
        "#,
    )
    .expect("Config should parse");

    let fetcher = HttpFetcher::new(&config.user_agent, config.crawl.per_page_timeout())
        .expect("Failed to build HTTP client");
    let mut crawler = DeepCrawler::new(config.crawl.clone(), fetcher, HtmlLinkExtractor::new())
        .with_filter_chain(config.filter_chain().expect("Filters should build"));
    if let Some(scorer) = config.scorer() {
        crawler = crawler.with_shared_scorer(scorer);
    }

    let (results, summary) = crawler
        .crawl_with_summary(&server.uri())
        .await
        .expect("Crawl failed");

    let paths: Vec<_> = results
        .iter()
        .map(|r| url::Url::parse(&r.url).unwrap().path().to_string())
        .collect();
    assert_eq!(paths, vec!["/", "/guide/rust", "/blog/cooking"]);
    assert!(results[1].score() > results[2].score());
    assert_eq!(summary.filter_stats[0].rejected, 1);
}
