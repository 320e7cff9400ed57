use crate::support::{crawler, tree, urls, SiteGraph};
use async_trait::async_trait;
use deepcrawl::config::ContentTypePolicy;
use deepcrawl::filter::{
    ContentTypeFilter, FilterChain, FilterError, LinkContext, UrlFilter, UrlPatternFilter,
};
use deepcrawl::output::RejectReason;
use deepcrawl::scorer::KeywordRelevanceScorer;
use deepcrawl::{CancelHandle, CrawlError, CrawlPhase, CrawlSettings, Scorer, StrategyKind};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

fn settings(strategy: StrategyKind, max_depth: u32) -> CrawlSettings {
    CrawlSettings::new(strategy, max_depth)
        .with_fetch_concurrency(1)
        .with_per_page_timeout(Duration::from_secs(5))
        .with_cancel_grace(Duration::from_millis(50))
}

/// Link filter that counts how often it runs and admits everything
struct CountingFilter(Arc<AtomicUsize>);

#[async_trait]
impl UrlFilter for CountingFilter {
    fn name(&self) -> &str {
        "counting"
    }

    async fn evaluate(&self, _url: &Url, _ctx: &LinkContext) -> Result<bool, FilterError> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Scorer that cannot score URLs mentioning "broken"
struct FlakyScorer;

impl Scorer for FlakyScorer {
    fn name(&self) -> &str {
        "flaky"
    }

    fn score(&self, url: &Url, _ctx: &LinkContext) -> f64 {
        if url.path().contains("broken") {
            f64::NAN
        } else {
            0.5
        }
    }
}

#[tokio::test]
async fn test_max_depth_bounds_the_result_set() {
    let graph = SiteGraph::new()
        .page("https://example.com", &["/a"])
        .page("https://example.com/a", &["/a/b"])
        .page("https://example.com/a/b", &[])
        .into_shared();

    for strategy in StrategyKind::all() {
        let results = crawler(settings(strategy, 1), &graph)
            .crawl("https://example.com")
            .await
            .unwrap();

        let got: HashSet<_> = urls(&results).into_iter().collect();
        let expected: HashSet<_> = ["https://example.com/", "https://example.com/a"]
            .into_iter()
            .collect();
        assert_eq!(got, expected, "strategy {}", strategy);
    }
    assert!(!graph
        .fetched()
        .contains(&"https://example.com/a/b".to_string()));
}

#[tokio::test]
async fn test_max_pages_one_returns_only_the_seed() {
    let graph = tree(3).into_shared();

    for strategy in StrategyKind::all() {
        let crawl_settings = settings(strategy, 3)
            .with_max_pages(1)
            .with_fetch_concurrency(4);
        let (results, summary) = crawler(crawl_settings, &graph)
            .crawl_with_summary("https://example.com/")
            .await
            .unwrap();

        assert_eq!(urls(&results), vec!["https://example.com/"]);
        assert_eq!(results[0].depth(), 0);
        assert_eq!(summary.final_phase, CrawlPhase::Completed);
    }
}

#[tokio::test]
async fn test_emitted_never_exceeds_max_pages() {
    let graph = tree(4).into_shared();

    for strategy in StrategyKind::all() {
        for max_pages in [2, 5, 9] {
            let crawl_settings = settings(strategy, 4)
                .with_max_pages(max_pages)
                .with_fetch_concurrency(4);
            let (results, summary) = crawler(crawl_settings, &graph)
                .crawl_with_summary("https://example.com/")
                .await
                .unwrap();

            assert_eq!(results.len(), max_pages, "strategy {}", strategy);
            assert_eq!(summary.emitted, max_pages);
        }
    }
}

#[tokio::test]
async fn test_no_url_is_emitted_twice() {
    // Every page links back to the root and to each other
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/a", "/b", "/", "/a?fbclid=x"])
        .page("https://example.com/a", &["/", "/b", "/a#top", "/c"])
        .page("https://example.com/b", &["/a", "/c", "/b/"])
        .page("https://example.com/c", &["/", "/a", "/b"])
        .into_shared();

    for strategy in StrategyKind::all() {
        let crawl_settings = settings(strategy, 5).with_fetch_concurrency(3);
        let (results, summary) = crawler(crawl_settings, &graph)
            .crawl_with_summary("https://example.com/")
            .await
            .unwrap();

        let unique: HashSet<_> = urls(&results).into_iter().collect();
        assert_eq!(unique.len(), results.len(), "strategy {}", strategy);
        assert_eq!(results.len(), 4);
        assert_eq!(summary.discovered, 4);
        assert!(summary.rejections[&RejectReason::Duplicate] > 0);
    }
}

#[tokio::test]
async fn test_bfs_finishes_each_level_before_the_next() {
    // /a is slow, so without level barriers /b/1 would overtake it
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/a", "/b"])
        .slow_page("https://example.com/a", Duration::from_millis(80), &["/a/1"])
        .page("https://example.com/b", &["/b/1"])
        .page("https://example.com/a/1", &[])
        .page("https://example.com/b/1", &[])
        .into_shared();

    let crawl_settings = settings(StrategyKind::Bfs, 3).with_fetch_concurrency(4);
    let stream = crawler(crawl_settings, &graph)
        .crawl_stream("https://example.com/")
        .unwrap();

    // Completion order, not dispatch order
    let results: Vec<_> = stream.collect().await;
    let depths: Vec<_> = results.iter().map(|r| r.depth()).collect();
    assert_eq!(depths, vec![0, 1, 1, 2, 2]);

    let fetched = graph.fetched();
    let a_pos = fetched.iter().position(|u| u.ends_with("/a")).unwrap();
    let b1_pos = fetched.iter().position(|u| u.ends_with("/b/1")).unwrap();
    assert!(a_pos < b1_pos);
}

#[tokio::test]
async fn test_dfs_follows_siblings_in_document_order() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/a", "/b"])
        .page("https://example.com/a", &["/a/1", "/a/2"])
        .page("https://example.com/a/1", &[])
        .page("https://example.com/a/2", &[])
        .page("https://example.com/b", &["/b/1"])
        .page("https://example.com/b/1", &[])
        .into_shared();

    let results = crawler(settings(StrategyKind::Dfs, 3), &graph)
        .crawl("https://example.com/")
        .await
        .unwrap();

    assert_eq!(
        urls(&results),
        vec![
            "https://example.com/",
            "https://example.com/a",
            "https://example.com/a/1",
            "https://example.com/a/2",
            "https://example.com/b",
            "https://example.com/b/1",
        ]
    );
}

#[tokio::test]
async fn test_best_first_visits_highest_scores_first() {
    let graph = SiteGraph::new()
        .page(
            "https://example.com/",
            &["/misc", "/rust", "/rust-async", "/about"],
        )
        .page("https://example.com/misc", &[])
        .page("https://example.com/rust", &[])
        .page("https://example.com/rust-async", &[])
        .page("https://example.com/about", &[])
        .into_shared();

    let results = crawler(settings(StrategyKind::BestFirst, 1), &graph)
        .with_scorer(KeywordRelevanceScorer::new(&["rust", "async"], 1.0))
        .crawl("https://example.com/")
        .await
        .unwrap();

    assert_eq!(
        urls(&results),
        vec![
            "https://example.com/",
            "https://example.com/rust-async",
            "https://example.com/rust",
            // Equal scores keep discovery order
            "https://example.com/misc",
            "https://example.com/about",
        ]
    );

    let scores: Vec<_> = results.iter().skip(1).map(|r| r.score()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_best_first_prefers_late_high_scores_under_concurrency() {
    // /rust-async finishes first and its child outranks every queued /misc page
    let graph = SiteGraph::new()
        .page(
            "https://example.com/",
            &["/rust-async", "/misc-1", "/misc-2", "/misc-3", "/misc-4"],
        )
        .slow_page(
            "https://example.com/rust-async",
            Duration::from_millis(50),
            &["/rust-async/next"],
        )
        .slow_page("https://example.com/misc-1", Duration::from_millis(120), &[])
        .slow_page("https://example.com/misc-2", Duration::from_millis(120), &[])
        .slow_page("https://example.com/misc-3", Duration::from_millis(120), &[])
        .slow_page("https://example.com/misc-4", Duration::from_millis(120), &[])
        .page("https://example.com/rust-async/next", &[])
        .into_shared();

    let crawl_settings = settings(StrategyKind::BestFirst, 2).with_fetch_concurrency(2);
    let results = crawler(crawl_settings, &graph)
        .with_scorer(KeywordRelevanceScorer::new(&["rust", "async"], 1.0))
        .crawl("https://example.com/")
        .await
        .unwrap();

    assert_eq!(
        urls(&results),
        vec![
            "https://example.com/",
            "https://example.com/rust-async",
            "https://example.com/misc-1",
            "https://example.com/rust-async/next",
            "https://example.com/misc-2",
            "https://example.com/misc-3",
            "https://example.com/misc-4",
        ]
    );

    let fetched = graph.fetched();
    let next_pos = fetched.iter().position(|u| u.ends_with("/next")).unwrap();
    let misc2_pos = fetched.iter().position(|u| u.ends_with("/misc-2")).unwrap();
    assert!(next_pos < misc2_pos);
}

#[tokio::test]
async fn test_score_threshold_prunes_low_scores() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/rust", "/misc"])
        .page("https://example.com/rust", &[])
        .page("https://example.com/misc", &[])
        .into_shared();

    for strategy in StrategyKind::all() {
        let (results, summary) = crawler(
            settings(strategy, 2).with_score_threshold(0.5),
            &graph,
        )
        .with_scorer(KeywordRelevanceScorer::new(&["rust"], 1.0))
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();

        assert_eq!(
            urls(&results),
            vec!["https://example.com/", "https://example.com/rust"]
        );
        assert_eq!(summary.rejections[&RejectReason::BelowThreshold], 1);
    }
}

#[tokio::test]
async fn test_external_links_are_never_admitted() {
    let graph = SiteGraph::new()
        .page(
            "https://example.com/",
            &["https://other.com/x", "https://sub.example.com/y", "/local"],
        )
        .page("https://example.com/local", &[])
        .page("https://other.com/x", &[])
        .page("https://sub.example.com/y", &[])
        .into_shared();

    let chains = [
        None,
        Some(FilterChain::new().with_filter(UrlPatternFilter::new(&["*"], false).unwrap())),
    ];
    for chain in chains {
        let mut crawler = crawler(settings(StrategyKind::Bfs, 2), &graph);
        if let Some(chain) = chain {
            crawler = crawler.with_filter_chain(chain);
        }
        let (results, summary) = crawler
            .crawl_with_summary("https://example.com/")
            .await
            .unwrap();

        assert_eq!(
            urls(&results),
            vec!["https://example.com/", "https://example.com/local"]
        );
        assert_eq!(summary.rejections[&RejectReason::ExternalHost], 2);
    }
    assert!(graph.fetched().iter().all(|u| u.starts_with("https://example.com/")));

    let results = crawler(
        settings(StrategyKind::Bfs, 2).with_include_external(true),
        &graph,
    )
    .crawl("https://example.com/")
    .await
    .unwrap();
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn test_rejecting_filter_short_circuits_later_filters() {
    let graph = SiteGraph::new()
        .page(
            "https://example.com/",
            &["/private/a", "/public/b", "/private/c"],
        )
        .page("https://example.com/public/b", &[])
        .into_shared();

    let counter = Arc::new(AtomicUsize::new(0));
    let chain = FilterChain::new()
        .with_filter(UrlPatternFilter::new(&["/private/*"], true).unwrap())
        .with_filter(CountingFilter(Arc::clone(&counter)));

    let crawler = crawler(settings(StrategyKind::Bfs, 1), &graph).with_filter_chain(chain);
    let results = crawler.crawl("https://example.com/").await.unwrap();

    assert_eq!(
        urls(&results),
        vec!["https://example.com/", "https://example.com/public/b"]
    );
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    let stats = crawler.filter_chain().stats();
    assert_eq!(stats[0].evaluated, 3);
    assert_eq!(stats[0].rejected, 2);
    assert_eq!(stats[1].evaluated, 1);

    let totals = crawler.filter_chain().totals();
    assert_eq!((totals.evaluated, totals.admitted, totals.rejected), (3, 1, 2));
}

#[tokio::test]
async fn test_fetch_failures_are_results_and_count_toward_budget() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/gone", "/broken", "/ok"])
        .status("https://example.com/broken", 500)
        .page("https://example.com/ok", &[])
        .into_shared();

    let (results, summary) = crawler(settings(StrategyKind::Bfs, 1), &graph)
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    let gone = results.iter().find(|r| r.url.ends_with("/gone")).unwrap();
    assert!(!gone.success);
    assert!(gone.content.is_none());
    assert_eq!(gone.error_message.as_deref(), Some("HTTP status 404"));
    assert_eq!(
        gone.metadata.parent_url.as_deref(),
        Some("https://example.com/")
    );
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 2);

    // Failed pages use up budget like any other
    let results = crawler(settings(StrategyKind::Bfs, 1).with_max_pages(3), &graph)
        .crawl("https://example.com/")
        .await
        .unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results.iter().filter(|r| !r.success).count(), 2);
}

#[tokio::test]
async fn test_slow_page_times_out_without_failing_the_crawl() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/slow", "/fast"])
        .slow_page("https://example.com/slow", Duration::from_secs(5), &[])
        .page("https://example.com/fast", &[])
        .into_shared();

    let crawl_settings = settings(StrategyKind::Bfs, 1)
        .with_fetch_concurrency(2)
        .with_per_page_timeout(Duration::from_millis(50));
    let results = crawler(crawl_settings, &graph)
        .crawl("https://example.com/")
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    let slow = results.iter().find(|r| r.url.ends_with("/slow")).unwrap();
    assert!(!slow.success);
    assert!(slow.error_message.as_deref().unwrap().contains("Timed out"));
    assert!(results.iter().find(|r| r.url.ends_with("/fast")).unwrap().success);
}

#[tokio::test]
async fn test_panicking_fetch_becomes_a_failed_result() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/boom", "/fine"])
        .panicking("https://example.com/boom")
        .page("https://example.com/fine", &[])
        .into_shared();

    let results = crawler(settings(StrategyKind::Dfs, 1), &graph)
        .crawl("https://example.com/")
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    let boom = results.iter().find(|r| r.url.ends_with("/boom")).unwrap();
    assert!(!boom.success);
    assert!(boom.error_message.as_deref().unwrap().contains("panicked"));
}

#[tokio::test]
async fn test_scorer_failure_rejects_the_link() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/broken", "/good"])
        .page("https://example.com/broken", &[])
        .page("https://example.com/good", &[])
        .into_shared();

    let (results, summary) = crawler(settings(StrategyKind::BestFirst, 1), &graph)
        .with_scorer(FlakyScorer)
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();

    assert_eq!(
        urls(&results),
        vec!["https://example.com/", "https://example.com/good"]
    );
    assert_eq!(summary.rejections[&RejectReason::ScorerError], 1);
}

#[tokio::test]
async fn test_content_type_policy() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/report.pdf", "/next"])
        .typed_page("https://example.com/report.pdf", "application/pdf", &["/hidden"])
        .page("https://example.com/next", &[])
        .page("https://example.com/hidden", &[])
        .into_shared();

    let chain = || FilterChain::new().with_filter(ContentTypeFilter::html_only());

    // emit: the PDF is a result, but its links are not followed
    let (results, summary) = crawler(settings(StrategyKind::Bfs, 3), &graph)
        .with_filter_chain(chain())
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();
    assert_eq!(
        urls(&results),
        vec![
            "https://example.com/",
            "https://example.com/report.pdf",
            "https://example.com/next"
        ]
    );
    assert!(results[1].success);
    assert_eq!(
        summary.rejections[&RejectReason::PageFilter("content-type".to_string())],
        1
    );

    // exclude: the PDF disappears and does not use up budget
    let crawl_settings = settings(StrategyKind::Bfs, 3)
        .with_content_type_policy(ContentTypePolicy::Exclude)
        .with_max_pages(2);
    let (results, summary) = crawler(crawl_settings, &graph)
        .with_filter_chain(chain())
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();
    assert_eq!(
        urls(&results),
        vec!["https://example.com/", "https://example.com/next"]
    );
    assert_eq!(summary.excluded, 1);
}

#[tokio::test]
async fn test_non_html_seed_is_emitted_under_exclude_policy() {
    let graph = SiteGraph::new()
        .typed_page("https://example.com/report.pdf", "application/pdf", &["/hidden"])
        .page("https://example.com/hidden", &[])
        .into_shared();

    for max_pages in [1, 5] {
        let crawl_settings = settings(StrategyKind::Bfs, 2)
            .with_content_type_policy(ContentTypePolicy::Exclude)
            .with_max_pages(max_pages);
        let (results, summary) = crawler(crawl_settings, &graph)
            .with_filter_chain(FilterChain::new().with_filter(ContentTypeFilter::html_only()))
            .crawl_with_summary("https://example.com/report.pdf")
            .await
            .unwrap();

        assert_eq!(urls(&results), vec!["https://example.com/report.pdf"]);
        assert!(results[0].success);
        assert_eq!(summary.excluded, 0);
        assert_eq!(summary.final_phase, CrawlPhase::Completed);
    }
    assert!(!graph
        .fetched()
        .contains(&"https://example.com/hidden".to_string()));
}

#[tokio::test]
async fn test_seed_bypasses_the_filter_chain() {
    let graph = SiteGraph::new()
        .page("https://example.com/start", &["/docs/a"])
        .page("https://example.com/docs/a", &[])
        .into_shared();

    let chain = FilterChain::new().with_filter(UrlPatternFilter::new(&["/docs/*"], false).unwrap());
    let results = crawler(settings(StrategyKind::Bfs, 1), &graph)
        .with_filter_chain(chain)
        .crawl("https://example.com/start")
        .await
        .unwrap();

    assert_eq!(
        urls(&results),
        vec!["https://example.com/start", "https://example.com/docs/a"]
    );
}

#[tokio::test]
async fn test_pre_cancelled_crawl_emits_nothing() {
    let graph = tree(2).into_shared();
    let cancel = CancelHandle::new();
    cancel.cancel();

    let (results, summary) = crawler(settings(StrategyKind::Bfs, 2), &graph)
        .crawl_with_cancel("https://example.com/", cancel)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert_eq!(summary.final_phase, CrawlPhase::Cancelled);
    assert!(graph.fetched().is_empty());
}

#[tokio::test]
async fn test_crawl_timeout_cancels() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/slow"])
        .slow_page("https://example.com/slow", Duration::from_secs(5), &[])
        .into_shared();

    let crawl_settings =
        settings(StrategyKind::Bfs, 1).with_crawl_timeout(Duration::from_millis(100));
    let (results, summary) = crawler(crawl_settings, &graph)
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();

    assert_eq!(urls(&results), vec!["https://example.com/"]);
    assert_eq!(summary.final_phase, CrawlPhase::Cancelled);
    assert_eq!(summary.abandoned, 1);
}

#[tokio::test]
async fn test_pages_finishing_within_cancel_grace_are_emitted() {
    let graph = SiteGraph::new()
        .page("https://example.com/", &["/quick"])
        .slow_page("https://example.com/quick", Duration::from_millis(80), &["/quick/child"])
        .page("https://example.com/quick/child", &[])
        .into_shared();

    let crawl_settings = settings(StrategyKind::Bfs, 2)
        .with_crawl_timeout(Duration::from_millis(30))
        .with_cancel_grace(Duration::from_millis(1000));
    let (results, summary) = crawler(crawl_settings, &graph)
        .crawl_with_summary("https://example.com/")
        .await
        .unwrap();

    assert_eq!(
        urls(&results),
        vec!["https://example.com/", "https://example.com/quick"]
    );
    assert!(results[1].success);
    assert_eq!(summary.final_phase, CrawlPhase::Cancelled);
    assert_eq!(summary.abandoned, 0);
    // Links found after cancellation are not followed
    assert!(!graph
        .fetched()
        .contains(&"https://example.com/quick/child".to_string()));
}

#[tokio::test]
async fn test_invalid_input_is_rejected_up_front() {
    let graph = tree(1).into_shared();

    let err = crawler(settings(StrategyKind::Bfs, 1), &graph)
        .crawl("ftp://example.com/")
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::UrlError(_)));

    let err = crawler(settings(StrategyKind::Bfs, 1).with_fetch_concurrency(0), &graph)
        .crawl("https://example.com/")
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::Config(_)));
}
