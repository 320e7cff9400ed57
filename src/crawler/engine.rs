use crate::config::{validate_crawl_settings, CrawlSettings};
use crate::crawler::coordinator::{Coordinator, WorkerContext};
use crate::crawler::emitter::{CancelHandle, CrawlStream, ResultSink};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::LinkExtractor;
use crate::crawler::result::CrawlResult;
use crate::filter::FilterChain;
use crate::output::CrawlSummary;
use crate::scorer::Scorer;
use crate::url::normalize_url;
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Results of [`DeepCrawler::run`], in the mode the settings asked for
pub enum CrawlOutput {
    Batch(Vec<CrawlResult>),
    Stream(CrawlStream),
}

/// Deep crawler: explores the link graph reachable from a seed URL
///
/// One `DeepCrawler` can run any number of crawls, one after another or
/// concurrently; every crawl gets its own state. The filter chain and scorer
/// are shared read-only by all of them, so filter counters accumulate across
/// crawls.
///
/// # Example
///
/// ```no_run
/// use deepcrawl::crawler::{HtmlLinkExtractor, HttpFetcher};
/// use deepcrawl::config::UserAgentConfig;
/// use deepcrawl::{CrawlSettings, DeepCrawler, StrategyKind};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = CrawlSettings::new(StrategyKind::Bfs, 2).with_max_pages(20);
/// let fetcher = HttpFetcher::new(&UserAgentConfig::default(), Duration::from_secs(15))?;
/// let crawler = DeepCrawler::new(settings, fetcher, HtmlLinkExtractor::new());
///
/// for result in crawler.crawl("https://example.com/").await? {
///     println!("{} {}", result.url, result.success);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DeepCrawler {
    settings: CrawlSettings,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    filters: Arc<FilterChain>,
    scorer: Option<Arc<dyn Scorer>>,
}

impl DeepCrawler {
    pub fn new(
        settings: CrawlSettings,
        fetcher: impl Fetcher + 'static,
        extractor: impl LinkExtractor + 'static,
    ) -> Self {
        Self::from_shared(settings, Arc::new(fetcher), Arc::new(extractor))
    }

    pub fn from_shared(
        settings: CrawlSettings,
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            extractor,
            filters: Arc::new(FilterChain::new()),
            scorer: None,
        }
    }

    pub fn with_filter_chain(mut self, filters: FilterChain) -> Self {
        self.filters = Arc::new(filters);
        self
    }

    pub fn with_scorer(self, scorer: impl Scorer + 'static) -> Self {
        self.with_shared_scorer(Arc::new(scorer))
    }

    pub fn with_shared_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn filter_chain(&self) -> &FilterChain {
        &self.filters
    }

    /// Crawls from `seed` and returns every result, in dispatch order
    pub async fn crawl(&self, seed: &str) -> Result<Vec<CrawlResult>, CrawlError> {
        let (results, _) = self.crawl_with_summary(seed).await?;
        Ok(results)
    }

    /// Like [`crawl`](Self::crawl), also returning the crawl's summary
    pub async fn crawl_with_summary(
        &self,
        seed: &str,
    ) -> Result<(Vec<CrawlResult>, CrawlSummary), CrawlError> {
        self.crawl_with_cancel(seed, CancelHandle::new()).await
    }

    /// Batch crawl that stops early when `cancel` fires
    pub async fn crawl_with_cancel(
        &self,
        seed: &str,
        cancel: CancelHandle,
    ) -> Result<(Vec<CrawlResult>, CrawlSummary), CrawlError> {
        let coordinator = self.coordinator(seed, cancel)?;
        let mut sink = ResultSink::batch();
        let summary = coordinator.run(&mut sink).await?;
        Ok((sink.into_results(), summary))
    }

    /// Starts a crawl in the background and streams its results
    ///
    /// Must be called from within a Tokio runtime.
    pub fn crawl_stream(&self, seed: &str) -> Result<CrawlStream, CrawlError> {
        let cancel = CancelHandle::new();
        let coordinator = self.coordinator(seed, cancel.clone())?;
        let (tx, rx) = mpsc::channel(self.settings.stream_buffer.max(1));

        let task = tokio::spawn(async move {
            let mut sink = ResultSink::Stream(tx);
            coordinator.run(&mut sink).await
        });

        Ok(CrawlStream::new(rx, cancel, task))
    }

    /// Crawls in batch or stream mode, as `settings.stream` says
    pub async fn run(&self, seed: &str) -> Result<CrawlOutput, CrawlError> {
        if self.settings.stream {
            Ok(CrawlOutput::Stream(self.crawl_stream(seed)?))
        } else {
            Ok(CrawlOutput::Batch(self.crawl(seed).await?))
        }
    }

    fn coordinator(&self, seed: &str, cancel: CancelHandle) -> Result<Coordinator, CrawlError> {
        validate_crawl_settings(&self.settings)?;
        let seed = normalize_url(seed)?;

        if self.settings.score_threshold.is_some() && self.scorer.is_none() {
            tracing::warn!("score-threshold is set but no scorer is configured; ignoring it");
        }

        let ctx = WorkerContext {
            seed,
            max_depth: self.settings.max_depth,
            include_external: self.settings.include_external,
            score_threshold: self.settings.score_threshold,
            per_page_timeout: self.settings.per_page_timeout(),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            filters: Arc::clone(&self.filters),
            scorer: self.scorer.clone(),
        };

        Ok(Coordinator::new(&self.settings, ctx, cancel))
    }
}
