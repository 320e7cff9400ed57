//! Crawl coordinator - main crawl orchestration logic
//!
//! One coordinator task owns the [`CrawlState`] of a crawl. It pops nodes
//! from the frontier and hands them to workers in a `JoinSet`, bounded by the
//! fetch concurrency. Each worker:
//! - Fetches the page under the per-page timeout
//! - Runs page-stage filters
//! - Extracts, normalizes, scopes, filters and scores the page's links
//!
//! and returns the outcome. Admission into the frontier, budget accounting
//! and emission happen back on the coordinator, so the visited set and the
//! counters have a single writer.

use crate::config::{ContentTypePolicy, CrawlSettings};
use crate::crawler::emitter::{CancelHandle, ResultSink};
use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::result::CrawlResult;
use crate::crawler::strategy::StrategyKind;
use crate::filter::{FilterChain, FilterStage, FilterVerdict, LinkContext};
use crate::frontier::CrawlNode;
use crate::output::{CrawlSummary, RejectReason};
use crate::scorer::{checked_score, Scorer};
use crate::state::{CrawlPhase, CrawlState};
use crate::url::{normalize_url, same_host};
use crate::CrawlError;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use url::Url;

/// Read-only inputs shared by every worker of one crawl
pub(crate) struct WorkerContext {
    pub seed: Url,
    pub max_depth: u32,
    pub include_external: bool,
    pub score_threshold: Option<f64>,
    pub per_page_timeout: Duration,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub filters: Arc<FilterChain>,
    pub scorer: Option<Arc<dyn Scorer>>,
}

/// A link that survived scoping, filtering and scoring
struct Candidate {
    url: Url,
    score: f64,
}

enum PageOutcome {
    Fetched {
        page: FetchedPage,
        /// Page-stage filter that rejected the page, if any
        page_rejection: Option<String>,
        candidates: Vec<Candidate>,
    },
    Failed(String),
}

/// What a worker hands back to the coordinator
struct WorkerOutput {
    node: CrawlNode,
    dispatch_index: u64,
    outcome: PageOutcome,
    rejections: Vec<RejectReason>,
}

/// Why the main loop stopped
enum Stop {
    /// Frontier exhausted or budget spent, nothing in flight
    Finished,
    Cancelled(&'static str),
}

/// Main crawl coordinator
pub(crate) struct Coordinator {
    ctx: Arc<WorkerContext>,
    strategy: StrategyKind,
    fetch_concurrency: usize,
    max_pages: Option<usize>,
    content_type_policy: ContentTypePolicy,
    cancel_grace: Duration,
    crawl_timeout: Option<Duration>,
    cancel: CancelHandle,
}

impl Coordinator {
    pub(crate) fn new(
        settings: &CrawlSettings,
        ctx: WorkerContext,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            ctx: Arc::new(ctx),
            strategy: settings.strategy,
            fetch_concurrency: settings.fetch_concurrency.max(1),
            max_pages: settings.max_pages,
            content_type_policy: settings.content_type_policy,
            cancel_grace: settings.cancel_grace(),
            crawl_timeout: settings.crawl_timeout(),
            cancel,
        }
    }

    /// Runs one crawl to completion or cancellation
    ///
    /// Per-page failures become unsuccessful results. An `Err` here means the
    /// crawl itself broke (an invariant was violated or a worker task died)
    /// and all outstanding work has been aborted.
    pub(crate) async fn run(self, sink: &mut ResultSink) -> Result<CrawlSummary, CrawlError> {
        let started = Instant::now();
        let mut summary = CrawlSummary::new(self.ctx.seed.as_str(), self.strategy);
        let mut state = CrawlState::new(self.strategy.frontier());
        let mut workers = JoinSet::new();

        tracing::info!(
            "Starting {} crawl from {} (max depth {}, max pages {})",
            self.strategy,
            self.ctx.seed,
            self.ctx.max_depth,
            self.max_pages
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );

        let outcome = self
            .drive(&mut state, &mut workers, sink, &mut summary)
            .await;

        if let Err(e) = outcome {
            workers.abort_all();
            tracing::error!("Crawl from {} aborted: {}", self.ctx.seed, e);
            return Err(e);
        }

        summary.final_phase = state.phase();
        summary.discovered = state.visited_len();
        summary.abandoned += state.abandon_frontier();
        summary.filter_stats = self.ctx.filters.stats();
        summary.filter_totals = self.ctx.filters.totals();
        summary.elapsed = started.elapsed();

        tracing::info!(
            "Crawl {}: {} pages emitted ({} failed) in {:?}",
            summary.final_phase,
            summary.emitted,
            summary.failed,
            summary.elapsed
        );

        Ok(summary)
    }

    async fn drive(
        &self,
        state: &mut CrawlState,
        workers: &mut JoinSet<WorkerOutput>,
        sink: &mut ResultSink,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError> {
        state.transition(CrawlPhase::Running)?;
        state.admit_seed(self.ctx.seed.clone())?;

        let deadline = self.crawl_timeout.map(|timeout| Instant::now() + timeout);
        let mut wave_depth = None;

        let stop = loop {
            if self.cancel.is_cancelled() {
                break Stop::Cancelled("cancel requested");
            }

            self.dispatch(state, workers, summary, &mut wave_depth)?;

            if workers.is_empty() {
                break Stop::Finished;
            }

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break Stop::Cancelled("cancel requested"),

                _ = deadline_elapsed(deadline) => break Stop::Cancelled("crawl timeout"),

                _ = sink.consumer_gone() => break Stop::Cancelled("stream consumer closed"),

                joined = workers.join_next() => {
                    let Some(joined) = joined else { continue };
                    let output = joined.map_err(|e| CrawlError::WorkerPanicked(e.to_string()))?;

                    if state.in_flight() == 1 {
                        wave_depth = None;
                    }

                    let Some(result) = self.complete(state, summary, output)? else {
                        continue;
                    };

                    let (success, depth) = (result.success, result.depth());
                    let delivered = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => None,
                        delivered = sink.emit(result) => Some(delivered),
                    };

                    match delivered {
                        Some(true) => self.record_emission(state, summary, success, depth)?,
                        Some(false) => break Stop::Cancelled("stream consumer closed"),
                        None => break Stop::Cancelled("cancel requested"),
                    }
                }
            }
        };

        match stop {
            Stop::Finished => {
                state.transition(CrawlPhase::Completed)?;
            }
            Stop::Cancelled(reason) => {
                tracing::info!("Cancelling crawl: {}", reason);
                state.transition(CrawlPhase::Cancelled)?;
                summary.abandoned += state.abandon_frontier();
                self.drain_after_cancel(state, workers, sink, summary)
                    .await?;
            }
        }

        Ok(())
    }

    /// Starts as many workers as concurrency, budget and ordering allow
    fn dispatch(
        &self,
        state: &mut CrawlState,
        workers: &mut JoinSet<WorkerOutput>,
        summary: &mut CrawlSummary,
        wave_depth: &mut Option<u32>,
    ) -> Result<(), CrawlError> {
        while state.phase().accepts_dispatch() && state.in_flight() < self.fetch_concurrency {
            if let Some(max_pages) = self.max_pages {
                // Every in-flight page may still emit, so it holds a budget slot
                if state.emitted() + state.in_flight() >= max_pages {
                    if !self.budget_can_refund() && state.in_flight() > 0 {
                        state.transition(CrawlPhase::Draining)?;
                        let dropped = state.abandon_frontier();
                        summary.abandoned += dropped;
                        tracing::debug!(
                            "Page budget of {} reached, draining {} in-flight, dropping {} queued",
                            max_pages,
                            state.in_flight(),
                            dropped
                        );
                    }
                    break;
                }
            }

            let Some(next) = state.peek_next() else { break };
            if !self.strategy.may_dispatch(next.depth(), *wave_depth) {
                break;
            }

            let Some((node, dispatch_index)) = state.begin_dispatch() else {
                break;
            };
            if node.depth() > self.ctx.max_depth {
                return Err(CrawlError::InvariantViolation(format!(
                    "{} on the frontier at depth {} beyond max depth {}",
                    node.url(),
                    node.depth(),
                    self.ctx.max_depth
                )));
            }

            *wave_depth = Some(node.depth());
            tracing::debug!(
                "Dispatching #{} {} (depth {}, score {:.3})",
                dispatch_index,
                node.url(),
                node.depth(),
                node.score()
            );

            let ctx = Arc::clone(&self.ctx);
            workers.spawn(async move {
                let (outcome, rejections) =
                    match AssertUnwindSafe(process_node(Arc::clone(&ctx), node.clone()))
                        .catch_unwind()
                        .await
                    {
                        Ok(done) => done,
                        Err(panic) => {
                            let message = panic_message(panic.as_ref());
                            tracing::warn!("Worker for {} panicked: {}", node.url(), message);
                            (
                                PageOutcome::Failed(format!("worker panicked: {}", message)),
                                Vec::new(),
                            )
                        }
                    };

                WorkerOutput {
                    node,
                    dispatch_index,
                    outcome,
                    rejections,
                }
            });
        }

        Ok(())
    }

    /// Whether a page in flight might end up not counting toward the budget
    fn budget_can_refund(&self) -> bool {
        self.content_type_policy == ContentTypePolicy::Exclude
            && self.ctx.filters.has_stage(FilterStage::Page)
    }

    /// Applies a worker's output to the crawl state
    ///
    /// Returns the result to emit, or `None` when the page is excluded from
    /// the output.
    fn complete(
        &self,
        state: &mut CrawlState,
        summary: &mut CrawlSummary,
        output: WorkerOutput,
    ) -> Result<Option<CrawlResult>, CrawlError> {
        state.finish_dispatch()?;

        for reason in output.rejections {
            summary.record_rejection(reason);
        }

        let WorkerOutput {
            node,
            dispatch_index,
            outcome,
            ..
        } = output;

        match outcome {
            PageOutcome::Failed(error) => {
                tracing::debug!("Failed {}: {}", node.url(), error);
                Ok(Some(CrawlResult::failed(&node, dispatch_index, error)))
            }
            PageOutcome::Fetched {
                page,
                page_rejection,
                candidates,
            } => {
                if let Some(filter) = page_rejection {
                    summary.record_rejection(RejectReason::PageFilter(filter.clone()));
                    // The seed is always emitted; a rejection only stops its links
                    if self.content_type_policy == ContentTypePolicy::Exclude && !node.is_seed() {
                        tracing::debug!("Excluding {} (rejected by {})", node.url(), filter);
                        summary.excluded += 1;
                        return Ok(None);
                    }
                }

                if state.phase().accepts_dispatch() {
                    self.admit(state, summary, &node, candidates)?;
                }

                Ok(Some(CrawlResult::succeeded(&node, dispatch_index, page)))
            }
        }
    }

    /// Admits the surviving children of `parent` into the frontier
    fn admit(
        &self,
        state: &mut CrawlState,
        summary: &mut CrawlSummary,
        parent: &CrawlNode,
        candidates: Vec<Candidate>,
    ) -> Result<(), CrawlError> {
        let depth = parent.depth() + 1;
        if depth > self.ctx.max_depth && !candidates.is_empty() {
            return Err(CrawlError::InvariantViolation(format!(
                "worker for {} returned links at depth {} beyond max depth {}",
                parent.url(),
                depth,
                self.ctx.max_depth
            )));
        }

        let mut admitted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match state.try_admit(
                candidate.url,
                depth,
                Some(parent.url().clone()),
                candidate.score,
            ) {
                Some(node) => admitted.push(node),
                None => summary.record_rejection(RejectReason::Duplicate),
            }
        }

        if !admitted.is_empty() {
            tracing::debug!(
                "Admitted {} links from {} ({} in frontier)",
                admitted.len(),
                parent.url(),
                state.frontier_len() + admitted.len()
            );
        }
        state.enqueue_siblings(admitted);
        Ok(())
    }

    fn record_emission(
        &self,
        state: &mut CrawlState,
        summary: &mut CrawlSummary,
        success: bool,
        depth: u32,
    ) -> Result<(), CrawlError> {
        state.record_emission();
        summary.record_emitted(success, depth);

        if let Some(max_pages) = self.max_pages {
            if state.emitted() > max_pages {
                return Err(CrawlError::InvariantViolation(format!(
                    "emitted {} results with a budget of {}",
                    state.emitted(),
                    max_pages
                )));
            }
        }

        if state.emitted() % 10 == 0 {
            tracing::info!(
                "Progress: {} pages emitted, {} in flight, {} in frontier",
                state.emitted(),
                state.in_flight(),
                state.frontier_len()
            );
        }
        Ok(())
    }

    /// Gives in-flight pages a bounded grace period, then abandons them
    ///
    /// Pages that resolve within the grace period are still emitted; nothing
    /// they discover is admitted.
    async fn drain_after_cancel(
        &self,
        state: &mut CrawlState,
        workers: &mut JoinSet<WorkerOutput>,
        sink: &mut ResultSink,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError> {
        let grace_deadline = Instant::now() + self.cancel_grace;

        while !workers.is_empty() {
            let joined = tokio::select! {
                _ = tokio::time::sleep_until(grace_deadline) => break,
                joined = workers.join_next() => joined,
            };
            let Some(joined) = joined else { break };
            let output = joined.map_err(|e| CrawlError::WorkerPanicked(e.to_string()))?;

            let Some(result) = self.complete(state, summary, output)? else {
                continue;
            };
            let (success, depth) = (result.success, result.depth());

            let delivered = tokio::select! {
                _ = tokio::time::sleep_until(grace_deadline) => break,
                delivered = sink.emit(result) => delivered,
            };
            if delivered {
                self.record_emission(state, summary, success, depth)?;
            }
        }

        if !workers.is_empty() {
            tracing::info!(
                "Abandoning {} in-flight pages after {:?} grace",
                workers.len(),
                self.cancel_grace
            );
            summary.abandoned += workers.len();
            workers.abort_all();
        }

        Ok(())
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Fetches one page and prepares its links for admission
async fn process_node(
    ctx: Arc<WorkerContext>,
    node: CrawlNode,
) -> (PageOutcome, Vec<RejectReason>) {
    let page = match tokio::time::timeout(ctx.per_page_timeout, ctx.fetcher.fetch(node.url())).await
    {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => return (PageOutcome::Failed(e.to_string()), Vec::new()),
        Err(_) => {
            return (
                PageOutcome::Failed(format!(
                    "Timed out after {} ms",
                    ctx.per_page_timeout.as_millis()
                )),
                Vec::new(),
            )
        }
    };

    if ctx.filters.has_stage(FilterStage::Page) {
        let page_ctx = LinkContext::for_page(node.depth(), page.content_type.clone());
        if let FilterVerdict::Reject { filter, .. } = ctx
            .filters
            .evaluate(node.url(), &page_ctx, FilterStage::Page)
            .await
        {
            return (
                PageOutcome::Fetched {
                    page,
                    page_rejection: Some(filter),
                    candidates: Vec::new(),
                },
                Vec::new(),
            );
        }
    }

    if node.depth() >= ctx.max_depth {
        return (
            PageOutcome::Fetched {
                page,
                page_rejection: None,
                candidates: Vec::new(),
            },
            Vec::new(),
        );
    }

    let links = ctx.extractor.extract_links(&page);
    let child_depth = node.depth() + 1;
    let mut candidates = Vec::new();
    let mut rejections = Vec::new();
    let mut seen = HashSet::new();

    for link in links {
        let url = match normalize_url(&link.href) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping link {}: {}", link.href, e);
                rejections.push(RejectReason::MalformedUrl);
                continue;
            }
        };

        // The same target linked twice from one page is judged once
        if !seen.insert(url.as_str().to_string()) {
            continue;
        }

        if !ctx.include_external && !same_host(&url, &ctx.seed) {
            rejections.push(RejectReason::ExternalHost);
            continue;
        }

        let link_ctx = LinkContext::for_link(node.url(), child_depth, link.anchor_text);
        if let FilterVerdict::Reject { filter, error } = ctx
            .filters
            .evaluate(&url, &link_ctx, FilterStage::Link)
            .await
        {
            rejections.push(match error {
                Some(_) => RejectReason::FilterError(filter),
                None => RejectReason::Filter(filter),
            });
            continue;
        }

        let score = match &ctx.scorer {
            Some(scorer) => match checked_score(scorer.as_ref(), &url, &link_ctx) {
                Some(score) => score,
                None => {
                    tracing::warn!(
                        "Scorer {} produced no usable score for {}; rejecting",
                        scorer.name(),
                        url
                    );
                    rejections.push(RejectReason::ScorerError);
                    continue;
                }
            },
            None => 0.0,
        };

        if let (Some(threshold), Some(_)) = (ctx.score_threshold, &ctx.scorer) {
            if score < threshold {
                rejections.push(RejectReason::BelowThreshold);
                continue;
            }
        }

        candidates.push(Candidate { url, score });
    }

    (
        PageOutcome::Fetched {
            page,
            page_rejection: None,
            candidates,
        },
        rejections,
    )
}
