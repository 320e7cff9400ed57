use async_trait::async_trait;
use deepcrawl::crawler::{FetchError, FetchedPage, Fetcher, HtmlLinkExtractor};
use deepcrawl::{normalize_url, CrawlResult, CrawlSettings, DeepCrawler};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
enum Behavior {
    Page,
    Status(u16),
    Panic,
}

#[derive(Debug, Clone)]
struct Node {
    behavior: Behavior,
    content_type: Option<String>,
    links: Vec<(String, String)>,
    delay: Duration,
}

/// In-memory website: every page is an HTML list of links
///
/// Unknown URLs answer 404. Every fetch is recorded so tests can check which
/// pages the crawler actually touched.
#[derive(Debug, Default)]
pub struct SiteGraph {
    nodes: HashMap<String, Node>,
    fetched: Mutex<Vec<String>>,
}

fn key(url: &str) -> String {
    normalize_url(url).unwrap().to_string()
}

impl SiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// HTML page linking to `links`, anchor text taken from the last path segment
    pub fn page(self, url: &str, links: &[&str]) -> Self {
        let links = links
            .iter()
            .map(|l| {
                let text = l.rsplit('/').next().unwrap_or_default().to_string();
                (l.to_string(), text)
            })
            .collect();
        self.insert(url, Behavior::Page, Some("text/html"), links, Duration::ZERO)
    }

    pub fn slow_page(self, url: &str, delay: Duration, links: &[&str]) -> Self {
        let links = links.iter().map(|l| (l.to_string(), String::new())).collect();
        self.insert(url, Behavior::Page, Some("text/html"), links, delay)
    }

    pub fn typed_page(self, url: &str, content_type: &str, links: &[&str]) -> Self {
        let links = links.iter().map(|l| (l.to_string(), String::new())).collect();
        self.insert(url, Behavior::Page, Some(content_type), links, Duration::ZERO)
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.insert(url, Behavior::Status(status), None, Vec::new(), Duration::ZERO)
    }

    pub fn panicking(self, url: &str) -> Self {
        self.insert(url, Behavior::Panic, None, Vec::new(), Duration::ZERO)
    }

    fn insert(
        mut self,
        url: &str,
        behavior: Behavior,
        content_type: Option<&str>,
        links: Vec<(String, String)>,
        delay: Duration,
    ) -> Self {
        self.nodes.insert(
            key(url),
            Node {
                behavior,
                content_type: content_type.map(str::to_string),
                links,
                delay,
            },
        );
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Fetcher for SiteGraph {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());

        let Some(node) = self.nodes.get(url.as_str()) else {
            return Err(FetchError::Status { status_code: 404 });
        };

        if !node.delay.is_zero() {
            tokio::time::sleep(node.delay).await;
        }

        match node.behavior {
            Behavior::Status(status_code) => Err(FetchError::Status { status_code }),
            Behavior::Panic => panic!("fetcher blew up on {}", url),
            Behavior::Page => {
                let anchors: String = node
                    .links
                    .iter()
                    .map(|(href, text)| format!("<a href=\"{}\">{}</a>\n", href, text))
                    .collect();
                Ok(FetchedPage {
                    url: url.clone(),
                    final_url: url.clone(),
                    status_code: 200,
                    content_type: node.content_type.clone(),
                    body: format!("<html><body>\n{}</body></html>", anchors),
                })
            }
        }
    }
}

/// Crawler over `graph` with the HTML extractor
pub fn crawler(settings: CrawlSettings, graph: &Arc<SiteGraph>) -> DeepCrawler {
    DeepCrawler::from_shared(
        settings,
        Arc::clone(graph) as Arc<dyn Fetcher>,
        Arc::new(HtmlLinkExtractor::new()),
    )
}

pub fn urls(results: &[CrawlResult]) -> Vec<&str> {
    results.iter().map(|r| r.url.as_str()).collect()
}

/// Binary tree of pages under example.com, `levels` deep below the root
pub fn tree(levels: u32) -> SiteGraph {
    fn add(graph: SiteGraph, path: &str, level: u32, levels: u32) -> SiteGraph {
        let url = format!("https://example.com{}", if path.is_empty() { "/" } else { path });
        if level == levels {
            return graph.page(&url, &[]);
        }
        let left = format!("{}/l", path);
        let right = format!("{}/r", path);
        let graph = graph.page(&url, &[left.as_str(), right.as_str()]);
        let graph = add(graph, &left, level + 1, levels);
        add(graph, &right, level + 1, levels)
    }
    add(SiteGraph::new(), "", 0, levels)
}
