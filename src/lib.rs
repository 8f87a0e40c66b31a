// Re-export modules
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod parsers;
pub mod results;
pub mod sink;
pub mod visited;

// Re-export commonly used types for convenience
pub use error::{Result, ScrapeError};
pub use results::Record;

use config::{FetcherKind, LinksConfig, ScrapeConfigType, ScrollConfig};
use crawlers::http::HttpFetcher;
use crawlers::links::{LinkSummary, LinkTraversal};
use crawlers::scroll::{self, ScrollOptions, ScrollSummary};
use crawlers::web::{self, BrowserFetcher, BrowserPage};
use crawlers::PageFetcher;
use filter::LinkScope;
use parsers::CompiledSelectors;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// How the listing reveals more products
#[derive(Debug, Clone)]
pub enum Mode {
    /// Infinite scroll on a single page, driven through WebDriver
    Scroll(String),
    /// "Next page" links between listing pages
    Links(String),
}

/// Traversal counters for either mode
#[derive(Debug, Clone)]
pub enum Summary {
    Scroll(ScrollSummary),
    Links(LinkSummary),
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub records: Vec<Record>,
    pub summary: Summary,
}

/// Main builder for a scrape run
pub struct Scrape {
    config: ScrapeConfigType,
}

impl Scrape {
    /// Create a new builder with default settings for the given mode
    pub fn new(mode: Mode) -> Self {
        let config = match mode {
            Mode::Scroll(url) => ScrapeConfigType::Scroll(ScrollConfig::new(&url)),
            Mode::Links(url) => ScrapeConfigType::Links(LinksConfig::new(&url)),
        };
        Self { config }
    }

    /// Create a builder from a complete configuration
    pub fn from_config(config: ScrapeConfigType) -> Self {
        Self { config }
    }

    /// Load configuration from a file
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_config(ScrapeConfigType::from_file(path)?))
    }

    /// Load configuration from a string
    pub fn from_config_str(config_str: &str) -> Result<Self> {
        Ok(Self::from_config(ScrapeConfigType::from_json(config_str)?))
    }

    pub fn config(&self) -> &ScrapeConfigType {
        &self.config
    }

    /// Override the start URL
    pub fn with_start_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        match &mut self.config {
            ScrapeConfigType::Scroll(cfg) => cfg.start_url = url,
            ScrapeConfigType::Links(cfg) => cfg.start_url = url,
        }
        self
    }

    /// Override the WebDriver URL
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        match &mut self.config {
            ScrapeConfigType::Scroll(cfg) => cfg.webdriver_url = url,
            ScrapeConfigType::Links(cfg) => cfg.webdriver_url = url,
        }
        self
    }

    /// Show or hide the browser window
    pub fn with_headless(mut self, headless: bool) -> Self {
        match &mut self.config {
            ScrapeConfigType::Scroll(cfg) => cfg.headless = headless,
            ScrapeConfigType::Links(cfg) => cfg.headless = headless,
        }
        self
    }

    /// Set the pause after each scroll (scroll mode only)
    pub fn with_scroll_delay(mut self, delay_ms: u64) -> Self {
        match &mut self.config {
            ScrapeConfigType::Scroll(cfg) => cfg.scroll_delay_ms = delay_ms,
            ScrapeConfigType::Links(_) => ::log::debug!("Scroll delay ignored in links mode"),
        }
        self
    }

    /// Cap the number of scroll actions (scroll mode only)
    pub fn with_max_scrolls(mut self, max_scrolls: usize) -> Self {
        match &mut self.config {
            ScrapeConfigType::Scroll(cfg) => cfg.max_scrolls = Some(max_scrolls),
            ScrapeConfigType::Links(_) => ::log::debug!("Scroll limit ignored in links mode"),
        }
        self
    }

    /// Toggle the seen-URL filter (scroll mode only)
    pub fn with_dedup(mut self, dedup_by_url: bool) -> Self {
        match &mut self.config {
            ScrapeConfigType::Scroll(cfg) => cfg.dedup_by_url = dedup_by_url,
            ScrapeConfigType::Links(_) => ::log::debug!("Dedup setting ignored in links mode"),
        }
        self
    }

    /// Cap the number of fetched pages (links mode only)
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        match &mut self.config {
            ScrapeConfigType::Links(cfg) => cfg.max_pages = Some(max_pages),
            ScrapeConfigType::Scroll(_) => ::log::debug!("Page limit ignored in scroll mode"),
        }
        self
    }

    /// Choose how listing pages are fetched (links mode only)
    pub fn with_fetcher(mut self, fetcher: FetcherKind) -> Self {
        match &mut self.config {
            ScrapeConfigType::Links(cfg) => cfg.fetcher = fetcher,
            ScrapeConfigType::Scroll(_) => ::log::debug!("Fetcher ignored in scroll mode"),
        }
        self
    }

    /// Override the WebDriver URL with the WEBDRIVER_URL environment variable if set
    pub fn with_env_overrides(self) -> Self {
        match std::env::var("WEBDRIVER_URL") {
            Ok(webdriver_url) if !webdriver_url.is_empty() => self.with_webdriver_url(webdriver_url),
            _ => self,
        }
    }

    /// Run the scrape and collect every record
    pub async fn run(self) -> Result<ScrapeReport> {
        match &self.config {
            ScrapeConfigType::Scroll(cfg) => run_scroll(cfg).await,
            ScrapeConfigType::Links(cfg) => run_links(cfg).await,
        }
    }
}

/// Opens the listing in a browser and scrolls it, streaming records to a collector task
async fn run_scroll(config: &ScrollConfig) -> Result<ScrapeReport> {
    ::log::info!("Starting scroll scrape of {}", config.start_url);

    // Reject malformed selectors before opening a browser
    CompiledSelectors::compile(&config.selectors)?;

    let client = web::connect_to_webdriver(&config.webdriver_url, config.headless).await?;
    let page = BrowserPage::new(client);

    let result = scroll_page(&page, config).await;
    page.close().await;
    result
}

async fn scroll_page(page: &BrowserPage, config: &ScrollConfig) -> Result<ScrapeReport> {
    page.goto(&config.start_url).await?;

    let (mut tx, done) = sink::spawn_collector();
    let summary = scroll::run(page, &config.selectors, &ScrollOptions::from(config), &mut tx).await;

    // Closing the channel lets the collector finish
    drop(tx);
    let records = sink::finish_collecting(done).await?;
    let summary = summary?;

    Ok(ScrapeReport {
        records,
        summary: Summary::Scroll(summary),
    })
}

/// Follows next links from the start page, extracting sequentially
async fn run_links(config: &LinksConfig) -> Result<ScrapeReport> {
    ::log::info!("Starting link scrape of {}", config.start_url);

    let selectors = CompiledSelectors::compile(&config.selectors)?;
    let start = Url::parse(&config.start_url)?;
    let scope = LinkScope::for_start(&start, &config.exclude_patterns)
        .map_err(|e| ScrapeError::Config(format!("invalid exclude pattern: {}", e)))?;

    match config.fetcher {
        FetcherKind::Http => {
            let fetcher = HttpFetcher::new(
                &config.user_agent,
                Duration::from_secs(config.request_timeout_secs),
            )?;
            follow_links(&fetcher, &selectors, &scope, &start, config.max_pages).await
        }
        FetcherKind::Browser => {
            let client = web::connect_to_webdriver(&config.webdriver_url, config.headless).await?;
            let fetcher = BrowserFetcher::new(client);
            let result = follow_links(&fetcher, &selectors, &scope, &start, config.max_pages).await;
            fetcher.close().await;
            result
        }
    }
}

/// Runs a link traversal with any fetcher, collecting records in memory
pub async fn follow_links<F: PageFetcher>(
    fetcher: &F,
    selectors: &CompiledSelectors,
    scope: &LinkScope,
    start: &Url,
    max_pages: Option<usize>,
) -> Result<ScrapeReport> {
    let mut records = Vec::new();
    let summary = LinkTraversal::new(fetcher, selectors, scope)
        .with_max_pages(max_pages)
        .run(start, &mut records)
        .await?;

    Ok(ScrapeReport {
        records,
        summary: Summary::Links(summary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_scroll_config() {
        let scrape = Scrape::new(Mode::Scroll("https://shop.example/scroll".to_string()))
            .with_scroll_delay(0)
            .with_max_scrolls(5)
            .with_dedup(false)
            .with_max_pages(9);

        let ScrapeConfigType::Scroll(cfg) = scrape.config() else {
            panic!("expected scroll config");
        };
        assert_eq!(cfg.start_url, "https://shop.example/scroll");
        assert_eq!(cfg.scroll_delay_ms, 0);
        assert_eq!(cfg.max_scrolls, Some(5));
        assert!(!cfg.dedup_by_url);
    }

    #[test]
    fn test_builder_overrides_links_config() {
        let scrape = Scrape::from_config_str(r#"{"type": "links"}"#)
            .unwrap()
            .with_start_url("https://shop.example/page/1/")
            .with_fetcher(FetcherKind::Browser)
            .with_headless(false)
            .with_max_pages(2);

        let ScrapeConfigType::Links(cfg) = scrape.config() else {
            panic!("expected links config");
        };
        assert_eq!(cfg.start_url, "https://shop.example/page/1/");
        assert_eq!(cfg.fetcher, FetcherKind::Browser);
        assert!(!cfg.headless);
        assert_eq!(cfg.max_pages, Some(2));
    }

    #[tokio::test]
    async fn test_invalid_selector_fails_before_fetching() {
        let mut config = LinksConfig::new("http://127.0.0.1:9/");
        config.selectors.item = "li[".to_string();
        let result = Scrape::from_config(ScrapeConfigType::Links(config)).run().await;
        assert!(matches!(result, Err(ScrapeError::Selector { .. })));
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let result = Scrape::new(Mode::Links("not a url".to_string())).run().await;
        assert!(matches!(result, Err(ScrapeError::Url(_))));
    }
}
