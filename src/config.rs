use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// CSS selectors used to pull product fields out of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// One match per product card
    pub item: String,

    /// Product name, relative to the item
    pub name: String,

    /// Product price, relative to the item
    pub price: String,

    /// Element carrying the image URL, relative to the item
    pub image: String,

    /// Attribute of `image` holding the URL
    #[serde(default = "default_image_attr")]
    pub image_attr: String,

    /// Element carrying the product link, relative to the item
    pub link: String,

    /// Attribute of `link` holding the URL
    #[serde(default = "default_link_attr")]
    pub link_attr: String,

    /// "Next page" anchor, relative to the document
    #[serde(default = "default_next_selector")]
    pub next: String,
}

impl Selectors {
    /// Selectors for the infinite-scroll demo listing
    pub fn infinite_scroll() -> Self {
        Self {
            item: ".product-item".to_string(),
            name: ".product-name".to_string(),
            price: ".product-price".to_string(),
            image: "img".to_string(),
            image_attr: default_image_attr(),
            link: "a".to_string(),
            link_attr: default_link_attr(),
            next: default_next_selector(),
        }
    }

    /// Selectors for the paginated (WooCommerce) demo shop
    pub fn paginated_shop() -> Self {
        Self {
            item: "li.product".to_string(),
            name: "h2".to_string(),
            price: ".price".to_string(),
            image: "img".to_string(),
            image_attr: default_image_attr(),
            link: "a".to_string(),
            link_attr: default_link_attr(),
            next: default_next_selector(),
        }
    }
}

/// How pages are fetched in link-based pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Plain HTTP requests
    Http,
    /// A WebDriver-controlled browser
    Browser,
}

/// Configuration for infinite-scroll scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Page to open before scrolling
    #[serde(default = "default_scroll_url")]
    pub start_url: String,

    #[serde(default = "Selectors::infinite_scroll")]
    pub selectors: Selectors,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Pause after each scroll so lazily loaded items can render
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,

    /// Upper bound on scroll actions (unbounded if absent)
    #[serde(default)]
    pub max_scrolls: Option<usize>,

    /// Drop records whose URL was already emitted in this run
    #[serde(default = "default_dedup_by_url")]
    pub dedup_by_url: bool,
}

/// Configuration for "next page" link scraping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    /// First listing page
    #[serde(default = "default_links_url")]
    pub start_url: String,

    #[serde(default = "Selectors::paginated_shop")]
    pub selectors: Selectors,

    #[serde(default = "default_fetcher")]
    pub fetcher: FetcherKind,

    /// URL for the WebDriver instance (browser fetcher only)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Run the browser without a visible window (browser fetcher only)
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// User agent sent by the HTTP fetcher
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for the HTTP fetcher
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on fetched pages (unbounded if absent)
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Regex patterns for next links that must not be followed
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Enum containing all scrape configuration types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScrapeConfigType {
    Scroll(ScrollConfig),
    Links(LinksConfig),
}

impl ScrapeConfigType {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            ScrapeError::Config(format!("cannot open {}: {}", path.display(), e))
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        ::log::debug!("Loaded {} configuration", config.kind());
        Ok(config)
    }

    /// Short name of the configured mode
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeConfigType::Scroll(_) => "scroll",
            ScrapeConfigType::Links(_) => "links",
        }
    }
}

/// Default infinite-scroll target
fn default_scroll_url() -> String {
    "https://www.scrapingcourse.com/infinite-scrolling".to_string()
}

/// Default paginated shop target
fn default_links_url() -> String {
    "https://www.scrapingcourse.com/ecommerce/".to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_scroll_delay_ms() -> u64 {
    1000
}

fn default_dedup_by_url() -> bool {
    true
}

fn default_fetcher() -> FetcherKind {
    FetcherKind::Http
}

fn default_user_agent() -> String {
    concat!("product-pages/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_image_attr() -> String {
    "src".to_string()
}

fn default_link_attr() -> String {
    "href".to_string()
}

fn default_next_selector() -> String {
    "a.next".to_string()
}

impl ScrollConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            selectors: Selectors::infinite_scroll(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            scroll_delay_ms: default_scroll_delay_ms(),
            max_scrolls: None,
            dedup_by_url: default_dedup_by_url(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::new(&default_scroll_url())
    }
}

impl LinksConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            selectors: Selectors::paginated_shop(),
            fetcher: default_fetcher(),
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            max_pages: None,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self::new(&default_links_url())
    }
}
