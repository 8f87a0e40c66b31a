use crate::crawlers::crawler::{PageFetcher, ScrollPage};
use crate::error::{Result, ScrapeError};
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use url::Url;

const SCROLL_HEIGHT_SCRIPT: &str = "return document.documentElement.scrollHeight;";
const SCROLL_TO_BOTTOM_SCRIPT: &str =
    "window.scrollTo(0, document.documentElement.scrollHeight);";

/// Connects to the WebDriver instance
///
/// Falls back to the default ports of common drivers when the configured URL
/// does not answer.
pub async fn connect_to_webdriver(webdriver_url: &str, headless: bool) -> Result<Client> {
    let mut builder = ClientBuilder::native();
    if headless {
        builder.capabilities(headless_capabilities());
    }

    match builder.connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // geckodriver / Selenium default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = builder.connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(ScrapeError::WebDriver(format!(
        "no WebDriver server answered at {} or the default ports",
        webdriver_url
    )))
}

/// Capabilities asking Chrome and Firefox to run without a window
fn headless_capabilities() -> serde_json::Map<String, Value> {
    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": ["--headless=new", "--disable-gpu"] }),
    );
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({ "args": ["-headless"] }),
    );
    caps
}

/// Closes a session, logging instead of failing
pub async fn close_client(client: Client) {
    if let Err(e) = client.close().await {
        ::log::warn!("Failed to close WebDriver client: {}", e);
    }
}

/// A browser tab scrolled through an infinite listing
pub struct BrowserPage {
    client: Client,
}

impl BrowserPage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Navigate to the listing
    pub async fn goto(&self, url: &str) -> Result<()> {
        ::log::info!("Navigating to {}", url);
        self.client
            .goto(url)
            .await
            .map_err(|e| navigation_error(e, &format!("navigate to {}", url)))
    }

    pub async fn close(self) {
        close_client(self.client).await;
    }
}

impl ScrollPage for BrowserPage {
    type Node = Element;

    async fn query_nodes(&self, selector: &str) -> Result<Vec<Element>> {
        self.client
            .find_all(Locator::Css(selector))
            .await
            .map_err(|e| navigation_error(e, &format!("query `{}`", selector)))
    }

    async fn text(&self, node: &Element, selector: &str) -> Result<String> {
        let element = node
            .find(Locator::Css(selector))
            .await
            .map_err(|e| navigation_error(e, &format!("find `{}`", selector)))?;
        element
            .text()
            .await
            .map_err(|e| navigation_error(e, &format!("read text of `{}`", selector)))
    }

    async fn attribute(&self, node: &Element, selector: &str, attr: &str) -> Result<String> {
        let element = node
            .find(Locator::Css(selector))
            .await
            .map_err(|e| navigation_error(e, &format!("find `{}`", selector)))?;
        element
            .attr(attr)
            .await
            .map_err(|e| navigation_error(e, &format!("read `{}` of `{}`", attr, selector)))?
            .ok_or_else(|| {
                ScrapeError::navigation(
                    format!("read `{}` of `{}`", attr, selector),
                    "attribute not present",
                )
            })
    }

    async fn scroll_height(&self) -> Result<u64> {
        let value = self
            .client
            .execute(SCROLL_HEIGHT_SCRIPT, vec![])
            .await
            .map_err(|e| ScrapeError::Evaluate(e.to_string()))?;
        height_from_value(&value)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.client
            .execute(SCROLL_TO_BOTTOM_SCRIPT, vec![])
            .await
            .map(|_| ())
            .map_err(|e| ScrapeError::Evaluate(e.to_string()))
    }
}

/// Reads a scroll height returned by the browser, which may be an integer or a float
fn height_from_value(value: &Value) -> Result<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|h| *h >= 0.0).map(|h| h.round() as u64))
        .ok_or_else(|| ScrapeError::Evaluate(format!("unexpected scroll height {}", value)))
}

/// Loads listing pages in a browser session and returns the rendered source
pub struct BrowserFetcher {
    client: Client,
}

impl BrowserFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn close(self) {
        close_client(self.client).await;
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        self.client
            .goto(url.as_str())
            .await
            .map_err(|e| navigation_error(e, &format!("access {}", url)))?;

        self.client
            .source()
            .await
            .map_err(|e| navigation_error(e, &format!("get source for {}", url)))
    }
}

/// Handles errors that occur during navigation or element lookup
fn navigation_error(error: fantoccini::error::CmdError, context: &str) -> ScrapeError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while trying to {}", context);
    }
    ScrapeError::navigation(context, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_from_integer_and_float() {
        assert_eq!(height_from_value(&json!(2400)).unwrap(), 2400);
        assert_eq!(height_from_value(&json!(2400.4)).unwrap(), 2400);
    }

    #[test]
    fn test_height_rejects_non_numbers() {
        assert!(matches!(
            height_from_value(&json!(null)),
            Err(ScrapeError::Evaluate(_))
        ));
        assert!(height_from_value(&json!("tall")).is_err());
        assert!(height_from_value(&json!(-1.0)).is_err());
    }

    #[test]
    fn test_headless_capabilities() {
        let caps = headless_capabilities();
        let chrome_args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(chrome_args.iter().any(|a| a == "--headless=new"));
    }
}
