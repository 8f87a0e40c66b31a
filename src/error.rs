use thiserror::Error;

/// Errors raised while scraping product pages
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// A CSS selector that does not parse
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// Could not open a WebDriver session
    #[error("webdriver session error: {0}")]
    WebDriver(String),

    /// A browser command (lookup, navigation) failed
    #[error("failed to {context}: {message}")]
    Navigation { context: String, message: String },

    /// A script evaluated in the page failed or returned an unexpected value
    #[error("script evaluation failed: {0}")]
    Evaluate(String),

    /// A page could not be fetched
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The record consumer went away before the producer finished
    #[error("record channel closed")]
    ChannelClosed,
}

impl ScrapeError {
    /// Wraps a browser command failure with what was being attempted
    pub fn navigation(context: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Navigation {
            context: context.into(),
            message: error.to_string(),
        }
    }

    pub fn fetch(url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
