use crate::error::{Result, ScrapeError};
use crate::results::Record;
use tokio::sync::mpsc;
use url::Url;

/// A rendered page that grows as it is scrolled
///
/// Node lookups are scoped to a node returned by [`ScrollPage::query_nodes`];
/// `text` and `attribute` fail when the selector matches nothing.
#[allow(async_fn_in_trait)]
pub trait ScrollPage {
    type Node;

    /// All nodes currently matching the selector
    async fn query_nodes(&self, selector: &str) -> Result<Vec<Self::Node>>;

    /// Text of the first descendant of `node` matching `selector`
    async fn text(&self, node: &Self::Node, selector: &str) -> Result<String>;

    /// Attribute value of the first descendant of `node` matching `selector`
    async fn attribute(&self, node: &Self::Node, selector: &str, attr: &str) -> Result<String>;

    /// Current document height, used to detect newly loaded content
    async fn scroll_height(&self) -> Result<u64>;

    /// Scroll the viewport to the bottom of the document
    async fn scroll_to_bottom(&self) -> Result<()>;
}

/// Retrieves the markup of a listing page
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Destination for records as a traversal extracts them
pub trait RecordTx {
    fn emit(&mut self, record: Record) -> Result<()>;
}

impl RecordTx for Vec<Record> {
    fn emit(&mut self, record: Record) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

impl RecordTx for mpsc::UnboundedSender<Record> {
    fn emit(&mut self, record: Record) -> Result<()> {
        self.send(record).map_err(|_| ScrapeError::ChannelClosed)
    }
}
