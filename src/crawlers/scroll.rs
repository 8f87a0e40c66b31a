use crate::config::{ScrollConfig, Selectors};
use crate::crawlers::crawler::{RecordTx, ScrollPage};
use crate::error::{Result, ScrapeError};
use crate::results::Record;
use crate::visited::{PageToken, VisitedSet};
use std::collections::HashSet;
use std::time::Duration;

/// Tuning for an infinite-scroll traversal
#[derive(Debug, Clone)]
pub struct ScrollOptions {
    /// Pause after each scroll before re-querying items
    pub delay: Duration,
    /// Stop after this many scroll actions even if the page keeps growing
    pub max_scrolls: Option<usize>,
    /// Skip records whose URL was already emitted in this run
    pub dedup_by_url: bool,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_scrolls: None,
            dedup_by_url: true,
        }
    }
}

impl From<&ScrollConfig> for ScrollOptions {
    fn from(config: &ScrollConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.scroll_delay_ms),
            max_scrolls: config.max_scrolls,
            dedup_by_url: config.dedup_by_url,
        }
    }
}

/// Counters for one infinite-scroll run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollSummary {
    /// Extraction passes over the currently loaded items
    pub passes: usize,
    /// Scroll actions performed
    pub scrolls: usize,
    /// Records handed to the sink channel
    pub emitted: usize,
    /// Records skipped because their URL had been emitted already
    pub duplicates_skipped: usize,
    /// Last measured document height
    pub final_height: u64,
}

/// Scrolls a page until its height stops changing, extracting items on every pass.
///
/// Each pass re-reads every item currently in the document, so items loaded
/// earlier are seen again. With `dedup_by_url` those repeats are dropped;
/// without it they are emitted again.
///
/// Failing to list items, measure the page, or scroll aborts the traversal.
/// A single item whose fields cannot be read is skipped.
pub async fn run<P, T>(
    page: &P,
    selectors: &Selectors,
    options: &ScrollOptions,
    tx: &mut T,
) -> Result<ScrollSummary>
where
    P: ScrollPage,
    T: RecordTx,
{
    let mut summary = ScrollSummary::default();

    // Height 0 stands for "not measured yet"
    let mut visited = VisitedSet::new();
    visited.insert(PageToken::Height(0));

    let mut seen_urls: HashSet<String> = HashSet::new();

    loop {
        summary.passes += 1;

        let nodes = page.query_nodes(&selectors.item).await?;
        ::log::debug!(
            "Pass {} found {} items matching {}",
            summary.passes,
            nodes.len(),
            selectors.item
        );

        for node in &nodes {
            let Some(record) = extract_node(page, node, selectors).await else {
                continue;
            };

            if options.dedup_by_url && !seen_urls.insert(dedup_key(&record).to_string()) {
                summary.duplicates_skipped += 1;
                continue;
            }

            tx.emit(record)?;
            summary.emitted += 1;
        }

        let height = page.scroll_height().await?;
        summary.final_height = height;

        if !visited.insert(PageToken::Height(height)) {
            ::log::info!("Page height settled at {}, no more content", height);
            break;
        }

        if options.max_scrolls.is_some_and(|max| summary.scrolls >= max) {
            ::log::warn!(
                "Stopping after {} scrolls while the page was still growing",
                summary.scrolls
            );
            break;
        }

        ::log::info!("New page loading...");
        page.scroll_to_bottom().await?;
        summary.scrolls += 1;

        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    ::log::info!(
        "Scroll traversal done: {} passes, {} scrolls, {} records",
        summary.passes,
        summary.scrolls,
        summary.emitted
    );
    Ok(summary)
}

/// Reads the four product fields from one item node.
///
/// Returns `None` if any lookup fails or the name is empty.
pub async fn extract_node<P: ScrollPage>(
    page: &P,
    node: &P::Node,
    selectors: &Selectors,
) -> Option<Record> {
    let fields = async {
        let name = page.text(node, &selectors.name).await?;
        let price = page.text(node, &selectors.price).await?;
        let image = page
            .attribute(node, &selectors.image, &selectors.image_attr)
            .await?;
        let url = page
            .attribute(node, &selectors.link, &selectors.link_attr)
            .await?;
        Ok::<_, ScrapeError>((name, price, image, url))
    }
    .await;

    match fields {
        Ok((name, price, image, url)) => Record::from_fields(name, price, image, url),
        Err(e) => {
            ::log::trace!("Skipping item: {}", e);
            None
        }
    }
}

/// URL when present, otherwise the name
fn dedup_key(record: &Record) -> &str {
    if record.url.is_empty() {
        &record.name
    } else {
        &record.url
    }
}
