use crate::crawlers::crawler::{PageFetcher, RecordTx};
use crate::error::Result;
use crate::filter::LinkScope;
use crate::parsers::{CompiledSelectors, Parser};
use crate::visited::{PageToken, VisitedSet};
use url::Url;

/// Where a link-based traversal currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalState {
    /// Nothing fetched yet
    #[default]
    Idle,
    /// A page is loaded and its items are being extracted
    PageLoaded,
    /// A next link was found and is about to be followed
    Following,
    /// No further page will be fetched
    Done,
}

/// Outcome of one link-based run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSummary {
    /// Normalized URLs fetched (or attempted), in order
    pub pages: Vec<String>,
    /// Fetches of followed links that failed
    pub failed_fetches: usize,
    /// Records extracted across all pages
    pub emitted: usize,
    pub final_state: TraversalState,
}

impl LinkSummary {
    pub fn pages_fetched(&self) -> usize {
        self.pages.len()
    }
}

/// Follows "next page" links from a start URL, one page at a time
pub struct LinkTraversal<'a, F> {
    fetcher: &'a F,
    parser: Parser<'a>,
    scope: &'a LinkScope,
    max_pages: Option<usize>,
    visited: VisitedSet,
    state: TraversalState,
}

impl<'a, F: PageFetcher> LinkTraversal<'a, F> {
    pub fn new(fetcher: &'a F, selectors: &'a CompiledSelectors, scope: &'a LinkScope) -> Self {
        Self {
            fetcher,
            parser: Parser::new(selectors),
            scope,
            max_pages: None,
            visited: VisitedSet::new(),
            state: TraversalState::Idle,
        }
    }

    /// Stop after this many page fetches
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// Runs the traversal to completion.
    ///
    /// Failing to fetch the start page is an error. A later page that cannot
    /// be fetched is logged and ends the run, keeping what was extracted so far.
    /// Reaching an already visited URL ends the run normally.
    pub async fn run<T: RecordTx>(&mut self, start_url: &Url, tx: &mut T) -> Result<LinkSummary> {
        let mut summary = LinkSummary::default();

        let mut current = self.scope.normalize(start_url);
        self.visited.insert(PageToken::Url(current.to_string()));
        summary.pages.push(current.to_string());

        ::log::info!("Fetching first page: {}", current);
        let mut html = self.fetcher.fetch(&current).await?;
        self.state = TraversalState::PageLoaded;

        let mut next_href = None;

        loop {
            let state = self.state;
            match state {
                TraversalState::PageLoaded => {
                    let parsed = self.parser.parse(&html);
                    ::log::info!("Found {} products on {}", parsed.records.len(), current);

                    for record in parsed.records {
                        tx.emit(record)?;
                        summary.emitted += 1;
                    }

                    next_href = parsed.next_link;
                    self.state = if next_href.is_some() {
                        TraversalState::Following
                    } else {
                        ::log::info!("No next link on {}", current);
                        TraversalState::Done
                    };
                }
                TraversalState::Following => {
                    let Some(next) = next_href.take().and_then(|href| self.resolve(&current, &href))
                    else {
                        self.state = TraversalState::Done;
                        continue;
                    };

                    if self.max_pages.is_some_and(|max| summary.pages.len() >= max) {
                        ::log::info!("Page limit reached before {}", next);
                        self.state = TraversalState::Done;
                        continue;
                    }

                    if !self.visited.insert(PageToken::Url(next.to_string())) {
                        ::log::info!("Next link {} was already visited, stopping", next);
                        self.state = TraversalState::Done;
                        continue;
                    }

                    summary.pages.push(next.to_string());
                    ::log::debug!("Following next link: {}", next);

                    match self.fetcher.fetch(&next).await {
                        Ok(body) => {
                            html = body;
                            current = next;
                            self.state = TraversalState::PageLoaded;
                        }
                        Err(e) => {
                            ::log::error!("Failed to fetch {}: {}", next, e);
                            summary.failed_fetches += 1;
                            self.state = TraversalState::Done;
                        }
                    }
                }
                TraversalState::Idle | TraversalState::Done => break,
            }
        }

        summary.final_state = self.state;
        ::log::info!(
            "Link traversal done: {} pages, {} records",
            summary.pages.len(),
            summary.emitted
        );
        Ok(summary)
    }

    /// Resolves a raw href against the current page and checks it is in scope
    fn resolve(&self, current: &Url, href: &str) -> Option<Url> {
        let resolved = match current.join(href) {
            Ok(url) => url,
            Err(e) => {
                ::log::warn!("Ignoring malformed next link {:?}: {}", href, e);
                return None;
            }
        };

        if !self.scope.allows(&resolved) {
            ::log::debug!("Next link out of scope: {}", resolved);
            return None;
        }

        Some(self.scope.normalize(&resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Selectors;
    use crate::error::ScrapeError;
    use crate::filter::LinkScopeConfig;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned HTML by URL and records every fetch
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        fetched: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: &str, html: String) -> Self {
            self.pages.insert(url.to_string(), html);
            self
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &Url) -> Result<String> {
            self.fetched.borrow_mut().push(url.to_string());
            self.pages
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| ScrapeError::fetch(url.as_str(), "404 Not Found"))
        }
    }

    fn listing(product: &str, next: Option<&str>) -> String {
        let nav = next
            .map(|href| format!(r#"<a class="next page-numbers" href="{}">Next</a>"#, href))
            .unwrap_or_default();
        format!(
            r#"<html><body><ul>
                <li class="product"><a href="/product/{0}/"><img src="/img/{0}.jpg"><h2>{0}</h2>
                <span class="price">$10.00</span></a></li>
            </ul>{1}</body></html>"#,
            product, nav
        )
    }

    fn selectors() -> CompiledSelectors {
        CompiledSelectors::compile(&Selectors::paginated_shop()).unwrap()
    }

    fn scope() -> LinkScope {
        let start = Url::parse("https://shop.example/").unwrap();
        LinkScope::for_start(&start, &[]).unwrap()
    }

    #[tokio::test]
    async fn test_three_page_chain() {
        let fetcher = FakeFetcher::default()
            .with_page("https://shop.example/", listing("a", Some("/page/2/")))
            .with_page("https://shop.example/page/2/", listing("b", Some("/page/3/")))
            .with_page("https://shop.example/page/3/", listing("c", None));
        let selectors = selectors();
        let scope = scope();
        let start = Url::parse("https://shop.example/").unwrap();

        let mut traversal = LinkTraversal::new(&fetcher, &selectors, &scope);
        let mut records = Vec::new();
        let summary = traversal.run(&start, &mut records).await.unwrap();

        assert_eq!(
            *fetcher.fetched.borrow(),
            vec![
                "https://shop.example/",
                "https://shop.example/page/2/",
                "https://shop.example/page/3/",
            ]
        );
        assert_eq!(summary.final_state, TraversalState::Done);
        assert_eq!(traversal.state(), TraversalState::Done);
        assert_eq!(traversal.visited().len(), summary.pages_fetched());
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(records[1].url, "/product/b/");
    }

    #[tokio::test]
    async fn test_cycle_is_not_refetched() {
        let fetcher = FakeFetcher::default()
            .with_page("https://shop.example/a", listing("a", Some("/b")))
            .with_page("https://shop.example/b", listing("b", Some("/a#top")));
        let selectors = selectors();
        let scope = scope();
        let start = Url::parse("https://shop.example/a").unwrap();

        let mut traversal = LinkTraversal::new(&fetcher, &selectors, &scope);
        let mut records = Vec::new();
        let summary = traversal.run(&start, &mut records).await.unwrap();

        assert_eq!(fetcher.fetched.borrow().len(), 2);
        assert_eq!(summary.pages, vec!["https://shop.example/a", "https://shop.example/b"]);
        assert_eq!(traversal.visited().len(), 2);
        assert_eq!(summary.final_state, TraversalState::Done);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_fatal() {
        let fetcher = FakeFetcher::default();
        let selectors = selectors();
        let scope = scope();
        let start = Url::parse("https://shop.example/").unwrap();

        let mut traversal = LinkTraversal::new(&fetcher, &selectors, &scope);
        let mut records = Vec::new();
        let result = traversal.run(&start, &mut records).await;
        assert!(matches!(result, Err(ScrapeError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_later_fetch_failure_keeps_records() {
        let fetcher = FakeFetcher::default()
            .with_page("https://shop.example/", listing("a", Some("/page/2/")));
        let selectors = selectors();
        let scope = scope();
        let start = Url::parse("https://shop.example/").unwrap();

        let mut traversal = LinkTraversal::new(&fetcher, &selectors, &scope);
        let mut records = Vec::new();
        let summary = traversal.run(&start, &mut records).await.unwrap();

        assert_eq!(summary.failed_fetches, 1);
        assert_eq!(summary.final_state, TraversalState::Done);
        assert_eq!(records.len(), 1);
        assert_eq!(traversal.visited().len(), summary.pages_fetched());
    }

    #[tokio::test]
    async fn test_out_of_scope_next_link_is_not_followed() {
        let fetcher = FakeFetcher::default().with_page(
            "https://shop.example/",
            listing("a", Some("https://elsewhere.example/page/2/")),
        );
        let selectors = selectors();
        let scope = scope();
        let start = Url::parse("https://shop.example/").unwrap();

        let mut traversal = LinkTraversal::new(&fetcher, &selectors, &scope);
        let mut records = Vec::new();
        let summary = traversal.run(&start, &mut records).await.unwrap();

        assert_eq!(summary.pages_fetched(), 1);
        assert_eq!(fetcher.fetched.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_max_pages() {
        let fetcher = FakeFetcher::default()
            .with_page("https://shop.example/", listing("a", Some("/page/2/")))
            .with_page("https://shop.example/page/2/", listing("b", Some("/page/3/")))
            .with_page("https://shop.example/page/3/", listing("c", None));
        let selectors = selectors();
        let scope = LinkScope::new(LinkScopeConfig::default()).unwrap();
        let start = Url::parse("https://shop.example/").unwrap();

        let mut traversal =
            LinkTraversal::new(&fetcher, &selectors, &scope).with_max_pages(Some(2));
        let mut records = Vec::new();
        let summary = traversal.run(&start, &mut records).await.unwrap();

        assert_eq!(summary.pages_fetched(), 2);
        assert_eq!(records.len(), 2);
    }
}
