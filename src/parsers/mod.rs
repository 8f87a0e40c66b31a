pub mod html;


pub use html::CompiledSelectors;

use crate::results::Record;

/// Result of parsing one listing page
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Products found on the page, in document order
    pub records: Vec<Record>,
    /// Raw href of the "next page" anchor, if any
    pub next_link: Option<String>,
}

impl ParseResult {
    /// Creates a new parse result with the given records and next link
    pub fn new(records: Vec<Record>, next_link: Option<String>) -> Self {
        Self { records, next_link }
    }
}

/// Parses listing pages with a fixed set of selectors
pub struct Parser<'a> {
    selectors: &'a CompiledSelectors,
}

impl<'a> Parser<'a> {
    pub fn new(selectors: &'a CompiledSelectors) -> Self {
        Self { selectors }
    }

    /// Extract products and the next-page link from an HTML document
    pub fn parse(&self, html: &str) -> ParseResult {
        html::parse(html, self.selectors)
    }
}
