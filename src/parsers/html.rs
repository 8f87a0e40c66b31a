use crate::config::Selectors;
use crate::error::{Result, ScrapeError};
use crate::parsers::ParseResult;
use crate::results::Record;
use scraper::{ElementRef, Html, Selector};

/// Selectors parsed once and reused for every page
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    item: Selector,
    name: Selector,
    price: Selector,
    image: Selector,
    image_attr: String,
    link: Selector,
    link_attr: String,
    next: Selector,
}

impl CompiledSelectors {
    /// Parse every CSS selector, failing on the first invalid one
    pub fn compile(selectors: &Selectors) -> Result<Self> {
        Ok(Self {
            item: compile_one(&selectors.item)?,
            name: compile_one(&selectors.name)?,
            price: compile_one(&selectors.price)?,
            image: compile_one(&selectors.image)?,
            image_attr: selectors.image_attr.clone(),
            link: compile_one(&selectors.link)?,
            link_attr: selectors.link_attr.clone(),
            next: compile_one(&selectors.next)?,
        })
    }
}

fn compile_one(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parses a listing document into products and its next-page link
pub fn parse(html: &str, selectors: &CompiledSelectors) -> ParseResult {
    let doc = Html::parse_document(html);

    let records = doc
        .select(&selectors.item)
        .filter_map(|item| extract_record(item, selectors))
        .collect::<Vec<_>>();

    let next_link = next_link_in(&doc, selectors);

    ::log::debug!(
        "HTML parser found {} products, next link: {:?}",
        records.len(),
        next_link
    );

    ParseResult::new(records, next_link)
}

/// Extracts products only
pub fn extract_records(html: &str, selectors: &CompiledSelectors) -> Vec<Record> {
    parse(html, selectors).records
}

/// Extracts the first next-page href only
pub fn find_next_link(html: &str, selectors: &CompiledSelectors) -> Option<String> {
    let doc = Html::parse_document(html);
    next_link_in(&doc, selectors)
}

/// Builds a record from one product card.
///
/// Fields are looked up independently; a missing field becomes an empty string
/// instead of discarding the card. Only a card without a name yields `None`.
pub fn extract_record(item: ElementRef<'_>, selectors: &CompiledSelectors) -> Option<Record> {
    let name = first_text(item, &selectors.name);
    let price = first_text(item, &selectors.price);
    let image = first_attr(item, &selectors.image, &selectors.image_attr);
    let url = first_attr(item, &selectors.link, &selectors.link_attr);

    let record = Record::from_fields(name, price, image, url);
    if record.is_none() {
        ::log::trace!("Dropping product card without a name");
    }
    record
}

fn next_link_in(doc: &Html, selectors: &CompiledSelectors) -> Option<String> {
    doc.select(&selectors.next)
        .filter_map(|e| e.value().attr("href"))
        .map(|href| href.trim().to_string())
        .find(|href| !href.is_empty())
}

/// Text of the first match, with runs of whitespace collapsed
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|e| {
            e.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

fn first_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> String {
    scope
        .select(selector)
        .find_map(|e| e.value().attr(attr))
        .unwrap_or_default()
        .to_string()
}
