use clap::{Parser, ValueEnum};
use product_pages::Mode;
use product_pages::config::{FetcherKind, LinksConfig, ScrollConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "product-pages")]
#[command(about = "Scrapes product listings by infinite scroll or next-page links into CSV")]
#[command(version)]
pub struct Args {
    /// How the listing reveals more products (scroll, links)
    #[arg(value_enum, default_value_t = ModeArg::Scroll)]
    pub mode: ModeArg,

    /// Listing URL (defaults to the demo shop for the chosen mode)
    #[arg(short, long)]
    pub url: Option<String>,

    /// CSV file to write
    #[arg(short, long, default_value = "products.csv")]
    pub output: PathBuf,

    /// JSON configuration file; its "type" takes precedence over MODE
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Page fetcher for links mode
    #[arg(long, value_enum)]
    pub fetcher: Option<FetcherArg>,

    /// Pause after each scroll in milliseconds
    #[arg(long)]
    pub scroll_delay_ms: Option<u64>,

    /// Stop after this many scrolls
    #[arg(long)]
    pub max_scrolls: Option<usize>,

    /// Stop after this many pages in links mode
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Emit items again each time a scroll pass re-reads them
    #[arg(long)]
    pub keep_duplicates: bool,

    /// WebDriver server URL
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Scroll,
    Links,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FetcherArg {
    Http,
    Browser,
}

impl From<FetcherArg> for FetcherKind {
    fn from(arg: FetcherArg) -> Self {
        match arg {
            FetcherArg::Http => FetcherKind::Http,
            FetcherArg::Browser => FetcherKind::Browser,
        }
    }
}

/// Convert from CLI mode argument to the library mode
pub fn convert_mode(arg_mode: ModeArg, url: Option<&str>) -> Mode {
    match arg_mode {
        ModeArg::Scroll => Mode::Scroll(
            url.map(str::to_string)
                .unwrap_or_else(|| ScrollConfig::default().start_url),
        ),
        ModeArg::Links => Mode::Links(
            url.map(str::to_string)
                .unwrap_or_else(|| LinksConfig::default().start_url),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["product-pages"]);
        assert_eq!(args.mode, ModeArg::Scroll);
        assert_eq!(args.output, PathBuf::from("products.csv"));
        assert!(!args.keep_duplicates);

        match convert_mode(args.mode, args.url.as_deref()) {
            Mode::Scroll(url) => {
                assert_eq!(url, "https://www.scrapingcourse.com/infinite-scrolling")
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_links_mode_with_flags() {
        let args = Args::parse_from([
            "product-pages",
            "links",
            "--url",
            "https://shop.example/",
            "--fetcher",
            "browser",
            "--max-pages",
            "4",
            "-o",
            "out.csv",
        ]);
        assert_eq!(args.mode, ModeArg::Links);
        assert_eq!(args.fetcher.map(FetcherKind::from), Some(FetcherKind::Browser));
        assert_eq!(args.max_pages, Some(4));
        assert!(matches!(
            convert_mode(args.mode, args.url.as_deref()),
            Mode::Links(url) if url == "https://shop.example/"
        ));
    }
}
