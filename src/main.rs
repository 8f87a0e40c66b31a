use clap::Parser;
use product_pages::sink::{ConsoleSink, CsvSink, RecordSink};
use product_pages::{Scrape, ScrapeReport, Summary};
use std::process::ExitCode;

mod args;
use args::{Args, convert_mode};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let scrape = match build_scrape(&args) {
        Ok(scrape) => scrape,
        Err(e) => {
            ::log::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    ::log::info!("Starting {} scrape", scrape.config().kind());
    let start_time = std::time::Instant::now();

    let report = match scrape.run().await {
        Ok(report) => report,
        Err(e) => {
            ::log::error!("Scrape failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log_summary(&report, start_time.elapsed().as_secs_f64());

    if let Err(e) = ConsoleSink::stdout().write_records(&report.records) {
        ::log::error!("Failed to print records: {}", e);
        return ExitCode::FAILURE;
    }

    let written = CsvSink::create(&args.output).and_then(|mut sink| sink.write_records(&report.records));
    if let Err(e) = written {
        ::log::error!("Failed to write {}: {}", args.output.display(), e);
        return ExitCode::FAILURE;
    }

    ::log::info!("Saved {} products to {}", report.records.len(), args.output.display());
    ExitCode::SUCCESS
}

/// Builds the scrape from a config file or the mode argument, then applies flag overrides
fn build_scrape(args: &Args) -> product_pages::Result<Scrape> {
    let mut scrape = match &args.config {
        Some(path) => {
            let scrape = Scrape::from_config_file(path)?;
            if let Some(url) = &args.url {
                scrape.with_start_url(url.clone())
            } else {
                scrape
            }
        }
        None => Scrape::new(convert_mode(args.mode, args.url.as_deref())),
    }
    .with_env_overrides();

    if let Some(fetcher) = args.fetcher {
        scrape = scrape.with_fetcher(fetcher.into());
    }
    if let Some(delay) = args.scroll_delay_ms {
        scrape = scrape.with_scroll_delay(delay);
    }
    if let Some(max) = args.max_scrolls {
        scrape = scrape.with_max_scrolls(max);
    }
    if let Some(max) = args.max_pages {
        scrape = scrape.with_max_pages(max);
    }
    if args.keep_duplicates {
        scrape = scrape.with_dedup(false);
    }
    if let Some(url) = &args.webdriver_url {
        scrape = scrape.with_webdriver_url(url.clone());
    }
    if args.headed {
        scrape = scrape.with_headless(false);
    }

    Ok(scrape)
}

fn log_summary(report: &ScrapeReport, seconds: f64) {
    match &report.summary {
        Summary::Scroll(summary) => ::log::info!(
            "Scroll complete - {} passes, {} scrolls, {} duplicates skipped in {:.2} seconds",
            summary.passes,
            summary.scrolls,
            summary.duplicates_skipped,
            seconds
        ),
        Summary::Links(summary) => ::log::info!(
            "Pagination complete - {} pages, {} failed fetches in {:.2} seconds",
            summary.pages_fetched(),
            summary.failed_fetches,
            seconds
        ),
    }
}
