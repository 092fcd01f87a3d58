//! Crawler module for fetching and parsing result pages
//!
//! This module contains the core scraping pipeline, including:
//! - HTTP fetching with explicit deadlines
//! - Page-count discovery from the pagination control
//! - Result card location and posting extraction
//! - Bounded, cancellable fan-out over pages and cards
//! - Aggregation of per-page results

mod coordinator;
mod fetcher;
mod page;
mod pages;
mod parser;

pub use coordinator::{run_scrape, Harvester, ScrapeReport};
pub use fetcher::{build_http_client, fetch_document};
pub use page::{fetch_page, PageContext, PagePostings};
pub use pages::{count_pages, SearchQuery};
pub use parser::{
    count_page_links, extract_posting, job_key, locate_cards, CardFragment, LinkBuilder,
    PageSelectors,
};

use crate::config::Config;
use crate::HarvestError;
use tokio_util::sync::CancellationToken;

/// Runs a complete scrape for one search term
///
/// This is the main entry point. It will:
/// 1. Build the HTTP client and compile the page selectors
/// 2. Count the result pages
/// 3. Fetch and extract every page concurrently
/// 4. Write all postings to the configured CSV file
///
/// # Arguments
///
/// * `config` - The scraper configuration
/// * `term` - A search term, already normalized by the caller
/// * `cancel` - Cancels all outstanding work when triggered
///
/// # Returns
///
/// * `Ok(ScrapeReport)` - Scrape completed and the file was written
/// * `Err(HarvestError)` - Scrape failed; a partial file may remain
pub async fn scrape(
    config: Config,
    term: &str,
    cancel: CancellationToken,
) -> Result<ScrapeReport, HarvestError> {
    run_scrape(config, term, cancel).await
}
