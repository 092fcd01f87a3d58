//! Scrape coordinator - the aggregation side of the pipeline
//!
//! This module drives one scrape end to end:
//! - Discovering the number of result pages
//! - Fetching pages through a bounded pool of page tasks
//! - Merging per-page postings into a single collection
//! - Handing the collection to the CSV writer

use crate::config::{Config, MissingPagination};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::page::{fetch_page, lost_task, PageContext, PagePostings};
use crate::crawler::pages::{count_pages, SearchQuery};
use crate::crawler::parser::{LinkBuilder, PageSelectors};
use crate::output::{write_postings, WriteOptions};
use crate::posting::JobCollection;
use crate::HarvestError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome of a completed scrape
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// The search term that was scraped
    pub term: String,

    /// Number of result pages fetched
    pub pages: u32,

    /// Number of postings written
    pub postings: usize,

    /// Where the CSV file was written
    pub output: PathBuf,

    /// Wall-clock duration of the whole scrape
    pub elapsed: Duration,
}

/// Main scrape coordinator
pub struct Harvester {
    config: Arc<Config>,
    client: Client,
    selectors: Arc<PageSelectors>,
    links: Arc<LinkBuilder>,
}

impl Harvester {
    /// Creates a new harvester
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to scrape
    /// * `Err(HarvestError)` - A selector or URL failed to compile, or the client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let selectors = PageSelectors::compile(&config.selectors)?;
        let links = LinkBuilder::from_site(&config.site)?;
        let client = build_http_client(&config.scraper)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            selectors: Arc::new(selectors),
            links: Arc::new(links),
        })
    }

    /// Scrapes every result page for `term` and writes the CSV file
    ///
    /// The output goes to the configured path. On failure, a partially written
    /// file may be left behind.
    pub async fn run(
        &self,
        term: &str,
        cancel: CancellationToken,
    ) -> Result<ScrapeReport, HarvestError> {
        self.run_to(term, Path::new(&self.config.output.path), cancel).await
    }

    /// Same as [`Harvester::run`], writing to `output` instead of the configured path
    pub async fn run_to(
        &self,
        term: &str,
        output: &Path,
        cancel: CancellationToken,
    ) -> Result<ScrapeReport, HarvestError> {
        let start_time = Instant::now();
        tracing::info!("Scraping postings for '{}'", term);

        let (pages, postings) = self.collect(term, cancel.clone()).await?;
        let count = postings.len();

        let options = WriteOptions {
            max_tasks: self.config.scraper.max_concurrent_tasks as usize,
            ordered: self.config.scraper.preserve_order,
        };

        tokio::select! {
            _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
            written = write_postings(postings, output, options) => written?,
        };

        let elapsed = start_time.elapsed();
        tracing::info!(
            "Done, extracted {} postings from {} pages in {:?}",
            count,
            pages,
            elapsed
        );

        Ok(ScrapeReport {
            term: term.to_string(),
            pages,
            postings: count,
            output: output.to_path_buf(),
            elapsed,
        })
    }

    /// Fetches every result page for `term` and merges the postings
    ///
    /// Returns the number of pages fetched together with the collection. The
    /// first failing page cancels the remaining ones; no partial result is returned.
    pub async fn collect(
        &self,
        term: &str,
        cancel: CancellationToken,
    ) -> Result<(u32, JobCollection), HarvestError> {
        let query = SearchQuery::new(&self.config.site, term)?;

        let discovered = tokio::select! {
            _ = cancel.cancelled() => return Err(HarvestError::Cancelled),
            pages = count_pages(&self.client, &query, &self.selectors) => pages?,
        };
        let total_pages = self.pages_to_fetch(discovered);

        let ctx = Arc::new(PageContext {
            client: self.client.clone(),
            query,
            selectors: Arc::clone(&self.selectors),
            links: Arc::clone(&self.links),
            task_limit: Arc::new(Semaphore::new(
                self.config.scraper.max_concurrent_tasks as usize,
            )),
        });

        let pages = self.fetch_all(ctx, total_pages, cancel).await?;
        Ok((total_pages, self.merge(pages)))
    }

    /// Applies the missing-pagination policy to a discovered page count
    fn pages_to_fetch(&self, discovered: u32) -> u32 {
        if discovered > 0 {
            return discovered;
        }

        match self.config.scraper.missing_pagination {
            MissingPagination::Empty => {
                tracing::warn!("No pagination control found, treating result set as empty");
                0
            }
            MissingPagination::SinglePage => {
                tracing::warn!("No pagination control found, scraping the first page only");
                1
            }
        }
    }

    /// Runs one page task per page index through a bounded pool
    async fn fetch_all(
        &self,
        ctx: Arc<PageContext>,
        total_pages: u32,
        cancel: CancellationToken,
    ) -> Result<Vec<PagePostings>, HarvestError> {
        let expected = total_pages as usize;
        let page_limit = Arc::new(Semaphore::new(
            self.config.scraper.max_concurrent_pages as usize,
        ));
        let page_cancel = cancel.child_token();

        let (tx, mut rx) = mpsc::channel::<Result<PagePostings, HarvestError>>(expected.max(1));
        let mut tasks = JoinSet::new();

        for page in 0..total_pages {
            let ctx = Arc::clone(&ctx);
            let limit = Arc::clone(&page_limit);
            let token = page_cancel.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let result = tokio::select! {
                    _ = token.cancelled() => Err(HarvestError::Cancelled),
                    result = async {
                        match limit.acquire_owned().await {
                            Ok(_permit) => fetch_page(ctx, page).await,
                            Err(_) => Err(HarvestError::Cancelled),
                        }
                    } => result,
                };
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut pages = Vec::with_capacity(expected);
        while pages.len() < expected {
            let received = tokio::select! {
                _ = cancel.cancelled() => Err(HarvestError::Cancelled),
                received = rx.recv() => match received {
                    Some(result) => result,
                    None => Err(lost_task(&mut tasks).await),
                },
            };

            match received {
                Ok(page) => {
                    tracing::debug!(
                        "Received {} postings from page {} ({}/{})",
                        page.len(),
                        page.page,
                        pages.len() + 1,
                        expected
                    );
                    pages.push(page);
                }
                Err(e) => {
                    tracing::error!("Aborting scrape: {}", e);
                    page_cancel.cancel();
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(pages)
    }

    /// Concatenates per-page results into one collection
    fn merge(&self, mut pages: Vec<PagePostings>) -> JobCollection {
        if self.config.scraper.preserve_order {
            pages.sort_by_key(|page| page.page);
        }

        let total: usize = pages.iter().map(PagePostings::len).sum();
        let mut jobs = JobCollection::with_capacity(total);

        for mut page in pages {
            if self.config.scraper.preserve_order {
                page.postings.sort_by_key(|(index, _)| *index);
            }
            jobs.extend(page.postings.into_iter().map(|(_, posting)| posting));
        }

        jobs
    }
}

/// Runs a complete scrape with the given configuration
pub async fn run_scrape(
    config: Config,
    term: &str,
    cancel: CancellationToken,
) -> Result<ScrapeReport, HarvestError> {
    let harvester = Harvester::new(config)?;
    harvester.run(term, cancel).await
}
