//! Page fetcher: one results page in, one list of postings out
//!
//! The page is fetched and its cards are lifted out as owned fragments. Each
//! fragment is handed to an extraction task on the blocking pool; the tasks
//! report back over a channel and the page waits for exactly one posting per card.

use crate::crawler::fetcher::fetch_document;
use crate::crawler::pages::SearchQuery;
use crate::crawler::parser::{extract_posting, locate_cards, LinkBuilder, PageSelectors};
use crate::posting::Posting;
use crate::HarvestError;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Everything a page task needs, shared between all pages of a scrape
pub struct PageContext {
    pub client: Client,
    pub query: SearchQuery,
    pub selectors: Arc<PageSelectors>,
    pub links: Arc<LinkBuilder>,

    /// Caps the number of extraction tasks running at once
    pub task_limit: Arc<Semaphore>,
}

/// Postings extracted from one results page
#[derive(Debug, Clone)]
pub struct PagePostings {
    /// Zero-based page index
    pub page: u32,

    /// `(card index, posting)` pairs in extraction-completion order
    pub postings: Vec<(usize, Posting)>,
}

impl PagePostings {
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Fetches a single results page and extracts all of its postings
///
/// # Arguments
///
/// * `ctx` - Shared scrape context
/// * `page` - Zero-based page index
///
/// # Returns
///
/// * `Ok(PagePostings)` - One posting per card found on the page
/// * `Err(HarvestError)` - The request failed or an extraction task died
pub async fn fetch_page(ctx: Arc<PageContext>, page: u32) -> Result<PagePostings, HarvestError> {
    let url = ctx.query.page_url(page);
    tracing::debug!("Requesting {}", url);

    let body = fetch_document(&ctx.client, &url).await?;
    let cards = locate_cards(&body, &ctx.selectors);
    drop(body);

    let expected = cards.len();
    tracing::debug!("Page {} has {} result cards", page, expected);

    let (tx, mut rx) = mpsc::channel::<(usize, Posting)>(expected.max(1));
    let mut tasks = JoinSet::new();

    for card in cards {
        let permit = ctx
            .task_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| HarvestError::Cancelled)?;
        let tx = tx.clone();
        let selectors = Arc::clone(&ctx.selectors);
        let links = Arc::clone(&ctx.links);

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let posting = extract_posting(&card, &selectors, &links);
            tracing::trace!("Extracted card {} on page {}: {}", card.index, page, posting.link());
            // Receiver only goes away when the page itself was abandoned
            let _ = tx.blocking_send((card.index, posting));
        });
    }
    drop(tx);

    let mut postings = Vec::with_capacity(expected);
    while postings.len() < expected {
        match rx.recv().await {
            Some(item) => postings.push(item),
            None => return Err(lost_task(&mut tasks).await),
        }
    }

    Ok(PagePostings { page, postings })
}

/// Finds out why a fan-in channel closed before every task reported
pub(crate) async fn lost_task(tasks: &mut JoinSet<()>) -> HarvestError {
    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            return HarvestError::Task(e);
        }
    }
    HarvestError::Cancelled
}
