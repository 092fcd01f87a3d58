//! Search query URLs and page-count discovery

use crate::config::SiteConfig;
use crate::crawler::fetcher::fetch_document;
use crate::crawler::parser::{count_page_links, PageSelectors};
use crate::HarvestError;
use reqwest::Client;
use url::Url;

/// Query URL for one search term
#[derive(Debug, Clone)]
pub struct SearchQuery {
    base: Url,
    page_size: u32,
}

impl SearchQuery {
    /// Builds the base query URL (`q` and `limit` parameters) for a term
    ///
    /// The term is expected to be normalized already; it is only percent-encoded.
    pub fn new(site: &SiteConfig, term: &str) -> Result<Self, HarvestError> {
        let mut base = Url::parse(&site.search_url)?;
        base.query_pairs_mut()
            .append_pair("q", term)
            .append_pair("limit", &site.page_size.to_string());

        Ok(Self {
            base,
            page_size: site.page_size,
        })
    }

    /// The first results page, as used for page-count discovery
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the zero-based results page `page`
    pub fn page_url(&self, page: u32) -> Url {
        let start = u64::from(page) * u64::from(self.page_size);
        let mut url = self.base.clone();
        url.query_pairs_mut().append_pair("start", &start.to_string());
        url
    }
}

/// Fetches the first results page and counts the links in its pagination control
///
/// Returns 0 when the page has no pagination control.
pub async fn count_pages(
    client: &Client,
    query: &SearchQuery,
    selectors: &PageSelectors,
) -> Result<u32, HarvestError> {
    tracing::debug!("Counting pages at {}", query.base_url());
    let body = fetch_document(client, query.base_url()).await?;
    let pages = count_page_links(&body, selectors);
    tracing::debug!("Found {} result pages", pages);
    Ok(pages)
}
