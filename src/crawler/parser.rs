//! Result page parsing and posting extraction
//!
//! This module turns result page markup into owned card fragments and
//! fragments into [`Posting`]s:
//! - Counting page links inside the pagination control
//! - Locating result cards
//! - Rebuilding canonical job links from the job-key parameter
//! - Extracting whitespace-normalized card fields

use crate::config::{SelectorConfig, SiteConfig};
use crate::posting::Posting;
use crate::text::normalize;
use crate::ConfigError;
use scraper::{Html, Selector};
use url::Url;

/// Query parameter prefixes that carry the job key
const JOB_KEY_MARKERS: [&str; 2] = ["?jk=", "&jk="];

/// Compiled selectors for the result page markup
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pagination: Selector,
    page_link: Selector,
    card: Selector,
    title: Selector,
    location: Selector,
    salary: Selector,
    summary: Selector,
}

impl PageSelectors {
    /// Compiles every selector in the configuration
    pub fn compile(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            pagination: compile("pagination", &config.pagination)?,
            page_link: compile("page-link", &config.page_link)?,
            card: compile("card", &config.card)?,
            title: compile("title", &config.title)?,
            location: compile("location", &config.location)?,
            salary: compile("salary", &config.salary)?,
            summary: compile("summary", &config.summary)?,
        })
    }
}

fn compile(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        name: name.to_string(),
        selector: selector.to_string(),
    })
}

/// One result card lifted out of a parsed page
///
/// Parsed documents cannot cross threads, so the card keeps its own markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFragment {
    /// Position of the card in document order
    pub index: usize,

    /// The card's `href` attribute, if any
    pub href: Option<String>,

    /// Outer HTML of the card
    pub html: String,
}

/// Builds canonical view links from job keys
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    view_url: Url,
    sentinel: String,
}

impl LinkBuilder {
    pub fn new(view_url: Url, sentinel: impl Into<String>) -> Self {
        Self {
            view_url,
            sentinel: sentinel.into(),
        }
    }

    /// Creates a link builder from the site configuration
    pub fn from_site(site: &SiteConfig) -> Result<Self, ConfigError> {
        let view_url = Url::parse(&site.view_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("view-url '{}': {}", site.view_url, e)))?;
        Ok(Self::new(view_url, site.link_sentinel.clone()))
    }

    /// Returns the canonical view link for `href`, or the sentinel when no job key is present
    ///
    /// The key is already query-encoded in `href` and is copied over as-is.
    pub fn link_for(&self, href: Option<&str>) -> String {
        match href.and_then(job_key) {
            Some(key) => {
                let mut url = self.view_url.clone();
                let query = match url.query() {
                    Some(existing) if !existing.is_empty() => format!("{}&jk={}", existing, key),
                    _ => format!("jk={}", key),
                };
                url.set_query(Some(&query));
                url.to_string()
            }
            None => self.sentinel.clone(),
        }
    }
}

/// Extracts the job key from an `href` value
///
/// The key starts after `?jk=` or `&jk=` and runs to the next `&` or `#`.
/// Empty keys are treated as missing.
pub fn job_key(href: &str) -> Option<&str> {
    let start = JOB_KEY_MARKERS
        .iter()
        .filter_map(|marker| href.find(marker).map(|pos| pos + marker.len()))
        .min()?;

    let key = href[start..].split(&['&', '#'][..]).next().unwrap_or_default();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Counts the page links inside the pagination control
///
/// Returns 0 when the page has no pagination control. If the control appears
/// more than once, the last one wins.
pub fn count_page_links(html: &str, selectors: &PageSelectors) -> u32 {
    let document = Html::parse_document(html);

    document
        .select(&selectors.pagination)
        .last()
        .map(|control| control.select(&selectors.page_link).count() as u32)
        .unwrap_or(0)
}

/// Locates every result card on a page, in document order
pub fn locate_cards(html: &str, selectors: &PageSelectors) -> Vec<CardFragment> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.card)
        .enumerate()
        .map(|(index, card)| CardFragment {
            index,
            href: card.value().attr("href").map(str::to_string),
            html: card.html(),
        })
        .collect()
}

/// Extracts a posting from a single card fragment
///
/// Never fails: missing sub-fragments yield empty strings and a missing
/// job key yields the sentinel link.
pub fn extract_posting(
    card: &CardFragment,
    selectors: &PageSelectors,
    links: &LinkBuilder,
) -> Posting {
    let fragment = Html::parse_fragment(&card.html);

    let text_of = |selector: &Selector| -> String {
        let raw: String = fragment
            .select(selector)
            .flat_map(|element| element.text())
            .collect();
        normalize(&raw)
    };

    Posting::new(
        links.link_for(card.href.as_deref()),
        text_of(&selectors.title),
        text_of(&selectors.location),
        text_of(&selectors.salary),
        text_of(&selectors.summary),
    )
}
