use serde::Deserialize;

/// Main configuration structure for Job-Harvest
///
/// Every section has defaults, so an empty file (or no file at all)
/// describes the built-in target site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub selectors: SelectorConfig,
    pub scraper: ScraperConfig,
    pub output: OutputConfig,
}

/// Target site URL contract
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Search endpoint; receives the `q`, `limit` and `start` query parameters
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Detail page endpoint; receives the `jk` job-key query parameter
    #[serde(rename = "view-url")]
    pub view_url: String,

    /// Number of results per page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Link value used when a card carries no job key
    #[serde(rename = "link-sentinel")]
    pub link_sentinel: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search_url: "https://kr.indeed.com/jobs".to_string(),
            view_url: "https://kr.indeed.com/viewjob".to_string(),
            page_size: 50,
            link_sentinel: "Couldn't extract link".to_string(),
        }
    }
}

/// CSS selectors describing the result page markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Pagination control container
    pub pagination: String,

    /// Page links counted inside the pagination control
    #[serde(rename = "page-link")]
    pub page_link: String,

    /// One result card per posting
    pub card: String,

    pub title: String,
    pub location: String,
    pub salary: String,
    pub summary: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            pagination: ".pagination".to_string(),
            page_link: "a".to_string(),
            card: ".tapItem".to_string(),
            title: ".jobTitle>span".to_string(),
            location: ".companyLocation".to_string(),
            salary: ".salary-snippet".to_string(),
            summary: ".job-snippet".to_string(),
        }
    }
}

/// What to do when a results page has no pagination control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPagination {
    /// Treat the result set as zero pages (header-only output)
    #[default]
    Empty,
    /// Treat the result set as a single page
    SinglePage,
}

/// Scraper behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Maximum number of result pages fetched at once
    #[serde(rename = "max-concurrent-pages")]
    pub max_concurrent_pages: u32,

    /// Maximum number of extraction or row-encoding tasks running at once
    #[serde(rename = "max-concurrent-tasks")]
    pub max_concurrent_tasks: u32,

    /// Overall deadline for a single HTTP request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Deadline for establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    #[serde(rename = "missing-pagination")]
    pub missing_pagination: MissingPagination,

    /// Sort postings into document order before writing
    #[serde(rename = "preserve-order")]
    pub preserve_order: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: 8,
            max_concurrent_tasks: 32,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: concat!("job-harvest/", env!("CARGO_PKG_VERSION")).to_string(),
            missing_pagination: MissingPagination::Empty,
            preserve_order: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the CSV file
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "jobs.csv".to_string(),
        }
    }
}
