//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper:
//! - Building HTTP clients with the configured user agent and deadlines
//! - GET requests for result pages
//! - Mapping transport, timeout and status failures to [`HarvestError`]

use crate::config::ScraperConfig;
use crate::HarvestError;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The scraper configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use job_harvest::config::ScraperConfig;
/// use job_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ScraperConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a results page and returns its body
///
/// Any transport failure or non-2xx status is an error; there are no retries.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// * `Ok(String)` - The response body
/// * `Err(HarvestError::Timeout)` - The request exceeded the client deadline
/// * `Err(HarvestError::Status)` - The server answered with a non-success status
/// * `Err(HarvestError::Http)` - Any other transport failure
pub async fn fetch_document(client: &Client, url: &Url) -> Result<String, HarvestError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvestError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| classify_error(url, e))
}

/// Maps a reqwest error onto the crate error type
fn classify_error(url: &Url, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
