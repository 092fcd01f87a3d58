use crate::config::types::{Config, OutputConfig, ScraperConfig, SelectorConfig, SiteConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

const MAX_CONCURRENCY: u32 = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_selector_config(&config.selectors)?;
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site contract
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("search-url", &config.search_url)?;
    validate_http_url("view-url", &config.view_url)?;

    if config.page_size < 1 {
        return Err(ConfigError::Validation("page-size must be >= 1".to_string()));
    }

    if config.link_sentinel.trim().is_empty() {
        return Err(ConfigError::Validation(
            "link-sentinel cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector compiles
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    let selectors = [
        ("pagination", &config.pagination),
        ("page-link", &config.page_link),
        ("card", &config.card),
        ("title", &config.title),
        ("location", &config.location),
        ("salary", &config.salary),
        ("summary", &config.summary),
    ];

    for (name, selector) in selectors {
        validate_selector(name, selector)?;
    }

    Ok(())
}

/// Validates scraper limits and timeouts
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_pages < 1 || config.max_concurrent_pages > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-pages must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.max_concurrent_pages
        )));
    }

    if config.max_concurrent_tasks < 1 || config.max_concurrent_tasks > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-tasks must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.max_concurrent_tasks
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation("user-agent cannot be empty".to_string()));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidSelector {
            name: name.to_string(),
            selector: selector.to_string(),
        })
}
