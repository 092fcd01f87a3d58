//! Text normalization helpers
//!
//! Free text pulled out of result cards is full of layout whitespace. Everything
//! that ends up in a [`Posting`](crate::Posting) goes through [`normalize`].

/// Trims the string and collapses every internal whitespace run to a single space
///
/// The function is total and idempotent.
///
/// # Example
///
/// ```
/// use job_harvest::normalize;
///
/// assert_eq!(normalize("  Senior \n\t Rust   Engineer "), "Senior Rust Engineer");
/// ```
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prepares a user-supplied search term for the query URL
///
/// The term is normalized and lower-cased before it reaches the scraper.
pub fn prepare_term(raw: &str) -> String {
    normalize(raw).to_lowercase()
}
