//! Posting data model
//!
//! A [`Posting`] is the structured record pulled out of one result card.
//! Postings are built once by the extractor and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Column names of the CSV output, in field order
pub const HEADER: [&str; 5] = ["Link", "Title", "Location", "Salary", "Summary"];

/// A single job posting
///
/// `link` is never empty: it holds either a canonical view URL or the
/// configured sentinel. The remaining fields may be empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Posting {
    #[serde(rename = "Link")]
    link: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Salary")]
    salary: String,
    #[serde(rename = "Summary")]
    summary: String,
}

/// All postings gathered for one query
///
/// Treated as an unordered multiset; duplicates are kept.
pub type JobCollection = Vec<Posting>;

impl Posting {
    /// Creates a new posting
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
        salary: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            location: location.into(),
            salary: salary.into(),
            summary: summary.into(),
        }
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn salary(&self) -> &str {
        &self.salary
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the fields in [`HEADER`] order
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.link,
            &self.title,
            &self.location,
            &self.salary,
            &self.summary,
        ]
    }
}
