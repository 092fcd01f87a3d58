//! Output module for writing scraped postings
//!
//! This module handles:
//! - Encoding postings as CSV rows
//! - Writing the header and rows to the output file

mod table;

pub use table::{encode_header, encode_row, write_postings, WriteOptions};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row encoding task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Row encoding was interrupted after {written} of {expected} rows")]
    Incomplete { written: usize, expected: usize },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
