//! CSV table writer
//!
//! The header is written first. Every posting is then encoded by its own task
//! (bounded by a semaphore); encoded rows come back over a channel and a single
//! writer appends them to the file. There is no temp-file-and-rename step, so a
//! failed write leaves a partial file behind.

use crate::output::{OutputError, OutputResult};
use crate::posting::{JobCollection, HEADER};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Options controlling how rows are written
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Maximum number of encoding tasks running at once
    pub max_tasks: usize,

    /// Write rows in collection order instead of encoding-completion order
    pub ordered: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            max_tasks: 32,
            ordered: true,
        }
    }
}

/// Encodes one CSV record, newline-terminated, quoting fields where needed
pub fn encode_row(fields: &[&str]) -> OutputResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(fields)?;
    writer
        .into_inner()
        .map_err(|e| OutputError::Io(e.into_error()))
}

/// Encodes the fixed header row
pub fn encode_header() -> OutputResult<Vec<u8>> {
    encode_row(&HEADER)
}

/// Writes the header and one row per posting to `path`
///
/// # Arguments
///
/// * `postings` - The collection to write; consumed
/// * `path` - Output file, created or truncated
/// * `options` - Encoding concurrency and ordering
///
/// # Returns
///
/// * `Ok(())` - Every row was written and flushed
/// * `Err(OutputError)` - Opening, encoding or writing failed
pub async fn write_postings(
    postings: JobCollection,
    path: &Path,
    options: WriteOptions,
) -> OutputResult<()> {
    let file = File::create(path).await?;
    let mut out = BufWriter::new(file);

    out.write_all(&encode_header()?).await?;

    let expected = postings.len();
    let limit = Arc::new(Semaphore::new(options.max_tasks.max(1)));
    let (tx, mut rx) = mpsc::channel::<(usize, OutputResult<Vec<u8>>)>(expected.max(1));
    let mut tasks = JoinSet::new();

    for (index, posting) in postings.into_iter().enumerate() {
        let limit = Arc::clone(&limit);
        let tx = tx.clone();
        tasks.spawn(async move {
            let row = match limit.acquire_owned().await {
                Ok(_permit) => encode_row(&posting.fields()),
                Err(_) => return,
            };
            let _ = tx.send((index, row)).await;
        });
    }
    drop(tx);

    // Rows that arrived ahead of their turn when writing in order
    let mut pending: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
    let mut next = 0;
    let mut received = 0;

    while received < expected {
        let Some((index, row)) = rx.recv().await else {
            while let Some(result) = tasks.join_next().await {
                result?;
            }
            return Err(OutputError::Incomplete {
                written: next,
                expected,
            });
        };
        received += 1;
        let row = row?;

        if !options.ordered {
            out.write_all(&row).await?;
            next += 1;
            continue;
        }

        pending.insert(index, row);
        while let Some(row) = pending.remove(&next) {
            out.write_all(&row).await?;
            next += 1;
        }
    }

    out.flush().await?;
    tracing::debug!("Wrote {} rows to {}", next, path.display());
    Ok(())
}
