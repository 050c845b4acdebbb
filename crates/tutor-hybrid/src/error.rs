use std::time::Duration;
use thiserror::Error;

/// Why a retrieval produced no excerpts.
///
/// An empty filtered view is not an error, and neither is an index hit that
/// falls outside the view; both just shorten the result.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Oops! Something went wrong with the learning tool: {0}")]
    ConfigurationUnavailable(String),

    #[error("Uh-oh! Trouble with the magic words: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Vector search failed: {0}")]
    IndexSearch(#[source] anyhow::Error),

    #[error("{stage} timed out after {elapsed:?}")]
    Timeout { stage: &'static str, elapsed: Duration },
}
