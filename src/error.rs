//! Error types for the search engine

use crate::search::SearchResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("at least {required} signatures are required, got {actual}")]
    TooFewSignatures { required: usize, actual: usize },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("no zero-error candidate after {cycles} cycles (best error {})", best.error)]
    Exhausted { cycles: u64, best: Box<SearchResult> },
}

/// Failures while reading or decoding a signature set.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot read {origin}: {source}")]
    Read { origin: String, source: std::io::Error },

    #[error("input is neither a JSON array nor CSV with an r,s,z header")]
    UnknownFormat,

    #[error("malformed JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV row {row}: {source}")]
    Csv { row: usize, source: csv::Error },

    #[error("signature #{index}: {reason}")]
    Value { index: usize, reason: String },

    #[error("input holds {actual} signature(s); at least {required} are needed")]
    TooFew { required: usize, actual: usize },
}
