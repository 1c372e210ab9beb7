//! Errors raised while fetching a grants payload.

use thiserror::Error;

/// A load that could not produce a payload at all.
///
/// The `Display` text is what the store keeps as its `Failed` reason and what
/// the user eventually sees.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("failed to parse grants response: {0}")]
    Parse(#[from] serde_json::Error),
}
