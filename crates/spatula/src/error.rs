use std::path::PathBuf;

use spatula_selector::{DocumentError, SelectorError};

use crate::page::PageState;
use crate::transport::HttpError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No explicit source, no derivation hook result and no URL on the input.
    #[error("{page}: no source could be resolved")]
    MissingSource { page: String },

    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// A transport error that no error hook consumed.
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("{page}: no response to extract from")]
    MissingResponse { page: String },

    /// Raised from item processing to drop a single list item.
    #[error("skipped item: {0}")]
    SkipItem(String),

    #[error("{page}: cannot {action} a page in state {state}")]
    Lifecycle {
        page: String,
        action: &'static str,
        state: PageState,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{} exists and is not empty", .0.display())]
    OutputNotEmpty(PathBuf),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Drops the list item being processed, see [`crate::PageContext::items`].
pub fn skip<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::SkipItem(msg.into()))
}
