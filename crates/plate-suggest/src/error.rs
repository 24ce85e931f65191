use thiserror::Error;

use crate::document::DocumentError;
use crate::range::Position;

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("invalid range {from}..{to} for a document of length {len}")]
    InvalidRange {
        from: Position,
        to: Position,
        len: usize,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Failure reported by a suggestion source. The overlay renders these as an
/// empty result list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("suggestion lookup failed: {0}")]
    Failed(String),
    #[error("suggestion lookup was cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        FetchError::Failed(message.into())
    }
}
