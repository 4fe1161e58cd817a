//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use geoquest_core::QuizError;
use geoquest_core::model::SessionSummaryError;
use storage::repository::StorageError;

/// Errors emitted by the game services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error("no questions available for this level")]
    NoQuestions,
    #[error("loading questions timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the remote document store client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteStoreError {
    #[error("invalid remote store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("remote store request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("malformed remote document: {0}")]
    Decode(String),
}

impl From<RemoteStoreError> for StorageError {
    fn from(err: RemoteStoreError) -> Self {
        match err {
            RemoteStoreError::Decode(msg) => StorageError::Serialization(msg),
            other => StorageError::Connection(other.to_string()),
        }
    }
}
