use providers::ProviderError;
use thiserror::Error;

/// Failure of a store call. Both variants are recoverable by retrying; a
/// retrieval that fails never yields a partially filled record set.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vector store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<ProviderError> for StoreError {
    fn from(e: ProviderError) -> Self {
        if e.is_unreachable() {
            StoreError::Unavailable(e.to_string())
        } else {
            StoreError::QueryFailed(e.to_string())
        }
    }
}
