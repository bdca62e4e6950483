use thiserror::Error;

/// Failures surfaced by the entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no entry with id {id}")]
    NotFound { id: String },

    #[error("an entry with key {key} already exists")]
    DuplicateKey { key: String },

    #[error(transparent)]
    Storage(anyhow::Error),
}

impl StoreError {
    /// Whether retrying the same write could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(other) => StoreError::Storage(other),
        }
    }
}
