// trustsync — Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Slug collision: '{slug}' is already held by '{existing}' but was derived for '{incoming}'")]
    SlugCollision {
        slug: String,
        existing: String,
        incoming: String,
    },

    #[error("Database not initialized — run `trustsync init` first")]
    NotInitialized,

    #[error("{0}")]
    Other(String),
}
