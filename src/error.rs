// trustsync — Top-level error types
//
// Aggregates errors from the store, bundle, transport, sync, and export
// modules into a single error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all trustsync operations.
#[derive(Debug, Error)]
pub enum TrustsyncError {
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Bundle error: {0}")]
    Bundle(#[from] crate::bundle::BundleError),

    #[error("Transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Sync error: {0}")]
    Sync(#[from] crate::sync::SyncError),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::ExportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrustsyncError>;
