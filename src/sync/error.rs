// trustsync — Sync error types

use thiserror::Error;

use crate::bundle::BundleError;
use crate::store::StoreError;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("Certificate from {origin} has no usable subject fields — refusing to store an empty identity")]
    EmptyIdentity { origin: String },

    #[error("Refusing to remove {stale} of {total} stored certificates (over the 20% safety threshold); re-run with --force to override")]
    RemovalThreshold { stale: usize, total: usize },
}
