// trustsync — Bundle error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Certificate decode error: {0}")]
    Decode(String),
}
