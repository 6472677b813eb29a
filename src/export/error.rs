// trustsync — Export error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Unknown filename mode '{0}' — use 'dn' or 'uuid'")]
    UnknownFilenameMode(String),
}
