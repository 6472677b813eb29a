// trustsync — Transport Module
//
// Fetches bundle text from the three locator kinds the reconciler accepts:
// http(s) URLs, local file paths, and `-` for standard input. Timeouts and
// retries are the HTTP client's concern; any failure here ends the pass.

use std::path::PathBuf;

use thiserror::Error;
use tokio::io::AsyncReadExt;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read standard input: {0}")]
    Stdin(std::io::Error),
}

/// Where bundle bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Url(String),
    Stdin,
    Path(PathBuf),
}

impl Locator {
    /// Classify a raw locator string. `-` is the stdin sentinel; anything
    /// that is not an http(s) URL is treated as a filesystem path.
    pub fn parse(raw: &str) -> Self {
        if raw == "-" {
            Locator::Stdin
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Locator::Url(raw.to_string())
        } else {
            Locator::Path(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Url(url) => write!(f, "{}", url),
            Locator::Stdin => write!(f, "-"),
            Locator::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetch the full text behind a locator. Each call is one suspension point;
/// callers fetch origins strictly one after another.
pub async fn fetch(locator: &Locator) -> Result<String, TransportError> {
    match locator {
        Locator::Url(url) => {
            tracing::debug!(url = %url, "Fetching bundle over HTTP");
            let body = reqwest::get(url)
                .await?
                .error_for_status()?
                .text()
                .await?;
            Ok(body)
        }
        Locator::Path(path) => {
            tracing::debug!(path = %path.display(), "Reading bundle from file");
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| TransportError::File {
                    path: path.display().to_string(),
                    source,
                })
        }
        Locator::Stdin => {
            tracing::debug!("Reading bundle from standard input");
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .map_err(TransportError::Stdin)?;
            Ok(buf)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
