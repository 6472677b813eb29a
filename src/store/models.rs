// trustsync — Catalog data models
//
// A `CertificateRecord` is keyed by its derived distinguished name; the slug
// is a filesystem-safe derivative that must stay unique across the catalog.
// Records are only ever created or refreshed by a reconciliation pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared bundle origin. `last_updated` reflects the last time the
/// declaration itself was touched, not the last sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub locator: String,
    pub last_updated: DateTime<Utc>,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.id, self.locator)
    }
}

/// The full certificate record, stored in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Canonical subject identity, primary key across the whole store.
    pub distinguished_name: String,
    /// Filesystem-safe derivative of the distinguished name, unique.
    pub slug: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// Wall-clock start time of the reconciliation pass that last touched
    /// this record.
    pub last_updated: DateTime<Utc>,
    /// Canonical single-certificate PEM: exactly one BEGIN/END CERTIFICATE
    /// pair, `\n` line endings, no leading whitespace.
    pub pem_body: String,
    pub origin_locator: String,
}

impl fmt::Display for CertificateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (valid {} – {})",
            self.distinguished_name,
            self.valid_from.format("%Y-%m-%d"),
            self.valid_to.format("%Y-%m-%d"),
        )
    }
}

/// Input struct for an upsert. The repository stamps `last_updated` with the
/// pass-start time supplied by the reconciler.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub distinguished_name: String,
    pub slug: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub pem_body: String,
    pub origin_locator: String,
}

/// A lightweight view of a certificate, used for listing.
/// Never contains the PEM body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub distinguished_name: String,
    pub slug: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub origin_locator: String,
}

impl fmt::Display for CertificateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (valid {} – {})",
            self.distinguished_name,
            self.valid_from.format("%Y-%m-%d"),
            self.valid_to.format("%Y-%m-%d"),
        )
    }
}

/// What an upsert did to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// An existing record with the same distinguished name was overwritten.
    /// `pem_changed` is true when the stored PEM bytes differ from the
    /// incoming ones — the later import wins either way.
    Updated { pem_changed: bool },
}

// ─── Tests ───────────────────────────────────────────────────────────────────
