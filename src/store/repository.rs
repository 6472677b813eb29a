// trustsync — Catalog Store Repository
//
// Implements the two-table catalog the reconciler and the exporters work
// against. Key design decision: `upsert` matches on the distinguished name
// only — a record with the same subject identity is overwritten in place
// (later import wins), while a slug that is already held by a *different*
// distinguished name is surfaced as a collision instead of being resolved
// silently.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::db::Database;
use super::models::{CertificateRecord, CertificateSummary, NewCertificate, Source, UpsertOutcome};
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over catalog storage operations. Two tables: declared
/// sources and the certificate record set.
pub trait CertStore {
    /// Insert or overwrite a certificate, matching by distinguished name.
    /// All non-key fields are replaced; `last_updated` is stamped with
    /// `touched_at` (the pass-start time) for every touched record.
    fn upsert(
        &self,
        cert: NewCertificate,
        touched_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError>;

    /// All certificate records, ordered by distinguished name ascending.
    fn find_all(&self) -> Result<Vec<CertificateRecord>, StoreError>;

    /// Look up one certificate by its distinguished name.
    fn find_one(&self, distinguished_name: &str) -> Result<Option<CertificateRecord>, StoreError>;

    /// Listing view of every record, ordered by distinguished name.
    fn list(&self) -> Result<Vec<CertificateSummary>, StoreError>;

    /// Remove a certificate by distinguished name. Returns true if it existed.
    fn remove(&self, distinguished_name: &str) -> Result<bool, StoreError>;

    /// Remove every certificate record. Returns the number removed.
    fn clear(&self) -> Result<usize, StoreError>;

    /// Number of certificate records currently persisted.
    fn count(&self) -> Result<usize, StoreError>;

    /// Declare a source, or update the locator of an existing declaration.
    fn upsert_source(
        &self,
        id: &str,
        locator: &str,
        touched_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// All declared sources, ordered by id.
    fn find_sources(&self) -> Result<Vec<Source>, StoreError>;

    /// Look up one declared source.
    fn find_source(&self, id: &str) -> Result<Option<Source>, StoreError>;

    /// Remove a source declaration. Returns true if it existed.
    fn remove_source(&self, id: &str) -> Result<bool, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteCertStore<'a> {
    db: &'a Database,
}

impl<'a> SqliteCertStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a certificate row from the database.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CertificateRecord> {
        Ok(CertificateRecord {
            distinguished_name: row.get(0)?,
            slug: row.get(1)?,
            valid_from: Self::parse_timestamp(row, 2)?,
            valid_to: Self::parse_timestamp(row, 3)?,
            last_updated: Self::parse_timestamp(row, 4)?,
            pem_body: row.get(5)?,
            origin_locator: row.get(6)?,
        })
    }

    /// Parse a summary row (no PEM body).
    fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<CertificateSummary> {
        Ok(CertificateSummary {
            distinguished_name: row.get(0)?,
            slug: row.get(1)?,
            valid_from: Self::parse_timestamp(row, 2)?,
            valid_to: Self::parse_timestamp(row, 3)?,
            last_updated: Self::parse_timestamp(row, 4)?,
            origin_locator: row.get(5)?,
        })
    }

    fn row_to_source(row: &rusqlite::Row<'_>) -> rusqlite::Result<Source> {
        Ok(Source {
            id: row.get(0)?,
            locator: row.get(1)?,
            last_updated: Self::parse_timestamp(row, 2)?,
        })
    }

    fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }
}

impl<'a> CertStore for SqliteCertStore<'a> {
    fn upsert(
        &self,
        cert: NewCertificate,
        touched_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        // A slug already held by a different distinguished name is a defect
        // to surface, never something to resolve by renaming.
        let holder: Option<String> = self
            .db
            .conn()
            .query_row(
                "SELECT distinguished_name FROM certificates
                 WHERE slug = ?1 AND distinguished_name != ?2",
                params![cert.slug, cert.distinguished_name],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(existing) = holder {
            return Err(StoreError::SlugCollision {
                slug: cert.slug,
                existing,
                incoming: cert.distinguished_name,
            });
        }

        let previous = self.find_one(&cert.distinguished_name)?;
        let outcome = match &previous {
            None => UpsertOutcome::Inserted,
            Some(prev) => UpsertOutcome::Updated {
                pem_changed: prev.pem_body != cert.pem_body,
            },
        };

        self.db.conn().execute(
            "INSERT INTO certificates
                (distinguished_name, slug, valid_from, valid_to,
                 last_updated, pem_body, origin_locator)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(distinguished_name) DO UPDATE SET
                slug = excluded.slug,
                valid_from = excluded.valid_from,
                valid_to = excluded.valid_to,
                last_updated = excluded.last_updated,
                pem_body = excluded.pem_body,
                origin_locator = excluded.origin_locator",
            params![
                cert.distinguished_name,
                cert.slug,
                cert.valid_from.to_rfc3339(),
                cert.valid_to.to_rfc3339(),
                touched_at.to_rfc3339(),
                cert.pem_body,
                cert.origin_locator,
            ],
        )?;

        tracing::debug!(
            distinguished_name = %cert.distinguished_name,
            origin = %cert.origin_locator,
            outcome = ?outcome,
            "Certificate upserted"
        );

        Ok(outcome)
    }

    fn find_all(&self) -> Result<Vec<CertificateRecord>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT distinguished_name, slug, valid_from, valid_to,
                    last_updated, pem_body, origin_locator
             FROM certificates ORDER BY distinguished_name ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    fn find_one(&self, distinguished_name: &str) -> Result<Option<CertificateRecord>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT distinguished_name, slug, valid_from, valid_to,
                    last_updated, pem_body, origin_locator
             FROM certificates WHERE distinguished_name = ?1",
        )?;

        let record = stmt
            .query_row(params![distinguished_name], Self::row_to_record)
            .optional()?;

        Ok(record)
    }

    fn list(&self) -> Result<Vec<CertificateSummary>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT distinguished_name, slug, valid_from, valid_to,
                    last_updated, origin_locator
             FROM certificates ORDER BY distinguished_name ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_summary)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }

        Ok(summaries)
    }

    fn remove(&self, distinguished_name: &str) -> Result<bool, StoreError> {
        let affected = self.db.conn().execute(
            "DELETE FROM certificates WHERE distinguished_name = ?1",
            params![distinguished_name],
        )?;

        if affected > 0 {
            tracing::info!(distinguished_name = %distinguished_name, "Certificate removed");
        }

        Ok(affected > 0)
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let affected = self.db.conn().execute("DELETE FROM certificates", [])?;
        tracing::info!(removed = affected, "Certificate catalog cleared");
        Ok(affected)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .db
            .conn()
            .query_row("SELECT count(*) FROM certificates", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn upsert_source(
        &self,
        id: &str,
        locator: &str,
        touched_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.db.conn().execute(
            "INSERT INTO sources (id, locator, last_updated)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                locator = excluded.locator,
                last_updated = excluded.last_updated",
            params![id, locator, touched_at.to_rfc3339()],
        )?;

        tracing::info!(source = %id, locator = %locator, "Source declared");
        Ok(())
    }

    fn find_sources(&self) -> Result<Vec<Source>, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT id, locator, last_updated FROM sources ORDER BY id ASC")?;

        let rows = stmt.query_map([], Self::row_to_source)?;

        let mut sources = Vec::new();
        for row in rows {
            sources.push(row?);
        }

        Ok(sources)
    }

    fn find_source(&self, id: &str) -> Result<Option<Source>, StoreError> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT id, locator, last_updated FROM sources WHERE id = ?1")?;

        let source = stmt.query_row(params![id], Self::row_to_source).optional()?;

        Ok(source)
    }

    fn remove_source(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM sources WHERE id = ?1", params![id])?;

        if affected > 0 {
            tracing::info!(source = %id, "Source removed");
        }

        Ok(affected > 0)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
