// trustsync — Database Management
//
// Opens and initializes the SQLite catalog database. Two tables: `sources`
// (declared bundle origins) and `certificates` (the authoritative record
// set, keyed by distinguished name).

use rusqlite::Connection;

use super::StoreError;

/// Wrapper around the SQLite catalog connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the catalog database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run schema migrations to create or update tables.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS sources (
                id              TEXT PRIMARY KEY,
                locator         TEXT NOT NULL,
                last_updated    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS certificates (
                distinguished_name  TEXT PRIMARY KEY,
                slug                TEXT NOT NULL UNIQUE,
                valid_from          TEXT NOT NULL,
                valid_to            TEXT NOT NULL,
                last_updated        TEXT NOT NULL,
                pem_body            TEXT NOT NULL,
                origin_locator      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_certificates_origin
                ON certificates(origin_locator);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
