// trustsync — Store Module
//
// SQLite-backed catalog of declared sources and certificate records. The
// certificate table is keyed by distinguished name; upserts are atomic per
// record, which is what lets an interrupted pass leave a consistent store.

mod db;
mod error;
mod models;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use models::{CertificateRecord, CertificateSummary, NewCertificate, Source, UpsertOutcome};
pub use repository::{CertStore, SqliteCertStore};
