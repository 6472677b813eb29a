// trustsync — Store Reconciler
//
// One reconciliation pass: snapshot the persisted identity set, then per
// origin fetch → scan → decode → derive → upsert, then sweep whatever was
// not refreshed. Only the deletion step is guarded; upserts committed
// before a failure stand, which is what makes re-running a pass safe.
//
// Origins are processed strictly one after another. Every upsert is an
// independent atomic store operation, so an interrupted pass never leaves
// a half-written record behind.

use std::collections::BTreeSet;

use chrono::Utc;

use crate::bundle::{derive_identity, BundleError, CertificateDecoder, PemScanner};
use crate::store::{CertStore, NewCertificate, UpsertOutcome};
use crate::transport::{self, Locator};

use super::SyncError;

/// Highest share of the persisted set a single pass may delete without the
/// force override.
const REMOVAL_THRESHOLD: f64 = 0.20;

/// What one reconciliation pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub origins: usize,
    pub scanned: usize,
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Merges fetched bundle snapshots into the catalog.
pub struct Reconciler<'a, S: CertStore, D: CertificateDecoder> {
    store: &'a S,
    decoder: D,
    scanner: PemScanner,
    force: bool,
}

impl<'a, S: CertStore, D: CertificateDecoder> Reconciler<'a, S, D> {
    pub fn new(store: &'a S, decoder: D, force: bool) -> Result<Self, BundleError> {
        Ok(Self {
            store,
            decoder,
            scanner: PemScanner::new()?,
            force,
        })
    }

    /// Run one full pass over the given origins.
    pub async fn run(&self, origins: &[Locator]) -> Result<PassReport, SyncError> {
        let pass_start = Utc::now();

        // Everything persisted before the pass is a deletion candidate
        // until some origin refreshes it.
        let mut candidate_obsolete: BTreeSet<String> = self
            .store
            .list()?
            .into_iter()
            .map(|summary| summary.distinguished_name)
            .collect();
        let persisted_before = candidate_obsolete.len();

        let mut report = PassReport {
            origins: origins.len(),
            ..PassReport::default()
        };

        for locator in origins {
            let origin = locator.to_string();
            let text = transport::fetch(locator).await?;

            let mut origin_count = 0usize;
            for block in self.scanner.scan(&text) {
                let decoded = self.decoder.decode(&block)?;
                let identity = derive_identity(&decoded.subject).ok_or_else(|| {
                    SyncError::EmptyIdentity {
                        origin: origin.clone(),
                    }
                })?;

                let outcome = self.store.upsert(
                    NewCertificate {
                        distinguished_name: identity.distinguished_name.clone(),
                        slug: identity.slug,
                        valid_from: decoded.valid_from,
                        valid_to: decoded.valid_to,
                        pem_body: block,
                        origin_locator: origin.clone(),
                    },
                    pass_start,
                )?;

                candidate_obsolete.remove(&identity.distinguished_name);
                origin_count += 1;
                report.scanned += 1;
                match outcome {
                    UpsertOutcome::Inserted => report.inserted += 1,
                    UpsertOutcome::Updated { pem_changed } => {
                        report.updated += 1;
                        if pem_changed {
                            // Same subject identity, different bytes: the
                            // later import wins, but make it visible.
                            tracing::debug!(
                                distinguished_name = %identity.distinguished_name,
                                origin = %origin,
                                "Replaced certificate with differing PEM bytes"
                            );
                        }
                    }
                }
            }

            tracing::info!(origin = %origin, certificates = origin_count, "Origin reconciled");
        }

        if !candidate_obsolete.is_empty() {
            let removal_ratio = candidate_obsolete.len() as f64 / persisted_before as f64;
            if removal_ratio > REMOVAL_THRESHOLD && !self.force {
                tracing::warn!(
                    stale = candidate_obsolete.len(),
                    total = persisted_before,
                    "Obsolescence sweep aborted by safety threshold"
                );
                return Err(SyncError::RemovalThreshold {
                    stale: candidate_obsolete.len(),
                    total: persisted_before,
                });
            }

            for distinguished_name in &candidate_obsolete {
                self.store.remove(distinguished_name)?;
                report.removed += 1;
            }
        }

        tracing::info!(
            origins = report.origins,
            scanned = report.scanned,
            inserted = report.inserted,
            updated = report.updated,
            removed = report.removed,
            "Reconciliation pass complete"
        );

        Ok(report)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{DecodedCertificate, SubjectAttributes};
    use crate::store::{Database, SqliteCertStore};
    use chrono::{DateTime, TimeZone, Utc};
    use std::io::Write;
    use std::path::Path;

    /// Test decoder: treats the block body as the literal common name, so
    /// bundles can be authored as plain text without real DER.
    struct BodyDecoder;

    impl CertificateDecoder for BodyDecoder {
        fn decode(&self, pem_block: &str) -> Result<DecodedCertificate, BundleError> {
            let cn = pem_block
                .lines()
                .filter(|line| !line.starts_with("-----"))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(DecodedCertificate {
                subject: SubjectAttributes {
                    common_name: (!cn.is_empty()).then_some(cn),
                    ..SubjectAttributes::default()
                },
                valid_from: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                valid_to: Utc.with_ymd_and_hms(2040, 1, 1, 0, 0, 0).unwrap(),
            })
        }
    }

    fn bundle_of(names: &[&str]) -> String {
        names
            .iter()
            .map(|name| {
                format!("-----BEGIN CERTIFICATE-----\n{name}\n-----END CERTIFICATE-----\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn write_bundle(dir: &Path, file: &str, names: &[&str]) -> Locator {
        let path = dir.join(file);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{}", bundle_of(names)).unwrap();
        Locator::Path(path)
    }

    fn snapshot(store: &SqliteCertStore<'_>) -> Vec<(String, String, String, DateTime<Utc>)> {
        store
            .find_all()
            .unwrap()
            .into_iter()
            .map(|r| (r.distinguished_name, r.slug, r.pem_body, r.valid_to))
            .collect()
    }

    #[tokio::test]
    async fn test_pass_inserts_scanned_certificates() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let origin = write_bundle(dir.path(), "roots.pem", &["Alpha Root", "Beta Root"]);

        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();
        let report = reconciler.run(&[origin]).await.unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.removed, 0);

        let dns: Vec<String> = store
            .find_all()
            .unwrap()
            .into_iter()
            .map(|r| r.distinguished_name)
            .collect();
        assert_eq!(dns, vec!["CN=Alpha Root", "CN=Beta Root"]);
    }

    #[tokio::test]
    async fn test_reconciling_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let origin = write_bundle(dir.path(), "roots.pem", &["Alpha Root", "Beta Root"]);

        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();
        reconciler.run(&[origin.clone()]).await.unwrap();
        let first = snapshot(&store);

        let report = reconciler.run(&[origin]).await.unwrap();
        let second = snapshot(&store);

        assert_eq!(first, second, "Second pass must leave identical records");
        assert_eq!(report.inserted, 0);
        assert_eq!(report.updated, 2);
        assert_eq!(report.removed, 0);
    }

    #[tokio::test]
    async fn test_origin_locator_and_pass_time_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let origin = write_bundle(dir.path(), "roots.pem", &["Alpha Root"]);

        let before = Utc::now();
        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();
        reconciler.run(&[origin.clone()]).await.unwrap();
        let after = Utc::now();

        let record = store.find_one("CN=Alpha Root").unwrap().unwrap();
        assert_eq!(record.origin_locator, origin.to_string());
        assert!(record.last_updated >= before && record.last_updated <= after);
    }

    #[tokio::test]
    async fn test_multiple_origins_accumulate_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);

        let first = write_bundle(dir.path(), "a.pem", &["Alpha Root"]);
        let second = write_bundle(dir.path(), "b.pem", &["Beta Root"]);

        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();
        let report = reconciler.run(&[first, second]).await.unwrap();

        assert_eq!(report.origins, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sweep_over_threshold_fails_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();

        // Seed ten records
        let names: Vec<String> = (0..10).map(|i| format!("Root {i:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let seed = write_bundle(dir.path(), "seed.pem", &name_refs);
        reconciler.run(&[seed]).await.unwrap();

        // Fresh data covers only seven of them: 3/10 = 30% > 20%
        let overlap = write_bundle(dir.path(), "partial.pem", &name_refs[..7]);
        let err = reconciler.run(&[overlap]).await.unwrap_err();

        match err {
            SyncError::RemovalThreshold { stale, total } => {
                assert_eq!(stale, 3);
                assert_eq!(total, 10);
            }
            other => panic!("Expected RemovalThreshold, got {:?}", other),
        }

        // Nothing was deleted; the seven refreshed upserts stand.
        assert_eq!(store.count().unwrap(), 10);
    }

    #[tokio::test]
    async fn test_sweep_under_threshold_deletes_stale_records() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();

        let names: Vec<String> = (0..10).map(|i| format!("Root {i:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let seed = write_bundle(dir.path(), "seed.pem", &name_refs);
        reconciler.run(&[seed]).await.unwrap();

        // One of ten stale: 10% is under the threshold
        let overlap = write_bundle(dir.path(), "partial.pem", &name_refs[..9]);
        let report = reconciler.run(&[overlap]).await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(store.count().unwrap(), 9);
        assert!(store.find_one("CN=Root 09").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_force_overrides_removal_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);

        let names: Vec<String> = (0..10).map(|i| format!("Root {i:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let seed = write_bundle(dir.path(), "seed.pem", &name_refs);
        Reconciler::new(&store, BodyDecoder, false)
            .unwrap()
            .run(&[seed])
            .await
            .unwrap();

        let overlap = write_bundle(dir.path(), "partial.pem", &name_refs[..7]);
        let report = Reconciler::new(&store, BodyDecoder, true)
            .unwrap()
            .run(&[overlap])
            .await
            .unwrap();

        assert_eq!(report.removed, 3);
        assert_eq!(store.count().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_prior_origin_upserts() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);

        let good = write_bundle(dir.path(), "good.pem", &["Alpha Root"]);
        let missing = Locator::Path(dir.path().join("does-not-exist.pem"));

        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();
        let err = reconciler.run(&[good, missing]).await.unwrap_err();

        assert!(matches!(err, SyncError::Transport(_)));
        // Partial progress is intentional: the first origin's upsert stands.
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_identity_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);

        // A block with no body lines decodes to a subject with no fields.
        let path = dir.path().join("empty.pem");
        std::fs::write(
            &path,
            "-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n",
        )
        .unwrap();

        let reconciler = Reconciler::new(&store, BodyDecoder, false).unwrap();
        let err = reconciler
            .run(&[Locator::Path(path)])
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::EmptyIdentity { .. }));
        assert_eq!(store.count().unwrap(), 0, "Empty identity must not be persisted");
    }

    #[tokio::test]
    async fn test_exported_bundle_round_trips_the_identity_set() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let origin = write_bundle(dir.path(), "roots.pem", &["Alpha Root", "Beta Root", "Gamma Root"]);
        Reconciler::new(&store, BodyDecoder, false)
            .unwrap()
            .run(&[origin])
            .await
            .unwrap();

        // Export the full store to bundle form, then reconcile that bundle
        // into a fresh store: the identity set must be reproduced.
        let exported = crate::export::render_bundle(&store.find_all().unwrap(), Utc::now());
        let reexport_path = dir.path().join("reexport.pem");
        std::fs::write(&reexport_path, exported).unwrap();

        let db2 = Database::open_in_memory().unwrap();
        let store2 = SqliteCertStore::new(&db2);
        Reconciler::new(&store2, BodyDecoder, false)
            .unwrap()
            .run(&[Locator::Path(reexport_path)])
            .await
            .unwrap();

        let dns = |s: &SqliteCertStore<'_>| -> Vec<String> {
            s.find_all()
                .unwrap()
                .into_iter()
                .map(|r| r.distinguished_name)
                .collect()
        };
        assert_eq!(dns(&store), dns(&store2));
    }

    #[tokio::test]
    async fn test_empty_store_pass_has_no_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);
        let origin = write_bundle(dir.path(), "roots.pem", &["Alpha Root"]);

        let report = Reconciler::new(&store, BodyDecoder, false)
            .unwrap()
            .run(&[origin])
            .await
            .unwrap();
        assert_eq!(report.removed, 0);
    }

    #[tokio::test]
    async fn test_bundle_with_no_certificates_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let store = SqliteCertStore::new(&db);

        let path = dir.path().join("prose.txt");
        std::fs::write(&path, "nothing resembling a certificate").unwrap();

        let report = Reconciler::new(&store, BodyDecoder, false)
            .unwrap()
            .run(&[Locator::Path(path)])
            .await
            .unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(store.count().unwrap(), 0);
    }
}
