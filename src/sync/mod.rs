// trustsync — Sync Module
//
// The reconciliation engine: one pass merges every origin's fetched bundle
// into the catalog, then sweeps records no origin refreshed, guarded by the
// mass-deletion threshold.

mod error;
mod reconciler;

pub use error::SyncError;
pub use reconciler::{PassReport, Reconciler};
